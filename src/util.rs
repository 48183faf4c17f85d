//! Shared utility functions.

use std::fmt;

use crate::{Error, Result};

/// `fmt::Write` sink over a fixed byte buffer with bounded-print semantics.
///
/// Output that does not fit is counted but dropped. One byte is always kept
/// free for the terminating NUL.
pub struct BoundedWriter<'a> {
    buf: &'a mut [u8],
    required: usize,
}

impl<'a> BoundedWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, required: 0 }
    }

    /// Terminate the output and return the length the full text needs,
    /// excluding the terminator.
    pub fn finish(self) -> usize {
        let required = self.required;
        let buf = self.buf;
        if !buf.is_empty() {
            let end = required.min(buf.len() - 1);
            buf[end] = 0;
        }
        required
    }
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let capacity = self.buf.len().saturating_sub(1);
        if self.required < capacity {
            let n = s.len().min(capacity - self.required);
            self.buf[self.required..self.required + n].copy_from_slice(&s.as_bytes()[..n]);
        }
        self.required += s.len();
        Ok(())
    }
}

/// Format `args` into `buf` like `snprintf`.
///
/// Returns the length the complete output would need. A result greater than
/// or equal to `buf.len()` means the output was truncated.
pub fn format_bounded(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
    let mut writer = BoundedWriter::new(buf);
    let _ = fmt::Write::write_fmt(&mut writer, args);
    writer.finish()
}

/// Read a little-endian `u16` at `offset`.
pub fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Append every little-endian `u16` of `data` to `dest`.
///
/// # Errors
/// - `InvalidCount` if `data` has an odd length or `dest` would exceed `max_len`
/// - `AllocationFailed` if `dest` cannot grow
///
/// `dest` is left untouched on error.
pub fn collect_u16_le(dest: &mut Vec<u16>, max_len: usize, data: &[u8]) -> Result<()> {
    if data.len() % 2 != 0 {
        return Err(Error::InvalidCount);
    }
    let added = data.len() / 2;
    if dest.len() + added > max_len {
        return Err(Error::InvalidCount);
    }
    dest.try_reserve(added)
        .map_err(|_| Error::AllocationFailed)?;
    dest.extend(
        data.chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
    );
    Ok(())
}
