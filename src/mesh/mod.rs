//! BT Mesh collaborator surfaces.
//!
//! The configurator talks to the mesh stack through `MeshStack` and
//! `MeshEvent`, and records Device Composition Data through `NodeDatabase`.

pub mod db;
pub mod dcd;
pub mod event;
pub mod models;
pub mod stack;

pub use db::{MemoryNodeDb, ModelId, NodeDatabase, NodeEntry};
pub use dcd::DcdHeader;
pub use event::{handle_from_event, is_configuration_event, MeshEvent};
pub use models::{SigModelInfo, SIG_MODELS};
pub use stack::{ConfRequest, MeshStack, ModelTarget, Publication};
