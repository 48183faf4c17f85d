//! Node database seam used while registering Device Composition Data.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::mesh::dcd::DcdHeader;

/// Model identity as stored per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId {
    pub vendor: u16,
    pub model: u16,
}

/// Store of provisioned nodes and their composition.
pub trait NodeDatabase {
    /// DCD availability of the node at `address`, `None` if the node is unknown.
    fn node_dcd_available(&self, address: u16) -> Option<bool>;

    fn set_dcd_header(&mut self, address: u16, header: &DcdHeader) -> Result<()>;

    /// Append an element; elements are indexed in insertion order.
    fn add_element(&mut self, address: u16, location: u16) -> Result<()>;

    fn add_model(&mut self, address: u16, element_index: u16, model: ModelId) -> Result<()>;

    fn set_dcd_available(&mut self, address: u16) -> Result<()>;

    /// Drop header, elements and the available flag of the node.
    fn clear_dcd(&mut self, address: u16) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementEntry {
    pub location: u16,
    pub models: Vec<ModelId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeEntry {
    pub header: Option<DcdHeader>,
    pub elements: Vec<ElementEntry>,
    pub dcd_available: bool,
}

impl NodeEntry {
    pub fn model_count(&self) -> usize {
        self.elements.iter().map(|e| e.models.len()).sum()
    }
}

/// In-memory `NodeDatabase`.
#[derive(Debug, Default)]
pub struct MemoryNodeDb {
    nodes: BTreeMap<u16, NodeEntry>,
}

impl MemoryNodeDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Returns false if it was already known.
    pub fn add_node(&mut self, address: u16) -> bool {
        if self.nodes.contains_key(&address) {
            return false;
        }
        self.nodes.insert(address, NodeEntry::default());
        true
    }

    pub fn remove_node(&mut self, address: u16) -> Option<NodeEntry> {
        self.nodes.remove(&address)
    }

    pub fn node(&self, address: u16) -> Option<&NodeEntry> {
        self.nodes.get(&address)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_mut(&mut self, address: u16) -> Result<&mut NodeEntry> {
        self.nodes.get_mut(&address).ok_or(Error::NotFound)
    }
}

impl NodeDatabase for MemoryNodeDb {
    fn node_dcd_available(&self, address: u16) -> Option<bool> {
        self.nodes.get(&address).map(|n| n.dcd_available)
    }

    fn set_dcd_header(&mut self, address: u16, header: &DcdHeader) -> Result<()> {
        self.node_mut(address)?.header = Some(*header);
        Ok(())
    }

    fn add_element(&mut self, address: u16, location: u16) -> Result<()> {
        let node = self.node_mut(address)?;
        node.elements.try_reserve(1).map_err(|_| Error::AllocationFailed)?;
        node.elements.push(ElementEntry {
            location,
            models: Vec::new(),
        });
        Ok(())
    }

    fn add_model(&mut self, address: u16, element_index: u16, model: ModelId) -> Result<()> {
        let element = self
            .node_mut(address)?
            .elements
            .get_mut(element_index as usize)
            .ok_or(Error::NotFound)?;
        element.models.try_reserve(1).map_err(|_| Error::AllocationFailed)?;
        element.models.push(model);
        Ok(())
    }

    fn set_dcd_available(&mut self, address: u16) -> Result<()> {
        self.node_mut(address)?.dcd_available = true;
        Ok(())
    }

    fn clear_dcd(&mut self, address: u16) -> Result<()> {
        let node = self.node_mut(address)?;
        node.header = None;
        node.elements.clear();
        node.dcd_available = false;
        Ok(())
    }
}
