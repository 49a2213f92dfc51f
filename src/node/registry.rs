//! Fixed-capacity registry of field nodes

use heapless::Vec;
use tracing::info;

use super::remote::Node;
use crate::packet::protocol::Address;

/// Number of field nodes the station can track
pub const MAX_NUMBER_OF_NODES: usize = 3;

/// Known field nodes, in registration order
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Vec<Node, MAX_NUMBER_OF_NODES>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node
    ///
    /// # Panics
    ///
    /// Panics if the registry is full or a node with the same id is already
    /// registered
    pub fn add(&mut self, node: Node) {
        assert!(
            self.get(node.id()).is_none(),
            "node 0x{:02X} already registered",
            node.id()
        );

        let id = node.id();
        if self.nodes.push(node).is_err() {
            panic!("node registry full ({} nodes)", MAX_NUMBER_OF_NODES);
        }
        info!("Registered node 0x{:02X}", id);
    }

    /// Node with the given address
    pub fn get_node_from_id(&mut self, id: Address) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id() == id)
    }

    pub fn get(&self, id: Address) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
