//! Signal points placed on the canvas

use egui::Pos2;

/// Unique identifier for a signal node
pub type NodeId = u64;

/// A signal point in the flow graph
#[derive(Debug, Clone, PartialEq)]
pub struct SignalNode {
    pub id: NodeId,
    /// Name shown on the canvas and used on the wire ("N" + id)
    pub display_name: String,
    pub position: Pos2,
}

impl SignalNode {
    /// Creates a node whose display name is derived from its id
    pub fn new(id: NodeId, position: Pos2) -> Self {
        Self {
            id,
            display_name: Self::name_for(id),
            position,
        }
    }

    /// The wire name of the node with the given id
    pub fn name_for(id: NodeId) -> String {
        format!("N{}", id)
    }
}
