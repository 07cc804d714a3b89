//! Signal flow graph model: nodes, gain branches and their id sequences

pub mod edge;
pub mod node;
pub mod sequence;

pub use edge::{is_valid_gain, Branch, EdgeId, FunctionId, DEFAULT_GAIN};
pub use node::{NodeId, SignalNode};
pub use sequence::Sequence;

use egui::Pos2;
use log::debug;
use std::collections::BTreeMap;

/// One row of the gain table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRow<'a> {
    pub edge_id: EdgeId,
    pub function_id: FunctionId,
    pub gain: &'a str,
}

/// The authoritative in-memory multigraph
#[derive(Debug, Clone)]
pub struct SignalGraph {
    nodes: BTreeMap<NodeId, SignalNode>,
    edges: Vec<Branch>,
    node_ids: Sequence,
    edge_ids: Sequence,
    function_ids: Sequence,
}

impl SignalGraph {
    /// Creates an empty graph with fresh sequences
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            node_ids: Sequence::starting_at(0),
            edge_ids: Sequence::starting_at(0),
            function_ids: Sequence::starting_at(1),
        }
    }

    /// Places a new node and returns it
    pub fn add_node(&mut self, position: Pos2) -> &SignalNode {
        let id = self.node_ids.next();
        debug!("Adding node N{} at ({:.1}, {:.1})", id, position.x, position.y);
        self.nodes
            .entry(id)
            .or_insert_with(|| SignalNode::new(id, position))
    }

    /// Connects two nodes. Self-loops and parallel branches are allowed.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> &Branch {
        let id = EdgeId(self.edge_ids.next());
        let function_id = FunctionId(self.function_ids.next());
        debug!("Adding branch {} ({}) from N{} to N{}", id, function_id, source, target);
        self.edges.push(Branch::new(id, source, target, function_id));
        &self.edges[self.edges.len() - 1]
    }

    /// Stores a new gain for the branch labelled `function_id`.
    ///
    /// Returns false and keeps the previous value when `raw` is neither
    /// empty nor a number, or when no branch carries that label.
    pub fn set_gain(&mut self, function_id: FunctionId, raw: &str) -> bool {
        if !is_valid_gain(raw) {
            debug!("Rejected gain {:?} for {}", raw, function_id);
            return false;
        }
        match self.edges.iter_mut().find(|e| e.function_id == function_id) {
            Some(edge) => {
                edge.gain = raw.to_string();
                true
            }
            None => false,
        }
    }

    /// Empties the graph and rewinds every sequence in one step
    pub fn clear(&mut self) {
        debug!(
            "Clearing graph ({} nodes, {} branches)",
            self.nodes.len(),
            self.edges.len()
        );
        self.nodes.clear();
        self.edges.clear();
        self.node_ids.reset();
        self.edge_ids.reset();
        self.function_ids.reset();
    }

    /// Moves a node to a new canvas position
    pub fn move_node(&mut self, id: NodeId, position: Pos2) -> Result<(), &'static str> {
        let node = self.nodes.get_mut(&id).ok_or("Node does not exist")?;
        node.position = position;
        Ok(())
    }

    /// Stores a dragged control point on a branch
    pub fn set_control_point(&mut self, id: EdgeId, point: Pos2) -> Result<(), &'static str> {
        let edge = self.edge_mut(id).ok_or("Branch does not exist")?;
        edge.control_point = Some(point);
        Ok(())
    }

    /// Forgets a dragged control point so the branch bows by default again
    pub fn reset_control_point(&mut self, id: EdgeId) -> Result<(), &'static str> {
        let edge = self.edge_mut(id).ok_or("Branch does not exist")?;
        edge.control_point = None;
        Ok(())
    }

    /// Removes one branch. Labels of the remaining branches are untouched.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Branch> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        let removed = self.edges.remove(index);
        debug!("Removed branch {} ({})", removed.id, removed.function_id);
        Some(removed)
    }

    /// Removes a node together with every branch touching it
    pub fn remove_node(&mut self, id: NodeId) -> Option<SignalNode> {
        let node = self.nodes.remove(&id)?;
        self.edges.retain(|edge| !edge.touches(id));
        debug!("Removed node {}", node.display_name);
        Some(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&SignalNode> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Branch> {
        self.edges.iter().find(|e| e.id == id)
    }

    fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Branch> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &SignalNode> {
        self.nodes.values()
    }

    /// Branches in creation order
    pub fn edges(&self) -> &[Branch] {
        &self.edges
    }

    /// The gain table, one row per branch in creation order
    pub fn gain_rows(&self) -> impl Iterator<Item = GainRow<'_>> {
        self.edges.iter().map(|edge| GainRow {
            edge_id: edge.id,
            function_id: edge.function_id,
            gain: &edge.gain,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

impl Default for SignalGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_nodes(count: usize) -> SignalGraph {
        let mut graph = SignalGraph::new();
        for i in 0..count {
            graph.add_node(Pos2::new(i as f32 * 100.0, 0.0));
        }
        graph
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut graph = graph_with_nodes(3);
        let node_ids: Vec<NodeId> = graph.nodes().map(|n| n.id).collect();
        assert_eq!(node_ids, vec![0, 1, 2]);

        let mut last_edge = None;
        let mut last_function = None;
        for (source, target) in [(0, 1), (1, 2), (1, 2), (2, 2)] {
            let edge = graph.add_edge(source, target);
            assert!(last_edge.map_or(true, |prev| edge.id > prev));
            assert!(last_function.map_or(true, |prev| edge.function_id > prev));
            last_edge = Some(edge.id);
            last_function = Some(edge.function_id);
        }

        assert_eq!(graph.node(1).map(|n| n.display_name.as_str()), Some("N1"));
        assert_eq!(graph.edges()[0].id.to_string(), "e0");
        assert_eq!(graph.edges()[0].function_id.to_string(), "g1");
        assert_eq!(graph.edges()[3].function_id.to_string(), "g4");
    }

    #[test]
    fn test_parallel_branches_and_self_loops_allowed() {
        let mut graph = graph_with_nodes(2);
        graph.add_edge(0, 1);
        graph.add_edge(0, 1);
        graph.add_edge(1, 1);

        assert_eq!(graph.edges().len(), 3);
        assert_ne!(graph.edges()[0].function_id, graph.edges()[1].function_id);
        assert!(graph.edges().iter().all(|e| e.gain == DEFAULT_GAIN));
    }

    #[test]
    fn test_set_gain_keeps_previous_value_on_rejection() {
        let mut graph = graph_with_nodes(2);
        let function_id = graph.add_edge(0, 1).function_id;

        assert!(graph.set_gain(function_id, "2.5"));
        assert!(!graph.set_gain(function_id, "abc"));
        assert_eq!(graph.edges()[0].gain, "2.5");

        assert!(graph.set_gain(function_id, ""));
        assert_eq!(graph.edges()[0].gain, "");

        assert!(graph.set_gain(function_id, "-3"));
        assert!(!graph.set_gain(FunctionId(99), "4"));
    }

    #[test]
    fn test_clear_resets_all_sequences() {
        let mut graph = graph_with_nodes(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);

        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.gain_rows().count(), 0);

        assert_eq!(graph.add_node(Pos2::ZERO).id, 0);
        graph.add_node(Pos2::ZERO);
        let edge = graph.add_edge(0, 1);
        assert_eq!(edge.id, EdgeId(0));
        assert_eq!(edge.function_id, FunctionId(1));
    }

    #[test]
    fn test_removing_branch_keeps_other_labels() {
        let mut graph = graph_with_nodes(3);
        let first = graph.add_edge(0, 1).id;
        graph.add_edge(1, 2);
        graph.add_edge(2, 0);

        assert!(graph.remove_edge(first).is_some());
        let labels: Vec<String> = graph.gain_rows().map(|r| r.function_id.to_string()).collect();
        assert_eq!(labels, vec!["g2", "g3"]);

        // Labels are never handed out twice
        assert_eq!(graph.add_edge(0, 2).function_id, FunctionId(4));
        assert!(graph.remove_edge(first).is_none());
    }

    #[test]
    fn test_removing_node_drops_incident_branches() {
        let mut graph = graph_with_nodes(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(0, 2);

        assert!(graph.remove_node(1).is_some());
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].function_id, FunctionId(3));
        assert_eq!(graph.add_node(Pos2::ZERO).id, 3);
    }

    #[test]
    fn test_control_point_round_trip() {
        let mut graph = graph_with_nodes(2);
        let id = graph.add_edge(0, 1).id;

        graph.set_control_point(id, Pos2::new(10.0, 20.0)).unwrap();
        assert_eq!(graph.edge(id).unwrap().control_point, Some(Pos2::new(10.0, 20.0)));

        graph.reset_control_point(id).unwrap();
        assert_eq!(graph.edge(id).unwrap().control_point, None);
        assert!(graph.set_control_point(EdgeId(42), Pos2::ZERO).is_err());
    }

    #[test]
    fn test_move_node() {
        let mut graph = graph_with_nodes(1);
        graph.move_node(0, Pos2::new(5.0, 6.0)).unwrap();
        assert_eq!(graph.node(0).unwrap().position, Pos2::new(5.0, 6.0));
        assert!(graph.move_node(9, Pos2::ZERO).is_err());
    }
}
