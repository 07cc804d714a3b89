//! Canonical edge list sent to the solver

use log::warn;
use serde::{Deserialize, Serialize};

use crate::graph::{SignalGraph, SignalNode};

/// One branch as the solver sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEdge {
    pub from: String,
    pub to: String,
    pub gain: f64,
}

/// Body of `POST /solve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub edges: Vec<CanonicalEdge>,
}

impl SolveRequest {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Numeric value of a stored gain string; empty means 1
pub fn resolve_gain(raw: &str) -> f64 {
    if raw.is_empty() {
        return 1.0;
    }
    match raw.trim().parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            // set_gain never stores these, so only hand-built graphs reach here
            warn!("Unparseable gain {:?}, using 1", raw);
            1.0
        }
    }
}

/// Projects every branch, in creation order, onto the wire format
pub fn build_edges(graph: &SignalGraph) -> Vec<CanonicalEdge> {
    graph
        .edges()
        .iter()
        .map(|edge| CanonicalEdge {
            from: SignalNode::name_for(edge.source),
            to: SignalNode::name_for(edge.target),
            gain: resolve_gain(&edge.gain),
        })
        .collect()
}

/// Snapshot of the graph ready to be posted
pub fn build_request(graph: &SignalGraph) -> SolveRequest {
    SolveRequest {
        edges: build_edges(graph),
    }
}
