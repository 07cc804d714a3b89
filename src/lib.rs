//! SFG Studio library
//!
//! Signal flow graph model, branch geometry, the solver wire schemas and
//! the egui editor that ties them together.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod editor;
pub mod export;
pub mod geometry;
pub mod graph;
pub mod payload;
pub mod results;
pub mod solver;
pub mod stability;

// Re-export commonly used types
pub use config::AppConfig;
pub use editor::SignalFlowEditor;
pub use graph::{Branch, EdgeId, FunctionId, NodeId, SignalGraph, SignalNode};
pub use solver::{HttpSolver, SolverError, SolverTransport};
