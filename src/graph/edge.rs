//! Gain branches between signal nodes

use std::fmt;

use egui::Pos2;

use super::node::NodeId;

/// Identifier of a branch, rendered as "e" + sequence value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Gain label of a branch, rendered as "g" + sequence value.
/// Assigned once when the branch is created and never handed out again
/// for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u64);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Gain every new branch starts with
pub const DEFAULT_GAIN: &str = "1";

/// A directed gain branch. Several branches may join the same pair of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub function_id: FunctionId,
    /// Gain exactly as the user typed it; empty means the default of 1
    pub gain: String,
    /// User-dragged control point, `None` until the curve is reshaped
    pub control_point: Option<Pos2>,
}

impl Branch {
    /// Creates a branch with the default gain and no stored control point
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, function_id: FunctionId) -> Self {
        Self {
            id,
            source,
            target,
            function_id,
            gain: DEFAULT_GAIN.to_string(),
            control_point: None,
        }
    }

    /// True if the branch starts or ends at `node`
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

/// Accepts the empty string or anything that reads as a finite number.
/// Integers, decimals, negatives and zero all pass.
pub fn is_valid_gain(raw: &str) -> bool {
    if raw.is_empty() {
        return true;
    }
    match raw.trim().parse::<f64>() {
        Ok(value) => value.is_finite(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_validation() {
        assert!(is_valid_gain(""));
        assert!(is_valid_gain("2"));
        assert!(is_valid_gain("-0.25"));
        assert!(is_valid_gain("0"));
        assert!(is_valid_gain(".5"));

        assert!(!is_valid_gain("abc"));
        assert!(!is_valid_gain("1.2.3"));
        assert!(!is_valid_gain("NaN"));
        assert!(!is_valid_gain("inf"));
    }

    #[test]
    fn test_labels_render_with_prefix() {
        assert_eq!(EdgeId(0).to_string(), "e0");
        assert_eq!(FunctionId(7).to_string(), "g7");
    }
}
