//! Application-wide constants and default values
//!
//! Centralized location for hard-coded values shared by the geometry,
//! the canvas and the solver client.

/// Edge curve construction
pub mod curve {
    /// How far the default control point sits above the chord midpoint
    pub const DEFAULT_BOW: f32 = 30.0;

    /// Curve parameter where the arrowhead is anchored
    pub const ARROW_T: f32 = 0.9;

    /// Length of each arrowhead wing
    pub const ARROW_LENGTH: f32 = 6.0;

    /// Angle between each wing and the curve tangent
    pub const ARROW_WING_ANGLE: f32 = std::f32::consts::PI / 6.0;

    /// Curve parameter where the function label is placed
    pub const LABEL_T: f32 = 0.5;

    /// Samples used when measuring the distance to a curve
    pub const HIT_SAMPLES: usize = 20;
}

/// Canvas sizing constants
pub mod canvas {
    /// Radius of a signal node
    pub const NODE_RADIUS: f32 = 18.0;

    /// Radius of the draggable control point handle
    pub const HANDLE_RADIUS: f32 = 5.0;

    /// Distance in screen pixels within which a click selects a branch
    pub const EDGE_PICK_DISTANCE: f32 = 6.0;

    /// Vertical offset of the function label above the curve
    pub const LABEL_LIFT: f32 = 10.0;

    /// Spacing of the background dot grid
    pub const GRID_SPACING: f32 = 24.0;
}

/// Solver endpoints and defaults
pub mod solver {
    /// Base URL of the analysis service
    pub const DEFAULT_URL: &str = "http://localhost:5000";

    /// Path of the signal flow graph endpoint
    pub const SOLVE_PATH: &str = "/solve";

    /// Path of the Routh-Hurwitz endpoint
    pub const CHARACTERISTIC_PATH: &str = "/solve_characteristic_equation";

    /// Default request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}
