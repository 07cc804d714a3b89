//! Viewport management for pan/zoom operations

use egui::{Pos2, Vec2};

/// Smallest and largest allowed zoom factor
const ZOOM_RANGE: (f32, f32) = (0.2, 4.0);

/// Maps graph space onto the canvas rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub pan_offset: Vec2,
    pub zoom: f32,
}

impl Viewport {
    /// Creates a new viewport with default settings
    pub fn new() -> Self {
        Self {
            pan_offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }

    /// Zoom at a specific screen point, keeping the graph point under it fixed
    pub fn zoom_at_point(&mut self, screen_point: Pos2, zoom_delta: f32) {
        let old_zoom = self.zoom;
        self.zoom = (self.zoom * zoom_delta).clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);

        let zoom_factor = self.zoom / old_zoom;
        let screen_point_vec = screen_point.to_vec2();
        self.pan_offset = screen_point_vec + (self.pan_offset - screen_point_vec) * zoom_factor;
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.pan_offset += delta;
    }

    /// Back to the identity transform
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Convert graph coordinates to screen coordinates
    pub fn world_to_screen(&self, world_pos: Pos2) -> Pos2 {
        Pos2::new(
            world_pos.x * self.zoom + self.pan_offset.x,
            world_pos.y * self.zoom + self.pan_offset.y,
        )
    }

    /// Convert screen coordinates to graph coordinates
    pub fn screen_to_world(&self, screen_pos: Pos2) -> Pos2 {
        Pos2::new(
            (screen_pos.x - self.pan_offset.x) / self.zoom,
            (screen_pos.y - self.pan_offset.y) / self.zoom,
        )
    }

    /// Converts a screen distance into a graph distance
    pub fn screen_to_world_distance(&self, distance: f32) -> f32 {
        distance / self.zoom
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_world_round_trip() {
        let mut viewport = Viewport::new();
        viewport.pan(Vec2::new(40.0, -10.0));
        viewport.zoom_at_point(Pos2::new(200.0, 100.0), 2.0);

        let world = Pos2::new(12.5, 33.0);
        let back = viewport.screen_to_world(viewport.world_to_screen(world));
        assert!((back - world).length() < 1e-4);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed_and_clamps() {
        let mut viewport = Viewport::new();
        let anchor = Pos2::new(120.0, 80.0);
        let before = viewport.screen_to_world(anchor);
        viewport.zoom_at_point(anchor, 1.5);
        let after = viewport.screen_to_world(anchor);
        assert!((before - after).length() < 1e-4);

        viewport.zoom_at_point(anchor, 100.0);
        assert_eq!(viewport.zoom, ZOOM_RANGE.1);
        viewport.reset();
        assert_eq!(viewport, Viewport::default());
    }
}
