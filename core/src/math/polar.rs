use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Maps telemetry distances onto a square drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    pub center_x: f64,
    pub center_y: f64,
    /// Screen pixels per telemetry distance unit.
    pub scale: f64,
}

impl CanvasGeometry {
    /// Derives the center and scale so that `max_distance` lands on the edge of
    /// the largest circle that fits the canvas.
    pub fn from_canvas(width: f64, height: f64, max_distance: f64) -> Self {
        let radius = width.min(height) / 2.0;
        let scale = if max_distance > 0.0 && radius > 0.0 {
            radius / max_distance
        } else {
            1.0
        };
        Self {
            center_x: width / 2.0,
            center_y: height / 2.0,
            scale,
        }
    }

    /// 1050 px canvas with a 75 unit range: center 525, scale 7.
    pub fn legacy() -> Self {
        Self::from_canvas(1050.0, 1050.0, 75.0)
    }

    pub fn radius(&self) -> f64 {
        self.center_x.min(self.center_y)
    }
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self::legacy()
    }
}

/// Converts a telemetry bearing/distance pair into integer screen coordinates.
///
/// The bearing is rotated by 90 degrees before projection, so the mapping is
/// `x = d·sin(a + 90°)`, `y = d·cos(a + 90°)`. Both offsets are truncated to
/// whole distance units before they are scaled and re-centered.
pub fn polar_to_screen(angle_degrees: f64, distance: u32, geometry: &CanvasGeometry) -> (i32, i32) {
    let theta = 2.0 * PI * (angle_degrees + 90.0) / 360.0;
    let distance = f64::from(distance);
    let x = (distance * theta.sin()) as i32;
    let y = (distance * theta.cos()) as i32;
    let screen_x = f64::from(x) * geometry.scale + geometry.center_x;
    let screen_y = f64::from(y) * geometry.scale + geometry.center_y;
    (screen_x as i32, screen_y as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_geometry_matches_fixed_constants() {
        let geometry = CanvasGeometry::legacy();
        assert_eq!(geometry.center_x, 525.0);
        assert_eq!(geometry.center_y, 525.0);
        assert!((geometry.scale - 7.0).abs() < 1e-12);
    }

    #[test]
    fn zero_distance_maps_to_center() {
        let geometry = CanvasGeometry::legacy();
        assert_eq!(polar_to_screen(123.0, 0, &geometry), (525, 525));
    }

    #[test]
    fn zero_degrees_projects_along_positive_x() {
        let geometry = CanvasGeometry::legacy();
        // sin(90°) = 1, cos(90°) ≈ 0
        assert_eq!(polar_to_screen(0.0, 10, &geometry), (595, 525));
    }

    #[test]
    fn ninety_degrees_projects_along_negative_y() {
        let geometry = CanvasGeometry::legacy();
        let (x, y) = polar_to_screen(90.0, 10, &geometry);
        assert_eq!(x, 525);
        assert_eq!(y, 455);
    }

    #[test]
    fn offsets_snap_to_whole_units_before_scaling() {
        let geometry = CanvasGeometry::legacy();
        // 33·sin(100°) = 32.5, 33·cos(100°) = -5.7
        assert_eq!(polar_to_screen(10.0, 33, &geometry), (32 * 7 + 525, -5 * 7 + 525));
    }

    #[test]
    fn from_canvas_uses_shorter_side() {
        let geometry = CanvasGeometry::from_canvas(800.0, 400.0, 50.0);
        assert_eq!(geometry.center_x, 400.0);
        assert_eq!(geometry.center_y, 200.0);
        assert_eq!(geometry.scale, 4.0);
        assert_eq!(geometry.radius(), 200.0);
    }
}
