use crate::math::CanvasGeometry;
use crate::prelude::{RadarResult, Rgba};
use crate::render::config::RadarConfig;
use crate::render::state::RadarState;
use serde::{Deserialize, Serialize};

/// Offsets of the sweep gradient, measured clockwise as a fraction of a turn.
pub const SWEEP_STOP_OFFSETS: [f32; 5] = [0.0, 0.6, 0.99, 0.998, 1.0];
const SWEEP_STOP_ALPHAS: [u8; 4] = [0, 168, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub center: Point,
    pub radius: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

/// A sweep gradient whose bright edge sits at `rotation_degrees`, measured
/// clockwise from the positive x axis in screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub rotation_degrees: f32,
    pub stops: Vec<GradientStop>,
}

impl Sweep {
    /// Gradient color `fraction` of a turn clockwise from the gradient origin.
    pub fn color_at(&self, fraction: f32) -> Rgba {
        let fraction = fraction.clamp(0.0, 1.0);
        let Some(first) = self.stops.first() else {
            return Rgba::TRANSPARENT;
        };
        let mut previous = first;
        for stop in &self.stops {
            if fraction <= stop.offset {
                let span = stop.offset - previous.offset;
                if span <= f32::EPSILON {
                    return stop.color;
                }
                let t = (fraction - previous.offset) / span;
                return lerp(previous.color, stop.color, t);
            }
            previous = stop;
        }
        previous.color
    }
}

fn lerp(from: Rgba, to: Rgba, t: f32) -> Rgba {
    let channel = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    Rgba {
        r: channel(from.r, to.r),
        g: channel(from.g, to.g),
        b: channel(from.b, to.b),
        a: channel(from.a, to.a),
    }
}

/// Toolkit-independent description of one radar frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub center: Point,
    pub radius: f32,
    pub ring_color: Rgba,
    pub rings: Vec<f32>,
    pub cross_lines: Vec<Segment>,
    pub raindrops: Vec<Spot>,
    pub sweep: Option<Sweep>,
    pub scanning: bool,
    pub sweep_degrees: f32,
    pub pending_angles: usize,
}

impl Scene {
    pub fn to_json(&self) -> RadarResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

pub fn sweep_stops(config: &RadarConfig) -> Vec<GradientStop> {
    std::iter::once(Rgba::TRANSPARENT)
        .chain(
            SWEEP_STOP_ALPHAS
                .iter()
                .map(|&alpha| config.sweep_color.with_alpha(alpha)),
        )
        .zip(SWEEP_STOP_OFFSETS)
        .map(|(color, offset)| GradientStop { offset, color })
        .collect()
}

/// Renders the state into a scene. The background rings and cross hair are
/// always present; raindrops and the sweep only while scanning.
pub fn compose(state: &RadarState, config: &RadarConfig, geometry: &CanvasGeometry) -> Scene {
    let center = Point {
        x: geometry.center_x as f32,
        y: geometry.center_y as f32,
    };
    let radius = geometry.radius() as f32;
    let count = config.circle_count.max(1);
    let step = radius / count as f32;
    let rings = (0..count).map(|i| radius - step * i as f32).collect();

    let cross_lines = if config.show_cross_line {
        vec![
            Segment {
                from: Point {
                    x: center.x - radius,
                    y: center.y,
                },
                to: Point {
                    x: center.x + radius,
                    y: center.y,
                },
            },
            Segment {
                from: Point {
                    x: center.x,
                    y: center.y - radius,
                },
                to: Point {
                    x: center.x,
                    y: center.y + radius,
                },
            },
        ]
    } else {
        Vec::new()
    };

    let raindrops = if state.scanning && config.show_raindrops {
        state
            .raindrops
            .iter()
            .map(|raindrop| Spot {
                center: Point {
                    x: raindrop.x as f32,
                    y: raindrop.y as f32,
                },
                radius: raindrop.radius,
                color: raindrop.paint(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let sweep = state.scanning.then(|| Sweep {
        rotation_degrees: state.rotation_degrees,
        stops: sweep_stops(config),
    });

    Scene {
        width: (geometry.center_x * 2.0) as f32,
        height: (geometry.center_y * 2.0) as f32,
        center,
        radius,
        ring_color: config.circle_color.with_alpha(255),
        rings,
        cross_lines,
        raindrops,
        sweep,
        scanning: state.scanning,
        sweep_degrees: state.sweep_degrees,
        pending_angles: state.angle_queue.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Rgb;
    use crate::render::state::Raindrop;

    fn scanning_state() -> RadarState {
        let mut state = RadarState::new(8);
        state.scanning = true;
        state
    }

    #[test]
    fn rings_shrink_evenly_from_outer_radius() {
        let config = RadarConfig {
            circle_count: 4,
            ..Default::default()
        };
        let geometry = CanvasGeometry::from_canvas(200.0, 200.0, 10.0);
        let scene = compose(&RadarState::new(1), &config, &geometry);
        assert_eq!(scene.rings, vec![100.0, 75.0, 50.0, 25.0]);
        assert_eq!(scene.cross_lines.len(), 2);
        assert_eq!(scene.cross_lines[0].from, Point { x: 0.0, y: 100.0 });
    }

    #[test]
    fn stopped_scene_has_background_only() {
        let mut state = RadarState::new(1);
        state.raindrops.push(Raindrop::new(1, 1, 15.0, Rgb::RED));
        let scene = compose(&state, &RadarConfig::default(), &CanvasGeometry::legacy());
        assert!(scene.sweep.is_none());
        assert!(scene.raindrops.is_empty());
        assert_eq!(scene.rings.len(), 3);
    }

    #[test]
    fn scanning_scene_carries_raindrops_and_sweep() {
        let mut state = scanning_state();
        state.rotation_degrees = -30.0;
        state.raindrops.push(Raindrop::new(600, 500, 15.0, Rgb::RED));
        let config = RadarConfig {
            show_cross_line: false,
            ..Default::default()
        };

        let scene = compose(&state, &config, &CanvasGeometry::legacy());

        assert!(scene.cross_lines.is_empty());
        assert_eq!(scene.raindrops.len(), 1);
        assert_eq!(scene.raindrops[0].center, Point { x: 600.0, y: 500.0 });
        assert_eq!(scene.raindrops[0].color.a, 255);
        let sweep = scene.sweep.unwrap();
        assert_eq!(sweep.rotation_degrees, -30.0);
        assert_eq!(sweep.stops.len(), 5);
    }

    #[test]
    fn sweep_stops_ramp_up_to_opaque_edge() {
        let stops = sweep_stops(&RadarConfig {
            sweep_color: Rgb::new(0, 255, 0),
            ..Default::default()
        });
        let alphas: Vec<u8> = stops.iter().map(|stop| stop.color.a).collect();
        assert_eq!(alphas, vec![0, 0, 168, 255, 255]);
        assert_eq!(stops[0].color, Rgba::TRANSPARENT);
        assert_eq!(stops[4].color.g, 255);
        assert_eq!(stops[1].offset, 0.6);
    }

    #[test]
    fn sweep_color_interpolates_between_stops() {
        let sweep = Sweep {
            rotation_degrees: 0.0,
            stops: sweep_stops(&RadarConfig::default()),
        };
        assert_eq!(sweep.color_at(0.3).a, 0);
        assert_eq!(sweep.color_at(0.99).a, 168);
        assert_eq!(sweep.color_at(1.0).a, 255);
        let mid = sweep.color_at(0.795);
        assert!(mid.a > 70 && mid.a < 100, "alpha {}", mid.a);
    }

    #[test]
    fn scene_serializes_to_json() {
        let json = compose(&scanning_state(), &RadarConfig::default(), &CanvasGeometry::legacy())
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["scanning"], true);
        assert_eq!(value["width"], 1050.0);
    }
}
