use crate::prelude::Rgb;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CIRCLE_COUNT: u32 = 3;
pub const DEFAULT_SPEED: f32 = 3.0;
pub const DEFAULT_FLICKER: f32 = 3.0;
pub const DEFAULT_RAINDROP_START_SIZE: f32 = 15.0;
pub const DEFAULT_RAINDROP_VANISH_SIZE: f32 = 35.0;
pub const DEFAULT_ANGLE_QUEUE_CAPACITY: usize = 64;

/// Which value drives the drawn sweep rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Only queued telemetry angles rotate the sweep; it holds still otherwise.
    #[default]
    Queued,
    /// Queued angles win; with an empty queue the sweep follows the time-driven accumulator.
    Continuous,
}

/// Static visual configuration of the radar display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub circle_color: Rgb,
    pub circle_count: u32,
    pub sweep_color: Rgb,
    pub raindrop_color: Rgb,
    /// Carried for completeness; raindrops are spawned by telemetry only.
    pub raindrop_count: u32,
    pub show_cross_line: bool,
    pub show_raindrops: bool,
    /// Seconds per full continuous sweep revolution.
    pub speed: f32,
    /// Divisor slowing raindrop growth and fade.
    pub flicker: f32,
    pub raindrop_start_size: f32,
    pub raindrop_vanish_size: f32,
    pub angle_queue_capacity: usize,
    pub sweep_mode: SweepMode,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            circle_color: Rgb::RED,
            circle_count: DEFAULT_CIRCLE_COUNT,
            sweep_color: Rgb::RED,
            raindrop_color: Rgb::RED,
            raindrop_count: 5,
            show_cross_line: true,
            show_raindrops: true,
            speed: DEFAULT_SPEED,
            flicker: DEFAULT_FLICKER,
            raindrop_start_size: DEFAULT_RAINDROP_START_SIZE,
            raindrop_vanish_size: DEFAULT_RAINDROP_VANISH_SIZE,
            angle_queue_capacity: DEFAULT_ANGLE_QUEUE_CAPACITY,
            sweep_mode: SweepMode::Queued,
        }
    }
}

impl RadarConfig {
    /// Clamps out-of-range values back to their defaults instead of rejecting them.
    pub fn normalized(mut self) -> Self {
        if self.circle_count < 1 {
            self.circle_count = DEFAULT_CIRCLE_COUNT;
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            self.speed = DEFAULT_SPEED;
        }
        if !(self.flicker.is_finite() && self.flicker > 0.0) {
            self.flicker = DEFAULT_FLICKER;
        }
        if !(self.raindrop_start_size.is_finite() && self.raindrop_start_size >= 0.0) {
            self.raindrop_start_size = DEFAULT_RAINDROP_START_SIZE;
        }
        if !(self.raindrop_vanish_size.is_finite() && self.raindrop_vanish_size > 0.0) {
            self.raindrop_vanish_size = DEFAULT_RAINDROP_VANISH_SIZE;
        }
        if self.angle_queue_capacity == 0 {
            self.angle_queue_capacity = DEFAULT_ANGLE_QUEUE_CAPACITY;
        }
        self
    }

    /// Raindrop radius growth in pixels per second.
    pub fn growth_per_second(&self) -> f32 {
        20.0 / self.flicker
    }

    /// Raindrop alpha decay per second.
    pub fn fade_per_second(&self) -> f32 {
        255.0 / self.flicker
    }

    /// Continuous sweep advance in degrees per second.
    pub fn sweep_degrees_per_second(&self) -> f32 {
        360.0 / self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_clamps_invalid_values_to_defaults() {
        let config = RadarConfig {
            circle_count: 0,
            speed: -1.0,
            flicker: 0.0,
            raindrop_vanish_size: f32::NAN,
            angle_queue_capacity: 0,
            ..Default::default()
        }
        .normalized();

        assert_eq!(config.circle_count, DEFAULT_CIRCLE_COUNT);
        assert_eq!(config.speed, DEFAULT_SPEED);
        assert_eq!(config.flicker, DEFAULT_FLICKER);
        assert_eq!(config.raindrop_vanish_size, DEFAULT_RAINDROP_VANISH_SIZE);
        assert_eq!(config.angle_queue_capacity, DEFAULT_ANGLE_QUEUE_CAPACITY);
    }

    #[test]
    fn normalized_keeps_valid_values() {
        let config = RadarConfig {
            circle_count: 5,
            speed: 1.5,
            flicker: 6.0,
            ..Default::default()
        };
        assert_eq!(config.clone().normalized(), config);
    }

    #[test]
    fn rates_match_legacy_sixty_fps_deltas() {
        let config = RadarConfig::default();
        let frame = 1.0 / 60.0;
        assert!((config.growth_per_second() * frame - 1.0 * 20.0 / 60.0 / 3.0).abs() < 1e-6);
        assert!((config.fade_per_second() * frame - 1.0 * 255.0 / 60.0 / 3.0).abs() < 1e-6);
        assert!((config.sweep_degrees_per_second() * frame - 360.0 / 3.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn config_deserializes_partial_json() {
        let config: RadarConfig =
            serde_json::from_str(r##"{"circle_count": 4, "sweep_color": "#00FF00", "sweep_mode": "continuous"}"##)
                .unwrap();
        assert_eq!(config.circle_count, 4);
        assert_eq!(config.sweep_color, Rgb::new(0, 255, 0));
        assert_eq!(config.sweep_mode, SweepMode::Continuous);
        assert!(config.show_raindrops);
    }
}
