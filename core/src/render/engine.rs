use crate::diagnostics::MetricsRecorder;
use crate::math::CanvasGeometry;
use crate::prelude::RadarSink;
use crate::render::config::{RadarConfig, SweepMode};
use crate::render::scene::{compose, Scene};
use crate::render::state::{RadarState, Raindrop};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

/// Advances the animation by `dt`. Does nothing while stopped.
///
/// Raindrops grow and fade linearly and are dropped once they exceed the
/// vanish size or their alpha goes negative. At most one queued angle is
/// consumed; its negation becomes the drawn rotation. The continuous sweep
/// accumulator always advances, but only drives the rotation in
/// [`SweepMode::Continuous`] when no angle was queued.
pub fn advance_frame(mut state: RadarState, config: &RadarConfig, dt: Duration) -> RadarState {
    if !state.scanning {
        return state;
    }
    age(&mut state, config, dt);
    rotate_sweep(&mut state, config);
    state
}

/// Grows and fades raindrops and advances the continuous sweep accumulator.
fn age(state: &mut RadarState, config: &RadarConfig, dt: Duration) {
    let seconds = dt.as_secs_f32();

    if config.show_raindrops {
        let growth = config.growth_per_second() * seconds;
        let fade = config.fade_per_second() * seconds;
        for raindrop in state.raindrops.iter_mut() {
            raindrop.radius += growth;
            raindrop.alpha -= fade;
        }
        state
            .raindrops
            .retain(|raindrop| !raindrop.is_vanished(config.raindrop_vanish_size));
    }

    state.sweep_degrees =
        (state.sweep_degrees + config.sweep_degrees_per_second() * seconds).rem_euclid(360.0);
}

fn rotate_sweep(state: &mut RadarState, config: &RadarConfig) {
    match state.angle_queue.pop() {
        Some(angle) => state.rotation_degrees = -f32::from(angle),
        None if config.sweep_mode == SweepMode::Continuous => {
            state.rotation_degrees = state.sweep_degrees
        }
        None => {}
    }
}

/// Owns the radar state and exposes the control surface used by hosts.
pub struct RadarEngine {
    config: RadarConfig,
    state: RadarState,
    redraw_requested: bool,
    metrics: Arc<MetricsRecorder>,
}

impl RadarEngine {
    pub fn new(config: RadarConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsRecorder::new()))
    }

    pub fn with_metrics(config: RadarConfig, metrics: Arc<MetricsRecorder>) -> Self {
        let config = config.normalized();
        Self {
            state: RadarState::new(config.angle_queue_capacity),
            config,
            redraw_requested: false,
            metrics,
        }
    }

    pub fn start(&mut self) {
        if !self.state.scanning {
            self.state.scanning = true;
            self.redraw_requested = true;
            info!("radar scanning started");
        }
    }

    /// Stops scanning and clears the display. Queued angles are kept.
    pub fn stop(&mut self) {
        if self.state.scanning {
            self.state.scanning = false;
            info!("radar scanning stopped");
        }
        self.state.raindrops.clear();
        self.state.sweep_degrees = 0.0;
        self.state.rotation_degrees = 0.0;
    }

    pub fn enqueue_angle(&mut self, angle: u16) {
        if let Some(evicted) = self.state.angle_queue.push(angle) {
            debug!("angle queue full, dropped {}°", evicted);
            self.metrics.record_angle_coalesced();
        }
    }

    pub fn add_raindrop(&mut self, x: i32, y: i32) {
        debug!("raindrop at ({}, {})", x, y);
        self.state.raindrops.push(Raindrop::new(
            x,
            y,
            self.config.raindrop_start_size,
            self.config.raindrop_color,
        ));
        self.redraw_requested = true;
    }

    /// Advances one frame; returns whether another frame should be scheduled.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if !self.state.scanning {
            return false;
        }
        let state = std::mem::take(&mut self.state);
        self.state = advance_frame(state, &self.config, dt);
        self.metrics.record_frame();
        self.state.scanning
    }

    /// Produces the scene shown for this frame, then ages it by `dt`.
    ///
    /// The sweep takes its queued angle before drawing; raindrops are drawn
    /// as they are and only grow and fade afterwards, so a fresh raindrop is
    /// first shown at its start size and full alpha.
    pub fn render_frame(&mut self, dt: Duration, geometry: &CanvasGeometry) -> Scene {
        if !self.state.scanning {
            return self.scene(geometry);
        }
        rotate_sweep(&mut self.state, &self.config);
        let scene = self.scene(geometry);
        age(&mut self.state, &self.config, dt);
        self.metrics.record_frame();
        scene
    }

    pub fn scene(&self, geometry: &CanvasGeometry) -> Scene {
        compose(&self.state, &self.config, geometry)
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    pub fn is_scanning(&self) -> bool {
        self.state.scanning
    }

    pub fn state(&self) -> &RadarState {
        &self.state
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }
}

impl Default for RadarEngine {
    fn default() -> Self {
        Self::new(RadarConfig::default())
    }
}

impl RadarSink for RadarEngine {
    fn push_angle(&mut self, angle: u16) {
        self.enqueue_angle(angle);
    }

    fn push_raindrop(&mut self, x: i32, y: i32) {
        self.add_raindrop(x, y);
    }
}
