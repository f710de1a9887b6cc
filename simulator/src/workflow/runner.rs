use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::info;
use radarcore::diagnostics::MetricsSnapshot;
use radarcore::render::Scene;
use radarcore::session::{RadarSession, SessionEvent};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectionPoint {
    pub angle: u16,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Serialize)]
pub struct WorkflowResult {
    pub detections: Vec<DetectionPoint>,
    pub raindrops_alive: usize,
    pub disconnected: bool,
    pub metrics: MetricsSnapshot,
    pub final_scene: Scene,
}

/// Replays telemetry through a headless radar session.
#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(
            config.device.is_some(),
            "no device configured for the telemetry link"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn execute(&self, lines: &[String]) -> anyhow::Result<WorkflowResult> {
        let mut session = RadarSession::connect(
            self.config.device.clone(),
            self.config.radar.clone(),
            self.config.decoder.clone(),
        )
        .context("attaching telemetry link")?;
        session.start();

        let sender = session.sender();
        let dt = self.config.frame_interval();
        let frames_per_line = self.config.frames_per_line.max(1);
        let mut detections = Vec::new();
        let mut disconnected = false;

        for line in lines {
            sender
                .notify(line.as_str())
                .context("delivering telemetry to session")?;
            for _ in 0..frames_per_line {
                for event in session.tick(dt) {
                    match event {
                        SessionEvent::Detection { angle, x, y } => {
                            detections.push(DetectionPoint { angle, x, y })
                        }
                        SessionEvent::Disconnected => disconnected = true,
                    }
                }
            }
        }

        let metrics = session.metrics();
        info!(
            "replayed {} lines: {} detections, {} dropped",
            lines.len(),
            detections.len(),
            metrics.dropped
        );

        Ok(WorkflowResult {
            raindrops_alive: session.engine().state().raindrops.len(),
            final_scene: session.scene(),
            detections,
            disconnected,
            metrics,
        })
    }
}
