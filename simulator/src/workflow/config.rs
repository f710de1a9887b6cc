use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use radarcore::decoder::DecoderConfig;
use radarcore::link::DeviceDescriptor;
use radarcore::render::RadarConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub device: Option<DeviceDescriptor>,
    pub radar: RadarConfig,
    pub decoder: DecoderConfig,
    pub generator: GeneratorConfig,
    /// Render frames per second used when replaying offline.
    pub frame_rate: f32,
    /// Frames advanced after each delivered notification.
    pub frames_per_line: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            device: None,
            radar: RadarConfig::default(),
            decoder: DecoderConfig::default(),
            generator: GeneratorConfig::default(),
            frame_rate: 60.0,
            frames_per_line: 1,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(step_degrees: u16, seed: u64) -> Self {
        Self {
            device: Some(simulated_device()),
            generator: GeneratorConfig {
                step_degrees,
                seed,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn frame_interval(&self) -> Duration {
        if self.frame_rate.is_finite() && self.frame_rate > 0.0 {
            Duration::from_secs_f32(1.0 / self.frame_rate)
        } else {
            Duration::from_secs_f32(1.0 / 60.0)
        }
    }
}

pub fn simulated_device() -> DeviceDescriptor {
    DeviceDescriptor::new("simulated-radar", "sim://127.0.0.1:9000")
}
