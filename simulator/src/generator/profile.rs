use anyhow::ensure;
use radarcore::decoder::Sample;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A reflector the synthetic peripheral reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub bearing: u16,
    pub distance: u32,
    /// Half-width of the arc, in degrees, over which the target echoes.
    #[serde(default = "default_target_width")]
    pub width: u16,
}

fn default_target_width() -> u16 {
    6
}

/// Configuration for generating synthetic telemetry sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub step_degrees: u16,
    pub sweeps: u32,
    pub targets: Vec<Target>,
    /// Uniform jitter applied to every distance, in distance units.
    pub noise: u32,
    /// Distance reported where no target echoes.
    pub clutter_distance: u32,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            step_degrees: 1,
            sweeps: 1,
            targets: vec![
                Target {
                    bearing: 40,
                    distance: 35,
                    width: 6,
                },
                Target {
                    bearing: 150,
                    distance: 55,
                    width: 8,
                },
                Target {
                    bearing: 270,
                    distance: 20,
                    width: 5,
                },
            ],
            noise: 3,
            clutter_distance: 120,
            description: None,
            scenario: None,
        }
    }
}

fn angular_gap(a: u16, b: u16) -> u16 {
    let diff = (i32::from(a) - i32::from(b)).rem_euclid(360) as u16;
    diff.min(360 - diff)
}

fn echo_distance(config: &GeneratorConfig, angle: u16) -> u32 {
    config
        .targets
        .iter()
        .filter(|target| angular_gap(target.bearing % 360, angle) <= target.width)
        .map(|target| target.distance)
        .min()
        .unwrap_or(config.clutter_distance)
}

/// Generates the samples of every configured sweep.
pub fn build_samples(config: &GeneratorConfig) -> anyhow::Result<Vec<Sample>> {
    ensure!(
        (1..360).contains(&config.step_degrees),
        "step_degrees must be within 1..360, got {}",
        config.step_degrees
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut samples = Vec::new();

    for _ in 0..config.sweeps.max(1) {
        for angle in (0..360u16).step_by(usize::from(config.step_degrees)) {
            let base = echo_distance(config, angle);
            let jitter = if config.noise > 0 {
                rng.gen_range(-(config.noise as i64)..=config.noise as i64)
            } else {
                0
            };
            let distance = (i64::from(base) + jitter).max(0) as u32;
            samples.push(Sample::new(angle, distance));
        }
    }

    Ok(samples)
}

/// Generates the wire lines of every configured sweep.
pub fn build_sweep(config: &GeneratorConfig) -> anyhow::Result<Vec<String>> {
    Ok(build_samples(config)?
        .iter()
        .map(Sample::to_wire)
        .collect())
}
