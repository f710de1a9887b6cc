pub mod config;
pub mod engine;
pub mod scene;
pub mod state;

pub use config::{RadarConfig, SweepMode};
pub use engine::{advance_frame, RadarEngine};
pub use scene::{compose, Scene};
pub use state::{AngleQueue, RadarState, Raindrop};
