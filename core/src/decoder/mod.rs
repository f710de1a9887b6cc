pub mod classifier;
pub mod wire;

pub use classifier::{Decoded, DecoderConfig, DistanceAccumulator, TelemetryDecoder};
pub use wire::{decode, Sample};
