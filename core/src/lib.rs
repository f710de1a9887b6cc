//! Telemetry decoding and radar sweep animation for the BLE radar workspace.
//!
//! Notifications of the form `30°--45m)` arrive on a [`link`] from any
//! thread, are decoded into sweep angles or raindrop positions, and drive a
//! frame-stepped [`render::RadarEngine`] that produces toolkit-independent
//! scenes.

pub mod decoder;
pub mod diagnostics;
pub mod link;
pub mod math;
pub mod prelude;
pub mod render;
pub mod session;

pub use prelude::{DecodeError, RadarError, RadarResult, RadarSink};
pub use session::RadarSession;
