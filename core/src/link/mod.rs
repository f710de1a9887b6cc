pub mod channel;

pub use channel::{DeviceDescriptor, LinkEvent, TelemetryLink, TelemetryReceiver, TelemetrySender};
