use crate::decoder::{Decoded, DecoderConfig, TelemetryDecoder};
use crate::diagnostics::{MetricsRecorder, MetricsSnapshot};
use crate::link::{DeviceDescriptor, LinkEvent, TelemetryLink, TelemetryReceiver, TelemetrySender};
use crate::math::CanvasGeometry;
use crate::prelude::{RadarError, RadarResult};
use crate::render::{RadarConfig, RadarEngine, Scene};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Things the host should react to after a pump.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Detection { angle: u16, x: i32, y: i32 },
    Disconnected,
}

/// Connects a telemetry link to a decoder and a render engine. All mutation
/// happens on the thread that calls [`RadarSession::pump`] / [`RadarSession::tick`].
pub struct RadarSession {
    decoder: TelemetryDecoder,
    engine: RadarEngine,
    receiver: TelemetryReceiver,
    sender: TelemetrySender,
    geometry: CanvasGeometry,
    metrics: Arc<MetricsRecorder>,
    connected: bool,
}

impl RadarSession {
    pub fn connect(
        device: Option<DeviceDescriptor>,
        radar: RadarConfig,
        decoder: DecoderConfig,
    ) -> RadarResult<Self> {
        let device = device.ok_or(RadarError::MissingDevice)?;
        Ok(Self::attached(device, radar, decoder))
    }

    /// Builds a session for a device that is known to be present.
    pub fn attached(device: DeviceDescriptor, radar: RadarConfig, decoder: DecoderConfig) -> Self {
        let metrics = Arc::new(MetricsRecorder::new());
        let (sender, receiver) = TelemetryLink::open(device, metrics.clone());
        let geometry = decoder.geometry();
        Self {
            decoder: TelemetryDecoder::new(decoder),
            engine: RadarEngine::with_metrics(radar, metrics.clone()),
            receiver,
            sender,
            geometry,
            metrics,
            connected: true,
        }
    }

    /// Handle for producers on other threads.
    pub fn sender(&self) -> TelemetrySender {
        self.sender.clone()
    }

    /// Starts scanning. Ignored once the device has disconnected.
    pub fn start(&mut self) {
        if !self.connected {
            warn!("device {} is disconnected, not starting", self.receiver.device().name);
            return;
        }
        self.engine.start();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// Drains every pending link event. Malformed notifications are logged
    /// and dropped.
    pub fn pump(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.try_next() {
            match event {
                LinkEvent::Notification(raw) => {
                    if let Some(event) = self.ingest(&raw) {
                        events.push(event);
                    }
                }
                LinkEvent::Disconnected => {
                    if self.connected {
                        info!("device {} disconnected", self.receiver.device().name);
                        self.connected = false;
                        self.engine.stop();
                        self.decoder.reset();
                        events.push(SessionEvent::Disconnected);
                    }
                }
            }
        }
        events
    }

    /// Decodes one notification and applies it to the engine. Notifications
    /// that arrive after a disconnect are dropped.
    pub fn ingest(&mut self, raw: &str) -> Option<SessionEvent> {
        if !self.connected {
            debug!("ignoring telemetry after disconnect: {:?}", raw);
            self.metrics.record_dropped();
            return None;
        }
        let decoded = match self.decoder.ingest(raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!("dropping telemetry {:?}: {}", raw, err);
                self.metrics.record_dropped();
                return None;
            }
        };
        self.metrics.record_decoded();

        let event = match decoded {
            Decoded::Detection { angle, x, y, .. } => {
                self.metrics.record_detection();
                Some(SessionEvent::Detection { angle, x, y })
            }
            Decoded::OutOfRange { .. } => {
                self.metrics.record_out_of_range();
                None
            }
            Decoded::Sweep { .. } => None,
        };
        decoded.apply(&mut self.engine);
        event
    }

    /// Pumps the link then advances one frame.
    pub fn tick(&mut self, dt: Duration) -> Vec<SessionEvent> {
        let events = self.pump();
        self.engine.tick(dt);
        events
    }

    /// Pumps the link and returns the scene to draw for this frame. The
    /// engine ages the scene by `dt` only after it has been captured.
    pub fn frame(&mut self, dt: Duration) -> (Vec<SessionEvent>, Scene) {
        let events = self.pump();
        let scene = self.engine.render_frame(dt, &self.geometry);
        (events, scene)
    }

    pub fn scene(&self) -> Scene {
        self.engine.scene(&self.geometry)
    }

    pub fn engine(&self) -> &RadarEngine {
        &self.engine
    }

    pub fn decoder(&self) -> &TelemetryDecoder {
        &self.decoder
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn device(&self) -> &DeviceDescriptor {
        self.receiver.device()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
