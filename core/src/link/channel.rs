use crate::diagnostics::MetricsRecorder;
use crate::prelude::{RadarError, RadarResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Identifies the peripheral producing the telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub address: String,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// What the BLE side delivers to the render thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Notification(String),
    Disconnected,
}

/// Producer half; cheap to clone and safe to use from notification callbacks.
#[derive(Clone)]
pub struct TelemetrySender {
    tx: UnboundedSender<LinkEvent>,
    metrics: Arc<MetricsRecorder>,
}

impl TelemetrySender {
    pub fn notify(&self, raw: impl Into<String>) -> RadarResult<()> {
        self.metrics.record_received();
        self.tx
            .send(LinkEvent::Notification(raw.into()))
            .map_err(|_| RadarError::LinkClosed)
    }

    pub fn disconnect(&self) -> RadarResult<()> {
        self.tx
            .send(LinkEvent::Disconnected)
            .map_err(|_| RadarError::LinkClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, drained on the render thread.
pub struct TelemetryReceiver {
    rx: UnboundedReceiver<LinkEvent>,
    device: DeviceDescriptor,
}

impl TelemetryReceiver {
    /// Next pending event without blocking; `None` when nothing is queued
    /// or every sender is gone.
    pub fn try_next(&mut self) -> Option<LinkEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }
}

pub struct TelemetryLink;

impl TelemetryLink {
    /// Opens the single-consumer channel for `device`. A missing device is a
    /// fatal precondition failure.
    pub fn attach(
        device: Option<DeviceDescriptor>,
        metrics: Arc<MetricsRecorder>,
    ) -> RadarResult<(TelemetrySender, TelemetryReceiver)> {
        let device = device.ok_or(RadarError::MissingDevice)?;
        Ok(Self::open(device, metrics))
    }

    /// Opens the channel for a device the caller has already resolved.
    pub fn open(
        device: DeviceDescriptor,
        metrics: Arc<MetricsRecorder>,
    ) -> (TelemetrySender, TelemetryReceiver) {
        info!("attaching telemetry link to {} ({})", device.name, device.address);
        let (tx, rx) = mpsc::unbounded_channel();
        (TelemetrySender { tx, metrics }, TelemetryReceiver { rx, device })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn device() -> DeviceDescriptor {
        DeviceDescriptor::new("radar", "AA:BB:CC:DD:EE:FF")
    }

    #[test]
    fn attach_without_device_fails() {
        let result = TelemetryLink::attach(None, Arc::new(MetricsRecorder::new()));
        assert!(matches!(result, Err(RadarError::MissingDevice)));
    }

    #[test]
    fn notifications_cross_threads_in_order() {
        let metrics = Arc::new(MetricsRecorder::new());
        let (tx, mut rx) = TelemetryLink::attach(Some(device()), metrics.clone()).unwrap();

        thread::spawn(move || {
            tx.notify("5°--80m)").unwrap();
            tx.notify("10°--50m)").unwrap();
            tx.disconnect().unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(rx.try_next(), Some(LinkEvent::Notification("5°--80m)".into())));
        assert_eq!(rx.try_next(), Some(LinkEvent::Notification("10°--50m)".into())));
        assert_eq!(rx.try_next(), Some(LinkEvent::Disconnected));
        assert_eq!(rx.try_next(), None);
        assert_eq!(metrics.snapshot().received, 2);
        assert_eq!(rx.device().name, "radar");
    }

    #[test]
    fn sending_after_receiver_dropped_reports_closed_link() {
        let (tx, rx) = TelemetryLink::attach(Some(device()), Arc::new(MetricsRecorder::new())).unwrap();
        drop(rx);
        assert!(tx.is_closed());
        assert!(matches!(tx.notify("1°--1m)"), Err(RadarError::LinkClosed)));
    }
}
