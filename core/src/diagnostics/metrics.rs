use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters shared between the notification producer and the render thread.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub decoded: u64,
    pub dropped: u64,
    pub detections: u64,
    pub out_of_range: u64,
    pub angles_coalesced: u64,
    pub frames: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut *metrics);
        }
    }

    pub fn record_received(&self) {
        self.update(|m| m.received += 1);
    }

    pub fn record_decoded(&self) {
        self.update(|m| m.decoded += 1);
    }

    pub fn record_dropped(&self) {
        self.update(|m| m.dropped += 1);
    }

    pub fn record_detection(&self) {
        self.update(|m| m.detections += 1);
    }

    pub fn record_out_of_range(&self) {
        self.update(|m| m.out_of_range += 1);
    }

    pub fn record_angle_coalesced(&self) {
        self.update(|m| m.angles_coalesced += 1);
    }

    pub fn record_frame(&self) {
        self.update(|m| m.frames += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = MetricsRecorder::new();
        metrics.record_decoded();
        metrics.record_decoded();
        metrics.record_dropped();
        metrics.record_frame();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.decoded, 2);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(snapshot.frames, 1);
        assert_eq!(snapshot.detections, 0);
    }

    #[test]
    fn received_counter_is_shared_across_threads() {
        let metrics = Arc::new(MetricsRecorder::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        metrics.record_received();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().received, 100);
    }
}
