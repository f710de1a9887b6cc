use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const FEED_RETENTION: usize = 2048;
pub const MAX_BATCH: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryLine {
    pub seq: u64,
    pub line: String,
}

/// Response of `GET /telemetry`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryBatch {
    pub lines: Vec<TelemetryLine>,
    pub connected: bool,
    /// Cursor to pass as `after` on the next request.
    pub next: u64,
}

/// Rolling window of notifications the simulated peripheral has emitted,
/// plus the script it loops over.
#[derive(Debug, Clone, Default)]
pub struct TelemetryFeed {
    script: Vec<String>,
    cursor: usize,
    recent: VecDeque<TelemetryLine>,
    last_seq: u64,
    connected: bool,
}

impl TelemetryFeed {
    pub fn new(script: Vec<String>) -> Self {
        Self {
            script,
            connected: true,
            ..Default::default()
        }
    }

    pub fn replace_script(&mut self, script: Vec<String>) {
        self.script = script;
        self.cursor = 0;
        self.connected = true;
    }

    /// Emits the next scripted line, looping at the end. Returns `None` once
    /// disconnected or when the script is empty.
    pub fn emit_next(&mut self) -> Option<&TelemetryLine> {
        if !self.connected || self.script.is_empty() {
            return None;
        }
        let line = self.script[self.cursor % self.script.len()].clone();
        self.cursor = (self.cursor + 1) % self.script.len();
        self.last_seq += 1;
        if self.recent.len() >= FEED_RETENTION {
            self.recent.pop_front();
        }
        self.recent.push_back(TelemetryLine {
            seq: self.last_seq,
            line,
        });
        self.recent.back()
    }

    pub fn batch_after(&self, after: u64) -> TelemetryBatch {
        let lines: Vec<TelemetryLine> = self
            .recent
            .iter()
            .filter(|entry| entry.seq > after)
            .take(MAX_BATCH)
            .cloned()
            .collect();
        let next = lines.last().map(|entry| entry.seq).unwrap_or(after.max(self.oldest_cursor()));
        TelemetryBatch {
            lines,
            connected: self.connected,
            next,
        }
    }

    fn oldest_cursor(&self) -> u64 {
        self.recent.front().map(|entry| entry.seq - 1).unwrap_or(self.last_seq)
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn script_len(&self) -> usize {
        self.script.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> TelemetryFeed {
        TelemetryFeed::new(vec!["1°--10m)".into(), "2°--20m)".into()])
    }

    #[test]
    fn feed_loops_over_script() {
        let mut feed = feed();
        let emitted: Vec<String> = (0..3)
            .filter_map(|_| feed.emit_next().map(|entry| entry.line.clone()))
            .collect();
        assert_eq!(emitted, vec!["1°--10m)", "2°--20m)", "1°--10m)"]);
        assert_eq!(feed.last_seq(), 3);
    }

    #[test]
    fn batch_after_returns_only_newer_lines() {
        let mut feed = feed();
        for _ in 0..4 {
            feed.emit_next();
        }
        let batch = feed.batch_after(2);
        assert_eq!(batch.lines.iter().map(|l| l.seq).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(batch.next, 4);

        let empty = feed.batch_after(4);
        assert!(empty.lines.is_empty());
        assert_eq!(empty.next, 4);
    }

    #[test]
    fn disconnected_feed_stops_emitting() {
        let mut feed = feed();
        feed.disconnect();
        assert!(feed.emit_next().is_none());
        assert!(!feed.batch_after(0).connected);

        feed.replace_script(vec!["5°--5m)".into()]);
        assert!(feed.is_connected());
        assert_eq!(feed.emit_next().unwrap().line, "5°--5m)");
    }

    #[test]
    fn retention_window_is_bounded() {
        let mut feed = feed();
        for _ in 0..(FEED_RETENTION + 10) {
            feed.emit_next();
        }
        let batch = feed.batch_after(0);
        assert_eq!(batch.lines.len(), MAX_BATCH);
        assert_eq!(batch.lines[0].seq, 11);
    }
}
