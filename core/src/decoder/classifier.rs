use crate::decoder::wire::{decode, Sample};
use crate::math::{polar_to_screen, CanvasGeometry, StatsHelper};
use crate::prelude::{DecodeError, RadarSink};
use log::debug;
use serde::{Deserialize, Serialize};

/// Thresholds applied to each decoded sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Angles that are a multiple of this step are axis crossings.
    pub axis_step: u16,
    /// Crossings at or beyond this distance produce no raindrop.
    pub detection_threshold: u32,
    /// Distance that maps onto the outer radar circle.
    pub max_distance: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            axis_step: 10,
            detection_threshold: 70,
            max_distance: 75.0,
            canvas_width: 1050.0,
            canvas_height: 1050.0,
        }
    }
}

impl DecoderConfig {
    pub fn geometry(&self) -> CanvasGeometry {
        CanvasGeometry::from_canvas(self.canvas_width, self.canvas_height, self.max_distance)
    }
}

/// Distances collected between two axis crossings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceAccumulator {
    distances: Vec<u32>,
}

impl DistanceAccumulator {
    pub fn push(&mut self, distance: u32) {
        self.distances.push(distance);
    }

    pub fn average(&self) -> Option<f64> {
        StatsHelper::mean(&self.distances)
    }

    /// Mean truncated to whole distance units. An empty history yields 0.
    pub fn whole_average(&self) -> u32 {
        self.average().map_or(0, |mean| mean as u32)
    }

    pub fn clear(&mut self) {
        self.distances.clear();
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.distances
    }
}

/// Outcome of classifying a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// Off-axis sample: the angle drives the sweep.
    Sweep { angle: u16 },
    /// Axis crossing inside the threshold: place a raindrop at the truncated
    /// mean of the off-axis distances seen since the previous crossing.
    Detection {
        angle: u16,
        distance: u32,
        x: i32,
        y: i32,
    },
    /// Axis crossing at or beyond the threshold.
    OutOfRange { angle: u16, distance: u32 },
}

impl Decoded {
    pub fn apply<S: RadarSink + ?Sized>(self, sink: &mut S) {
        match self {
            Decoded::Sweep { angle } => sink.push_angle(angle),
            Decoded::Detection { x, y, .. } => sink.push_raindrop(x, y),
            Decoded::OutOfRange { .. } => {}
        }
    }
}

/// Turns raw notifications into sweep angles and raindrop positions.
pub struct TelemetryDecoder {
    config: DecoderConfig,
    geometry: CanvasGeometry,
    accumulator: DistanceAccumulator,
}

impl TelemetryDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        let axis_step = config.axis_step.max(1);
        let config = DecoderConfig { axis_step, ..config };
        Self {
            geometry: config.geometry(),
            config,
            accumulator: DistanceAccumulator::default(),
        }
    }

    pub fn with_geometry(mut self, geometry: CanvasGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn ingest(&mut self, raw: &str) -> Result<Decoded, DecodeError> {
        let sample = decode(raw)?;
        Ok(self.classify(sample))
    }

    pub fn classify(&mut self, sample: Sample) -> Decoded {
        if sample.angle % self.config.axis_step != 0 {
            self.accumulator.push(sample.distance);
            return Decoded::Sweep {
                angle: sample.angle,
            };
        }

        if sample.distance >= self.config.detection_threshold {
            // accumulator carries over to the next crossing
            return Decoded::OutOfRange {
                angle: sample.angle,
                distance: sample.distance,
            };
        }

        // the crossing's own distance is not part of the average
        if self.accumulator.is_empty() {
            debug!("crossing at {}° with no history, placing at center", sample.angle);
        }
        let distance = self.accumulator.whole_average();
        let (x, y) = polar_to_screen(f64::from(sample.angle), distance, &self.geometry);
        self.accumulator.clear();
        debug!(
            "detection at {}° avg {} -> ({}, {})",
            sample.angle, distance, x, y
        );

        Decoded::Detection {
            angle: sample.angle,
            distance,
            x,
            y,
        }
    }

    pub fn accumulator(&self) -> &DistanceAccumulator {
        &self.accumulator
    }

    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    pub fn reset(&mut self) {
        self.accumulator.clear();
    }
}

impl Default for TelemetryDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        angles: Vec<u16>,
        raindrops: Vec<(i32, i32)>,
    }

    impl RadarSink for RecordingSink {
        fn push_angle(&mut self, angle: u16) {
            self.angles.push(angle);
        }

        fn push_raindrop(&mut self, x: i32, y: i32) {
            self.raindrops.push((x, y));
        }
    }

    fn expected_screen(angle: f64, distance: f64) -> (i32, i32) {
        let theta = 2.0 * std::f64::consts::PI * (angle + 90.0) / 360.0;
        let x = (distance * theta.sin()) as i32;
        let y = (distance * theta.cos()) as i32;
        (x * 7 + 525, y * 7 + 525)
    }

    #[test]
    fn off_axis_sample_accumulates_and_queues_angle() {
        let mut decoder = TelemetryDecoder::default();
        let mut sink = RecordingSink::default();

        decoder.ingest("5°--80m").unwrap().apply(&mut sink);

        assert_eq!(decoder.accumulator().as_slice(), &[80]);
        assert_eq!(sink.angles, vec![5]);
        assert!(sink.raindrops.is_empty());
    }

    #[test]
    fn crossing_within_threshold_places_raindrop_at_average() {
        let mut decoder = TelemetryDecoder::default();
        let mut sink = RecordingSink::default();

        decoder.ingest("5°--80m").unwrap().apply(&mut sink);
        let decoded = decoder.ingest("10°--50m").unwrap();
        decoded.apply(&mut sink);

        match decoded {
            Decoded::Detection {
                angle,
                distance,
                x,
                y,
            } => {
                assert_eq!(angle, 10);
                assert_eq!(distance, 80);
                assert_eq!((x, y), (1071, 434));
                assert_eq!((x, y), expected_screen(10.0, 80.0));
            }
            other => panic!("expected detection, got {:?}", other),
        }
        assert_eq!(sink.raindrops, vec![(1071, 434)]);
        assert!(decoder.accumulator().is_empty());
    }

    #[test]
    fn averaging_covers_every_sample_since_last_crossing() {
        let mut decoder = TelemetryDecoder::default();
        for line in ["1°--10m)", "2°--20m)", "3°--30m)"] {
            decoder.ingest(line).unwrap();
        }
        let decoded = decoder.ingest("20°--40m)").unwrap();
        assert_eq!(
            decoded,
            Decoded::Detection {
                angle: 20,
                distance: 20,
                x: expected_screen(20.0, 20.0).0,
                y: expected_screen(20.0, 20.0).1,
            }
        );
    }

    #[test]
    fn fractional_mean_is_truncated_before_scaling() {
        let mut decoder = TelemetryDecoder::default();
        for line in ["1°--33m)", "2°--34m)", "3°--33m)", "4°--34m)", "5°--33m)"] {
            decoder.ingest(line).unwrap();
        }
        assert_eq!(decoder.accumulator().average(), Some(33.4));

        let decoded = decoder.ingest("10°--20m)").unwrap();

        // offsets truncate to (32, -5) before the x7 scale
        assert_eq!(
            decoded,
            Decoded::Detection {
                angle: 10,
                distance: 33,
                x: 749,
                y: 490,
            }
        );
    }

    #[test]
    fn crossing_with_empty_history_lands_at_center() {
        let mut decoder = TelemetryDecoder::default();
        let decoded = decoder.ingest("0°--30m)").unwrap();
        assert_eq!(
            decoded,
            Decoded::Detection {
                angle: 0,
                distance: 0,
                x: 525,
                y: 525,
            }
        );
    }

    #[test]
    fn far_crossing_is_discarded_and_keeps_history() {
        let mut decoder = TelemetryDecoder::default();
        let mut sink = RecordingSink::default();
        decoder.ingest("15°--40m)").unwrap();

        let decoded = decoder.ingest("20°--90m").unwrap();
        decoded.apply(&mut sink);

        assert_eq!(
            decoded,
            Decoded::OutOfRange {
                angle: 20,
                distance: 90
            }
        );
        assert!(sink.angles.is_empty());
        assert!(sink.raindrops.is_empty());
        assert_eq!(decoder.accumulator().as_slice(), &[40]);
    }

    #[test]
    fn threshold_boundary_is_exclusive() {
        let mut decoder = TelemetryDecoder::default();
        assert!(matches!(
            decoder.ingest("30°--70m)").unwrap(),
            Decoded::OutOfRange { .. }
        ));
        assert!(matches!(
            decoder.ingest("30°--69m)").unwrap(),
            Decoded::Detection { .. }
        ));
    }

    #[test]
    fn malformed_input_leaves_state_untouched() {
        let mut decoder = TelemetryDecoder::default();
        decoder.ingest("7°--12m)").unwrap();
        assert!(decoder.ingest("garbage").is_err());
        assert!(decoder.ingest("7°--twelve").is_err());
        assert_eq!(decoder.accumulator().as_slice(), &[12]);
    }

    #[test]
    fn geometry_follows_configured_canvas() {
        let config = DecoderConfig {
            canvas_width: 200.0,
            canvas_height: 200.0,
            max_distance: 50.0,
            ..Default::default()
        };
        let mut decoder = TelemetryDecoder::new(config);
        decoder.ingest("5°--25m)").unwrap();
        let decoded = decoder.ingest("0°--10m)").unwrap();
        // scale 2, center 100: x = 25·2 + 100
        assert!(matches!(decoded, Decoded::Detection { x: 150, y: 100, .. }));
    }
}
