use crate::prelude::{Rgb, Rgba};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const FULL_ALPHA: f32 = 255.0;

/// A detection marker that grows and fades until it vanishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raindrop {
    pub x: i32,
    pub y: i32,
    pub radius: f32,
    pub color: Rgb,
    pub alpha: f32,
}

impl Raindrop {
    pub fn new(x: i32, y: i32, radius: f32, color: Rgb) -> Self {
        Self {
            x,
            y,
            radius,
            color,
            alpha: FULL_ALPHA,
        }
    }

    pub fn is_vanished(&self, vanish_size: f32) -> bool {
        self.radius > vanish_size || self.alpha < 0.0
    }

    pub fn paint(&self) -> Rgba {
        self.color.with_alpha(self.alpha.clamp(0.0, FULL_ALPHA) as u8)
    }
}

/// Pending sweep angles, consumed front first. Bounded: pushing onto a full
/// queue evicts the oldest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleQueue {
    entries: VecDeque<u16>,
    capacity: usize,
}

impl AngleQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an angle, returning the entry evicted to make room, if any.
    pub fn push(&mut self, angle: u16) -> Option<u16> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(angle);
        evicted
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &u16> {
        self.entries.iter()
    }
}

impl Default for AngleQueue {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: 1,
        }
    }
}

/// Everything the radar display animates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarState {
    /// Time-driven continuous sweep accumulator, in `[0, 360)`.
    pub sweep_degrees: f32,
    /// Rotation applied to the drawn sweep, in screen degrees.
    pub rotation_degrees: f32,
    pub scanning: bool,
    pub raindrops: Vec<Raindrop>,
    pub angle_queue: AngleQueue,
}

impl RadarState {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            sweep_degrees: 0.0,
            rotation_degrees: 0.0,
            scanning: false,
            raindrops: Vec::new(),
            angle_queue: AngleQueue::with_capacity(queue_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_queue_is_fifo() {
        let mut queue = AngleQueue::with_capacity(4);
        queue.push(5);
        queue.push(15);
        queue.push(25);
        assert_eq!(queue.pop(), Some(5));
        assert_eq!(queue.pop(), Some(15));
        assert_eq!(queue.pop(), Some(25));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn full_angle_queue_evicts_oldest() {
        let mut queue = AngleQueue::with_capacity(2);
        assert_eq!(queue.push(1), None);
        assert_eq!(queue.push(2), None);
        assert_eq!(queue.push(3), Some(1));
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn raindrop_vanishes_past_size_or_below_zero_alpha() {
        let mut drop = Raindrop::new(0, 0, 35.0, Rgb::RED);
        assert!(!drop.is_vanished(35.0));
        drop.radius = 35.01;
        assert!(drop.is_vanished(35.0));

        let mut faded = Raindrop::new(0, 0, 15.0, Rgb::RED);
        faded.alpha = 0.0;
        assert!(!faded.is_vanished(35.0));
        faded.alpha = -0.1;
        assert!(faded.is_vanished(35.0));
    }

    #[test]
    fn raindrop_paint_truncates_alpha() {
        let mut drop = Raindrop::new(0, 0, 15.0, Rgb::new(1, 2, 3));
        drop.alpha = 100.9;
        assert_eq!(
            drop.paint(),
            Rgba {
                r: 1,
                g: 2,
                b: 3,
                a: 100
            }
        );
    }
}
