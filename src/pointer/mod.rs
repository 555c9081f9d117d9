use heapless::Deque;

use crate::config::{MOVEMENT_HISTORY_CAPACITY, VELOCITY_HORIZON_MS, VELOCITY_THRESHOLD};
use crate::types::{PointerId, TouchPoint};

mod velocity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivePointer {
    pub pointer_id: PointerId,
    pub down_at_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MotionSample {
    pub(crate) t_ms: u64,
    pub(crate) point: TouchPoint,
}

/// Follows the one pointer that may authenticate and estimates its speed.
pub struct PointerTracker {
    active: Option<ActivePointer>,
    history: Deque<MotionSample, MOVEMENT_HISTORY_CAPACITY>,
    horizon_ms: u64,
    threshold: f32,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(VELOCITY_HORIZON_MS, VELOCITY_THRESHOLD)
    }
}

impl PointerTracker {
    pub fn new(horizon_ms: u64, threshold: f32) -> Self {
        Self {
            active: None,
            history: Deque::new(),
            horizon_ms,
            threshold,
        }
    }

    /// Starts tracking `pointer_id`, dropping any history from a previous pointer.
    pub fn begin(&mut self, pointer_id: PointerId, down_at_ms: u64) {
        self.active = Some(ActivePointer {
            pointer_id,
            down_at_ms,
        });
        self.history.clear();
    }

    pub fn active(&self) -> Option<ActivePointer> {
        self.active
    }

    pub fn is_tracking(&self, pointer_id: PointerId) -> bool {
        self.active.is_some_and(|active| active.pointer_id == pointer_id)
    }

    pub fn record(&mut self, t_ms: u64, point: TouchPoint) {
        if self.history.is_full() {
            let _ = self.history.pop_front();
        }
        let _ = self.history.push_back(MotionSample { t_ms, point });

        while let Some(oldest) = self.history.front() {
            if t_ms.saturating_sub(oldest.t_ms) > self.horizon_ms {
                let _ = self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Speed in px/s over the retained window; 0 with fewer than two samples.
    pub fn speed(&self) -> f32 {
        let mut window = heapless::Vec::<MotionSample, MOVEMENT_HISTORY_CAPACITY>::new();
        for sample in self.history.iter() {
            let _ = window.push(*sample);
        }
        let (vx, vy) = velocity::least_squares(&window);
        (vx * vx + vy * vy).sqrt()
    }

    pub fn exceeds_threshold(&self, speed: f32) -> bool {
        speed > self.threshold
    }

    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    pub fn end(&mut self) {
        self.active = None;
        self.history.clear();
    }
}

/// Default swipe cut-off, for callers without a configured tracker.
pub fn exceeds_velocity_threshold(speed: f32) -> bool {
    speed > VELOCITY_THRESHOLD
}
