//! Frame rate measurement over a trailing one-second window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Counts events in the last second
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    timestamps: VecDeque<Instant>,
}

impl FpsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame now
    pub fn count_frame(&mut self) {
        self.count_frame_at(Instant::now());
    }

    /// Record one frame at `now`
    pub fn count_frame_at(&mut self, now: Instant) {
        self.timestamps.push_back(now);
        self.evict(now);
    }

    /// Frames within the last second
    #[must_use]
    pub fn rate(&mut self) -> usize {
        self.rate_at(Instant::now())
    }

    /// Frames within the second before `now`
    pub fn rate_at(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.timestamps.len()
    }

    pub fn reset(&mut self) {
        self.timestamps.clear();
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= WINDOW {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}
