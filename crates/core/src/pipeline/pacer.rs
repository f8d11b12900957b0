use std::sync::Arc;
use std::time::{Duration, Instant};

use super::clock::Clock;

/// Caps the loop rate at a target frame interval.
///
/// Pacing only throttles: an iteration slower than the target is never
/// followed by a shorter one.
pub struct Pacer {
    clock: Arc<dyn Clock>,
    target: Duration,
    boundary: Instant,
}

impl Pacer {
    /// A zero `target` disables sleeping.
    pub fn new(clock: Arc<dyn Clock>, target: Duration) -> Self {
        let boundary = clock.now();
        Self {
            clock,
            target,
            boundary,
        }
    }

    /// Target interval for `fps`; zero or negative means unpaced.
    pub fn interval_for_fps(fps: f64) -> Duration {
        if fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        }
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    /// Sleeps until `target` has passed since the previous boundary, then
    /// starts a new interval. Returns the measured interval.
    pub fn wait(&mut self) -> Duration {
        let mut elapsed = self.clock.now().saturating_duration_since(self.boundary);
        // Timers may wake early; keep re-checking.
        while elapsed < self.target {
            self.clock.sleep(self.target - elapsed);
            elapsed = self.clock.now().saturating_duration_since(self.boundary);
        }
        self.boundary = self.clock.now();
        elapsed
    }
}
