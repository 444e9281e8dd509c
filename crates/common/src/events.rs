use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{EventConfig, TimeWindow};

/// Deterministic synthetic source of radio key presses.
///
/// Exactly one uniform draw is consumed per tick no matter which
/// controller tier is wired in, so equal seeds and configurations
/// produce equal pulse streams across all tiers. That is what makes
/// their trajectories directly comparable.
pub struct PulseGenerator {
    rng: StdRng,
    baseline_probability: f64,
    elevated_probability: f64,
    elevated_windows: Vec<TimeWindow>,
}

impl PulseGenerator {
    pub fn new(seed: u64, events: &EventConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            baseline_probability: events.baseline_probability,
            elevated_probability: events.elevated_probability,
            elevated_windows: events.elevated_windows.clone(),
        }
    }

    /// Draws the pulse flag for the tick at the given simulated hour.
    pub fn draw(&mut self, hour: f64) -> bool {
        let probability = if self.elevated_windows.iter().any(|w| w.contains(hour)) {
            self.elevated_probability
        } else {
            self.baseline_probability
        };

        self.rng.gen::<f64>() < probability
    }
}
