//! Temperature-bias schedules applied year by year as a glacier progresses.
//!
//! Schedules are precomputed when they are queued, so a glacier's full state
//! (including its pending climate) stays serialisable, and runs are
//! reproducible when the caller seeds the random number generator.

use crate::errors::{SgmError, SgmResult};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A FIFO of per-year temperature biases (K) waiting to be applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BiasSchedule {
    pending: VecDeque<f64>,
}

impl BiasSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of scheduled years left.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// The bias for the next simulated year, consuming it.
    pub fn next_bias(&mut self) -> Option<f64> {
        self.pending.pop_front()
    }

    /// The scheduled biases, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = f64> + '_ {
        self.pending.iter().copied()
    }

    /// Ramp linearly from `current` to `target` over `duration` years.
    pub fn push_trend(&mut self, current: f64, target: f64, duration: usize) {
        for i in 0..duration {
            let frac = (i + 1) as f64 / duration as f64;
            self.pending.push_back(current + frac * (target - current));
        }
    }

    /// Like [`push_trend`](Self::push_trend), with Gaussian noise of standard
    /// deviation `sigma` added to each year.
    pub fn push_noisy_trend<R: Rng>(
        &mut self,
        current: f64,
        target: f64,
        duration: usize,
        sigma: f64,
        rng: &mut R,
    ) -> SgmResult<()> {
        let noise = Normal::new(0.0, sigma)
            .map_err(|e| SgmError::InvalidClimate(format!("bad noise level {sigma}: {e}")))?;
        for i in 0..duration {
            let frac = (i + 1) as f64 / duration as f64;
            let bias = current + frac * (target - current) + noise.sample(rng);
            self.pending.push_back(bias);
        }
        Ok(())
    }

    /// `duration` yearly biases drawn uniformly from
    /// `[-temperature_range, temperature_range]`.
    pub fn push_random<R: Rng>(
        &mut self,
        duration: usize,
        temperature_range: f64,
        rng: &mut R,
    ) -> SgmResult<()> {
        if !(temperature_range > 0.0) {
            return Err(SgmError::InvalidClimate(format!(
                "temperature_range must be positive, got {temperature_range}"
            )));
        }
        for _ in 0..duration {
            self.pending
                .push_back(rng.gen_range(-temperature_range..=temperature_range));
        }
        Ok(())
    }
}
