// src/throttle.rs
//! Adaptive concurrency throttle (spec §4.10). Samples latency over a
//! window of W operations and nudges the allowed concurrency toward a
//! target mean latency.

use crate::config::ConcurrencyConfig;
use std::time::Duration;

pub struct AdaptiveThrottle {
    min: usize,
    max: usize,
    factor: f64,
    window: usize,
    target: Duration,
    concurrency: usize,
    samples: Vec<Duration>,
}

impl AdaptiveThrottle {
    pub fn new(config: &ConcurrencyConfig) -> Self {
        AdaptiveThrottle {
            min: config.min_concurrency,
            max: config.max_concurrency,
            factor: config.adjustment_factor,
            window: config.window,
            target: config.target_latency,
            concurrency: config.initial_concurrency.clamp(config.min_concurrency, config.max_concurrency),
            samples: Vec::with_capacity(config.window),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Record one operation's latency. Every `window` samples, recompute
    /// the concurrency bound and clear the window.
    pub fn record(&mut self, latency: Duration) {
        self.samples.push(latency);
        if self.samples.len() < self.window {
            return;
        }
        let total: Duration = self.samples.iter().sum();
        let mean = total / self.samples.len() as u32;
        self.samples.clear();

        let target_secs = self.target.as_secs_f64();
        let mean_secs = mean.as_secs_f64();
        if target_secs <= 0.0 {
            return;
        }
        if mean_secs > 1.2 * target_secs {
            let shrunk = (self.concurrency as f64 * (1.0 - self.factor)).floor() as isize;
            self.concurrency = shrunk.max(self.min as isize) as usize;
        } else if mean_secs < 0.8 * target_secs {
            let grown = (self.concurrency as f64 * (1.0 + self.factor)).ceil() as isize;
            self.concurrency = grown.min(self.max as isize) as usize;
        }
        self.concurrency = self.concurrency.clamp(self.min, self.max);
    }
}
