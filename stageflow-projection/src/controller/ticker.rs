//! Periodic progress nudging for the active stage.

use crate::config::ProjectionConfig;
use rand::Rng;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// A timer that exists only while some stage is active.
///
/// [`sync`](Self::sync) starts or drops the underlying interval, and
/// [`tick`](Self::tick) never resolves while it is stopped, so the ticker
/// can sit in a `select!` unconditionally.
#[derive(Debug)]
pub struct ProgressTicker {
    period: Duration,
    max_increment: u8,
    interval: Option<Interval>,
}

impl ProgressTicker {
    /// Creates a stopped ticker.
    #[must_use]
    pub fn new(period: Duration, max_increment: u8) -> Self {
        Self {
            period,
            max_increment: max_increment.max(1),
            interval: None,
        }
    }

    /// Creates a stopped ticker from configuration.
    #[must_use]
    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::new(config.tick_interval(), config.tick_max_increment)
    }

    /// True while the interval is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Starts the interval when `active` and stops it otherwise.
    ///
    /// Must be called from within a tokio runtime.
    pub fn sync(&mut self, active: bool) {
        match (active, self.interval.is_some()) {
            (true, false) => {
                let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.interval = Some(interval);
                debug!(period_ms = self.period.as_millis(), "Progress ticker started");
            }
            (false, true) => {
                self.interval = None;
                debug!("Progress ticker stopped");
            }
            _ => {}
        }
    }

    /// Waits for the next tick and returns the increment to apply.
    pub async fn tick(&mut self) -> u8 {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
                self.next_increment()
            }
            None => std::future::pending().await,
        }
    }

    /// A uniformly random increment in `1..=max_increment`.
    #[must_use]
    pub fn next_increment(&self) -> u8 {
        rand::thread_rng().gen_range(1..=self.max_increment)
    }
}
