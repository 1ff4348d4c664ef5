//! Overall progress arithmetic.

use crate::core::{Stage, StageStatus};

/// Derives a single 0-100 completion figure from per-stage state.
///
/// Completed stages count as one unit each; active stages count as the
/// mean of their progress, so the figure moves smoothly within a stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressAggregator;

impl ProgressAggregator {
    /// `round(100 * (completed + active * mean_active / 100) / total)`
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn aggregate(stages: &[Stage]) -> u8 {
        if stages.is_empty() {
            return 0;
        }

        let completed = stages
            .iter()
            .filter(|s| s.status == StageStatus::Completed)
            .count();
        let active: Vec<u8> = stages
            .iter()
            .filter(|s| s.status == StageStatus::Active)
            .map(|s| s.progress)
            .collect();

        let mean_active = if active.is_empty() {
            0.0
        } else {
            active.iter().map(|p| f64::from(*p)).sum::<f64>() / active.len() as f64
        };

        let units = completed as f64 + active.len() as f64 * (mean_active / 100.0);
        let overall = (100.0 * units / stages.len() as f64).round();
        overall.clamp(0.0, 100.0) as u8
    }
}
