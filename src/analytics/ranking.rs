use crate::analytics::primitives::average_rank_percentile;
use crate::analytics::windows::{SortedWindow, WindowStrategy};
use crate::config::PipelineConfig;
use crate::time_series::{RankPoint, ReturnPoint};

/// Rolling percentile rank of each return within the entity's own trailing
/// window of returns.
///
/// Entities are never compared with each other: the window only ever holds
/// the same entity's most recent `W` returns, the current one included.
#[derive(Debug, Clone, Copy)]
pub struct RollingPercentileRanker {
    window_size: usize,
}

impl RollingPercentileRanker {
    pub fn new(window_size: usize) -> Self {
        RollingPercentileRanker {
            window_size: window_size.max(1),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.rank_window_size)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Computes one RankPoint for every return that closes a full window.
    ///
    /// The first `W - 1` returns only fill the window. Non-finite returns
    /// are dropped before windowing.
    pub fn compute(&self, returns: &[ReturnPoint]) -> Vec<RankPoint> {
        let mut window = SortedWindow::new(self.window_size);
        let mut ranks = Vec::with_capacity(self.output_len(returns.len()));

        for point in returns {
            let value = point.annualized_return;
            if !value.is_finite() {
                tracing::trace!(date = %point.date, "RollingPercentileRanker: dropped non-finite return");
                continue;
            }

            window.push(value);
            if !window.is_full() {
                continue;
            }

            if let Some(percentile) = average_rank_percentile(window.sorted(), value) {
                ranks.push(RankPoint::new(point.date, percentile));
            }
        }

        ranks
    }
}

impl WindowStrategy for RollingPercentileRanker {
    fn burn_in(&self) -> usize {
        self.window_size - 1
    }
}
