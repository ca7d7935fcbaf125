use crate::analytics::primitives::cagr;
use crate::analytics::windows::{FixedLag, WindowStrategy};
use crate::config::PipelineConfig;
use crate::time_series::{Observation, ReturnPoint};

/// Fixed-horizon annualized (CAGR) rolling return.
///
/// The observation at position `i` is paired with the one at `i - H`, where
/// `H` counts positions in the ordered series rather than calendar days.
#[derive(Debug, Clone, Copy)]
pub struct RollingReturnCalculator {
    horizon: FixedLag,
    years: f64,
}

impl RollingReturnCalculator {
    /// Creates a calculator for `horizon_days` positions, annualized over
    /// `horizon_days / 365` years.
    pub fn new(horizon_days: usize) -> Self {
        let config = PipelineConfig::default().with_horizon_days(horizon_days);
        Self::from_config(&config)
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        RollingReturnCalculator {
            horizon: FixedLag::new(config.horizon_days),
            years: config.years(),
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon.lag()
    }

    pub fn years(&self) -> f64 {
        self.years
    }

    /// Computes one ReturnPoint per eligible position, dated at the later
    /// endpoint.
    ///
    /// Positions before `H` emit nothing. A position whose endpoints are not
    /// both positive, or whose result is not finite, is skipped on its own
    /// without affecting the rest of the series.
    pub fn compute(&self, observations: &[Observation]) -> Vec<ReturnPoint> {
        let mut points = Vec::with_capacity(self.horizon.output_len(observations.len()));
        let mut skipped = 0usize;

        for (_, start, end) in self.horizon.pairs(observations) {
            match cagr(start.value, end.value, self.years) {
                Some(value) => points.push(ReturnPoint::new(end.date, value)),
                None => {
                    tracing::trace!(
                        date = %end.date,
                        start = start.value,
                        end = end.value,
                        "RollingReturnCalculator: skipped position"
                    );
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, emitted = points.len(), "RollingReturnCalculator: skipped positions");
        }

        points
    }
}

impl WindowStrategy for RollingReturnCalculator {
    fn burn_in(&self) -> usize {
        self.horizon.burn_in()
    }
}
