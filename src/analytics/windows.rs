//! Windowing strategies that supply pairs or windows to primitives.
//!
//! Each strategy implements `WindowStrategy` so callers can reason about
//! burn-in without knowing the primitive applied to the window.

use ordered_float::OrderedFloat;
use std::collections::VecDeque;

/// Common behavior shared by every windowing strategy.
pub trait WindowStrategy {
    /// Number of leading inputs that produce no output.
    fn burn_in(&self) -> usize;

    /// Number of outputs produced from `len` inputs.
    fn output_len(&self, len: usize) -> usize {
        len.saturating_sub(self.burn_in())
    }
}

/// Pairs each position with the position `lag` places earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLag {
    lag: usize,
}

impl FixedLag {
    pub fn new(lag: usize) -> Self {
        FixedLag { lag }
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Yields `(index, lagged, current)` for every `index >= lag`.
    ///
    /// Nothing is yielded before `lag`: there is no partial-lag fallback.
    pub fn pairs<'a, T>(&self, data: &'a [T]) -> impl Iterator<Item = (usize, &'a T, &'a T)> + 'a {
        let lag = self.lag;
        (lag..data.len()).map(move |index| (index, &data[index - lag], &data[index]))
    }
}

impl WindowStrategy for FixedLag {
    fn burn_in(&self) -> usize {
        self.lag
    }
}

/// Trailing window of the most recent `size` values, also kept sorted so
/// rank queries are binary searches.
#[derive(Debug, Clone)]
pub struct SortedWindow {
    size: usize,
    arrival: VecDeque<f64>,
    sorted: Vec<OrderedFloat<f64>>,
}

impl SortedWindow {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        SortedWindow {
            size,
            arrival: VecDeque::with_capacity(size + 1),
            sorted: Vec::with_capacity(size + 1),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.arrival.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrival.is_empty()
    }

    /// Whether the window holds exactly `size` values.
    pub fn is_full(&self) -> bool {
        self.arrival.len() == self.size
    }

    /// Adds `value` and evicts the oldest value once over capacity.
    ///
    /// Returns the evicted value, if any.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let key = OrderedFloat(value);
        let at = self.sorted.partition_point(|v| *v <= key);
        self.sorted.insert(at, key);
        self.arrival.push_back(value);

        if self.arrival.len() <= self.size {
            return None;
        }

        let evicted = self.arrival.pop_front()?;
        let evicted_key = OrderedFloat(evicted);
        let at = self.sorted.partition_point(|v| *v < evicted_key);
        if self.sorted.get(at) == Some(&evicted_key) {
            self.sorted.remove(at);
        }
        Some(evicted)
    }

    /// Current members in ascending order.
    pub fn sorted(&self) -> &[OrderedFloat<f64>] {
        &self.sorted
    }

    /// Most recently pushed value.
    pub fn latest(&self) -> Option<f64> {
        self.arrival.back().copied()
    }
}

impl WindowStrategy for SortedWindow {
    fn burn_in(&self) -> usize {
        self.size - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_lag_pairs_start_at_lag() {
        let lag = FixedLag::new(2);
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let pairs: Vec<_> = lag.pairs(&data).map(|(i, a, b)| (i, *a, *b)).collect();
        assert_eq!(pairs, vec![(2, 1.0, 3.0), (3, 2.0, 4.0)]);
        assert_eq!(lag.burn_in(), 2);
        assert_eq!(lag.output_len(data.len()), 2);
    }

    #[test]
    fn fixed_lag_longer_than_data_yields_nothing() {
        let lag = FixedLag::new(5);
        let data = vec![1.0, 2.0, 3.0];
        assert_eq!(lag.pairs(&data).count(), 0);
        assert_eq!(lag.output_len(data.len()), 0);
    }

    #[test]
    fn sorted_window_evicts_oldest() {
        let mut window = SortedWindow::new(3);
        assert_eq!(window.push(5.0), None);
        assert_eq!(window.push(1.0), None);
        assert!(!window.is_full());
        assert_eq!(window.push(3.0), None);
        assert!(window.is_full());
        assert_eq!(window.push(2.0), Some(5.0));

        let members: Vec<f64> = window.sorted().iter().map(|v| v.0).collect();
        assert_eq!(members, vec![1.0, 2.0, 3.0]);
        assert_eq!(window.latest(), Some(2.0));
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn sorted_window_evicts_one_of_duplicates() {
        let mut window = SortedWindow::new(2);
        window.push(1.0);
        window.push(1.0);
        assert_eq!(window.push(2.0), Some(1.0));

        let members: Vec<f64> = window.sorted().iter().map(|v| v.0).collect();
        assert_eq!(members, vec![1.0, 2.0]);
    }

    #[test]
    fn sorted_window_burn_in() {
        assert_eq!(SortedWindow::new(4).burn_in(), 3);
        assert_eq!(SortedWindow::new(1).burn_in(), 0);
        assert_eq!(SortedWindow::new(0).size(), 1);
    }
}
