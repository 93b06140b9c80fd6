//! Per-leg distance history

/// Number of samples each leg's history holds
pub const HISTORY_CAPACITY: usize = 10;

/// A bounded history of distance samples for one leg
///
/// Fixed capacity of [`HISTORY_CAPACITY`] samples. Once full, recording
/// another sample overwrites the oldest one; the window always holds the
/// most recent measurements.
#[derive(Clone, Debug)]
pub struct SampleHistory {
    samples: [f64; HISTORY_CAPACITY],
    write_at: usize,
    filled: usize,
}

impl SampleHistory {
    /// Creates an empty history
    pub const fn new() -> Self {
        SampleHistory {
            samples: [0.0; HISTORY_CAPACITY],
            write_at: 0,
            filled: 0,
        }
    }

    /// Records a distance sample, in metres
    pub fn record(&mut self, distance: f64) {
        self.samples[self.write_at] = distance;
        self.write_at = (self.write_at + 1) % HISTORY_CAPACITY;
        if self.filled < HISTORY_CAPACITY {
            self.filled += 1;
        }
    }

    /// Number of samples currently stored
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Returns whether no sample has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// The most recently recorded sample
    pub fn latest(&self) -> Option<f64> {
        if self.filled == 0 {
            return None;
        }
        let idx = (self.write_at + HISTORY_CAPACITY - 1) % HISTORY_CAPACITY;
        Some(self.samples[idx])
    }

    /// Iterates over the stored samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let start = if self.filled < HISTORY_CAPACITY {
            0
        } else {
            self.write_at
        };
        (0..self.filled).map(move |offset| self.samples[(start + offset) % HISTORY_CAPACITY])
    }

    /// Mean of the stored window, if any samples have been recorded
    pub fn average(&self) -> Option<f64> {
        if self.filled == 0 {
            return None;
        }
        Some(self.iter().sum::<f64>() / self.filled as f64)
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        SampleHistory::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let history = SampleHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.latest(), None);
        assert_eq!(history.average(), None);
    }

    #[test]
    fn records_in_order() {
        let mut history = SampleHistory::new();
        history.record(1.0);
        history.record(2.0);
        history.record(3.0);

        assert_eq!(history.len(), 3);
        assert_eq!(history.latest(), Some(3.0));
        let samples: [f64; 3] = [1.0, 2.0, 3.0];
        assert!(history.iter().eq(samples.iter().copied()));
    }

    #[test]
    fn overwrites_oldest_first_once_full() {
        let mut history = SampleHistory::new();
        for i in 0..HISTORY_CAPACITY + 3 {
            history.record(i as f64);
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.latest(), Some((HISTORY_CAPACITY + 2) as f64));
        // Oldest surviving sample is the fourth one recorded.
        assert_eq!(history.iter().next(), Some(3.0));
    }

    #[test]
    fn average_covers_the_stored_window() {
        let mut history = SampleHistory::new();
        history.record(2.0);
        history.record(4.0);
        assert_eq!(history.average(), Some(3.0));
    }
}
