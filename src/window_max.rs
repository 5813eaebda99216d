use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: u64,
    value: f32,
}

/// Running maximum over the last `window_size` samples, O(1) amortized per sample.
///
/// Candidates are kept in decreasing value order, the front is always the current maximum. A
/// sample that is no larger than a newer one can never become the maximum again, so it's dropped
/// from the back as soon as the newer sample arrives.
#[derive(Debug, Clone)]
pub struct SlidingWindowMax {
    candidates: VecDeque<Candidate>,
    capacity: usize,
    window_size: usize,
    index: u64,
}

impl SlidingWindowMax {
    /// Preallocates room for windows of up to `capacity` samples. The deque never grows past
    /// that, so [`process_sample()`][Self::process_sample()] doesn't allocate.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            candidates: VecDeque::with_capacity(capacity + 1),
            capacity,
            window_size: 1,
            index: 0,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Clamps `num_samples` to `[1, capacity]`. Changing the size forgets all history.
    pub fn set_window_size(&mut self, num_samples: usize) {
        let num_samples = num_samples.clamp(1, self.capacity);
        if num_samples == self.window_size {
            return;
        }

        self.window_size = num_samples;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.candidates.clear();
        self.index = 0;
    }

    #[inline]
    pub fn process_sample(&mut self, value: f32) -> f32 {
        while self
            .candidates
            .back()
            .is_some_and(|candidate| candidate.value <= value)
        {
            self.candidates.pop_back();
        }
        self.candidates.push_back(Candidate {
            index: self.index,
            value,
        });

        let window_size = self.window_size as u64;
        while self
            .candidates
            .front()
            .is_some_and(|candidate| candidate.index + window_size <= self.index)
        {
            self.candidates.pop_front();
        }

        self.index += 1;

        self.candidates.front().map_or(0.0, |candidate| candidate.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn brute_force(values: &[f32], window_size: usize) -> Vec<f32> {
        (0..values.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(window_size);
                values[start..=i].iter().copied().fold(0.0, f32::max)
            })
            .collect()
    }

    #[test]
    fn matches_brute_force_on_random_input() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        for window_size in [1, 2, 3, 7, 16, 100, 480] {
            let values: Vec<f32> = (0..2000).map(|_| rng.random::<f32>()).collect();

            let mut tracker = SlidingWindowMax::new(480);
            tracker.set_window_size(window_size);
            let actual: Vec<f32> = values.iter().map(|&v| tracker.process_sample(v)).collect();

            assert_eq!(actual, brute_force(&values, window_size), "window {window_size}");
        }
    }

    #[test]
    fn handles_repeated_and_descending_values() {
        let values = [0.5, 0.5, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0, 0.0, 0.9, 0.9, 0.1];
        let mut tracker = SlidingWindowMax::new(16);
        tracker.set_window_size(3);

        let actual: Vec<f32> = values.iter().map(|&v| tracker.process_sample(v)).collect();
        assert_eq!(actual, brute_force(&values, 3));
    }

    #[test]
    fn window_size_is_clamped() {
        let mut tracker = SlidingWindowMax::new(10);
        tracker.set_window_size(0);
        assert_eq!(tracker.window_size(), 1);
        tracker.set_window_size(1000);
        assert_eq!(tracker.window_size(), 10);
    }

    #[test]
    fn resizing_forgets_history() {
        let mut tracker = SlidingWindowMax::new(64);
        tracker.set_window_size(32);
        tracker.process_sample(5.0);
        assert_eq!(tracker.process_sample(0.0), 5.0);

        tracker.set_window_size(16);
        assert_eq!(tracker.process_sample(0.25), 0.25);
    }

    #[test]
    fn never_grows_past_capacity() {
        let mut tracker = SlidingWindowMax::new(32);
        tracker.set_window_size(32);
        let capacity = tracker.candidates.capacity();

        // Strictly decreasing input keeps every sample as a candidate
        for i in 0..1000 {
            tracker.process_sample(1000.0 - i as f32);
        }
        assert!(tracker.candidates.len() <= 32);
        assert_eq!(tracker.candidates.capacity(), capacity);
    }
}
