use super::{enforce_ceiling, overshoot, Coefficients, GainReduction};

/// Jumps straight to any new overshoot, holds it for the look-ahead time and then ramps linearly
/// back to zero over the release time.
#[derive(Debug, Clone)]
pub struct PeakHold {
    reduction: f32,
    gain_add: f32,
    hold_elapsed: f32,
    release_elapsed: f32,
}

impl Default for PeakHold {
    fn default() -> Self {
        Self {
            reduction: 0.0,
            gain_add: 0.0,
            hold_elapsed: f32::MAX,
            release_elapsed: f32::MAX,
        }
    }
}

impl GainReduction for PeakHold {
    fn new(_max_lookahead: usize) -> Self {
        Self::default()
    }

    fn configure(&mut self, _coefficients: &Coefficients) {}

    #[inline]
    fn process_sample(&mut self, sample: f32, coefficients: &Coefficients) -> (f32, f32) {
        let hold_len = coefficients.lookahead as f32;
        let release_len = coefficients.release_samples;
        let target = overshoot(sample);

        if target > self.gain_add {
            self.reduction = target;
            self.gain_add = target;
            self.hold_elapsed = 0.0;
            self.release_elapsed = 0.0;
        } else if hold_len >= 1.0 && self.hold_elapsed < hold_len {
            self.hold_elapsed += 1.0;
        } else if release_len > 1.0 && self.release_elapsed < release_len {
            let t = self.release_elapsed / release_len;
            self.gain_add = lerp(self.reduction, 0.0, t);
            self.release_elapsed += 1.0;
        } else {
            self.gain_add = 0.0;
        }
        self.gain_add = enforce_ceiling(sample, self.gain_add);

        (sample, self.gain_add)
    }

    fn gain_add(&self) -> f32 {
        self.gain_add
    }

    fn latency(&self) -> usize {
        0
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = f32::clamp(t, 0.0, 1.0);
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::{Limiter, Settings};

    #[test]
    fn holds_then_ramps_to_zero() {
        let coefficients = Coefficients::new(
            &Settings {
                lookahead_ms: 1.0,
                release_ms: 2.0,
                ..Settings::default()
            },
            48000.0,
            4800,
        );
        let hold = coefficients.lookahead;
        let release = coefficients.release_samples as usize;
        let mut channel = PeakHold::new(4800);

        channel.process_sample(3.0, &coefficients);
        assert_eq!(channel.gain_add(), 2.0);

        for _ in 0..hold {
            channel.process_sample(0.0, &coefficients);
            assert_eq!(channel.gain_add(), 2.0);
        }

        let mut previous = channel.gain_add();
        for _ in 0..release {
            channel.process_sample(0.0, &coefficients);
            assert!(channel.gain_add() <= previous);
            previous = channel.gain_add();
        }
        channel.process_sample(0.0, &coefficients);
        assert_eq!(channel.gain_add(), 0.0);
    }

    #[test]
    fn louder_peak_restarts_the_hold() {
        let coefficients = Coefficients::new(&Settings::default(), 48000.0, 4800);
        let mut channel = PeakHold::new(4800);

        channel.process_sample(2.0, &coefficients);
        channel.process_sample(0.0, &coefficients);
        channel.process_sample(4.0, &coefficients);
        assert_eq!(channel.gain_add(), 3.0);

        // A quieter peak during the hold changes nothing
        channel.process_sample(-2.0, &coefficients);
        assert_eq!(channel.gain_add(), 3.0);
    }

    #[test]
    fn works_as_a_limiter_strategy() {
        let mut limiter: Limiter<PeakHold> = Limiter::new(44100.0);
        let input: Vec<f32> = (0..2048).map(|i| if i % 100 == 0 { 5.0 } else { 0.8 }).collect();
        let mut left = vec![0.0; input.len()];
        let mut right = vec![0.0; input.len()];
        limiter.process_block(&input, &input, &mut left, &mut right);

        assert!(left.iter().chain(&right).all(|y| y.abs() <= 1.0));
        // Samples right after a peak are held down
        assert!((left[1] - 0.8 / 5.0).abs() < 1e-6);
    }

    #[test]
    fn starts_without_reduction() {
        let coefficients = Coefficients::new(&Settings::default(), 48000.0, 4800);
        let mut channel = PeakHold::new(4800);
        assert_eq!(channel.process_sample(0.5, &coefficients), (0.5, 0.0));

        channel.process_sample(2.0, &coefficients);
        channel.reset();
        assert_eq!(channel.process_sample(0.5, &coefficients), (0.5, 0.0));
    }
}
