use super::{enforce_ceiling, overshoot, Coefficients, GainReduction};

/// Linear attack over the attack time, exponential release. There's no look-ahead, so anything
/// faster than the attack is caught by the brick-wall clamp instead.
#[derive(Debug, Default, Clone)]
pub struct Ramp {
    gain_add: f32,
}

impl GainReduction for Ramp {
    fn new(_max_lookahead: usize) -> Self {
        Self::default()
    }

    fn configure(&mut self, _coefficients: &Coefficients) {}

    #[inline]
    fn process_sample(&mut self, sample: f32, coefficients: &Coefficients) -> (f32, f32) {
        let target = overshoot(sample);

        if target > self.gain_add {
            let step = target / coefficients.attack_samples.max(1.0);
            self.gain_add = (self.gain_add + step).min(target);
        } else {
            self.gain_add += coefficients.release_taw * (target - self.gain_add);
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
        self.gain_add = 0.0;
    }
}
