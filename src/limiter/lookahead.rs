use nih_plug::nih_debug_assert;

use super::{enforce_ceiling, overshoot, Coefficients, GainReduction};
use crate::delay::DelayLine;
use crate::window_max::SlidingWindowMax;

/// The look-ahead brick-wall limiter. The signal is delayed by the look-ahead time while a sliding
/// window maximum over the same span tells the envelope what's about to arrive, so the gain
/// reduction is fully engaged by the time a peak reaches the output.
#[derive(Debug, Clone)]
pub struct Lookahead {
    delay: DelayLine,
    window: SlidingWindowMax,
    gain_add: f32,
}

impl GainReduction for Lookahead {
    fn new(max_lookahead: usize) -> Self {
        Self {
            delay: DelayLine::new(max_lookahead + 1),
            window: SlidingWindowMax::new(max_lookahead),
            gain_add: 0.0,
        }
    }

    fn configure(&mut self, coefficients: &Coefficients) {
        self.delay.set_delay(coefficients.lookahead);
        self.window.set_window_size(coefficients.lookahead);
    }

    #[inline]
    fn process_sample(&mut self, sample: f32, coefficients: &Coefficients) -> (f32, f32) {
        let peak = self.window.process_sample(overshoot(sample));
        let delayed = self.delay.process_sample(sample);

        if peak > self.gain_add {
            self.gain_add = (self.gain_add + peak * coefficients.attack_taw).min(peak);
        } else {
            self.gain_add += coefficients.release_taw * (peak - self.gain_add);
        }

        // The window may under-report right after it's been resized
        self.gain_add = enforce_ceiling(delayed, self.gain_add);
        nih_debug_assert!(self.gain_add.is_finite() && self.gain_add >= 0.0);

        (delayed, self.gain_add)
    }

    fn gain_add(&self) -> f32 {
        self.gain_add
    }

    fn latency(&self) -> usize {
        self.delay.delay()
    }

    fn reset(&mut self) {
        self.delay.clear();
        self.window.reset();
        self.gain_add = 0.0;
    }
}
