//! The stereo limiter and its per-channel gain reduction strategies.
//!
//! Every strategy works on a normalized signal where the threshold sits at `1.0`. [`Limiter`]
//! takes care of the trims, the normalization, the final brick-wall clip and the metering, so a
//! [`GainReduction`] only has to decide how much excess gain to divide out.

use nih_plug::nih_debug_assert;
use nih_plug::util;
use std::sync::Arc;

use crate::handoff::SettingsReader;
use crate::meter::{MeterAccumulator, MeterValues, Meters};

mod lookahead;
mod peak_hold;
mod ramp;

pub use lookahead::Lookahead;
pub use peak_hold::PeakHold;
pub use ramp::Ramp;

/// The longest look-ahead the delay buffers are sized for.
pub const MAX_LOOKAHEAD_MS: f32 = 100.0;

/// Thresholds below this would make the normalization blow up.
pub const MIN_THRESHOLD_DB: f32 = -60.0;

/// Bound for the trims and the threshold, keeps every derived multiplier finite and non-zero.
pub const MAX_GAIN_DB: f32 = 60.0;

/// Normalized samples are clamped to this so the envelope math can't overflow.
const MAX_NORMALIZED: f32 = 1.0e30;

/// The user facing parameters, in engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub lookahead_ms: f32,
    pub input_db: f32,
    pub output_db: f32,
    pub threshold_db: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookahead_ms: 5.0,
            input_db: 0.0,
            output_db: 0.0,
            threshold_db: 0.0,
            attack_ms: 0.0,
            release_ms: 100.0,
        }
    }
}

impl Settings {
    /// Replaces non-finite values with their defaults and clamps times, trims and the threshold
    /// to ranges the limiter can work with.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, default: f32| if value.is_finite() { value } else { default };

        Self {
            lookahead_ms: finite_or(self.lookahead_ms, defaults.lookahead_ms).max(0.0),
            input_db: finite_or(self.input_db, defaults.input_db)
                .clamp(-MAX_GAIN_DB, MAX_GAIN_DB),
            output_db: finite_or(self.output_db, defaults.output_db)
                .clamp(-MAX_GAIN_DB, MAX_GAIN_DB),
            threshold_db: finite_or(self.threshold_db, defaults.threshold_db)
                .clamp(MIN_THRESHOLD_DB, MAX_GAIN_DB),
            attack_ms: finite_or(self.attack_ms, defaults.attack_ms).max(0.0),
            release_ms: finite_or(self.release_ms, defaults.release_ms).max(0.0),
        }
    }
}

/// [`Settings`] translated into multipliers, per-sample coefficients and sample counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub input_mul: f32,
    pub output_mul: f32,
    pub threshold_mul: f32,
    /// `input_mul / threshold_mul`, maps the input so the threshold lands on `1.0`.
    pub normalize_mul: f32,
    /// `threshold_mul * output_mul`, maps the normalized signal back to output levels.
    pub ceiling_mul: f32,
    /// Fraction of the target overshoot added per sample while attacking.
    pub attack_taw: f32,
    /// One-pole coefficient for the release.
    pub release_taw: f32,
    /// Look-ahead in samples, never more than the delay buffers can hold.
    pub lookahead: usize,
    pub attack_samples: f32,
    pub release_samples: f32,
}

impl Coefficients {
    pub fn new(settings: &Settings, sample_rate: f32, max_lookahead: usize) -> Self {
        let settings = settings.sanitized();
        let ms_to_samples = |ms: f32| ms * sample_rate / 1000.0;

        let input_mul = util::db_to_gain(settings.input_db);
        let output_mul = util::db_to_gain(settings.output_db);
        let threshold_mul = util::db_to_gain(settings.threshold_db);

        let lookahead = (ms_to_samples(settings.lookahead_ms).round() as usize).min(max_lookahead);
        // The attack reaches the target within the look-ahead, the attack time only speeds it up
        let attack_taw = (1.0 + settings.attack_ms / 1000.0) / lookahead.max(1) as f32;

        let release_samples = ms_to_samples(settings.release_ms);
        let release_taw = if release_samples > 1.0 {
            release_samples.recip()
        } else {
            1.0
        };

        Self {
            input_mul,
            output_mul,
            threshold_mul,
            normalize_mul: input_mul / threshold_mul,
            ceiling_mul: threshold_mul * output_mul,
            attack_taw,
            release_taw,
            lookahead,
            attack_samples: ms_to_samples(settings.attack_ms),
            release_samples,
        }
    }
}

/// A per-channel gain reduction envelope.
pub trait GainReduction: Send {
    /// Allocates everything needed for look-aheads of up to `max_lookahead` samples.
    fn new(max_lookahead: usize) -> Self
    where
        Self: Sized;

    /// Applies new coefficients. Never called concurrently with processing.
    fn configure(&mut self, coefficients: &Coefficients);

    /// Takes a normalized sample and returns the (possibly delayed) normalized sample together
    /// with the linear excess gain it should be divided by, as in `sample / (1.0 + gain_add)`.
    fn process_sample(&mut self, sample: f32, coefficients: &Coefficients) -> (f32, f32);

    /// The current linear excess gain.
    fn gain_add(&self) -> f32;

    /// How many samples the output lags behind the input.
    fn latency(&self) -> usize;

    /// Clears the envelope and any buffered audio without reallocating.
    fn reset(&mut self);
}

/// How far a normalized sample pokes above the threshold.
#[inline]
pub fn overshoot(sample: f32) -> f32 {
    (sample.abs() - 1.0).max(0.0)
}

/// Raises `gain_add` far enough that `sample` can't leave `[-1, 1]` after division.
#[inline]
pub fn enforce_ceiling(sample: f32, gain_add: f32) -> f32 {
    gain_add.max(sample.abs() - 1.0)
}

/// A stereo limiter. The strategy is picked through the type parameter.
pub struct Limiter<G: GainReduction = Lookahead> {
    channels: [G; 2],
    sample_rate: f32,
    max_lookahead: usize,
    settings: Settings,
    coefficients: Coefficients,
    accumulator: MeterAccumulator,
    meters: Arc<Meters>,
}

impl<G: GainReduction> Limiter<G> {
    /// Allocates the delay buffers for `sample_rate` and applies the default [`Settings`].
    pub fn new(sample_rate: f32) -> Self {
        Self::with_meters(sample_rate, Arc::new(Meters::default()))
    }

    /// Like [`new()`][Self::new()], but publishes into an existing [`Meters`] handle. Useful when
    /// the limiter gets rebuilt while an observer holds on to the meters.
    pub fn with_meters(sample_rate: f32, meters: Arc<Meters>) -> Self {
        nih_debug_assert!(sample_rate > 0.0);

        let max_lookahead = (MAX_LOOKAHEAD_MS * sample_rate / 1000.0).ceil() as usize;
        let settings = Settings::default();
        let coefficients = Coefficients::new(&settings, sample_rate, max_lookahead);

        let mut limiter = Self {
            channels: [G::new(max_lookahead), G::new(max_lookahead)],
            sample_rate,
            max_lookahead,
            settings,
            coefficients,
            accumulator: MeterAccumulator::default(),
            meters,
        };
        limiter.configure(settings);

        limiter
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Recomputes all coefficients and resizes the per-channel buffers.
    pub fn configure(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.coefficients = Coefficients::new(&self.settings, self.sample_rate, self.max_lookahead);
        for channel in &mut self.channels {
            channel.configure(&self.coefficients);
        }
    }

    /// Configures the limiter from the latest record in `reader`, if there is a new one. Returns
    /// whether anything changed.
    pub fn apply_pending(&mut self, reader: &mut SettingsReader) -> bool {
        match reader.poll() {
            Some(settings) => {
                self.configure(settings);
                true
            }
            None => false,
        }
    }

    pub fn latency_samples(&self) -> u32 {
        self.channels[0].latency() as u32
    }

    /// The current linear excess gain of the left and right channels.
    pub fn gain_add(&self) -> [f32; 2] {
        [self.channels[0].gain_add(), self.channels[1].gain_add()]
    }

    pub fn meters(&self) -> Arc<Meters> {
        self.meters.clone()
    }

    /// The last published meter snapshot.
    pub fn meter_values(&self) -> MeterValues {
        self.meters.values()
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.accumulator.reset();
    }

    /// Processes as many samples as the shortest of the four slices holds.
    pub fn process_block(
        &mut self,
        in_left: &[f32],
        in_right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) {
        let frames = in_left
            .iter()
            .zip(in_right)
            .zip(out_left.iter_mut().zip(out_right.iter_mut()));
        for ((&left, &right), (out_left, out_right)) in frames {
            (*out_left, *out_right) = self.process_frame(left, right);
        }
    }

    pub fn process_block_in_place(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (left, right) in left.iter_mut().zip(right.iter_mut()) {
            (*left, *right) = self.process_frame(*left, *right);
        }
    }

    #[inline]
    fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        let [channel_left, channel_right] = &mut self.channels;
        let left = process_channel(channel_left, &self.coefficients, &mut self.accumulator, left);
        let right = process_channel(
            channel_right,
            &self.coefficients,
            &mut self.accumulator,
            right,
        );
        self.accumulator.advance(&self.meters);

        (left, right)
    }
}

#[inline]
fn process_channel<G: GainReduction>(
    channel: &mut G,
    coefficients: &Coefficients,
    accumulator: &mut MeterAccumulator,
    sample: f32,
) -> f32 {
    let sample = if sample.is_finite() { sample } else { 0.0 };
    // A finite sample can still overflow once the input trim and the threshold are applied
    let normalized = (sample * coefficients.normalize_mul).clamp(-MAX_NORMALIZED, MAX_NORMALIZED);

    let (delayed, gain_add) = channel.process_sample(normalized, coefficients);
    let output = (delayed / (1.0 + gain_add)).clamp(-1.0, 1.0) * coefficients.ceiling_mul;

    accumulator.observe(
        normalized * coefficients.threshold_mul,
        output,
        coefficients.threshold_mul,
        1.0 + gain_add,
    );

    output
}
