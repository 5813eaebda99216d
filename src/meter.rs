//! Peak telemetry shared between the audio thread and the editor.
//!
//! The audio thread accumulates peaks for [`PUBLISH_INTERVAL`] samples and then stores them in
//! [`Meters`]. The editor reads [`Meters`] at whatever rate it redraws. Peaks are tracked as linear
//! gain and only converted to decibels when they're published.

use atomic_float::AtomicF32;
use nih_plug::util;
use std::sync::atomic::Ordering;

/// Number of processed sample frames between two published snapshots.
pub const PUBLISH_INTERVAL: usize = 1024;

/// What the meters read before anything has been published.
pub const SILENCE_DB: f32 = -1000.0;

/// A single meter reading. All values are peaks in decibels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterValues {
    pub input_db: f32,
    pub output_db: f32,
    pub threshold_db: f32,
    pub reduction_db: f32,
}

impl Default for MeterValues {
    fn default() -> Self {
        Self {
            input_db: SILENCE_DB,
            output_db: SILENCE_DB,
            threshold_db: SILENCE_DB,
            reduction_db: SILENCE_DB,
        }
    }
}

/// The published snapshot. Written only by the audio thread, read from anywhere.
#[derive(Debug)]
pub struct Meters {
    input_db: AtomicF32,
    output_db: AtomicF32,
    threshold_db: AtomicF32,
    reduction_db: AtomicF32,
}

impl Default for Meters {
    fn default() -> Self {
        Self {
            input_db: AtomicF32::new(SILENCE_DB),
            output_db: AtomicF32::new(SILENCE_DB),
            threshold_db: AtomicF32::new(SILENCE_DB),
            reduction_db: AtomicF32::new(SILENCE_DB),
        }
    }
}

impl Meters {
    pub fn values(&self) -> MeterValues {
        MeterValues {
            input_db: self.input_db(),
            output_db: self.output_db(),
            threshold_db: self.threshold_db(),
            reduction_db: self.reduction_db(),
        }
    }

    pub fn input_db(&self) -> f32 {
        self.input_db.load(Ordering::Relaxed)
    }

    pub fn output_db(&self) -> f32 {
        self.output_db.load(Ordering::Relaxed)
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db.load(Ordering::Relaxed)
    }

    pub fn reduction_db(&self) -> f32 {
        self.reduction_db.load(Ordering::Relaxed)
    }

    fn publish(&self, values: MeterValues) {
        self.input_db.store(values.input_db, Ordering::Relaxed);
        self.output_db.store(values.output_db, Ordering::Relaxed);
        self.threshold_db.store(values.threshold_db, Ordering::Relaxed);
        self.reduction_db.store(values.reduction_db, Ordering::Relaxed);
    }
}

/// The in-progress generation, owned by the audio thread.
#[derive(Debug, Default, Clone)]
pub struct MeterAccumulator {
    input_peak: f32,
    output_peak: f32,
    threshold_peak: f32,
    reduction_peak: f32,
    counter: usize,
}

impl MeterAccumulator {
    /// Records one channel's sample. `reduction` is the linear divisor applied to the signal, so
    /// `1.0` means no gain reduction.
    #[inline]
    pub fn observe(&mut self, input: f32, output: f32, threshold: f32, reduction: f32) {
        self.input_peak = self.input_peak.max(input.abs());
        self.output_peak = self.output_peak.max(output.abs());
        self.threshold_peak = self.threshold_peak.max(threshold.abs());
        self.reduction_peak = self.reduction_peak.max(reduction);
    }

    /// Counts one processed sample frame and publishes the peaks to `meters` every
    /// [`PUBLISH_INTERVAL`] frames.
    #[inline]
    pub fn advance(&mut self, meters: &Meters) {
        self.counter += 1;
        if self.counter < PUBLISH_INTERVAL {
            return;
        }

        meters.publish(MeterValues {
            input_db: util::gain_to_db(self.input_peak),
            output_db: util::gain_to_db(self.output_peak),
            threshold_db: util::gain_to_db(self.threshold_peak),
            reduction_db: util::gain_to_db(self.reduction_peak),
        });
        *self = Self::default();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
