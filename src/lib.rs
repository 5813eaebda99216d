use nih_plug::prelude::*;
use nih_plug_vizia::ViziaState;
use std::sync::Arc;

mod editor;

pub mod delay;
pub mod handoff;
pub mod limiter;
pub mod meter;
pub mod window_max;

use limiter::{Limiter, Lookahead, Settings, MAX_LOOKAHEAD_MS};
use meter::Meters;

/// The plugin. The host adapter only turns parameters into [`Settings`] and hands the buffers to
/// the [`Limiter`], everything interesting happens in there.
pub struct Brickwall {
    params: Arc<BrickwallParams>,
    limiter: Limiter<Lookahead>,
    /// Shared with the editor. Outlives the limiter, which gets rebuilt on every sample rate
    /// change.
    meters: Arc<Meters>,
}

#[derive(Params)]
pub struct BrickwallParams {
    #[persist = "editor-state"]
    editor_state: Arc<ViziaState>,

    #[id = "lookahead"]
    pub lookahead: FloatParam,

    #[id = "attack"]
    pub attack: FloatParam,

    #[id = "release"]
    pub release: FloatParam,

    /// Stored as linear gain, displayed in decibels.
    #[id = "input"]
    pub input: FloatParam,

    #[id = "output"]
    pub output: FloatParam,

    #[id = "threshold"]
    pub threshold: FloatParam,
}

impl Default for Brickwall {
    fn default() -> Self {
        let meters = Arc::new(Meters::default());

        Self {
            params: Arc::new(BrickwallParams::default()),
            limiter: Limiter::with_meters(44100.0, meters.clone()),
            meters,
        }
    }
}

impl Default for BrickwallParams {
    fn default() -> Self {
        Self {
            editor_state: editor::default_state(),

            lookahead: FloatParam::new(
                "Lookahead",
                5.0,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_LOOKAHEAD_MS,
                },
            )
            .with_unit(" ms")
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            attack: FloatParam::new(
                "Attack",
                0.0,
                FloatRange::Skewed {
                    min: 0.0,
                    max: 1000.,
                    factor: 0.25,
                },
            )
            .with_unit(" ms")
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            release: FloatParam::new(
                "Release",
                100.0,
                FloatRange::Skewed {
                    min: 1.0,
                    max: 5000.,
                    factor: 0.301,
                },
            )
            .with_unit(" ms")
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            input: trim_param("Input"),
            output: trim_param("Output"),

            threshold: FloatParam::new(
                "Threshold",
                0.0,
                FloatRange::Linear {
                    min: -30.0,
                    max: 0.0,
                },
            )
            .with_step_size(0.1)
            .with_unit(" dB")
            .with_value_to_string(formatters::v2s_f32_rounded(1)),
        }
    }
}

/// A ±30 dB trim, stored as linear gain.
fn trim_param(name: &str) -> FloatParam {
    FloatParam::new(
        name,
        util::db_to_gain(0.0),
        FloatRange::Skewed {
            min: util::db_to_gain(-30.0),
            max: util::db_to_gain(30.0),
            // This makes the range appear as if it was linear when displaying the values as
            // decibels
            factor: FloatRange::gain_skew_factor(-30.0, 30.0),
        },
    )
    .with_unit(" dB")
    .with_value_to_string(formatters::v2s_f32_gain_to_db(2))
    .with_string_to_value(formatters::s2v_f32_gain_to_db())
}

impl BrickwallParams {
    /// The current parameter values as one consistent record.
    pub fn settings(&self) -> Settings {
        Settings {
            lookahead_ms: self.lookahead.value(),
            input_db: util::gain_to_db(self.input.value()),
            output_db: util::gain_to_db(self.output.value()),
            threshold_db: self.threshold.value(),
            attack_ms: self.attack.value(),
            release_ms: self.release.value(),
        }
    }
}

impl Plugin for Brickwall {
    const NAME: &'static str = "brickwall";
    const VENDOR: &'static str = "Adamina Barx";
    const URL: &'static str = env!("CARGO_PKG_HOMEPAGE");
    const EMAIL: &'static str = "adaminabarx@gmail.com";

    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Each channel is limited on its own, there's no stereo link. Anything other than stereo is
    // not supported.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),

        aux_input_ports: &[],
        aux_output_ports: &[],

        names: PortNames::const_default(),
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const MIDI_OUTPUT: MidiConfig = MidiConfig::None;

    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn editor(&mut self, _async_executor: AsyncExecutor<Self>) -> Option<Box<dyn Editor>> {
        editor::create(
            self.params.clone(),
            self.meters.clone(),
            self.params.editor_state.clone(),
        )
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        context: &mut impl InitContext<Self>,
    ) -> bool {
        // All buffers are sized for the sample rate here, processing never allocates
        self.limiter = Limiter::with_meters(buffer_config.sample_rate, self.meters.clone());
        self.limiter.configure(self.params.settings());
        context.set_latency_samples(self.limiter.latency_samples());

        nih_log!(
            "initialized at {} Hz with {} samples of look-ahead",
            buffer_config.sample_rate,
            self.limiter.latency_samples()
        );

        true
    }

    fn reset(&mut self) {
        self.limiter.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let settings = self.params.settings();
        if settings != self.limiter.settings() {
            let latency = self.limiter.latency_samples();
            self.limiter.configure(settings);
            if self.limiter.latency_samples() != latency {
                context.set_latency_samples(self.limiter.latency_samples());
            }
        }

        if let [left, right] = buffer.as_slice() {
            self.limiter.process_block_in_place(left, right);
        }

        ProcessStatus::Normal
    }
}

impl ClapPlugin for Brickwall {
    const CLAP_ID: &'static str = "com.adabarx.brickwall";
    const CLAP_DESCRIPTION: Option<&'static str> = Some("look-ahead brick-wall limiter");
    const CLAP_MANUAL_URL: Option<&'static str> = Some(Self::URL);
    const CLAP_SUPPORT_URL: Option<&'static str> = None;

    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Limiter,
        ClapFeature::Mastering,
    ];
}

impl Vst3Plugin for Brickwall {
    const VST3_CLASS_ID: [u8; 16] = *b"BrickwallLimiter";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Dynamics];
}

nih_export_clap!(Brickwall);
nih_export_vst3!(Brickwall);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_default_settings() {
        let params = BrickwallParams::default();
        assert_eq!(params.settings(), Settings::default());
    }

    #[test]
    fn default_plugin_reports_default_latency() {
        let plugin = Brickwall::default();
        // 5 ms at 44.1 kHz
        assert_eq!(plugin.limiter.latency_samples(), 221);
        assert!(Arc::ptr_eq(&plugin.meters, &plugin.limiter.meters()));
    }
}
