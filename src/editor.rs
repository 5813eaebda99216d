use nih_plug::prelude::Editor;
use nih_plug_vizia::vizia::prelude::*;
use nih_plug_vizia::widgets::*;
use nih_plug_vizia::{assets, create_vizia_editor, ViziaState, ViziaTheming};
use std::sync::Arc;
use std::time::Duration;

use crate::meter::Meters;
use crate::BrickwallParams;

const PEAK_HOLD: Duration = Duration::from_millis(600);

/// The peak meter draws nothing at or below this level.
const METER_FLOOR_DB: f32 = -90.0;
/// Reduction past this fills the whole reduction meter.
const REDUCTION_RANGE_DB: f32 = 60.0;

#[derive(Lens)]
struct Data {
    params: Arc<BrickwallParams>,
    meters: Arc<Meters>,
}

impl Model for Data {}

// Makes sense to also define this here, makes it a bit easier to keep track of
pub(crate) fn default_state() -> Arc<ViziaState> {
    ViziaState::new(|| (480, 360))
}

pub(crate) fn create(
    params: Arc<BrickwallParams>,
    meters: Arc<Meters>,
    editor_state: Arc<ViziaState>,
) -> Option<Box<dyn Editor>> {
    create_vizia_editor(editor_state, ViziaTheming::Custom, move |cx, _| {
        assets::register_noto_sans_light(cx);
        assets::register_noto_sans_thin(cx);

        Data {
            params: params.clone(),
            meters: meters.clone(),
        }
        .build(cx);

        VStack::new(cx, |cx| {
            Label::new(cx, "Brickwall")
                .font_family(vec![FamilyOwned::Name(String::from(assets::NOTO_SANS))])
                .font_weight(FontWeightKeyword::Thin)
                .font_size(30.0)
                .height(Pixels(50.0))
                .child_top(Stretch(1.0))
                .child_bottom(Pixels(0.0));

            HStack::new(cx, |cx| {
                VStack::new(cx, |cx| {
                    Label::new(cx, "Lookahead");
                    ParamSlider::new(cx, Data::params, |params| &params.lookahead);
                    Label::new(cx, "Attack");
                    ParamSlider::new(cx, Data::params, |params| &params.attack);
                    Label::new(cx, "Release");
                    ParamSlider::new(cx, Data::params, |params| &params.release);
                });
                VStack::new(cx, |cx| {
                    Label::new(cx, "Input");
                    ParamSlider::new(cx, Data::params, |params| &params.input);
                    Label::new(cx, "Output");
                    ParamSlider::new(cx, Data::params, |params| &params.output);
                    Label::new(cx, "Threshold");
                    ParamSlider::new(cx, Data::params, |params| &params.threshold);
                });
            });

            // Lags the audio by up to one publish interval
            Label::new(cx, "Input");
            PeakMeter::new(
                cx,
                Data::meters.map(|meters| meters.input_db()),
                Some(PEAK_HOLD),
            );
            Label::new(cx, "Reduction");
            PeakMeter::new(
                cx,
                Data::meters.map(|meters| reduction_meter_db(meters.reduction_db())),
                Some(PEAK_HOLD),
            );
            Label::new(cx, "Output");
            PeakMeter::new(
                cx,
                Data::meters.map(|meters| meters.output_db()),
                Some(PEAK_HOLD),
            );
        });

        ResizeHandle::new(cx);
    })
}

/// Maps a gain reduction onto the peak meter's scale so the bar grows with the reduction. No
/// reduction, and the unpublished [`SILENCE_DB`][crate::meter::SILENCE_DB] reading, draw an
/// empty bar.
fn reduction_meter_db(reduction_db: f32) -> f32 {
    METER_FLOOR_DB + reduction_db.clamp(0.0, REDUCTION_RANGE_DB)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::SILENCE_DB;

    #[test]
    fn reduction_meter_is_empty_without_reduction() {
        assert_eq!(reduction_meter_db(0.0), METER_FLOOR_DB);
        assert_eq!(reduction_meter_db(SILENCE_DB), METER_FLOOR_DB);
    }

    #[test]
    fn reduction_meter_grows_with_reduction() {
        assert_eq!(reduction_meter_db(6.0), METER_FLOOR_DB + 6.0);
        assert!(reduction_meter_db(12.0) > reduction_meter_db(6.0));
        assert_eq!(reduction_meter_db(1000.0), METER_FLOOR_DB + REDUCTION_RANGE_DB);
    }
}
