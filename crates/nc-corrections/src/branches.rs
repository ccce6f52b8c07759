//! Shared column-definition patterns used by all producers.

use std::sync::Arc;

use nc_core::{ObjectKinematics, Result, UncScale, WeightBranchList, NANO};
use nc_frame::{Column, ColumnFrame};

use crate::provider::CalibProvider;

/// Define `{obj}_p4_{syst}` as the per-object momentum scaled by the
/// provider's factor for (`source`, `scale`).
///
/// `inputs[0]` must be the nominal per-object four-vector column;
/// `kin_builder(cols, event, object)` assembles the provider input from the
/// evaluated columns.
#[allow(clippy::too_many_arguments)]
pub(crate) fn define_scaled_p4<K>(
    frame: &mut ColumnFrame,
    obj: &str,
    syst: &str,
    inputs: &[&str],
    provider: Arc<dyn CalibProvider>,
    source: String,
    scale: UncScale,
    kin_builder: K,
) -> Result<()>
where
    K: Fn(&[Arc<Column>], usize, usize) -> Result<ObjectKinematics> + 'static,
{
    frame.define(format!("{obj}_p4_{syst}"), inputs, move |cols| {
        let nominal = cols[0].as_p4()?;
        let mut shifted = Vec::with_capacity(nominal.len());
        for (event, objects) in nominal.iter().enumerate() {
            let mut out = Vec::with_capacity(objects.len());
            for object in 0..objects.len() {
                let kin = kin_builder(cols, event, object)?;
                let factor = provider.evaluate(&kin, &source, scale)?;
                out.push(kin.p4.scaled(factor));
            }
            shifted.push(out);
        }
        Ok(Column::P4(shifted))
    })
}

/// Define `{obj}_p4_{syst}_delta` = shifted − nominal, per object.
pub(crate) fn define_delta_p4(frame: &mut ColumnFrame, obj: &str, syst: &str) -> Result<()> {
    let shifted = format!("{obj}_p4_{syst}");
    let nominal = format!("{obj}_p4_{NANO}");
    frame.define(
        format!("{obj}_p4_{syst}_delta"),
        &[shifted.as_str(), nominal.as_str()],
        |cols| {
            let shifted = cols[0].as_p4()?;
            let nominal = cols[1].as_p4()?;
            let deltas = shifted
                .iter()
                .zip(nominal)
                .map(|(s, n)| s.iter().zip(n).map(|(a, b)| *a - *b).collect())
                .collect();
            Ok(Column::P4(deltas))
        },
    )
}

/// Define `{obj}_p4_{syst}_delta` = shifted − nominal for a per-event
/// four-vector column (MET).
pub(crate) fn define_delta_event_p4(frame: &mut ColumnFrame, obj: &str, syst: &str) -> Result<()> {
    let shifted = format!("{obj}_p4_{syst}");
    let nominal = format!("{obj}_p4_{NANO}");
    frame.define(
        format!("{obj}_p4_{syst}_delta"),
        &[shifted.as_str(), nominal.as_str()],
        |cols| {
            let shifted = cols[0].as_event_p4()?;
            let nominal = cols[1].as_event_p4()?;
            Ok(Column::EventP4(shifted.iter().zip(nominal).map(|(s, n)| *s - *n).collect()))
        },
    )
}

/// Define one scale-factor weight branch following the central/relative
/// naming asymmetry.
///
/// The raw value lands in `{base}_{syst}_double`. A central-scale branch is
/// re-exposed as the absolute weight `{base}_{syst}`; a non-central branch
/// becomes `{base}_{syst}_rel`, the ratio to `{base}_{central_syst}` (which
/// must therefore be defined first). The final branch is appended to `list`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn define_sf_branch<F>(
    frame: &mut ColumnFrame,
    list: &mut WeightBranchList,
    base: &str,
    syst: &str,
    central_syst: &str,
    scale: UncScale,
    inputs: &[&str],
    func: F,
) -> Result<()>
where
    F: Fn(&[Arc<Column>]) -> Result<Column> + 'static,
{
    let raw = format!("{base}_{syst}_double");
    frame.define(raw.clone(), inputs, func)?;
    if scale == UncScale::Central {
        let name = format!("{base}_{syst}");
        frame.define(name.clone(), &[raw.as_str()], |cols| Ok((*cols[0]).clone()))?;
        list.push_central(name);
    } else {
        let central = format!("{base}_{central_syst}");
        let name = format!("{base}_{syst}_rel");
        frame.define(name.clone(), &[raw.as_str(), central.as_str()], |cols| {
            let shifted = cols[0].as_scalar()?;
            let central = cols[1].as_scalar()?;
            Ok(Column::Scalar(shifted.iter().zip(central).map(|(s, c)| s / c).collect()))
        })?;
        list.push_relative(name);
    }
    Ok(())
}
