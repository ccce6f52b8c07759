//! AK4 jet energy scale/resolution variations.

use std::sync::Arc;

use nc_core::{
    scales_for, syst_name, ObjectKinematics, Period, PhysicsObject, Result, SourceDict, UncScale,
    CENTRAL, NANO,
};
use nc_frame::{Column, ColumnFrame};

use crate::branches::{define_delta_p4, define_scaled_p4};
use crate::provider::CalibProvider;

/// Regrouped JES sources plus JER. Sources with a trailing underscore are
/// decorrelated per year; their effective name appends the data-taking year.
pub const JES_SOURCES: [&str; 13] = [
    "JER",
    "FlavorQCD",
    "RelativeBal",
    "HF",
    "BBEC1",
    "EC2",
    "Absolute",
    "Total",
    "BBEC1_",
    "Absolute_",
    "EC2_",
    "HF_",
    "RelativeSample_",
];

/// Pseudo-source under which the provider reports the pT resolution.
pub(crate) const PT_RESOLUTION: &str = "PtResolution";

/// Effective (registered) name of a JES/JER source for a given year:
/// the central source and JER keep their name, everything else gains a
/// `JES_` prefix, and year-decorrelated sources (trailing underscore) get
/// the year appended.
pub(crate) fn effective_source(source: &str, year: &str) -> String {
    if source == CENTRAL || source == "JER" {
        return source.to_string();
    }
    let mut eff = format!("JES_{source}");
    if source.ends_with('_') {
        eff.push_str(year);
    }
    eff
}

/// Producer of AK4 jet four-momentum variations.
pub struct JetCorrProducer {
    provider: Arc<dyn CalibProvider>,
    year: &'static str,
}

impl JetCorrProducer {
    /// Create from the jet calibration provider.
    pub fn new(provider: Arc<dyn CalibProvider>, period: Period) -> Self {
        Self { provider, year: period.year() }
    }

    /// Define `Jet_p4_<syst>` and `Jet_p4_<syst>_delta` for the central
    /// value and every JES/JER source.
    pub fn p4_variations(
        &self,
        frame: &mut ColumnFrame,
        source_dict: &mut SourceDict,
    ) -> Result<()> {
        define_object_variations(
            frame,
            source_dict,
            "Jet",
            PhysicsObject::Jet,
            &JES_SOURCES,
            Arc::clone(&self.provider),
            self.year,
        )
    }

    /// Define the per-jet `Jet_ptRes` resolution column.
    pub fn energy_resolution(&self, frame: &mut ColumnFrame) -> Result<()> {
        define_resolution(frame, "Jet", Arc::clone(&self.provider))
    }
}

/// Shared variation loop for AK4 and AK8 jets.
pub(crate) fn define_object_variations(
    frame: &mut ColumnFrame,
    source_dict: &mut SourceDict,
    obj: &str,
    object: PhysicsObject,
    sources: &[&str],
    provider: Arc<dyn CalibProvider>,
    year: &str,
) -> Result<()> {
    let nominal = format!("{obj}_p4_{NANO}");
    for source in std::iter::once(CENTRAL).chain(sources.iter().copied()) {
        let eff = effective_source(source, year);
        source_dict.register(&eff, object)?;
        for &scale in scales_for(source) {
            let syst = syst_name(&eff, scale)?;
            define_scaled_p4(
                frame,
                obj,
                &syst,
                &[nominal.as_str()],
                Arc::clone(&provider),
                eff.clone(),
                scale,
                |cols, event, object| {
                    let p4 = cols[0].as_p4()?;
                    Ok(ObjectKinematics::from_p4(p4[event][object]))
                },
            )?;
            define_delta_p4(frame, obj, &syst)?;
        }
    }
    Ok(())
}

/// Shared `{obj}_ptRes` resolution column for AK4 and AK8 jets.
pub(crate) fn define_resolution(
    frame: &mut ColumnFrame,
    obj: &str,
    provider: Arc<dyn CalibProvider>,
) -> Result<()> {
    let nominal = format!("{obj}_p4_{NANO}");
    frame.define(format!("{obj}_ptRes"), &[nominal.as_str()], move |cols| {
        let p4 = cols[0].as_p4()?;
        let mut out = Vec::with_capacity(p4.len());
        for objects in p4 {
            let mut row = Vec::with_capacity(objects.len());
            for p4 in objects {
                let kin = ObjectKinematics::from_p4(*p4);
                row.push(provider.evaluate(&kin, PT_RESOLUTION, UncScale::Central)?);
            }
            out.push(row);
        }
        Ok(Column::JaggedF64(out))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::ShiftProvider;
    use approx::assert_relative_eq;
    use nc_core::FourVector;

    fn jet_frame() -> ColumnFrame {
        let mut frame = ColumnFrame::new(1);
        frame
            .insert_input(
                "Jet_p4_nano",
                Column::P4(vec![vec![
                    FourVector::from_ptetaphim(100.0, 0.5, 0.0, 8.0),
                    FourVector::from_ptetaphim(45.0, -2.0, 3.0, 5.0),
                ]]),
            )
            .unwrap();
        frame
    }

    #[test]
    fn effective_source_naming() {
        assert_eq!(effective_source(CENTRAL, "2018"), "Central");
        assert_eq!(effective_source("JER", "2018"), "JER");
        assert_eq!(effective_source("FlavorQCD", "2018"), "JES_FlavorQCD");
        assert_eq!(effective_source("BBEC1_", "2018"), "JES_BBEC1_2018");
        assert_eq!(effective_source("RelativeSample_", "2017"), "JES_RelativeSample_2017");
    }

    #[test]
    fn variations_register_effective_sources() {
        let mut frame = jet_frame();
        let mut dict = SourceDict::new();
        let producer =
            JetCorrProducer::new(Arc::new(ShiftProvider::new(0.02)), Period::Run2_2018);
        producer.p4_variations(&mut frame, &mut dict).unwrap();

        assert!(dict.contains("JER", PhysicsObject::Jet));
        assert!(dict.contains("JES_FlavorQCD", PhysicsObject::Jet));
        assert!(dict.contains("JES_BBEC1_2018", PhysicsObject::Jet));
        assert!(frame.contains("Jet_p4_JES_BBEC1_2018Up"));
        assert!(frame.contains("Jet_p4_JERDown_delta"));

        let down = frame.evaluate("Jet_p4_JES_TotalDown").unwrap();
        let down = down.as_p4().unwrap();
        assert_relative_eq!(down[0][1].pt(), 45.0 * 0.98, max_relative = 1e-12);
    }

    #[test]
    fn resolution_column_is_per_jet() {
        let mut frame = jet_frame();
        let producer =
            JetCorrProducer::new(Arc::new(ShiftProvider::new(0.02)), Period::Run2_2018);
        producer.energy_resolution(&mut frame).unwrap();
        let res = frame.evaluate("Jet_ptRes").unwrap();
        assert_eq!(res.as_jagged_f64().unwrap()[0].len(), 2);
    }
}
