//! Propagation of object four-momentum shifts into the missing transverse
//! momentum.
//!
//! For every registered source the MET is recomputed by subtracting the
//! summed per-object deltas of the MET-sensitive objects that source shifts,
//! then projecting onto the transverse plane. Runs after all momentum
//! producers, so it sees the complete source dictionary.

use nc_core::{
    scales_for, syst_name, FourVector, PhysicsObject, Result, SourceDict, CENTRAL, NANO,
};
use nc_frame::{Column, ColumnFrame};

use crate::branches::define_delta_event_p4;

/// Producer of shifted MET columns. Stateless: the shift is pure kinematics
/// and needs no calibration provider.
pub struct MetProducer;

impl MetProducer {
    /// Define `MET_p4_<syst>` and `MET_p4_<syst>_delta` for every source in
    /// `source_dict`, registering MET for each of them.
    ///
    /// The shifted MET is the nominal MET minus the sum of the
    /// `{obj}_p4_<syst>_delta` columns of the MET-sensitive objects the
    /// source shifts, projected transverse (pt and phi kept, eta and mass
    /// zeroed). Non-central sources touching no MET-sensitive object are
    /// skipped.
    pub fn shift(&self, frame: &mut ColumnFrame, source_dict: &mut SourceDict) -> Result<()> {
        let nominal = format!("MET_p4_{NANO}");
        let snapshot: Vec<(String, Vec<PhysicsObject>)> = source_dict
            .iter()
            .map(|(source, objects)| {
                let affected =
                    objects.iter().copied().filter(|obj| obj.affects_met()).collect();
                (source.to_string(), affected)
            })
            .collect();

        for (source, affected) in snapshot {
            if source != CENTRAL && affected.is_empty() {
                continue;
            }
            source_dict.register(&source, PhysicsObject::Met)?;
            for &scale in scales_for(&source) {
                let syst = syst_name(&source, scale)?;
                let mut inputs = vec![nominal.clone()];
                inputs.extend(
                    affected.iter().map(|obj| format!("{}_p4_{syst}_delta", obj.name())),
                );
                let input_refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
                frame.define(format!("MET_p4_{syst}"), &input_refs, |cols| {
                    let met = cols[0].as_event_p4()?;
                    let mut out = Vec::with_capacity(met.len());
                    for event in 0..met.len() {
                        let mut shifted = met[event];
                        for deltas in &cols[1..] {
                            let total: FourVector =
                                deltas.as_p4()?[event].iter().fold(FourVector::default(), |acc, d| acc + *d);
                            shifted = shifted - total;
                        }
                        out.push(shifted.transverse());
                    }
                    Ok(Column::EventP4(out))
                })?;
                define_delta_event_p4(frame, "MET", &syst)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn met_absorbs_negative_object_delta() {
        let mut frame = ColumnFrame::new(1);
        let nominal_met = FourVector::from_ptetaphim(50.0, 0.0, 0.0, 0.0);
        frame.insert_input("MET_p4_nano", Column::EventP4(vec![nominal_met])).unwrap();
        let tau = FourVector::from_ptetaphim(40.0, 1.2, 0.5, 1.777);
        frame
            .insert_input(
                "Tau_p4_TauES_DM0Up_delta",
                Column::P4(vec![vec![tau.scaled(1.05) - tau]]),
            )
            .unwrap();
        frame
            .insert_input(
                "Tau_p4_TauES_DM0Down_delta",
                Column::P4(vec![vec![tau.scaled(0.95) - tau]]),
            )
            .unwrap();

        let mut dict = SourceDict::new();
        dict.register("TauES_DM0", PhysicsObject::Tau).unwrap();
        MetProducer.shift(&mut frame, &mut dict).unwrap();
        assert!(dict.contains("TauES_DM0", PhysicsObject::Met));

        let shifted = frame.evaluate("MET_p4_TauES_DM0Up").unwrap();
        let shifted = shifted.as_event_p4().unwrap()[0];
        // Transverse projection: massless and central.
        assert_relative_eq!(shifted.eta(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(shifted.mass(), 0.0, epsilon = 1e-9);

        // px balance: met_x' = met_x - delta_x.
        let delta = tau.scaled(1.05) - tau;
        let expected = nominal_met - delta;
        assert_relative_eq!(shifted.px, expected.px, max_relative = 1e-12);
        assert_relative_eq!(shifted.py, expected.py, max_relative = 1e-12);
    }

    #[test]
    fn sources_without_met_sensitive_objects_are_skipped() {
        let mut frame = ColumnFrame::new(1);
        let nominal_met = FourVector::from_ptetaphim(30.0, 0.0, -2.0, 0.0);
        frame.insert_input("MET_p4_nano", Column::EventP4(vec![nominal_met])).unwrap();

        let mut dict = SourceDict::new();
        dict.register("FatJetOnly", PhysicsObject::FatJet).unwrap();
        // FatJet does not enter the MET recomputation.
        MetProducer.shift(&mut frame, &mut dict).unwrap();

        assert!(!frame.contains("MET_p4_FatJetOnlyUp"));
        assert!(!dict.contains("FatJetOnly", PhysicsObject::Met));
    }

    #[test]
    fn central_source_defines_central_met() {
        let mut frame = ColumnFrame::new(1);
        frame
            .insert_input(
                "MET_p4_nano",
                Column::EventP4(vec![FourVector::from_ptetaphim(60.0, 0.0, 1.0, 0.0)]),
            )
            .unwrap();
        frame
            .insert_input("Tau_p4_Central_delta", Column::P4(vec![vec![FourVector::default()]]))
            .unwrap();

        let mut dict = SourceDict::new();
        dict.register(CENTRAL, PhysicsObject::Tau).unwrap();
        MetProducer.shift(&mut frame, &mut dict).unwrap();

        assert!(frame.contains("MET_p4_Central"));
        assert!(frame.contains("MET_p4_Central_delta"));
        let central = frame.evaluate("MET_p4_Central").unwrap();
        assert_relative_eq!(central.as_event_p4().unwrap()[0].pt(), 60.0, max_relative = 1e-12);
    }
}
