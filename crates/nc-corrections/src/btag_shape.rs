//! Shape (iterative-fit) b-tagging scale factors.
//!
//! One event weight per systematic, the product of per-jet reshaping factors
//! over the pre-selected jets. The provider applies a source only to the jet
//! flavours it is defined for and falls back to the central factor otherwise,
//! so the producer treats every source uniformly.

use std::sync::Arc;

use nc_core::{
    scales_for, syst_name, ObjectKinematics, Result, UncScale, WeightBranchList, CENTRAL, NANO,
};
use nc_frame::{Column, ColumnFrame};

use crate::branches::define_sf_branch;
use crate::provider::CalibProvider;

/// Shape-reshaping uncertainty sources: the eight default fit sources plus
/// the correlated JES sources. Trailing-underscore sources are decorrelated
/// per year, as for the jet energy scale.
pub const SF_SOURCES: [&str; 19] = [
    "lf",
    "hf",
    "lfstats1",
    "lfstats2",
    "hfstats1",
    "hfstats2",
    "cferr1",
    "cferr2",
    "jesRelativeBal",
    "jesHF",
    "jesBBEC1",
    "jesEC2",
    "jesAbsolute",
    "jesFlavorQCD",
    "jesBBEC1_",
    "jesAbsolute_",
    "jesEC2_",
    "jesHF_",
    "jesRelativeSample_",
];

/// Producer of the shape b-tagging weight branches.
pub struct BTagShapeProducer {
    provider: Arc<dyn CalibProvider>,
    year: String,
}

impl BTagShapeProducer {
    /// Create from the shape b-tagging provider.
    pub fn new(provider: Arc<dyn CalibProvider>, year: &str) -> Self {
        Self { provider, year: year.to_string() }
    }

    /// Define `weight_bTagShapeSF_<syst>` branches: the absolute central weight
    /// plus a relative branch per (source, Up/Down).
    pub fn scale_factors(
        &self,
        frame: &mut ColumnFrame,
        is_central: bool,
        return_variations: bool,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        let nominal = format!("Jet_p4_{NANO}");
        let inputs =
            [nominal.as_str(), "Jet_bCand", "Jet_hadronFlavour", "Jet_btagDeepFlavB"];
        for source in std::iter::once(CENTRAL).chain(SF_SOURCES) {
            if source != CENTRAL && !return_variations {
                continue;
            }
            for &scale in scales_for(source) {
                if !is_central && scale != UncScale::Central {
                    continue;
                }
                let mut eff = source.to_string();
                if eff.ends_with('_') {
                    eff.push_str(&self.year);
                }
                let syst = syst_name(&eff, scale)?;
                let provider = Arc::clone(&self.provider);
                define_sf_branch(
                    frame,
                    list,
                    "weight_bTagShapeSF",
                    &syst,
                    CENTRAL,
                    scale,
                    &inputs,
                    move |cols| {
                        let p4 = cols[0].as_p4()?;
                        let b_cand = cols[1].as_jagged_i32()?;
                        let flavour = cols[2].as_jagged_i32()?;
                        let score = cols[3].as_jagged_f64()?;
                        let mut out = Vec::with_capacity(p4.len());
                        for event in 0..p4.len() {
                            let mut weight = 1.0;
                            for jet in 0..p4[event].len() {
                                if b_cand[event][jet] == 0 {
                                    continue;
                                }
                                let kin = ObjectKinematics {
                                    p4: p4[event][jet],
                                    hadron_flavour: flavour[event][jet],
                                    discriminant: score[event][jet],
                                    ..ObjectKinematics::default()
                                };
                                weight *= provider.evaluate(&kin, &eff, scale)?;
                            }
                            out.push(weight);
                        }
                        Ok(Column::Scalar(out))
                    },
                )?;
            }
        }
        Ok(())
    }
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
                    FourVector::from_ptetaphim(80.0, 0.3, 0.0, 6.0),
                    FourVector::from_ptetaphim(55.0, -1.1, 2.0, 5.0),
                ]]),
            )
            .unwrap();
        frame.insert_input("Jet_bCand", Column::JaggedI32(vec![vec![1, 1]])).unwrap();
        frame
            .insert_input("Jet_hadronFlavour", Column::JaggedI32(vec![vec![5, 0]]))
            .unwrap();
        frame
            .insert_input("Jet_btagDeepFlavB", Column::JaggedF64(vec![vec![0.9, 0.05]]))
            .unwrap();
        frame
    }

    #[test]
    fn shape_weight_multiplies_over_selected_jets() {
        let mut frame = jet_frame();
        let producer = BTagShapeProducer::new(Arc::new(ShiftProvider::new(0.05)), "2018");
        let mut list = WeightBranchList::new();
        producer.scale_factors(&mut frame, true, true, &mut list).unwrap();

        let central = frame.evaluate("weight_bTagShapeSF_Central").unwrap();
        assert_relative_eq!(central.as_scalar().unwrap()[0], 1.0, max_relative = 1e-12);
        // Two jets, each shifted by 5%: rel = 1.05^2.
        let rel = frame.evaluate("weight_bTagShapeSF_lfUp_rel").unwrap();
        assert_relative_eq!(rel.as_scalar().unwrap()[0], 1.05 * 1.05, max_relative = 1e-12);
    }

    #[test]
    fn year_suffixed_sources_are_expanded() {
        let mut frame = jet_frame();
        let producer = BTagShapeProducer::new(Arc::new(ShiftProvider::new(0.05)), "2017");
        let mut list = WeightBranchList::new();
        producer.scale_factors(&mut frame, true, true, &mut list).unwrap();
        assert!(frame.contains("weight_bTagShapeSF_jesBBEC1_2017Up_rel"));
        assert!(!frame.contains("weight_bTagShapeSF_jesBBEC1_Up_rel"));
        // Central plus Up/Down per source.
        assert_eq!(list.names().len(), 1 + 2 * SF_SOURCES.len());
    }
}
