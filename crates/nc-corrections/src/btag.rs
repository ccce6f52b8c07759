//! Fixed-working-point b-tagging scale factors.

use std::sync::Arc;

use nc_core::{ObjectKinematics, Result, UncScale, WeightBranchList, CENTRAL, NANO};
use nc_frame::{Column, ColumnFrame};

use crate::branches::define_sf_branch;
use crate::provider::{BTagProvider, BTagWorkingPoint};

/// b-tagging efficiency uncertainty sources, split by jet flavour and by
/// year correlation.
pub const SF_SOURCES: [&str; 4] = [
    "btagSFbc_uncorrelated",
    "btagSFlight_uncorrelated",
    "btagSFbc_correlated",
    "btagSFlight_correlated",
];

/// Producer of per-working-point b-tagging weight branches.
pub struct BTagSfProducer {
    provider: Arc<dyn BTagProvider>,
}

impl BTagSfProducer {
    /// Create from the b-tagging provider.
    pub fn new(provider: Arc<dyn BTagProvider>) -> Self {
        Self { provider }
    }

    /// Define `weight_bTagSF_<wp>_<syst>` branches, one set per working
    /// point: the event weight is the product of per-jet scale factors over
    /// the b-candidate jets.
    ///
    /// Each non-central source keeps its own central branch
    /// `weight_bTagSF_<wp>_<source>Central`, the denominator of its
    /// relative variations.
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
            for scale in [UncScale::Central, UncScale::Up, UncScale::Down] {
                if scale != UncScale::Central
                    && (source == CENTRAL || !is_central || !return_variations)
                {
                    continue;
                }
                for wp in BTagWorkingPoint::ALL {
                    let base = format!("weight_bTagSF_{}", wp.name());
                    let syst = if source == CENTRAL {
                        CENTRAL.to_string()
                    } else {
                        format!("{source}{scale}")
                    };
                    let central_syst = format!("{source}{CENTRAL}");
                    let provider = Arc::clone(&self.provider);
                    let source = source.to_string();
                    define_sf_branch(
                        frame,
                        list,
                        &base,
                        &syst,
                        &central_syst,
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
                                    weight *= provider.evaluate_wp(&kin, wp, &source, scale)?;
                                }
                                out.push(weight);
                            }
                            Ok(Column::Scalar(out))
                        },
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Define `Jet_idbtagDeepFlavB`: per jet, the number of working points
    /// whose discriminant threshold the jet passes.
    pub fn working_point_id(&self, frame: &mut ColumnFrame) -> Result<()> {
        let provider = Arc::clone(&self.provider);
        frame.define("Jet_idbtagDeepFlavB", &["Jet_btagDeepFlavB"], move |cols| {
            let scores = cols[0].as_jagged_f64()?;
            let out = scores
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|score| {
                            BTagWorkingPoint::ALL
                                .iter()
                                .filter(|wp| *score >= provider.wp_value(**wp))
                                .count() as i32
                        })
                        .collect()
                })
                .collect();
            Ok(Column::JaggedI32(out))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nc_core::FourVector;

    /// b/c jets get 0.9 (±10% under bc sources), light jets 1.0.
    struct FlavourProvider;

    impl BTagProvider for FlavourProvider {
        fn evaluate_wp(
            &self,
            kin: &ObjectKinematics,
            _wp: BTagWorkingPoint,
            source: &str,
            scale: UncScale,
        ) -> Result<f64> {
            let heavy = kin.hadron_flavour == 4 || kin.hadron_flavour == 5;
            if !heavy {
                return Ok(1.0);
            }
            let shift = if source.starts_with("btagSFbc") {
                0.1 * scale as i32 as f64
            } else {
                0.0
            };
            Ok(0.9 * (1.0 + shift))
        }

        fn wp_value(&self, wp: BTagWorkingPoint) -> f64 {
            match wp {
                BTagWorkingPoint::Loose => 0.05,
                BTagWorkingPoint::Medium => 0.3,
                BTagWorkingPoint::Tight => 0.7,
            }
        }
    }

    fn jet_frame() -> ColumnFrame {
        let mut frame = ColumnFrame::new(1);
        frame
            .insert_input(
                "Jet_p4_nano",
                Column::P4(vec![vec![
                    FourVector::from_ptetaphim(80.0, 0.3, 0.0, 6.0),
                    FourVector::from_ptetaphim(55.0, -1.1, 2.0, 5.0),
                    FourVector::from_ptetaphim(30.0, 2.0, -2.5, 4.0),
                ]]),
            )
            .unwrap();
        frame
            .insert_input("Jet_bCand", Column::JaggedI32(vec![vec![1, 1, 0]]))
            .unwrap();
        frame
            .insert_input("Jet_hadronFlavour", Column::JaggedI32(vec![vec![5, 0, 5]]))
            .unwrap();
        frame
            .insert_input("Jet_btagDeepFlavB", Column::JaggedF64(vec![vec![0.95, 0.1, 0.6]]))
            .unwrap();
        frame
    }

    #[test]
    fn weight_is_product_over_b_candidates() {
        let mut frame = jet_frame();
        let producer = BTagSfProducer::new(Arc::new(FlavourProvider));
        let mut list = WeightBranchList::new();
        producer.scale_factors(&mut frame, true, true, &mut list).unwrap();

        // Jet 0 (b, selected) contributes 0.9, jet 1 (light) 1.0, jet 2 is
        // not a b candidate.
        let central = frame.evaluate("weight_bTagSF_Medium_Central").unwrap();
        assert_relative_eq!(central.as_scalar().unwrap()[0], 0.9, max_relative = 1e-12);

        // bc-source variation moves only the heavy jet: rel = 0.99/0.9.
        let rel = frame
            .evaluate("weight_bTagSF_Medium_btagSFbc_correlatedUp_rel")
            .unwrap();
        assert_relative_eq!(rel.as_scalar().unwrap()[0], 1.1, max_relative = 1e-12);

        // Light-source variation leaves the weight unchanged.
        let rel = frame
            .evaluate("weight_bTagSF_Tight_btagSFlight_correlatedUp_rel")
            .unwrap();
        assert_relative_eq!(rel.as_scalar().unwrap()[0], 1.0, max_relative = 1e-12);

        let names = list.names();
        assert!(names.contains(&"weight_bTagSF_Loose_Central"));
        assert!(names.contains(&"weight_bTagSF_Loose_btagSFbc_uncorrelatedCentral"));
        // Per working point: plain central, 4 per-source centrals, 8 rels.
        assert_eq!(names.len(), 3 * (1 + 4 + 8));
    }

    #[test]
    fn non_central_samples_only_get_central_branches() {
        let mut frame = jet_frame();
        let producer = BTagSfProducer::new(Arc::new(FlavourProvider));
        let mut list = WeightBranchList::new();
        producer.scale_factors(&mut frame, false, true, &mut list).unwrap();
        assert_eq!(list.names().len(), 3 * (1 + 4));
        assert!(!frame.contains("weight_bTagSF_Medium_btagSFbc_correlatedUp_rel"));
    }

    #[test]
    fn working_point_id_counts_passed_thresholds() {
        let mut frame = jet_frame();
        let producer = BTagSfProducer::new(Arc::new(FlavourProvider));
        producer.working_point_id(&mut frame).unwrap();
        let id = frame.evaluate("Jet_idbtagDeepFlavB").unwrap();
        // Scores 0.95, 0.1, 0.6 against thresholds 0.05/0.3/0.7.
        assert_eq!(id.as_jagged_i32().unwrap()[0], vec![3, 1, 2]);
    }
}
