//! Muon reconstruction/identification/isolation scale factors.
//!
//! Two providers cover complementary pT regimes: the standard Z-peak
//! measurements below 120 GeV (reco valid up to 200 GeV) and the dedicated
//! high-pT measurements above. Each uncertainty source keeps its own central
//! branch; there is no shared plain-central branch for muons.

use std::sync::Arc;

use nc_core::{ObjectKinematics, Result, UncScale, WeightBranchList, CENTRAL};
use nc_frame::{Column, ColumnFrame};

use crate::branches::define_sf_branch;
use crate::config::LegType;
use crate::provider::CalibProvider;

/// One muon scale-factor source: the provider-side measurement name, the
/// short name used in branch names, and the pT validity window.
#[derive(Debug, Clone, Copy)]
pub struct MuonSfSource {
    /// Measurement name understood by the calibration provider.
    pub name: &'static str,
    /// Short name appearing in branch names.
    pub short: &'static str,
    /// Half-open pT window `[min, max)` outside which the factor is 1.
    pub pt_window: (f64, f64),
}

/// Standard-regime sources: tight/high-pT ID, tracker reco, and the matching
/// isolation measurements.
pub const SF_SOURCES: [MuonSfSource; 5] = [
    MuonSfSource {
        name: "NUM_TightID_DEN_TrackerMuons",
        short: "TightID_Trk",
        pt_window: (15.0, 120.0),
    },
    MuonSfSource {
        name: "NUM_HighPtID_DEN_TrackerMuons",
        short: "HighPtID_Trk",
        pt_window: (15.0, 120.0),
    },
    MuonSfSource {
        name: "NUM_TrackerMuons_DEN_genTracks",
        short: "Reco",
        pt_window: (10.0, 200.0),
    },
    MuonSfSource {
        name: "NUM_TightRelIso_DEN_TightIDandIPCut",
        short: "TightRelIso",
        pt_window: (15.0, 120.0),
    },
    MuonSfSource {
        name: "NUM_TightRelTkIso_DEN_TrkHighPtIDandIPCut",
        short: "HighPtIdRelTkIso",
        pt_window: (15.0, 120.0),
    },
];

/// High-pT-regime sources, valid from 120 GeV upward.
pub const HIGH_PT_SF_SOURCES: [MuonSfSource; 4] = [
    MuonSfSource {
        name: "NUM_GlobalMuons_DEN_TrackerMuonProbes",
        short: "Reco",
        pt_window: (120.0, f64::INFINITY),
    },
    MuonSfSource {
        name: "NUM_TightID_DEN_GlobalMuonProbes",
        short: "TightID",
        pt_window: (120.0, f64::INFINITY),
    },
    MuonSfSource {
        name: "NUM_HighPtID_DEN_GlobalMuonProbes",
        short: "HighPtID",
        pt_window: (120.0, f64::INFINITY),
    },
    MuonSfSource {
        name: "NUM_probe_TightRelTkIso_DEN_HighPtProbes",
        short: "HighPtIdRelTkIso",
        pt_window: (120.0, f64::INFINITY),
    },
];

/// Producer of per-leg muon weight branches.
pub struct MuIdSfProducer {
    provider: Arc<dyn CalibProvider>,
    high_pt_provider: Arc<dyn CalibProvider>,
}

impl MuIdSfProducer {
    /// Create from the standard and high-pT muon providers.
    pub fn new(
        provider: Arc<dyn CalibProvider>,
        high_pt_provider: Arc<dyn CalibProvider>,
    ) -> Self {
        Self { provider, high_pt_provider }
    }

    /// Define `weight_{leg}_MuonID_SF_{short}{scale}` branches for the
    /// standard-regime sources.
    pub fn scale_factors(
        &self,
        frame: &mut ColumnFrame,
        legs: &[String],
        is_central: bool,
        return_variations: bool,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        define_muon_branches(
            frame,
            legs,
            "MuonID_SF",
            &SF_SOURCES,
            Arc::clone(&self.provider),
            is_central,
            return_variations,
            list,
        )
    }

    /// Define `weight_{leg}_HighPt_MuonID_SF_{short}{scale}` branches for
    /// the high-pT sources.
    pub fn high_pt_scale_factors(
        &self,
        frame: &mut ColumnFrame,
        legs: &[String],
        is_central: bool,
        return_variations: bool,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        define_muon_branches(
            frame,
            legs,
            "HighPt_MuonID_SF",
            &HIGH_PT_SF_SOURCES,
            Arc::clone(&self.high_pt_provider),
            is_central,
            return_variations,
            list,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn define_muon_branches(
    frame: &mut ColumnFrame,
    legs: &[String],
    tag: &str,
    sources: &[MuonSfSource],
    provider: Arc<dyn CalibProvider>,
    is_central: bool,
    return_variations: bool,
    list: &mut WeightBranchList,
) -> Result<()> {
    let scales = if return_variations {
        &[UncScale::Central, UncScale::Up, UncScale::Down][..]
    } else {
        &[UncScale::Central][..]
    };
    for source in sources {
        for &scale in scales {
            if !is_central && scale != UncScale::Central {
                continue;
            }
            let syst = format!("{}{scale}", source.short);
            let central_syst = format!("{}{CENTRAL}", source.short);
            for leg in legs {
                let leg_type = format!("{leg}_legType");
                let leg_p4 = format!("{leg}_p4");
                let provider = Arc::clone(&provider);
                let source = *source;
                define_sf_branch(
                    frame,
                    list,
                    &format!("weight_{leg}_{tag}"),
                    &syst,
                    &central_syst,
                    scale,
                    &[leg_type.as_str(), leg_p4.as_str()],
                    move |cols| {
                        let leg_type = cols[0].as_scalar()?;
                        let p4 = cols[1].as_event_p4()?;
                        let (pt_min, pt_max) = source.pt_window;
                        let mut out = Vec::with_capacity(p4.len());
                        for event in 0..p4.len() {
                            let pt = p4[event].pt();
                            let weight = if leg_type[event] == LegType::Muon.code()
                                && pt >= pt_min
                                && pt < pt_max
                            {
                                let kin = ObjectKinematics::from_p4(p4[event]);
                                provider.evaluate(&kin, source.name, scale)?
                            } else {
                                1.0
                            };
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::ShiftProvider;
    use approx::assert_relative_eq;
    use nc_core::FourVector;

    fn muon_frame() -> ColumnFrame {
        let mut frame = ColumnFrame::new(3);
        frame
            .insert_input(
                "mu1_p4",
                Column::EventP4(vec![
                    FourVector::from_ptetaphim(50.0, 0.4, 0.0, 0.105),
                    FourVector::from_ptetaphim(300.0, -0.8, 1.5, 0.105),
                    FourVector::from_ptetaphim(45.0, 1.9, -0.5, 1.777),
                ]),
            )
            .unwrap();
        // Events 0 and 1 are muon legs, event 2 a tau leg.
        frame
            .insert_input("mu1_legType", Column::Scalar(vec![2.0, 2.0, 3.0]))
            .unwrap();
        frame
    }

    #[test]
    fn standard_branches_respect_pt_windows_and_leg_type() {
        let mut frame = muon_frame();
        let producer = MuIdSfProducer::new(
            Arc::new(ShiftProvider::new(0.02)),
            Arc::new(ShiftProvider::new(0.04)),
        );
        let mut list = WeightBranchList::new();
        producer
            .scale_factors(&mut frame, &["mu1".to_string()], true, true, &mut list)
            .unwrap();

        let central = frame.evaluate("weight_mu1_MuonID_SF_TightID_TrkCentral").unwrap();
        let central = central.as_scalar().unwrap();
        assert_relative_eq!(central[0], 1.0, max_relative = 1e-12);
        // 300 GeV sits outside the 15-120 ID window; tau leg is gated off.
        assert_relative_eq!(central[1], 1.0, max_relative = 1e-12);
        assert_relative_eq!(central[2], 1.0, max_relative = 1e-12);

        let rel = frame
            .evaluate("weight_mu1_MuonID_SF_TightID_TrkUp_rel")
            .unwrap();
        let rel = rel.as_scalar().unwrap();
        assert_relative_eq!(rel[0], 1.02, max_relative = 1e-12);
        assert_relative_eq!(rel[1], 1.0, max_relative = 1e-12);

        // Per-source central convention: every source has its own central.
        let names = list.names();
        assert!(names.contains(&"weight_mu1_MuonID_SF_RecoCentral"));
        assert!(!names.contains(&"weight_mu1_MuonID_SF_Central"));
        assert_eq!(names.len(), 3 * SF_SOURCES.len());
    }

    #[test]
    fn high_pt_branches_cover_the_complementary_regime() {
        let mut frame = muon_frame();
        let producer = MuIdSfProducer::new(
            Arc::new(ShiftProvider::new(0.02)),
            Arc::new(ShiftProvider::new(0.04)),
        );
        let mut list = WeightBranchList::new();
        producer
            .high_pt_scale_factors(&mut frame, &["mu1".to_string()], true, true, &mut list)
            .unwrap();

        let rel = frame
            .evaluate("weight_mu1_HighPt_MuonID_SF_HighPtIDUp_rel")
            .unwrap();
        let rel = rel.as_scalar().unwrap();
        // Only the 300 GeV muon enters the high-pT measurement.
        assert_relative_eq!(rel[0], 1.0, max_relative = 1e-12);
        assert_relative_eq!(rel[1], 1.04, max_relative = 1e-12);
    }
}
