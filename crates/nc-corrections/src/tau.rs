//! Tau energy scale and identification scale factors.

use std::sync::Arc;

use nc_core::{
    scales_for, syst_name, ObjectKinematics, PhysicsObject, Result, SourceDict, UncScale,
    WeightBranchList, CENTRAL, NANO,
};
use nc_frame::{Column, ColumnFrame};

use crate::branches::{define_delta_p4, define_scaled_p4, define_sf_branch};
use crate::config::LegType;
use crate::provider::CalibProvider;

/// Tau energy-scale uncertainty sources: genuine taus per decay mode, plus
/// electrons/muons faking taus.
pub const ENERGY_SCALE_SOURCES: [&str; 6] = [
    "TauES_DM0",
    "TauES_DM1",
    "TauES_3prong",
    "EleFakingTauES_DM0",
    "EleFakingTauES_DM1",
    "MuFakingTauES",
];

/// Tau ID uncertainty sources binned in decay mode.
pub const SF_SOURCES_DM: [&str; 3] =
    ["TauID_genuineTau_DM0", "TauID_genuineTau_DM1", "TauID_genuineTau_3Prong"];

/// Tau ID uncertainty sources binned in pT, plus fake-rate sources.
pub const SF_SOURCES_PT: [&str; 12] = [
    "TauID_genuineTau_Pt20_25",
    "TauID_genuineTau_Pt25_30",
    "TauID_genuineTau_Pt30_35",
    "TauID_genuineTau_Pt35_40",
    "TauID_genuineTau_Ptgt40",
    "TauID_genuineElectron_barrel",
    "TauID_genuineElectron_endcaps",
    "TauID_genuineMuon_etaLt0p4",
    "TauID_genuineMuon_eta0p4to0p8",
    "TauID_genuineMuon_eta0p8to1p2",
    "TauID_genuineMuon_eta1p2to1p7",
    "TauID_genuineMuon_etaGt1p7",
];

/// Producer of tau four-momentum variations.
pub struct TauEsProducer {
    provider: Arc<dyn CalibProvider>,
}

impl TauEsProducer {
    /// Create from the tau energy-scale provider.
    pub fn new(provider: Arc<dyn CalibProvider>) -> Self {
        Self { provider }
    }

    /// Define `Tau_p4_<syst>` and `Tau_p4_<syst>_delta` for the central
    /// value and every energy-scale source, registering each source for the
    /// Tau object.
    pub fn energy_scales(
        &self,
        frame: &mut ColumnFrame,
        source_dict: &mut SourceDict,
    ) -> Result<()> {
        let nominal = format!("Tau_p4_{NANO}");
        for source in std::iter::once(CENTRAL).chain(ENERGY_SCALE_SOURCES) {
            source_dict.register(source, PhysicsObject::Tau)?;
            for &scale in scales_for(source) {
                let syst = syst_name(source, scale)?;
                define_scaled_p4(
                    frame,
                    "Tau",
                    &syst,
                    &[nominal.as_str(), "Tau_decayMode", "Tau_genMatch"],
                    Arc::clone(&self.provider),
                    source.to_string(),
                    scale,
                    |cols, event, object| {
                        let p4 = cols[0].as_p4()?;
                        let dm = cols[1].as_jagged_i32()?;
                        let gm = cols[2].as_jagged_i32()?;
                        Ok(ObjectKinematics {
                            p4: p4[event][object],
                            decay_mode: dm[event][object],
                            gen_match: gm[event][object],
                            ..ObjectKinematics::default()
                        })
                    },
                )?;
                define_delta_p4(frame, "Tau", &syst)?;
            }
        }
        Ok(())
    }
}

/// Producer of per-leg tau identification weight branches.
pub struct TauIdSfProducer {
    provider: Arc<dyn CalibProvider>,
}

impl TauIdSfProducer {
    /// Create from the tau ID provider.
    pub fn new(provider: Arc<dyn CalibProvider>) -> Self {
        Self { provider }
    }

    /// Define `weight_{leg}_TauID_SF_{syst}` branches: the absolute central
    /// weight plus a relative branch per (source, Up/Down).
    pub fn scale_factors(
        &self,
        frame: &mut ColumnFrame,
        legs: &[String],
        is_central: bool,
        return_variations: bool,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        let sources = std::iter::once(CENTRAL)
            .chain(SF_SOURCES_DM)
            .chain(SF_SOURCES_PT);
        for source in sources {
            if source != CENTRAL && !return_variations {
                continue;
            }
            for &scale in scales_for(source) {
                if !is_central && scale != UncScale::Central {
                    continue;
                }
                let syst = syst_name(source, scale)?;
                for leg in legs {
                    let leg_type = format!("{leg}_legType");
                    let leg_p4 = format!("{leg}_p4");
                    let leg_dm = format!("{leg}_decayMode");
                    let leg_gm = format!("{leg}_genMatch");
                    let provider = Arc::clone(&self.provider);
                    let source = source.to_string();
                    define_sf_branch(
                        frame,
                        list,
                        &format!("weight_{leg}_TauID_SF"),
                        &syst,
                        CENTRAL,
                        scale,
                        &[leg_type.as_str(), leg_p4.as_str(), leg_dm.as_str(), leg_gm.as_str()],
                        move |cols| {
                            let leg_type = cols[0].as_scalar()?;
                            let p4 = cols[1].as_event_p4()?;
                            let dm = cols[2].as_scalar()?;
                            let gm = cols[3].as_scalar()?;
                            let mut out = Vec::with_capacity(p4.len());
                            for event in 0..p4.len() {
                                let weight = if leg_type[event] == LegType::Tau.code() {
                                    let kin = ObjectKinematics {
                                        p4: p4[event],
                                        decay_mode: dm[event] as i32,
                                        gen_match: gm[event] as i32,
                                        ..ObjectKinematics::default()
                                    };
                                    provider.evaluate(&kin, &source, scale)?
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
}
