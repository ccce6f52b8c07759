//! Electron identification scale factors.

use std::sync::Arc;

use nc_core::{ObjectKinematics, Result, UncScale, WeightBranchList, CENTRAL};
use nc_frame::{Column, ColumnFrame};

use crate::branches::define_sf_branch;
use crate::config::LegType;
use crate::provider::CalibProvider;

/// Electron ID uncertainty sources.
pub const SF_SOURCES: [&str; 1] = ["EleID"];

/// Working point the ID factors are measured at.
pub const WORKING_POINT: &str = "wp80iso";

/// Producer of per-leg electron ID weight branches.
pub struct EleIdSfProducer {
    provider: Arc<dyn CalibProvider>,
}

impl EleIdSfProducer {
    /// Create from the electron ID provider.
    pub fn new(provider: Arc<dyn CalibProvider>) -> Self {
        Self { provider }
    }

    /// Define `weight_{leg}_EleSF_{source}{scale}` branches; the factor is 1
    /// for non-electron legs.
    pub fn scale_factors(
        &self,
        frame: &mut ColumnFrame,
        legs: &[String],
        is_central: bool,
        return_variations: bool,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        let scales = if return_variations {
            &[UncScale::Central, UncScale::Up, UncScale::Down][..]
        } else {
            &[UncScale::Central][..]
        };
        for source in SF_SOURCES {
            for &scale in scales {
                if !is_central && scale != UncScale::Central {
                    continue;
                }
                let syst = format!("{source}{scale}");
                let central_syst = format!("{source}{CENTRAL}");
                for leg in legs {
                    let leg_type = format!("{leg}_legType");
                    let leg_p4 = format!("{leg}_p4");
                    let leg_gm = format!("{leg}_genMatch");
                    let provider = Arc::clone(&self.provider);
                    define_sf_branch(
                        frame,
                        list,
                        &format!("weight_{leg}_EleSF"),
                        &syst,
                        &central_syst,
                        scale,
                        &[leg_type.as_str(), leg_p4.as_str(), leg_gm.as_str()],
                        move |cols| {
                            let leg_type = cols[0].as_scalar()?;
                            let p4 = cols[1].as_event_p4()?;
                            let gm = cols[2].as_scalar()?;
                            let mut out = Vec::with_capacity(p4.len());
                            for event in 0..p4.len() {
                                let weight = if leg_type[event] == LegType::Electron.code() {
                                    let kin = ObjectKinematics {
                                        p4: p4[event],
                                        gen_match: gm[event] as i32,
                                        ..ObjectKinematics::default()
                                    };
                                    provider.evaluate_at(&kin, WORKING_POINT, source, scale)?
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
