//! Pileup-jet-ID efficiency scale factors.

use std::sync::Arc;

use nc_core::{scales_for, syst_name, ObjectKinematics, Result, UncScale, WeightBranchList, CENTRAL};
use nc_frame::{Column, ColumnFrame};

use crate::branches::define_sf_branch;
use crate::provider::CalibProvider;

/// Pileup-jet-ID uncertainty sources.
pub const SF_SOURCES: [&str; 1] = ["PUJetID_eff"];

/// Working point the efficiencies are measured at.
pub const WORKING_POINT: &str = "L";

/// Central branch suffix. The pileup-jet-ID branches carry a qualified
/// central name instead of the plain `Central`.
pub const CENTRAL_SYST: &str = "PUJetID_Central";

/// Producer of per-b-jet-leg pileup-jet-ID weight branches.
pub struct PuJetIdSfProducer {
    provider: Arc<dyn CalibProvider>,
}

impl PuJetIdSfProducer {
    /// Create from the pileup-jet-ID provider.
    pub fn new(provider: Arc<dyn CalibProvider>) -> Self {
        Self { provider }
    }

    /// Define `weight_{leg}_PUJetID_Central` and the relative variation
    /// branches `weight_{leg}_PUJetID_eff{Up,Down}_rel` per b-jet leg.
    pub fn scale_factors(
        &self,
        frame: &mut ColumnFrame,
        legs: &[String],
        is_central: bool,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        for source in std::iter::once(CENTRAL).chain(SF_SOURCES) {
            for &scale in scales_for(source) {
                if !is_central && scale != UncScale::Central {
                    continue;
                }
                let syst = if source == CENTRAL {
                    CENTRAL_SYST.to_string()
                } else {
                    syst_name(source, scale)?
                };
                for leg in legs {
                    let leg_p4 = format!("{leg}_p4");
                    let provider = Arc::clone(&self.provider);
                    let source = source.to_string();
                    define_sf_branch(
                        frame,
                        list,
                        &format!("weight_{leg}"),
                        &syst,
                        CENTRAL_SYST,
                        scale,
                        &[leg_p4.as_str()],
                        move |cols| {
                            let p4 = cols[0].as_event_p4()?;
                            let mut out = Vec::with_capacity(p4.len());
                            for event in 0..p4.len() {
                                let kin = ObjectKinematics::from_p4(p4[event]);
                                out.push(provider.evaluate_at(
                                    &kin,
                                    WORKING_POINT,
                                    &source,
                                    scale,
                                )?);
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
