//! Trigger scale factors.
//!
//! A trigger factor applies to a leg only when the leg has the right flavour,
//! the trigger fired, and the leg matches the trigger object; the per-leg
//! apply flag combining those three is materialized as its own column so
//! downstream selections can reuse it.

use std::sync::Arc;

use nc_core::{scales_for, syst_name, ObjectKinematics, Result, UncScale, WeightBranchList, CENTRAL};
use nc_frame::{Column, ColumnFrame};

use crate::branches::define_sf_branch;
use crate::config::TriggerKind;
use crate::provider::CalibProvider;

/// Producer of per-leg trigger weight branches.
pub struct TrigSfProducer {
    provider: Arc<dyn CalibProvider>,
}

impl TrigSfProducer {
    /// Create from the trigger provider.
    pub fn new(provider: Arc<dyn CalibProvider>) -> Self {
        Self { provider }
    }

    /// Define, per trigger and leg, the `{trg}_{leg}_ApplyTrgSF` flag and the
    /// `weight_{leg}_TrgSF_...` branches.
    ///
    /// The central branch is `weight_{leg}_TrgSF_{trg}_Central`, one per
    /// trigger; variation branches are relative to it.
    pub fn scale_factors(
        &self,
        frame: &mut ColumnFrame,
        triggers: &[TriggerKind],
        legs: &[String],
        is_central: bool,
        return_variations: bool,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        for &trigger in triggers {
            let trg = trigger.name();
            let hlt = format!("HLT_{trg}");
            for leg in legs {
                let flag = format!("{trg}_{leg}_ApplyTrgSF");
                let leg_type = format!("{leg}_legType");
                let matching = format!("{leg}_HasMatching_{trg}");
                let leg_code = trigger.leg_type().code();
                frame.define(
                    flag.clone(),
                    &[leg_type.as_str(), hlt.as_str(), matching.as_str()],
                    move |cols| {
                        let leg_type = cols[0].as_scalar()?;
                        let fired = cols[1].as_scalar()?;
                        let matched = cols[2].as_scalar()?;
                        let out = (0..leg_type.len())
                            .map(|event| {
                                let apply = leg_type[event] == leg_code
                                    && fired[event] != 0.0
                                    && matched[event] != 0.0;
                                if apply {
                                    1.0
                                } else {
                                    0.0
                                }
                            })
                            .collect();
                        Ok(Column::Scalar(out))
                    },
                )?;

                let sources: Vec<&str> = if return_variations {
                    std::iter::once(CENTRAL).chain(trigger.sources().iter().copied()).collect()
                } else {
                    vec![CENTRAL]
                };
                for source in sources {
                    for &scale in scales_for(source) {
                        if !is_central && scale != UncScale::Central {
                            continue;
                        }
                        // Central branches are qualified per trigger; the
                        // provider resolves the central source from the
                        // trigger name.
                        let (syst, provider_source) = if source == CENTRAL {
                            (format!("{trg}_{CENTRAL}"), trg.to_string())
                        } else {
                            (syst_name(source, scale)?, source.to_string())
                        };
                        let central_syst = format!("{trg}_{CENTRAL}");
                        let leg_p4 = format!("{leg}_p4");
                        let leg_dm = format!("{leg}_decayMode");
                        let provider = Arc::clone(&self.provider);
                        define_sf_branch(
                            frame,
                            list,
                            &format!("weight_{leg}_TrgSF"),
                            &syst,
                            &central_syst,
                            scale,
                            &[flag.as_str(), leg_p4.as_str(), leg_dm.as_str()],
                            move |cols| {
                                let apply = cols[0].as_scalar()?;
                                let p4 = cols[1].as_event_p4()?;
                                let dm = cols[2].as_scalar()?;
                                let mut out = Vec::with_capacity(p4.len());
                                for event in 0..p4.len() {
                                    let weight = if apply[event] != 0.0 {
                                        let kin = ObjectKinematics {
                                            p4: p4[event],
                                            decay_mode: dm[event] as i32,
                                            ..ObjectKinematics::default()
                                        };
                                        provider.evaluate(&kin, &provider_source, scale)?
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
        }
        Ok(())
    }
}
