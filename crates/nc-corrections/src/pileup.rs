//! Pileup reweighting.

use std::sync::Arc;

use nc_core::{ObjectKinematics, Result, UncScale, WeightBranchList, CENTRAL};
use nc_frame::{Column, ColumnFrame};

use crate::branches::define_sf_branch;
use crate::provider::CalibProvider;

/// Pileup uncertainty source name.
pub const SOURCE: &str = "pu";

/// Producer of the per-event pileup weight branches.
pub struct PuWeightProducer {
    provider: Arc<dyn CalibProvider>,
}

impl PuWeightProducer {
    /// Create from the pileup provider.
    pub fn new(provider: Arc<dyn CalibProvider>) -> Self {
        Self { provider }
    }

    /// Define `puWeight_Central` (absolute, entering the total event weight)
    /// and the relative branches `puWeight_pu{Up,Down}_rel`, all computed
    /// from the true pileup interaction count.
    pub fn weights(
        &self,
        frame: &mut ColumnFrame,
        is_central: bool,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        for scale in [UncScale::Central, UncScale::Up, UncScale::Down] {
            if !is_central && scale != UncScale::Central {
                continue;
            }
            let syst = if scale == UncScale::Central {
                CENTRAL.to_string()
            } else {
                format!("{SOURCE}{scale}")
            };
            let provider = Arc::clone(&self.provider);
            define_sf_branch(
                frame,
                list,
                "puWeight",
                &syst,
                CENTRAL,
                scale,
                &["Pileup_nTrueInt"],
                move |cols| {
                    let n_true = cols[0].as_scalar()?;
                    let mut out = Vec::with_capacity(n_true.len());
                    for &n in n_true {
                        let kin = ObjectKinematics { n_true_int: n, ..ObjectKinematics::default() };
                        out.push(provider.evaluate(&kin, SOURCE, scale)?);
                    }
                    Ok(Column::Scalar(out))
                },
            )?;
        }
        Ok(())
    }
}
