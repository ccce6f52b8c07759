//! Sample-stitching weights.
//!
//! When an inclusive sample is combined with exclusive jet- or pT-binned
//! samples, overlapping phase space must not be double counted. The exact
//! split is an analysis policy that has changed between revisions, so it is
//! a versioned configuration value rather than hard-coded arithmetic.

use serde::{Deserialize, Serialize};

/// Stitching policy, selected per sample in the configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum StitchingPolicy {
    /// No stitching; weight is 1.
    #[default]
    None,
    /// Two-bin split on the generator-level vector-boson pT.
    TwoBin {
        /// Weight for events with vanishing boson pT.
        #[serde(default = "default_vpt_zero")]
        vpt_zero: f64,
        /// Weight for events with positive boson pT.
        #[serde(default = "default_vpt_positive")]
        vpt_positive: f64,
    },
    /// Split binned in generator-level jet multiplicity; out-of-range
    /// multiplicities clamp to the last bin.
    JetBinned {
        /// Weight per jet-multiplicity bin, starting at zero jets.
        weights: Vec<f64>,
    },
}

fn default_vpt_zero() -> f64 {
    0.5
}

fn default_vpt_positive() -> f64 {
    1.0 / 3.0
}

impl StitchingPolicy {
    /// The two-bin policy with its default 1/2 vs 1/3 split.
    pub fn two_bin() -> Self {
        StitchingPolicy::TwoBin {
            vpt_zero: default_vpt_zero(),
            vpt_positive: default_vpt_positive(),
        }
    }

    /// Stitching weight for one event, from the generator-level jet
    /// multiplicity and vector-boson pT.
    pub fn weight(&self, n_jets: f64, v_pt: f64) -> f64 {
        match self {
            StitchingPolicy::None => 1.0,
            StitchingPolicy::TwoBin { vpt_zero, vpt_positive } => {
                if v_pt > 0.0 {
                    *vpt_positive
                } else {
                    *vpt_zero
                }
            }
            StitchingPolicy::JetBinned { weights } => {
                if weights.is_empty() {
                    return 1.0;
                }
                let bin = (n_jets.max(0.0) as usize).min(weights.len() - 1);
                weights[bin]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn two_bin_splits_on_boson_pt() {
        let policy = StitchingPolicy::two_bin();
        assert_relative_eq!(policy.weight(0.0, 0.0), 0.5);
        assert_relative_eq!(policy.weight(2.0, 35.0), 1.0 / 3.0);
    }

    #[test]
    fn jet_binned_clamps_to_last_bin() {
        let policy = StitchingPolicy::JetBinned { weights: vec![1.0, 0.4, 0.25] };
        assert_relative_eq!(policy.weight(0.0, 0.0), 1.0);
        assert_relative_eq!(policy.weight(1.0, 0.0), 0.4);
        assert_relative_eq!(policy.weight(7.0, 0.0), 0.25);
    }

    #[test]
    fn none_is_unity() {
        assert_relative_eq!(StitchingPolicy::None.weight(3.0, 120.0), 1.0);
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: StitchingPolicy = serde_json::from_str(r#"{"policy": "two_bin"}"#).unwrap();
        assert_relative_eq!(policy.weight(0.0, 0.0), 0.5);
        assert_relative_eq!(policy.weight(0.0, 10.0), 1.0 / 3.0);
    }
}
