//! Per-sample configuration of the corrections layer.

use nc_core::Period;
use serde::{Deserialize, Serialize};

use crate::provider::CalibKind;
use crate::stitching::StitchingPolicy;

/// A correction the caller requests for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    /// Tau energy scale variations.
    TauEs,
    /// Tau identification scale factors.
    TauId,
    /// AK4 jet energy scale/resolution variations.
    Jec,
    /// AK8 jet energy scale/resolution variations.
    FatJet,
    /// MET propagation of four-momentum shifts.
    Met,
    /// Fixed-working-point b-tagging scale factors.
    Btag,
    /// Shape b-tagging scale factors.
    BtagShape,
    /// Muon reco/ID/iso scale factors (standard and high-pT).
    MuId,
    /// Electron identification scale factors.
    EleId,
    /// Pileup-jet-ID efficiency scale factors.
    PuJetId,
    /// Trigger scale factors.
    Trigger,
    /// Pileup reweighting.
    Pileup,
}

impl Correction {
    /// Calibration datasets this correction needs loaded.
    pub fn calib_kinds(self) -> &'static [CalibKind] {
        match self {
            Correction::TauEs => &[CalibKind::TauEs],
            Correction::TauId => &[CalibKind::TauId],
            Correction::Jec => &[CalibKind::Jet],
            Correction::FatJet => &[CalibKind::FatJet],
            Correction::Met => &[],
            Correction::Btag => &[CalibKind::BTag],
            Correction::BtagShape => &[CalibKind::BTagShape],
            Correction::MuId => &[CalibKind::MuonId, CalibKind::HighPtMuonId],
            Correction::EleId => &[CalibKind::EleId],
            Correction::PuJetId => &[CalibKind::PuJetId],
            Correction::Trigger => &[CalibKind::Trigger],
            Correction::Pileup => &[CalibKind::Pileup],
        }
    }
}

/// Physics process category of a sample, as far as this layer cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleType {
    /// Recorded data.
    Data,
    /// Drell-Yan (stitched with jet-binned samples).
    #[serde(rename = "DY")]
    DrellYan,
    /// W+jets (stitched with jet-binned samples).
    W,
    /// Top pair production.
    TT,
    /// Anything else.
    Other,
}

impl SampleType {
    /// Whether this process combines inclusive and binned samples and
    /// therefore carries a stitching weight.
    pub fn is_stitched(self) -> bool {
        matches!(self, SampleType::DrellYan | SampleType::W)
    }
}

/// Candidate-leg flavour, as encoded in the `{leg}_legType` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegType {
    /// Electron leg.
    Electron,
    /// Muon leg.
    Muon,
    /// Hadronic tau leg.
    Tau,
}

impl LegType {
    /// Numeric code stored in the leg-type columns.
    pub fn code(self) -> f64 {
        match self {
            LegType::Electron => 1.0,
            LegType::Muon => 2.0,
            LegType::Tau => 3.0,
        }
    }
}

/// Trigger paths with scale-factor support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    /// Double-hadronic-tau trigger.
    Ditau,
    /// Single-muon trigger.
    SingleMu,
    /// Single-electron trigger.
    SingleEle,
}

impl TriggerKind {
    /// Name used in column names and as the provider's central context.
    pub fn name(self) -> &'static str {
        match self {
            TriggerKind::Ditau => "ditau",
            TriggerKind::SingleMu => "singleMu",
            TriggerKind::SingleEle => "singleEle",
        }
    }

    /// Leg flavour this trigger fires on.
    pub fn leg_type(self) -> LegType {
        match self {
            TriggerKind::Ditau => LegType::Tau,
            TriggerKind::SingleMu => LegType::Muon,
            TriggerKind::SingleEle => LegType::Electron,
        }
    }

    /// Uncertainty sources of this trigger's scale factor.
    pub fn sources(self) -> &'static [&'static str] {
        match self {
            TriggerKind::Ditau => &["ditau_DM0", "ditau_DM1", "ditau_3Prong"],
            TriggerKind::SingleMu => &["singleMu"],
            TriggerKind::SingleEle => &["singleEle"],
        }
    }
}

/// Configuration of the corrections layer for one sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionsConfig {
    /// Data-taking period.
    pub period: Period,
    /// Process category.
    pub sample_type: SampleType,
    /// Whether the sample is recorded data.
    pub is_data: bool,
    /// Requested corrections; producers for anything else never load.
    pub corrections: Vec<Correction>,
    /// Integrated luminosity the sample is normalized to.
    pub luminosity: f64,
    /// Process cross-section.
    pub cross_section: f64,
    /// Sample-stitching policy (versioned, never hard-coded).
    #[serde(default)]
    pub stitching: StitchingPolicy,
    /// Candidate lepton-leg names, in leg order.
    #[serde(default = "default_lepton_legs")]
    pub lepton_legs: Vec<String>,
    /// Candidate b-jet leg names, in leg order.
    #[serde(default = "default_jet_legs")]
    pub jet_legs: Vec<String>,
    /// Triggers whose scale factors are produced.
    #[serde(default)]
    pub triggers: Vec<TriggerKind>,
    /// DeepTau discriminator version tag.
    #[serde(default = "default_deep_tau")]
    pub deep_tau_version: String,
}

fn default_lepton_legs() -> Vec<String> {
    vec!["tau1".into(), "tau2".into()]
}

fn default_jet_legs() -> Vec<String> {
    vec!["b1".into(), "b2".into()]
}

fn default_deep_tau() -> String {
    "DeepTau2017v2p1".into()
}

impl CorrectionsConfig {
    /// Create a configuration with no corrections requested.
    pub fn new(period: Period, sample_type: SampleType) -> Self {
        Self {
            period,
            sample_type,
            is_data: sample_type == SampleType::Data,
            corrections: Vec::new(),
            luminosity: 1.0,
            cross_section: 1.0,
            stitching: StitchingPolicy::default(),
            lepton_legs: default_lepton_legs(),
            jet_legs: default_jet_legs(),
            triggers: Vec::new(),
            deep_tau_version: default_deep_tau(),
        }
    }

    /// Request a correction.
    pub fn correction(mut self, correction: Correction) -> Self {
        self.corrections.push(correction);
        self
    }

    /// Set the luminosity and cross-section normalization.
    pub fn normalization(mut self, luminosity: f64, cross_section: f64) -> Self {
        self.luminosity = luminosity;
        self.cross_section = cross_section;
        self
    }

    /// Set the stitching policy.
    pub fn stitching(mut self, policy: StitchingPolicy) -> Self {
        self.stitching = policy;
        self
    }

    /// Set the lepton-leg names.
    pub fn lepton_legs(mut self, legs: &[&str]) -> Self {
        self.lepton_legs = legs.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Enable a trigger.
    pub fn trigger(mut self, trigger: TriggerKind) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Whether `correction` was requested.
    pub fn has(&self, correction: Correction) -> bool {
        self.corrections.contains(&correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates() {
        let cfg = CorrectionsConfig::new(Period::Run2_2018, SampleType::DrellYan)
            .correction(Correction::TauEs)
            .correction(Correction::Met)
            .normalization(59.8, 10.0)
            .trigger(TriggerKind::Ditau);
        assert!(cfg.has(Correction::TauEs));
        assert!(!cfg.has(Correction::Pileup));
        assert_eq!(cfg.luminosity, 59.8);
        assert!(!cfg.is_data);
        assert_eq!(cfg.triggers, vec![TriggerKind::Ditau]);
    }

    #[test]
    fn config_deserializes_from_json() {
        let cfg: CorrectionsConfig = serde_json::from_str(
            r#"{
                "period": "Run2_2018",
                "sample_type": "DY",
                "is_data": false,
                "corrections": ["tau_es", "met", "pileup"],
                "luminosity": 59.8,
                "cross_section": 10.0,
                "stitching": {"policy": "two_bin"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.sample_type, SampleType::DrellYan);
        assert_eq!(cfg.corrections, vec![Correction::TauEs, Correction::Met, Correction::Pileup]);
        assert_eq!(cfg.lepton_legs, vec!["tau1", "tau2"]);
    }
}
