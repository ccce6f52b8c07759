//! Aggregator facade over the correction producers.

use nc_core::{
    scales_for, syst_name, Error, Result, SourceDict, WeightBranchList, CENTRAL, NANO,
    PhysicsObject,
};
use nc_frame::{Column, ColumnFrame};
use tracing::{debug, warn};

use crate::btag::BTagSfProducer;
use crate::btag_shape::BTagShapeProducer;
use crate::config::{Correction, CorrectionsConfig};
use crate::electron::EleIdSfProducer;
use crate::fatjet::FatJetCorrProducer;
use crate::jet::JetCorrProducer;
use crate::met::MetProducer;
use crate::mu::MuIdSfProducer;
use crate::pileup::PuWeightProducer;
use crate::provider::{CalibContext, CalibKind, ProviderFactory};
use crate::pu_jet_id::PuJetIdSfProducer;
use crate::registry::CalibRegistry;
use crate::stitching::StitchingPolicy;
use crate::tau::{TauEsProducer, TauIdSfProducer};
use crate::trigger::TrigSfProducer;

/// Ordered systematic-name → source map returned by the scale-uncertainty
/// pass.
#[derive(Debug, Clone, Default)]
pub struct SystematicsMap {
    entries: Vec<(String, String)>,
}

impl SystematicsMap {
    /// Source of a systematic name.
    pub fn source(&self, syst: &str) -> Option<&str> {
        self.entries.iter().find(|(s, _)| s == syst).map(|(_, src)| src.as_str())
    }

    /// Systematic names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(s, _)| s.as_str()).collect()
    }

    /// Iterate over (systematic, source) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, src)| (s.as_str(), src.as_str()))
    }

    /// Number of systematics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, syst: String, source: String) {
        self.entries.push((syst, source));
    }
}

/// The configured corrections for one sample: owns the providers and the
/// producers built from them.
pub struct Corrections {
    config: CorrectionsConfig,
    tau_es: Option<TauEsProducer>,
    tau_id: Option<TauIdSfProducer>,
    jet: Option<JetCorrProducer>,
    fatjet: Option<FatJetCorrProducer>,
    met: Option<MetProducer>,
    btag: Option<BTagSfProducer>,
    btag_shape: Option<BTagShapeProducer>,
    mu_id: Option<MuIdSfProducer>,
    ele_id: Option<EleIdSfProducer>,
    pu_jet_id: Option<PuJetIdSfProducer>,
    trigger: Option<TrigSfProducer>,
    pileup: Option<PuWeightProducer>,
}

impl std::fmt::Debug for Corrections {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corrections")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Corrections {
    /// Load the providers for every requested correction and build the
    /// producers. Loading is eager: a missing calibration dataset fails here,
    /// not at first evaluation.
    pub fn initialize(
        config: CorrectionsConfig,
        factory: &dyn ProviderFactory,
        ctx: &CalibContext,
    ) -> Result<Self> {
        for (i, correction) in config.corrections.iter().enumerate() {
            if config.corrections[..i].contains(correction) {
                return Err(Error::Config(format!(
                    "correction {correction:?} requested more than once"
                )));
            }
        }
        let registry = CalibRegistry::build(factory, ctx, &config.corrections)?;
        let period = config.period;
        let mut corrections = Self {
            config,
            tau_es: None,
            tau_id: None,
            jet: None,
            fatjet: None,
            met: None,
            btag: None,
            btag_shape: None,
            mu_id: None,
            ele_id: None,
            pu_jet_id: None,
            trigger: None,
            pileup: None,
        };
        for correction in corrections.config.corrections.clone() {
            match correction {
                Correction::TauEs => {
                    corrections.tau_es =
                        Some(TauEsProducer::new(registry.get(CalibKind::TauEs)?));
                }
                Correction::TauId => {
                    corrections.tau_id =
                        Some(TauIdSfProducer::new(registry.get(CalibKind::TauId)?));
                }
                Correction::Jec => {
                    corrections.jet =
                        Some(JetCorrProducer::new(registry.get(CalibKind::Jet)?, period));
                }
                Correction::FatJet => {
                    corrections.fatjet = Some(FatJetCorrProducer::new(
                        registry.get(CalibKind::FatJet)?,
                        period,
                    ));
                }
                Correction::Met => {
                    corrections.met = Some(MetProducer);
                }
                Correction::Btag => {
                    corrections.btag = Some(BTagSfProducer::new(registry.btag()?));
                }
                Correction::BtagShape => {
                    corrections.btag_shape = Some(BTagShapeProducer::new(
                        registry.get(CalibKind::BTagShape)?,
                        period.year(),
                    ));
                }
                Correction::MuId => {
                    corrections.mu_id = Some(MuIdSfProducer::new(
                        registry.get(CalibKind::MuonId)?,
                        registry.get(CalibKind::HighPtMuonId)?,
                    ));
                }
                Correction::EleId => {
                    corrections.ele_id =
                        Some(EleIdSfProducer::new(registry.get(CalibKind::EleId)?));
                }
                Correction::PuJetId => {
                    corrections.pu_jet_id =
                        Some(PuJetIdSfProducer::new(registry.get(CalibKind::PuJetId)?));
                }
                Correction::Trigger => {
                    corrections.trigger =
                        Some(TrigSfProducer::new(registry.get(CalibKind::Trigger)?));
                }
                Correction::Pileup => {
                    corrections.pileup =
                        Some(PuWeightProducer::new(registry.get(CalibKind::Pileup)?));
                }
            }
        }
        debug!(
            corrections = corrections.config.corrections.len(),
            period = %corrections.config.period.dataset_tag(),
            "corrections initialized"
        );
        Ok(corrections)
    }

    /// The per-sample configuration.
    pub fn config(&self) -> &CorrectionsConfig {
        &self.config
    }

    /// Run the four-momentum producers and MET propagation, then complete
    /// the column set: for every systematic, objects untouched by its source
    /// get a pass-through alias to their central column when one exists,
    /// otherwise to the raw input column. Returns the ordered systematic →
    /// source map.
    ///
    /// On recorded data nothing is defined and the map is empty.
    pub fn apply_scale_uncertainties(&self, frame: &mut ColumnFrame) -> Result<SystematicsMap> {
        let mut map = SystematicsMap::default();
        if self.config.is_data {
            return Ok(map);
        }
        let mut source_dict = SourceDict::new();
        if let Some(tau_es) = &self.tau_es {
            tau_es.energy_scales(frame, &mut source_dict)?;
        }
        if let Some(jet) = &self.jet {
            jet.p4_variations(frame, &mut source_dict)?;
            jet.energy_resolution(frame)?;
        }
        if let Some(fatjet) = &self.fatjet {
            fatjet.p4_variations(frame, &mut source_dict)?;
            fatjet.energy_resolution(frame)?;
        }
        if let Some(met) = &self.met {
            met.shift(frame, &mut source_dict)?;
        }

        let entries: Vec<(String, Vec<PhysicsObject>)> = source_dict
            .iter()
            .map(|(source, objects)| (source.to_string(), objects.to_vec()))
            .collect();
        for (source, objects) in entries {
            for &scale in scales_for(&source) {
                let syst = syst_name(&source, scale)?;
                for obj in PhysicsObject::ALL {
                    if objects.contains(&obj) {
                        continue;
                    }
                    let central = format!("{}_p4_{CENTRAL}", obj.name());
                    let target = if source_dict.contains(CENTRAL, obj) && frame.contains(&central)
                    {
                        central
                    } else {
                        format!("{}_p4_{NANO}", obj.name())
                    };
                    // Objects absent from the input tree are skipped rather
                    // than failing the whole pass.
                    if frame.contains(&target) {
                        frame.alias(format!("{}_p4_{syst}", obj.name()), &target)?;
                    } else {
                        warn!(
                            object = obj.name(),
                            column = %target,
                            "momentum column missing from the input tree; \
                             pass-through skipped"
                        );
                    }
                }
                map.insert(syst, source.clone());
            }
        }
        debug!(systematics = map.len(), "scale uncertainties applied");
        Ok(map)
    }

    /// Run the weight producers and define the normalization columns:
    /// `w_genWeightD` (the generator-weight sign), the stitching weight from
    /// the configured policy, and the absolute
    /// `weight_total_Central = sign × luminosity × crossSection × stitching
    /// × puWeight_Central`. Returns the ordered weight-branch list.
    ///
    /// On recorded data no weights are defined and the list is empty.
    pub fn apply_event_weights(&self, frame: &mut ColumnFrame) -> Result<WeightBranchList> {
        let mut list = WeightBranchList::new();
        if self.config.is_data {
            return Ok(list);
        }
        if let Some(pileup) = &self.pileup {
            pileup.weights(frame, true, &mut list)?;
        }
        if let Some(tau_id) = &self.tau_id {
            tau_id.scale_factors(frame, &self.config.lepton_legs, true, true, &mut list)?;
        }
        if let Some(mu_id) = &self.mu_id {
            mu_id.scale_factors(frame, &self.config.lepton_legs, true, true, &mut list)?;
            mu_id.high_pt_scale_factors(
                frame,
                &self.config.lepton_legs,
                true,
                true,
                &mut list,
            )?;
        }
        if let Some(ele_id) = &self.ele_id {
            ele_id.scale_factors(frame, &self.config.lepton_legs, true, true, &mut list)?;
        }
        if let Some(pu_jet_id) = &self.pu_jet_id {
            pu_jet_id.scale_factors(frame, &self.config.jet_legs, true, &mut list)?;
        }
        if let Some(trigger) = &self.trigger {
            trigger.scale_factors(
                frame,
                &self.config.triggers,
                &self.config.lepton_legs,
                true,
                true,
                &mut list,
            )?;
        }
        if let Some(btag) = &self.btag {
            btag.working_point_id(frame)?;
            btag.scale_factors(frame, true, true, &mut list)?;
        }
        if let Some(btag_shape) = &self.btag_shape {
            btag_shape.scale_factors(frame, true, true, &mut list)?;
        }

        self.define_normalization(frame, &mut list)?;
        debug!(weights = list.len(), "event weights applied");
        Ok(list)
    }

    fn define_normalization(
        &self,
        frame: &mut ColumnFrame,
        list: &mut WeightBranchList,
    ) -> Result<()> {
        frame.define("w_genWeightD", &["genWeight"], |cols| {
            let gen = cols[0].as_scalar()?;
            Ok(Column::Scalar(gen.iter().map(|w| 1.0_f64.copysign(*w)).collect()))
        })?;
        list.push_central("w_genWeightD");

        let stitched = self.config.sample_type.is_stitched()
            && self.config.stitching != StitchingPolicy::None;
        if stitched {
            if !frame.contains("LHE_Njets") || !frame.contains("LHE_Vpt") {
                return Err(Error::Config(
                    "stitching policy configured but LHE_Njets/LHE_Vpt are missing \
                     from the input tree"
                        .into(),
                ));
            }
            let policy = self.config.stitching.clone();
            frame.define("stitchWeight", &["LHE_Njets", "LHE_Vpt"], move |cols| {
                let n_jets = cols[0].as_scalar()?;
                let v_pt = cols[1].as_scalar()?;
                Ok(Column::Scalar(
                    n_jets
                        .iter()
                        .zip(v_pt)
                        .map(|(n, pt)| policy.weight(*n, *pt))
                        .collect(),
                ))
            })?;
        } else {
            let n = frame.n_events();
            frame.define("stitchWeight", &[], move |_| Ok(Column::Scalar(vec![1.0; n])))?;
        }

        let norm = self.config.luminosity * self.config.cross_section;
        let mut inputs = vec!["w_genWeightD", "stitchWeight"];
        let has_pu = self.config.has(Correction::Pileup);
        if has_pu {
            inputs.push("puWeight_Central");
        }
        frame.define("weight_total_Central", &inputs, move |cols| {
            let sign = cols[0].as_scalar()?;
            let stitch = cols[1].as_scalar()?;
            let pu: Option<&[f64]> = if has_pu { Some(cols[2].as_scalar()?) } else { None };
            let mut out = Vec::with_capacity(sign.len());
            for event in 0..sign.len() {
                let pu_weight = pu.map_or(1.0, |p| p[event]);
                out.push(sign[event] * norm * stitch[event] * pu_weight);
            }
            Ok(Column::Scalar(out))
        })?;
        list.push_central("weight_total_Central");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleType;
    use crate::provider::tests::ShiftProvider;
    use crate::provider::{BTagProvider, CalibProvider};
    use crate::stitching::StitchingPolicy;
    use approx::assert_relative_eq;
    use nc_core::{Error, ObjectKinematics, Period, UncScale};
    use std::sync::Arc;

    struct StubFactory;

    struct StubBTag;

    impl BTagProvider for StubBTag {
        fn evaluate_wp(
            &self,
            _: &ObjectKinematics,
            _: crate::provider::BTagWorkingPoint,
            _: &str,
            _: UncScale,
        ) -> Result<f64> {
            Ok(1.0)
        }

        fn wp_value(&self, _: crate::provider::BTagWorkingPoint) -> f64 {
            0.5
        }
    }

    impl ProviderFactory for StubFactory {
        fn load(
            &self,
            _kind: CalibKind,
            _ctx: &CalibContext,
        ) -> Result<Arc<dyn CalibProvider>> {
            Ok(Arc::new(ShiftProvider::new(0.05)))
        }

        fn load_btag(&self, _ctx: &CalibContext) -> Result<Arc<dyn BTagProvider>> {
            Ok(Arc::new(StubBTag))
        }
    }

    fn ctx() -> CalibContext {
        CalibContext::new(Period::Run2_2018, false, "/tmp/calib")
    }

    #[test]
    fn data_samples_produce_nothing() {
        let config = CorrectionsConfig::new(Period::Run2_2018, SampleType::Data)
            .correction(Correction::TauEs);
        let corrections = Corrections::initialize(config, &StubFactory, &ctx()).unwrap();
        let mut frame = ColumnFrame::new(1);
        let map = corrections.apply_scale_uncertainties(&mut frame).unwrap();
        assert!(map.is_empty());
        let list = corrections.apply_event_weights(&mut frame).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn normalization_combines_sign_lumi_xs_stitch_and_pileup() {
        /// Pileup weight fixed at 0.9.
        struct FixedPu;
        impl CalibProvider for FixedPu {
            fn evaluate(&self, _: &ObjectKinematics, _: &str, _: UncScale) -> Result<f64> {
                Ok(0.9)
            }
        }
        struct PuFactory;
        impl ProviderFactory for PuFactory {
            fn load(&self, _: CalibKind, _: &CalibContext) -> Result<Arc<dyn CalibProvider>> {
                Ok(Arc::new(FixedPu))
            }
            fn load_btag(&self, _: &CalibContext) -> Result<Arc<dyn BTagProvider>> {
                Err(Error::Config("not needed".into()))
            }
        }

        let config = CorrectionsConfig::new(Period::Run2_2018, SampleType::TT)
            .correction(Correction::Pileup)
            .normalization(59.8, 10.0);
        let corrections = Corrections::initialize(config, &PuFactory, &ctx()).unwrap();

        let mut frame = ColumnFrame::new(1);
        frame.insert_input("genWeight", Column::Scalar(vec![-3.7])).unwrap();
        frame.insert_input("Pileup_nTrueInt", Column::Scalar(vec![32.0])).unwrap();
        let list = corrections.apply_event_weights(&mut frame).unwrap();

        let total = frame.evaluate("weight_total_Central").unwrap();
        assert_relative_eq!(
            total.as_scalar().unwrap()[0],
            -1.0 * 59.8 * 10.0 * 0.9,
            max_relative = 1e-12
        );
        let names = list.names();
        assert!(names.contains(&"puWeight_Central"));
        assert!(names.contains(&"w_genWeightD"));
        assert_eq!(*names.last().unwrap(), "weight_total_Central");
    }

    #[test]
    fn duplicate_correction_request_is_a_config_error() {
        let config = CorrectionsConfig::new(Period::Run2_2018, SampleType::TT)
            .correction(Correction::TauEs)
            .correction(Correction::Met)
            .correction(Correction::TauEs);
        let err = Corrections::initialize(config, &StubFactory, &ctx()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn stitched_sample_without_generator_columns_is_a_config_error() {
        let config = CorrectionsConfig::new(Period::Run2_2018, SampleType::DrellYan)
            .stitching(StitchingPolicy::two_bin());
        let corrections = Corrections::initialize(config, &StubFactory, &ctx()).unwrap();

        let mut frame = ColumnFrame::new(1);
        frame.insert_input("genWeight", Column::Scalar(vec![1.0])).unwrap();
        let err = corrections.apply_event_weights(&mut frame).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn stitching_policy_feeds_the_total_weight() {
        let config = CorrectionsConfig::new(Period::Run2_2018, SampleType::DrellYan)
            .normalization(1.0, 1.0)
            .stitching(StitchingPolicy::two_bin());
        let corrections = Corrections::initialize(config, &StubFactory, &ctx()).unwrap();

        let mut frame = ColumnFrame::new(2);
        frame.insert_input("genWeight", Column::Scalar(vec![1.0, 1.0])).unwrap();
        frame.insert_input("LHE_Njets", Column::Scalar(vec![0.0, 2.0])).unwrap();
        frame.insert_input("LHE_Vpt", Column::Scalar(vec![0.0, 55.0])).unwrap();
        corrections.apply_event_weights(&mut frame).unwrap();

        let total = frame.evaluate("weight_total_Central").unwrap();
        let total = total.as_scalar().unwrap();
        assert_relative_eq!(total[0], 0.5, max_relative = 1e-12);
        assert_relative_eq!(total[1], 1.0 / 3.0, max_relative = 1e-12);
    }
}
