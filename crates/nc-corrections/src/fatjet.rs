//! AK8 (fat) jet energy scale/resolution variations.
//!
//! Same sources and naming as the AK4 producer; only the object prefix and
//! calibration dataset differ.

use std::sync::Arc;

use nc_core::{Period, PhysicsObject, Result, SourceDict};
use nc_frame::ColumnFrame;

use crate::jet::{define_object_variations, define_resolution, JES_SOURCES};
use crate::provider::CalibProvider;

/// Producer of AK8 jet four-momentum variations.
pub struct FatJetCorrProducer {
    provider: Arc<dyn CalibProvider>,
    year: &'static str,
}

impl FatJetCorrProducer {
    /// Create from the AK8 jet calibration provider.
    pub fn new(provider: Arc<dyn CalibProvider>, period: Period) -> Self {
        Self { provider, year: period.year() }
    }

    /// Define `FatJet_p4_<syst>` and `FatJet_p4_<syst>_delta` for the
    /// central value and every JES/JER source.
    pub fn p4_variations(
        &self,
        frame: &mut ColumnFrame,
        source_dict: &mut SourceDict,
    ) -> Result<()> {
        define_object_variations(
            frame,
            source_dict,
            "FatJet",
            PhysicsObject::FatJet,
            &JES_SOURCES,
            Arc::clone(&self.provider),
            self.year,
        )
    }

    /// Define the per-jet `FatJet_ptRes` resolution column.
    pub fn energy_resolution(&self, frame: &mut ColumnFrame) -> Result<()> {
        define_resolution(frame, "FatJet", Arc::clone(&self.provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::ShiftProvider;
    use approx::assert_relative_eq;
    use nc_core::FourVector;
    use nc_frame::Column;

    #[test]
    fn variations_share_jet_sources_under_fatjet_prefix() {
        let mut frame = ColumnFrame::new(1);
        frame
            .insert_input(
                "FatJet_p4_nano",
                Column::P4(vec![vec![FourVector::from_ptetaphim(350.0, 0.2, 1.0, 80.0)]]),
            )
            .unwrap();
        let mut dict = SourceDict::new();
        let producer =
            FatJetCorrProducer::new(Arc::new(ShiftProvider::new(0.03)), Period::Run2_2017);
        producer.p4_variations(&mut frame, &mut dict).unwrap();

        assert!(dict.contains("JES_BBEC1_2017", PhysicsObject::FatJet));
        assert!(frame.contains("FatJet_p4_JERUp"));
        assert!(frame.contains("FatJet_p4_JES_TotalDown_delta"));

        let up = frame.evaluate("FatJet_p4_JERUp").unwrap();
        assert_relative_eq!(up.as_p4().unwrap()[0][0].pt(), 350.0 * 1.03, max_relative = 1e-12);
    }

    #[test]
    fn jet_and_fatjet_sources_coexist_in_one_dict() {
        let mut dict = SourceDict::new();
        dict.register("JER", PhysicsObject::Jet).unwrap();
        // Registering the same source for a different object is fine.
        dict.register("JER", PhysicsObject::FatJet).unwrap();
        assert!(dict.contains("JER", PhysicsObject::Jet));
        assert!(dict.contains("JER", PhysicsObject::FatJet));
    }
}
