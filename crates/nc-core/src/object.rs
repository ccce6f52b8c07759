//! Physics-object enumeration.

use serde::{Deserialize, Serialize};

/// Object types whose columns participate in the systematic column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicsObject {
    /// Electron candidates.
    Electron,
    /// Muon candidates.
    Muon,
    /// Hadronic tau candidates.
    Tau,
    /// AK4 jets.
    Jet,
    /// AK8 (fat) jets.
    FatJet,
    /// Missing transverse energy.
    Met,
}

impl PhysicsObject {
    /// All objects in the rectangular column set, in column-layout order.
    pub const ALL: [PhysicsObject; 6] = [
        PhysicsObject::Electron,
        PhysicsObject::Muon,
        PhysicsObject::Tau,
        PhysicsObject::Jet,
        PhysicsObject::FatJet,
        PhysicsObject::Met,
    ];

    /// Objects whose four-momentum shifts propagate into MET.
    ///
    /// AK8 jets are excluded: their constituents are already covered by the
    /// AK4 collection.
    pub const MET_SENSITIVE: [PhysicsObject; 4] = [
        PhysicsObject::Electron,
        PhysicsObject::Muon,
        PhysicsObject::Tau,
        PhysicsObject::Jet,
    ];

    /// Column-name prefix for this object.
    pub fn name(self) -> &'static str {
        match self {
            PhysicsObject::Electron => "Electron",
            PhysicsObject::Muon => "Muon",
            PhysicsObject::Tau => "Tau",
            PhysicsObject::Jet => "Jet",
            PhysicsObject::FatJet => "FatJet",
            PhysicsObject::Met => "MET",
        }
    }

    /// Whether this object's deltas enter the MET propagation.
    pub fn affects_met(self) -> bool {
        Self::MET_SENSITIVE.contains(&self)
    }
}

impl std::fmt::Display for PhysicsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
