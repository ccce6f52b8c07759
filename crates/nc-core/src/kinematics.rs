//! Four-vector math and the kinematic record handed to calibration
//! providers.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A four-momentum, stored Cartesian (px, py, pz, e).
///
/// Constructed from (pt, eta, phi, mass) as delivered by the input columns.
/// Subtraction of two four-vectors yields the "delta" used for MET
/// propagation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourVector {
    /// x momentum component.
    pub px: f64,
    /// y momentum component.
    pub py: f64,
    /// z momentum component.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl FourVector {
    /// Build from (pt, eta, phi, mass).
    pub fn from_ptetaphim(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        let e = (p2 + mass * mass).sqrt();
        Self { px, py, pz, e }
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        (self.px * self.px + self.py * self.py).sqrt()
    }

    /// Azimuthal angle in (−π, π].
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    /// Pseudorapidity. Zero for a vector with no transverse component.
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            return 0.0;
        }
        (self.pz / pt).asinh()
    }

    /// Invariant mass. Clamped to zero for (numerically) spacelike vectors.
    pub fn mass(&self) -> f64 {
        let m2 = self.e * self.e - (self.px * self.px + self.py * self.py + self.pz * self.pz);
        if m2 > 0.0 {
            m2.sqrt()
        } else {
            0.0
        }
    }

    /// All components scaled by `k` (an energy-scale shift).
    pub fn scaled(&self, k: f64) -> Self {
        Self { px: self.px * k, py: self.py * k, pz: self.pz * k, e: self.e * k }
    }

    /// Projection onto the transverse plane: (pt, 0, phi, 0), the form in
    /// which MET is stored.
    pub fn transverse(&self) -> Self {
        FourVector::from_ptetaphim(self.pt(), 0.0, self.phi(), 0.0)
    }
}

impl Add for FourVector {
    type Output = FourVector;

    fn add(self, rhs: FourVector) -> FourVector {
        FourVector {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}

impl Sub for FourVector {
    type Output = FourVector;

    fn sub(self, rhs: FourVector) -> FourVector {
        FourVector {
            px: self.px - rhs.px,
            py: self.py - rhs.py,
            pz: self.pz - rhs.pz,
            e: self.e - rhs.e,
        }
    }
}

/// Kinematic record handed to a calibration provider for one candidate.
///
/// Only the fields relevant to a given correction are meaningful; the rest
/// stay at their defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectKinematics {
    /// Candidate four-momentum.
    pub p4: FourVector,
    /// Tau decay mode.
    pub decay_mode: i32,
    /// Generator-level match category.
    pub gen_match: i32,
    /// Jet hadron flavour (0, 4, 5).
    pub hadron_flavour: i32,
    /// Tagger discriminant value (e.g. DeepFlavour b score).
    pub discriminant: f64,
    /// True number of pileup interactions (pileup reweighting only).
    pub n_true_int: f64,
}

impl ObjectKinematics {
    /// Record carrying only a four-momentum.
    pub fn from_p4(p4: FourVector) -> Self {
        Self { p4, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ptetaphim_roundtrip() {
        let p4 = FourVector::from_ptetaphim(45.0, 1.2, -0.7, 1.777);
        assert_relative_eq!(p4.pt(), 45.0, max_relative = 1e-12);
        assert_relative_eq!(p4.eta(), 1.2, max_relative = 1e-12);
        assert_relative_eq!(p4.phi(), -0.7, max_relative = 1e-12);
        assert_relative_eq!(p4.mass(), 1.777, max_relative = 1e-9);
    }

    #[test]
    fn scaled_shifts_pt_linearly() {
        let p4 = FourVector::from_ptetaphim(30.0, 0.5, 1.0, 0.14);
        let up = p4.scaled(1.03);
        assert_relative_eq!(up.pt(), 30.0 * 1.03, max_relative = 1e-12);
        assert_relative_eq!(up.eta(), 0.5, max_relative = 1e-12);
        assert_relative_eq!(up.phi(), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn delta_is_exact_difference() {
        let a = FourVector::from_ptetaphim(50.0, 0.0, 0.3, 0.0);
        let b = FourVector::from_ptetaphim(48.0, 0.0, 0.3, 0.0);
        let d = a - b;
        assert_relative_eq!((b + d).px, a.px, max_relative = 1e-12);
        assert_relative_eq!((b + d).e, a.e, max_relative = 1e-12);
    }

    #[test]
    fn transverse_projection_is_massless() {
        let p4 = FourVector::from_ptetaphim(80.0, 2.1, -2.9, 10.0);
        let t = p4.transverse();
        assert_relative_eq!(t.pt(), 80.0, max_relative = 1e-12);
        assert_relative_eq!(t.phi(), -2.9, max_relative = 1e-12);
        assert_relative_eq!(t.eta(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(t.mass(), 0.0, epsilon = 1e-6);
    }
}
