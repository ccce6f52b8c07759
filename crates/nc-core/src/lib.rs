//! # nc-core
//!
//! Core types for nanocorr: the systematic source/scale naming protocol,
//! four-vector math, data-taking periods, physics-object enumeration, weight
//! branch bookkeeping, and the shared error taxonomy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod kinematics;
pub mod object;
pub mod period;
pub mod scale;
pub mod weights;

pub use error::{Error, Result};
pub use kinematics::{FourVector, ObjectKinematics};
pub use object::PhysicsObject;
pub use period::Period;
pub use scale::{scales_for, syst_name, SourceDict, UncScale, CENTRAL, NANO};
pub use weights::{WeightBranch, WeightBranchList};
