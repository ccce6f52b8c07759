//! Systematic-variation configuration for a columnar event pipeline.
//!
//! Producers turn raw detector-level columns into, per uncertainty source,
//! the central value and the Up/Down variations: shifted four-momentum
//! columns with their MET propagation, and multiplicative weight branches.
//! The [`Corrections`] facade wires the producers requested by a
//! [`CorrectionsConfig`] and runs them over a [`nc_frame::ColumnFrame`].
//!
//! Calibration payloads stay behind the [`CalibProvider`] traits; this crate
//! owns the naming protocol, the registration bookkeeping, and the column
//! graph, not the look-up tables.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod branches;
pub mod btag;
pub mod btag_shape;
pub mod config;
mod corrections;
pub mod electron;
pub mod fatjet;
pub mod jet;
pub mod lumi;
pub mod met;
pub mod mu;
pub mod pileup;
pub mod provider;
pub mod pu_jet_id;
pub mod registry;
pub mod stitching;
pub mod tau;
pub mod trigger;

pub use config::{Correction, CorrectionsConfig, LegType, SampleType, TriggerKind};
pub use corrections::{Corrections, SystematicsMap};
pub use lumi::LumiFilter;
pub use provider::{
    BTagProvider, BTagWorkingPoint, CalibContext, CalibKind, CalibProvider, ProviderFactory,
    BASE_PATH_ENV,
};
pub use registry::CalibRegistry;
pub use stitching::StitchingPolicy;
