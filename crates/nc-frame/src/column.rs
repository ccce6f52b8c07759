//! Column storage: one value (or one collection) per event.

use nc_core::{Error, FourVector, Result};

/// Column data, one entry per event.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// One `f64` per event (weights, counts, flags).
    Scalar(Vec<f64>),
    /// A variable-length `f64` collection per event (per-object quantities).
    JaggedF64(Vec<Vec<f64>>),
    /// A variable-length `i32` collection per event (decay modes, flavours).
    JaggedI32(Vec<Vec<i32>>),
    /// A variable-length four-vector collection per event (object momenta).
    P4(Vec<Vec<FourVector>>),
    /// One four-vector per event (MET, candidate legs).
    EventP4(Vec<FourVector>),
}

impl Column {
    /// Number of events.
    pub fn len(&self) -> usize {
        match self {
            Column::Scalar(v) => v.len(),
            Column::JaggedF64(v) => v.len(),
            Column::JaggedI32(v) => v.len(),
            Column::P4(v) => v.len(),
            Column::EventP4(v) => v.len(),
        }
    }

    /// Whether the column holds no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the stored variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Scalar(_) => "Scalar",
            Column::JaggedF64(_) => "JaggedF64",
            Column::JaggedI32(_) => "JaggedI32",
            Column::P4(_) => "P4",
            Column::EventP4(_) => "EventP4",
        }
    }

    /// Access as per-event scalars.
    pub fn as_scalar(&self) -> Result<&[f64]> {
        match self {
            Column::Scalar(v) => Ok(v),
            other => Err(type_mismatch("Scalar", other)),
        }
    }

    /// Access as per-object floats.
    pub fn as_jagged_f64(&self) -> Result<&[Vec<f64>]> {
        match self {
            Column::JaggedF64(v) => Ok(v),
            other => Err(type_mismatch("JaggedF64", other)),
        }
    }

    /// Access as per-object ints.
    pub fn as_jagged_i32(&self) -> Result<&[Vec<i32>]> {
        match self {
            Column::JaggedI32(v) => Ok(v),
            other => Err(type_mismatch("JaggedI32", other)),
        }
    }

    /// Access as per-object four-vectors.
    pub fn as_p4(&self) -> Result<&[Vec<FourVector>]> {
        match self {
            Column::P4(v) => Ok(v),
            other => Err(type_mismatch("P4", other)),
        }
    }

    /// Access as per-event four-vectors.
    pub fn as_event_p4(&self) -> Result<&[FourVector]> {
        match self {
            Column::EventP4(v) => Ok(v),
            other => Err(type_mismatch("EventP4", other)),
        }
    }
}

fn type_mismatch(expected: &str, got: &Column) -> Error {
    Error::Column(format!("expected {expected} column, got {}", got.kind()))
}
