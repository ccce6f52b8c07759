//! # nc-frame
//!
//! Typed, lazily-evaluated column frame: the computation-graph substrate the
//! correction producers define their derived columns on. Replaces textual
//! expression interpolation with typed closures over named columns.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod column;
pub mod frame;

pub use column::Column;
pub use frame::{ColumnFn, ColumnFrame};
