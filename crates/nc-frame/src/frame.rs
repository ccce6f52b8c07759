//! Lazily-evaluated column frame.
//!
//! The correction producers describe their outputs as named derived columns:
//! typed closures over previously defined columns. Nothing is computed at
//! definition time; a column's closure runs (once) when the column is first
//! evaluated, and the result is memoized. Inputs must already be defined
//! when a derived column is declared, so the graph is acyclic by
//! construction.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use nc_core::{Error, Result};

use crate::column::Column;

/// Closure computing a derived column from its evaluated inputs.
///
/// The slice is ordered as the `inputs` list passed to
/// [`ColumnFrame::define`].
pub type ColumnFn = dyn Fn(&[Arc<Column>]) -> Result<Column>;

enum Slot {
    Input(Arc<Column>),
    Derived { inputs: Vec<String>, func: Arc<ColumnFn> },
    Alias(String),
}

/// A frame of named columns over a fixed number of events.
pub struct ColumnFrame {
    n_events: usize,
    slots: HashMap<String, Slot>,
    order: Vec<String>,
    cache: RefCell<HashMap<String, Arc<Column>>>,
}

impl ColumnFrame {
    /// Create an empty frame for `n_events` events.
    pub fn new(n_events: usize) -> Self {
        Self {
            n_events,
            slots: HashMap::new(),
            order: Vec::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.n_events
    }

    /// Whether a column with this name exists (input, derived, or alias).
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Column names in definition order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Add a fully materialized input column.
    pub fn insert_input(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if column.len() != self.n_events {
            return Err(Error::Column(format!(
                "input column '{}' has {} events, frame has {}",
                name,
                column.len(),
                self.n_events
            )));
        }
        self.reserve(&name)?;
        self.slots.insert(name, Slot::Input(Arc::new(column)));
        Ok(())
    }

    /// Declare a derived column computed by `func` from `inputs`.
    ///
    /// All inputs must already be defined. The closure is not invoked until
    /// the column is evaluated.
    pub fn define<F>(&mut self, name: impl Into<String>, inputs: &[&str], func: F) -> Result<()>
    where
        F: Fn(&[Arc<Column>]) -> Result<Column> + 'static,
    {
        let name = name.into();
        for input in inputs {
            if !self.contains(input) {
                return Err(Error::Contract(format!(
                    "cannot define '{name}': unknown input column '{input}'"
                )));
            }
        }
        self.reserve(&name)?;
        self.slots.insert(
            name,
            Slot::Derived {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                func: Arc::new(func),
            },
        );
        Ok(())
    }

    /// Declare `name` as a pass-through copy of `existing`.
    pub fn alias(&mut self, name: impl Into<String>, existing: &str) -> Result<()> {
        let name = name.into();
        if !self.contains(existing) {
            return Err(Error::Contract(format!(
                "cannot alias '{name}': unknown column '{existing}'"
            )));
        }
        self.reserve(&name)?;
        self.slots.insert(name, Slot::Alias(existing.to_string()));
        Ok(())
    }

    /// Evaluate a column, computing and memoizing it (and its inputs) on
    /// first access.
    pub fn evaluate(&self, name: &str) -> Result<Arc<Column>> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(Arc::clone(cached));
        }
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| Error::Column(format!("unknown column '{name}'")))?;
        let value = match slot {
            Slot::Input(col) => Arc::clone(col),
            Slot::Alias(target) => self.evaluate(target)?,
            Slot::Derived { inputs, func } => {
                let mut resolved = Vec::with_capacity(inputs.len());
                for input in inputs {
                    resolved.push(self.evaluate(input)?);
                }
                let col = func(&resolved)?;
                if col.len() != self.n_events {
                    return Err(Error::Column(format!(
                        "derived column '{}' produced {} events, frame has {}",
                        name,
                        col.len(),
                        self.n_events
                    )));
                }
                Arc::new(col)
            }
        };
        self.cache.borrow_mut().insert(name.to_string(), Arc::clone(&value));
        Ok(value)
    }

    fn reserve(&mut self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(Error::Contract(format!("column '{name}' is already defined")));
        }
        self.order.push(name.to_string());
        Ok(())
    }
}
