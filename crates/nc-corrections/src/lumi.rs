//! Certified-luminosity filtering for recorded data.
//!
//! Recorded events are kept only when their (run, luminosity block) pair
//! falls inside the certification table: a golden JSON object keyed by run
//! number, each run holding inclusive `[first, last]` block ranges.
//! Simulation never passes through this filter.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nc_core::{Error, Result};
use nc_frame::{Column, ColumnFrame};

/// Pass-flag column defined by [`LumiFilter::define_mask`].
pub const MASK_COLUMN: &str = "lumiFilter_pass";

/// Certified (run, luminosity block) lookup built from a golden JSON file.
#[derive(Debug, Clone)]
pub struct LumiFilter {
    ranges: BTreeMap<u32, Vec<(u32, u32)>>,
}

impl LumiFilter {
    /// Load and validate a certification table from a golden JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let raw = serde_json::from_reader(BufReader::new(file))?;
        Self::from_table(raw)
    }

    /// Build from an in-memory run → block-range table. Ranges are sorted
    /// per run; overlapping ranges and non-numeric run keys are `Config`
    /// errors.
    pub fn from_table(raw: BTreeMap<String, Vec<(u32, u32)>>) -> Result<Self> {
        let mut ranges = BTreeMap::new();
        for (run_str, mut list) in raw {
            let run: u32 = run_str.parse().map_err(|_| {
                Error::Config(format!("lumi filter: invalid run number '{run_str}'"))
            })?;
            list.sort_unstable();
            for window in list.windows(2) {
                if window[1].0 <= window[0].1 {
                    return Err(Error::Config(format!(
                        "lumi filter: overlapping block ranges [{}, {}] and [{}, {}] \
                         for run {run}",
                        window[0].0, window[0].1, window[1].0, window[1].1
                    )));
                }
            }
            ranges.insert(run, list);
        }
        Ok(Self { ranges })
    }

    /// Whether the (run, luminosity block) pair is certified.
    pub fn pass(&self, run: u32, luminosity_block: u32) -> bool {
        let Some(list) = self.ranges.get(&run) else {
            return false;
        };
        for &(first, last) in list {
            if luminosity_block < first {
                return false;
            }
            if luminosity_block <= last {
                return true;
            }
        }
        false
    }

    /// Define the per-event pass flag (1 certified, 0 not) from the `run`
    /// and `luminosityBlock` columns.
    pub fn define_mask(&self, frame: &mut ColumnFrame) -> Result<()> {
        let filter = self.clone();
        frame.define(MASK_COLUMN, &["run", "luminosityBlock"], move |cols| {
            let run = cols[0].as_scalar()?;
            let block = cols[1].as_scalar()?;
            Ok(Column::Scalar(
                run.iter()
                    .zip(block)
                    .map(|(r, b)| {
                        if filter.pass(*r as u32, *b as u32) {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect(),
            ))
        })
    }
}
