//! Source/scale naming protocol.
//!
//! Every systematic uncertainty is identified by a *source* name (e.g.
//! `TauES_DM0`, `JES_FlavorQCD`) and a *scale* (`Up`, `Down`, or `Central`
//! for the nominal). The derived systematic name is `source + scale`, with
//! the central pseudo-source collapsing to plain `"Central"`. Column suffixes
//! and dictionary keys downstream are all built from these names, so the
//! rules here are load-bearing for the whole column layout.

use crate::error::{Error, Result};
use crate::object::PhysicsObject;
use serde::{Deserialize, Serialize};

/// Name of the central (nominal) pseudo-source and its scale.
pub const CENTRAL: &str = "Central";

/// Column suffix of the raw, uncorrected input columns.
pub const NANO: &str = "nano";

/// Direction of a systematic shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UncScale {
    /// −1σ variation.
    Down = -1,
    /// Nominal, unshifted.
    Central = 0,
    /// +1σ variation.
    Up = 1,
}

impl UncScale {
    /// Name used in systematic/column names.
    pub fn name(self) -> &'static str {
        match self {
            UncScale::Down => "Down",
            UncScale::Central => CENTRAL,
            UncScale::Up => "Up",
        }
    }
}

impl std::fmt::Display for UncScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Scales defined for a source: `[Central]` for the central pseudo-source,
/// `[Up, Down]` for everything else.
pub fn scales_for(source: &str) -> &'static [UncScale] {
    if source == CENTRAL {
        &[UncScale::Central]
    } else {
        &[UncScale::Up, UncScale::Down]
    }
}

/// Derived systematic name for a (source, scale) pair.
///
/// `"Central"` for (Central, Central), `source + scale` for a non-central
/// source with a directional scale. Any other combination (e.g. the central
/// source with an Up scale) is a contract violation: the central source never
/// carries a directional variation.
pub fn syst_name(source: &str, scale: UncScale) -> Result<String> {
    if source == CENTRAL {
        if scale == UncScale::Central {
            return Ok(CENTRAL.to_string());
        }
    } else if scale != UncScale::Central {
        return Ok(format!("{source}{scale}"));
    }
    Err(Error::Contract(format!(
        "syst_name: inconsistent source:scale combination = {source}:{scale}"
    )))
}

/// Insertion-ordered mapping from an uncertainty source to the object types
/// whose four-momentum it shifts.
///
/// Built incrementally as producers run; used downstream to decide which
/// objects need a pass-through column for a given systematic so every event
/// record carries a complete, rectangular column set.
#[derive(Debug, Clone, Default)]
pub struct SourceDict {
    entries: Vec<(String, Vec<PhysicsObject>)>,
}

impl SourceDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `obj` as shifted by `source`.
    ///
    /// Fails on a duplicate (source, object) pair: a producer defining the
    /// same shifted column twice is a registration-sequence bug.
    pub fn register(&mut self, source: &str, obj: PhysicsObject) -> Result<()> {
        if let Some((_, objs)) = self.entries.iter_mut().find(|(s, _)| s == source) {
            if objs.contains(&obj) {
                return Err(Error::Contract(format!(
                    "duplicated {source} definition for {obj}"
                )));
            }
            objs.push(obj);
        } else {
            self.entries.push((source.to_string(), vec![obj]));
        }
        Ok(())
    }

    /// Objects registered for `source`, if any.
    pub fn objects(&self, source: &str) -> Option<&[PhysicsObject]> {
        self.entries.iter().find(|(s, _)| s == source).map(|(_, o)| o.as_slice())
    }

    /// Whether `obj` is registered for `source`.
    pub fn contains(&self, source: &str, obj: PhysicsObject) -> bool {
        self.objects(source).is_some_and(|objs| objs.contains(&obj))
    }

    /// Iterate over (source, objects) in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PhysicsObject])> {
        self.entries.iter().map(|(s, o)| (s.as_str(), o.as_slice()))
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no source is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_central_vs_shifted() {
        assert_eq!(scales_for(CENTRAL), &[UncScale::Central]);
        assert_eq!(scales_for("TauES_DM0"), &[UncScale::Up, UncScale::Down]);
    }

    #[test]
    fn syst_name_valid_combinations() {
        assert_eq!(syst_name(CENTRAL, UncScale::Central).unwrap(), "Central");
        assert_eq!(syst_name("TauES_DM0", UncScale::Up).unwrap(), "TauES_DM0Up");
        assert_eq!(syst_name("TauES_DM0", UncScale::Down).unwrap(), "TauES_DM0Down");
    }

    #[test]
    fn syst_name_rejects_inconsistent_pairs() {
        assert!(syst_name(CENTRAL, UncScale::Up).is_err());
        assert!(syst_name(CENTRAL, UncScale::Down).is_err());
        assert!(syst_name("TauES_DM0", UncScale::Central).is_err());
    }

    #[test]
    fn source_dict_accumulates_and_rejects_duplicates() {
        let mut dict = SourceDict::new();
        dict.register("TauES_DM0", PhysicsObject::Tau).unwrap();
        dict.register("TauES_DM0", PhysicsObject::Met).unwrap();
        dict.register("JER", PhysicsObject::Jet).unwrap();

        assert_eq!(
            dict.objects("TauES_DM0").unwrap(),
            &[PhysicsObject::Tau, PhysicsObject::Met]
        );
        assert!(dict.register("TauES_DM0", PhysicsObject::Tau).is_err());
        assert!(dict.contains("JER", PhysicsObject::Jet));
        assert!(!dict.contains("JER", PhysicsObject::Tau));
    }

    #[test]
    fn source_dict_preserves_insertion_order() {
        let mut dict = SourceDict::new();
        dict.register(CENTRAL, PhysicsObject::Tau).unwrap();
        dict.register("TauES_DM0", PhysicsObject::Tau).unwrap();
        dict.register("JER", PhysicsObject::Jet).unwrap();
        let sources: Vec<&str> = dict.iter().map(|(s, _)| s).collect();
        assert_eq!(sources, vec![CENTRAL, "TauES_DM0", "JER"]);
    }
}
