//! Calibration provider registry.
//!
//! Owned by the caller and passed by reference, replacing process-global
//! provider singletons: every provider is installed exactly once, and a
//! second installation of the same kind is a fatal configuration error.

use std::collections::HashMap;
use std::sync::Arc;

use nc_core::{Error, Result};

use crate::config::Correction;
use crate::provider::{BTagProvider, CalibContext, CalibKind, CalibProvider, ProviderFactory};

/// Installed calibration providers, keyed by dataset kind.
#[derive(Default)]
pub struct CalibRegistry {
    providers: HashMap<CalibKind, Arc<dyn CalibProvider>>,
    btag: Option<Arc<dyn BTagProvider>>,
}

impl CalibRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding exactly the providers the requested
    /// corrections need. Each kind is loaded once even when several
    /// corrections share it.
    pub fn build(
        factory: &dyn ProviderFactory,
        ctx: &CalibContext,
        corrections: &[Correction],
    ) -> Result<Self> {
        let mut registry = Self::new();
        for correction in corrections {
            for kind in correction.calib_kinds() {
                if *kind == CalibKind::BTag {
                    if registry.btag.is_none() {
                        registry.install_btag(factory.load_btag(ctx)?)?;
                    }
                } else if !registry.providers.contains_key(kind) {
                    registry.install(*kind, factory.load(*kind, ctx)?)?;
                }
            }
        }
        Ok(registry)
    }

    /// Install a provider. Fails if `kind` is already installed.
    pub fn install(&mut self, kind: CalibKind, provider: Arc<dyn CalibProvider>) -> Result<()> {
        if self.providers.contains_key(&kind) {
            return Err(Error::Config(format!("provider {kind:?} is already installed")));
        }
        self.providers.insert(kind, provider);
        Ok(())
    }

    /// Install the b-tagging provider. Fails if already installed.
    pub fn install_btag(&mut self, provider: Arc<dyn BTagProvider>) -> Result<()> {
        if self.btag.is_some() {
            return Err(Error::Config("b-tag provider is already installed".into()));
        }
        self.btag = Some(provider);
        Ok(())
    }

    /// Provider for `kind`. Fails if the corresponding correction was not
    /// requested at build time.
    pub fn get(&self, kind: CalibKind) -> Result<Arc<dyn CalibProvider>> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::Config(format!("provider {kind:?} is not installed")))
    }

    /// The b-tagging provider.
    pub fn btag(&self) -> Result<Arc<dyn BTagProvider>> {
        self.btag
            .clone()
            .ok_or_else(|| Error::Config("b-tag provider is not installed".into()))
    }
}
