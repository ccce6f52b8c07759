//! Calibration provider collaborators.
//!
//! The actual calibration math (compressed JSON look-up tables, smearing
//! formulas) lives outside this crate. Producers see it through these
//! traits: a pure function from candidate kinematics and a (source, scale)
//! pair to a multiplicative factor. Loading a provider is fatal on missing
//! data; evaluation is total over valid inputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nc_core::{Error, ObjectKinematics, Period, Result, UncScale};

/// Calibration dataset kinds, one per provider to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibKind {
    /// Tau energy scale.
    TauEs,
    /// Tau identification scale factors.
    TauId,
    /// AK4 jet energy scale and resolution.
    Jet,
    /// AK8 jet energy scale and resolution.
    FatJet,
    /// Fixed-working-point b-tagging scale factors.
    BTag,
    /// Shape (iterative-fit) b-tagging scale factors.
    BTagShape,
    /// Muon reco/ID/iso scale factors.
    MuonId,
    /// High-pT muon scale factors.
    HighPtMuonId,
    /// Electron identification scale factors.
    EleId,
    /// Pileup-jet-ID efficiency scale factors.
    PuJetId,
    /// Trigger scale factors.
    Trigger,
    /// Pileup reweighting.
    Pileup,
}

/// Opaque calibration provider: evaluates one multiplicative factor for a
/// candidate under a given uncertainty source and scale.
pub trait CalibProvider: Send + Sync {
    /// Scale factor (or energy-scale multiplier) for `kin` under
    /// (`source`, `scale`).
    fn evaluate(&self, kin: &ObjectKinematics, source: &str, scale: UncScale) -> Result<f64>;

    /// Variant taking a named working point, for corrections parameterized
    /// by one (electron ID, pileup-jet ID). Defaults to ignoring it.
    fn evaluate_at(
        &self,
        kin: &ObjectKinematics,
        _working_point: &str,
        source: &str,
        scale: UncScale,
    ) -> Result<f64> {
        self.evaluate(kin, source, scale)
    }
}

/// b-tagging working point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BTagWorkingPoint {
    /// Loose.
    Loose,
    /// Medium.
    Medium,
    /// Tight.
    Tight,
}

impl BTagWorkingPoint {
    /// All working points, loosest first.
    pub const ALL: [BTagWorkingPoint; 3] =
        [BTagWorkingPoint::Loose, BTagWorkingPoint::Medium, BTagWorkingPoint::Tight];

    /// Name used in branch names.
    pub fn name(self) -> &'static str {
        match self {
            BTagWorkingPoint::Loose => "Loose",
            BTagWorkingPoint::Medium => "Medium",
            BTagWorkingPoint::Tight => "Tight",
        }
    }
}

/// Provider for fixed-working-point b-tagging scale factors.
pub trait BTagProvider: Send + Sync {
    /// Scale factor for one jet at `wp` under (`source`, `scale`).
    fn evaluate_wp(
        &self,
        kin: &ObjectKinematics,
        wp: BTagWorkingPoint,
        source: &str,
        scale: UncScale,
    ) -> Result<f64>;

    /// Discriminant threshold of `wp` for the loaded period.
    fn wp_value(&self, wp: BTagWorkingPoint) -> f64;
}

/// Context handed to the provider factory when loading calibration data.
#[derive(Debug, Clone)]
pub struct CalibContext {
    /// Data-taking period selecting the calibration dataset version.
    pub period: Period,
    /// Whether the sample is recorded data rather than simulation.
    pub is_data: bool,
    /// Base directory for calibration data files.
    pub base_path: PathBuf,
}

/// Environment variable holding the calibration base path.
pub const BASE_PATH_ENV: &str = "ANALYSIS_PATH";

impl CalibContext {
    /// Create a context with an explicit base path.
    pub fn new(period: Period, is_data: bool, base_path: impl Into<PathBuf>) -> Self {
        Self { period, is_data, base_path: base_path.into() }
    }

    /// Create a context resolving the base path from `ANALYSIS_PATH`.
    ///
    /// An unset variable is a fatal configuration error.
    pub fn from_env(period: Period, is_data: bool) -> Result<Self> {
        let base = std::env::var_os(BASE_PATH_ENV).ok_or_else(|| {
            Error::Config(format!("environment variable {BASE_PATH_ENV} is not set"))
        })?;
        Ok(Self::new(period, is_data, PathBuf::from(base)))
    }

    /// Resolve a calibration data path relative to the base path.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.base_path.join(relative)
    }
}

/// Loads calibration providers for the requested dataset kinds.
pub trait ProviderFactory {
    /// Load the provider for `kind`. Missing calibration data is a fatal
    /// `Config` error.
    fn load(&self, kind: CalibKind, ctx: &CalibContext) -> Result<Arc<dyn CalibProvider>>;

    /// Load the fixed-working-point b-tagging provider.
    fn load_btag(&self, ctx: &CalibContext) -> Result<Arc<dyn BTagProvider>>;
}
