//! Data-taking periods and the calibration dataset tags they map to.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Run 2 ultra-legacy data-taking period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// 2016 with the HIP-affected (preVFP) detector conditions.
    #[serde(rename = "Run2_2016_HIPM")]
    Run2_2016Hipm,
    /// 2016 postVFP.
    #[serde(rename = "Run2_2016")]
    Run2_2016,
    /// 2017.
    #[serde(rename = "Run2_2017")]
    Run2_2017,
    /// 2018.
    #[serde(rename = "Run2_2018")]
    Run2_2018,
}

impl Period {
    /// Tag used in calibration dataset paths (jsonpog-integration layout).
    pub fn dataset_tag(self) -> &'static str {
        match self {
            Period::Run2_2016Hipm => "2016preVFP_UL",
            Period::Run2_2016 => "2016postVFP_UL",
            Period::Run2_2017 => "2017_UL",
            Period::Run2_2018 => "2018_UL",
        }
    }

    /// Calendar year component of the dataset tag, used as the suffix of
    /// year-decorrelated uncertainty sources.
    pub fn year(self) -> &'static str {
        match self {
            Period::Run2_2016Hipm => "2016preVFP",
            Period::Run2_2016 => "2016postVFP",
            Period::Run2_2017 => "2017",
            Period::Run2_2018 => "2018",
        }
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Run2_2016_HIPM" => Ok(Period::Run2_2016Hipm),
            "Run2_2016" => Ok(Period::Run2_2016),
            "Run2_2017" => Ok(Period::Run2_2017),
            "Run2_2018" => Ok(Period::Run2_2018),
            other => Err(Error::Config(format!("unknown period '{other}'"))),
        }
    }
}
