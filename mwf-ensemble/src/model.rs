use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An ensemble forecast model known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Model {
    #[serde(rename = "ecmwf_ifs025")]
    EcmwfIfs025,
    #[serde(rename = "gem_global")]
    GemGlobal,
    #[serde(rename = "ecmwf_aifs025")]
    EcmwfAifs025,
    #[serde(rename = "gfs_seamless")]
    GfsSeamless,
    #[serde(rename = "icon_seamless")]
    IconSeamless,
}

impl Model {
    pub const ALL: [Model; 5] = [
        Model::EcmwfIfs025,
        Model::GemGlobal,
        Model::EcmwfAifs025,
        Model::GfsSeamless,
        Model::IconSeamless,
    ];

    /// Identifier used in payload keys and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::EcmwfIfs025 => "ecmwf_ifs025",
            Model::GemGlobal => "gem_global",
            Model::EcmwfAifs025 => "ecmwf_aifs025",
            Model::GfsSeamless => "gfs_seamless",
            Model::IconSeamless => "icon_seamless",
        }
    }

    /// Short name used in forecast documents.
    pub fn display_name(&self) -> &'static str {
        match self {
            Model::EcmwfIfs025 => "ECMWF_IFS",
            Model::GemGlobal => "GEM",
            Model::EcmwfAifs025 => "ECMWF_AIFS",
            Model::GfsSeamless => "GFS",
            Model::IconSeamless => "ICON",
        }
    }

    /// Numeric model id used by the upstream ensemble service.
    pub fn id(&self) -> u32 {
        match self {
            Model::EcmwfIfs025 => 60,
            Model::GemGlobal => 17,
            Model::EcmwfAifs025 => 61,
            Model::GfsSeamless => 2,
            Model::IconSeamless => 11,
        }
    }

    pub fn from_id(id: u32) -> Option<Model> {
        Model::ALL.iter().find(|m| m.id() == id).copied()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a payload or configuration names an unsupported model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModel(pub String);

impl fmt::Display for UnknownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown model: {}", self.0)
    }
}

impl std::error::Error for UnknownModel {}

/// Parses the model identifier or its numeric id ("gfs_seamless" or "2").
impl FromStr for Model {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(model) = Model::ALL.iter().find(|m| m.as_str() == s) {
            return Ok(*model);
        }
        s.parse::<u32>()
            .ok()
            .and_then(Model::from_id)
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}
