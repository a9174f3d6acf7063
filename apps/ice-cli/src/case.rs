//! YAML case files: a flowline, a velocity guess and a model choice.

use ice_core::units::{constants, kg_per_m3, m};
use ice_stream::{
    ChannelConfig, ConfinedStreamModel, DEFAULT_SCALE, GridProfile, LinearDrag, ModelConfig,
    StreamError, StressBalance, UnconfinedStreamModel,
};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Stream model error: {0}")]
    Stream(#[from] StreamError),

    #[error("Jacobian check failed for {failed} of {total} case(s)")]
    CheckFailed { failed: usize, total: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    #[serde(default)]
    pub name: String,
    /// Uniform node spacing in meters
    pub spacing: f64,
    pub thickness: Vec<f64>,
    pub slope: Vec<f64>,
    pub depth: Vec<f64>,
    #[serde(default = "default_rho_ice")]
    pub rho_ice: f64,
    #[serde(default = "default_rho_water")]
    pub rho_water: f64,
    /// Velocity guess the residual and Jacobian are evaluated at
    pub velocity: Vec<f64>,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub config: ModelConfig,
    pub model: ModelDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDef {
    Unconfined(LinearDrag),
    Confined(ChannelConfig),
}

impl ModelDef {
    pub fn label(&self) -> &'static str {
        match self {
            ModelDef::Unconfined(_) => "unconfined",
            ModelDef::Confined(_) => "confined",
        }
    }
}

fn default_rho_ice() -> f64 {
    constants::RHO_ICE_KGPM3
}

fn default_rho_water() -> f64 {
    constants::RHO_SEAWATER_KGPM3
}

fn default_scale() -> f64 {
    DEFAULT_SCALE
}

pub fn load_yaml(path: &Path) -> CliResult<Case> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut case: Case = serde_yaml::from_str(&content).map_err(|source| CliError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    if case.name.is_empty() {
        case.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(case)
}

impl Case {
    pub fn profile(&self) -> CliResult<GridProfile> {
        let profile = GridProfile::uniform(
            DVector::from_column_slice(&self.thickness),
            DVector::from_column_slice(&self.slope),
            DVector::from_column_slice(&self.depth),
            m(self.spacing),
            kg_per_m3(self.rho_ice),
            kg_per_m3(self.rho_water),
        )?;
        Ok(profile)
    }

    pub fn velocity(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.velocity)
    }

    /// Build the configured model on `profile`; one instance per caller.
    pub fn model<'a>(&self, profile: &'a GridProfile) -> CliResult<Box<dyn StressBalance + 'a>> {
        let model: Box<dyn StressBalance + 'a> = match self.model {
            ModelDef::Unconfined(drag) => {
                Box::new(UnconfinedStreamModel::new(profile, self.config, drag)?)
            }
            ModelDef::Confined(channel) => {
                Box::new(ConfinedStreamModel::new(profile, self.config, channel)?)
            }
        };
        Ok(model)
    }

    /// The confined model, for commands that need its stress decomposition.
    pub fn confined_model<'a>(
        &self,
        profile: &'a GridProfile,
    ) -> CliResult<ConfinedStreamModel<'a>> {
        match self.model {
            ModelDef::Confined(channel) => {
                Ok(ConfinedStreamModel::new(profile, self.config, channel)?)
            }
            ModelDef::Unconfined(_) => Err(StreamError::NotSupported {
                what: "stress decomposition requires a confined model",
            }
            .into()),
        }
    }
}
