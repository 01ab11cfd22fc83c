use crate::algos::mbased::mdp::DEFAULT_THETA;
use crate::algos::model_free::gradient_free::on_policy::monte_carlo::{
    DEFAULT_MAX_STEPS, DEFAULT_ROLLOUTS_PER_STATE,
};
use gridworld::{GridError, GridWorld, MdpParams, ScenarioGenerator};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Value,
    Policy,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub algorithm: Algorithm,
    pub theta: f64,
    pub max_iterations: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Value,
            theta: DEFAULT_THETA,
            max_iterations: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub wall_fraction_min: f64,
    pub wall_fraction_max: f64,
    /// Fixed layout in the `.#+-` text format; overrides random generation.
    pub layout: Option<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 6,
            seed: 2718,
            wall_fraction_min: 0.25,
            wall_fraction_max: 0.6,
            layout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub rollouts_per_state: usize,
    pub max_steps: usize,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            rollouts_per_state: DEFAULT_ROLLOUTS_PER_STATE,
            max_steps: DEFAULT_MAX_STEPS,
            seed: 314,
        }
    }
}

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mdp: MdpParams,
    pub solver: SolverConfig,
    pub scenario: ScenarioConfig,
    pub monte_carlo: MonteCarloConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mdp.validate()?;
        if !(self.solver.theta > 0.) {
            return Err(ConfigError::Validation("solver.theta must be > 0".into()));
        }
        if self.monte_carlo.rollouts_per_state == 0 {
            return Err(ConfigError::Validation(
                "monte_carlo.rollouts_per_state must be > 0".into(),
            ));
        }
        if self.scenario.layout.is_none() && (self.scenario.width == 0 || self.scenario.height == 0)
        {
            return Err(ConfigError::Validation(
                "scenario.width and scenario.height must be > 0".into(),
            ));
        }
        self.scenario_generator()?;
        Ok(())
    }

    pub fn scenario_generator(&self) -> Result<ScenarioGenerator, ConfigError> {
        let range = self.scenario.wall_fraction_min..self.scenario.wall_fraction_max;
        Ok(ScenarioGenerator::default().with_wall_fraction(range)?)
    }

    /// The configured layout if there is one, else a seeded random scenario.
    pub fn build_grid(&self) -> Result<GridWorld, ConfigError> {
        let grid = match &self.scenario.layout {
            Some(layout) => layout.parse::<GridWorld>()?,
            None => self.scenario_generator()?.from_seed(
                self.scenario.width,
                self.scenario.height,
                self.scenario.seed,
            )?,
        };

        Ok(grid)
    }
}
