use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {parameter}: {message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },
}

/// Which score families a community evaluation computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreSelection {
    /// Community-level scores only: minimal medium, MIP, MRO.
    Global,
    /// Pairwise scores only: SCS, MUS, MPS, SMETANA.
    Detailed,
    /// Both families.
    #[default]
    All,
}

impl ScoreSelection {
    pub fn global(&self) -> bool {
        matches!(self, ScoreSelection::Global | ScoreSelection::All)
    }

    pub fn detailed(&self) -> bool {
        matches!(self, ScoreSelection::Detailed | ScoreSelection::All)
    }
}

/// Numeric parameters shared by all scoring tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Growth-rate floor a viable organism must attain (1/h).
    pub min_growth: f64,
    /// Uptake magnitude an opened exchange reaction permits (mmol/gDW/h).
    pub max_uptake: f64,
    /// Number of perturbed-objective trials per sampled score.
    pub n_solutions: usize,
    /// Flux magnitude below which a reaction counts as inactive.
    pub flux_epsilon: f64,
    /// Base seed of the perturbation sequence; trial `t` uses `seed + t`.
    pub seed: u64,
    /// Weight minimal-medium selection by metabolite molecular mass.
    pub mass_weighted: bool,
    /// Re-confirm minimal-medium selections with a restricted growth solve.
    pub validate: bool,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            min_growth: 0.1,
            max_uptake: 10.0,
            n_solutions: 50,
            flux_epsilon: 1e-6,
            seed: 101,
            mass_weighted: false,
            validate: true,
        }
    }
}

impl ScoreConfig {
    pub fn builder() -> ScoreConfigBuilder {
        ScoreConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ScoreConfigBuilder {
    min_growth: Option<f64>,
    max_uptake: Option<f64>,
    n_solutions: Option<usize>,
    flux_epsilon: Option<f64>,
    seed: Option<u64>,
    mass_weighted: Option<bool>,
    validate: Option<bool>,
}

impl ScoreConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_growth(mut self, value: f64) -> Self {
        self.min_growth = Some(value);
        self
    }
    pub fn max_uptake(mut self, value: f64) -> Self {
        self.max_uptake = Some(value);
        self
    }
    pub fn n_solutions(mut self, value: usize) -> Self {
        self.n_solutions = Some(value);
        self
    }
    pub fn flux_epsilon(mut self, value: f64) -> Self {
        self.flux_epsilon = Some(value);
        self
    }
    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }
    pub fn mass_weighted(mut self, value: bool) -> Self {
        self.mass_weighted = Some(value);
        self
    }
    pub fn validate(mut self, value: bool) -> Self {
        self.validate = Some(value);
        self
    }

    pub fn build(self) -> Result<ScoreConfig, ConfigError> {
        let defaults = ScoreConfig::default();
        let config = ScoreConfig {
            min_growth: self.min_growth.unwrap_or(defaults.min_growth),
            max_uptake: self.max_uptake.unwrap_or(defaults.max_uptake),
            n_solutions: self.n_solutions.unwrap_or(defaults.n_solutions),
            flux_epsilon: self.flux_epsilon.unwrap_or(defaults.flux_epsilon),
            seed: self.seed.unwrap_or(defaults.seed),
            mass_weighted: self.mass_weighted.unwrap_or(defaults.mass_weighted),
            validate: self.validate.unwrap_or(defaults.validate),
        };

        if config.min_growth <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "min_growth",
                message: "growth floor must be strictly positive".into(),
            });
        }
        if config.max_uptake <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_uptake",
                message: "uptake limit must be strictly positive".into(),
            });
        }
        if config.n_solutions == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "n_solutions",
                message: "at least one sampling trial is required".into(),
            });
        }
        if !(config.flux_epsilon > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "flux_epsilon",
                message: "activity threshold must be strictly positive".into(),
            });
        }
        Ok(config)
    }
}
