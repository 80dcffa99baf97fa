use crate::cli::Cli;
use crate::error::{CliError, Result};
use crossfeed::core::lp::{LpOracle, MiniLpOracle};
use crossfeed::core::models::model::Flavor;
use crossfeed::engine::config::{ScoreConfig, ScoreSelection};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// LP backends the CLI can plug in behind the oracle seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverChoice {
    MiniLp,
}

impl SolverChoice {
    pub fn oracle(&self) -> Box<dyn LpOracle> {
        match self {
            SolverChoice::MiniLp => Box::new(MiniLpOracle::new()),
        }
    }
}

impl FromStr for SolverChoice {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "minilp" => Ok(SolverChoice::MiniLp),
            other => Err(CliError::Config(format!(
                "unknown solver '{other}' (available: minilp)"
            ))),
        }
    }
}

/// Optional TOML configuration file; command-line flags override its values.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    scoring: ScoringSection,
    run: RunSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScoringSection {
    min_growth: Option<f64>,
    max_uptake: Option<f64>,
    n_solutions: Option<usize>,
    flux_epsilon: Option<f64>,
    seed: Option<u64>,
    mass_weighted: Option<bool>,
    validate: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RunSection {
    flavor: Option<String>,
    solver: Option<String>,
    media: Option<Vec<String>>,
}

/// Fully resolved run parameters: file config plus command-line overrides.
#[derive(Debug)]
pub struct RunConfig {
    pub communities_path: PathBuf,
    pub models_dir: PathBuf,
    pub model_table: Option<PathBuf>,
    pub output_path: PathBuf,
    pub compounds_path: Option<PathBuf>,
    pub inorganic_path: Option<PathBuf>,
    pub mediadb_path: Option<PathBuf>,
    /// Media to score; empty means one complete pseudo-medium.
    pub media: Vec<String>,
    pub flavor: Flavor,
    pub selection: ScoreSelection,
    pub part: usize,
    pub parts_total: usize,
    pub scoring: ScoreConfig,
    pub solver: SolverChoice,
}

pub fn resolve(cli: Cli) -> Result<RunConfig> {
    let file = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            toml::from_str::<FileConfig>(&text).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?
        }
        None => FileConfig::default(),
    };

    if cli.parts_total == 0 {
        return Err(CliError::Config("parts-total must be at least 1".into()));
    }
    if cli.part == 0 || cli.part > cli.parts_total {
        return Err(CliError::Config(format!(
            "part must lie in 1..={}, got {}",
            cli.parts_total, cli.part
        )));
    }

    let mut builder = ScoreConfig::builder();
    if let Some(v) = file.scoring.min_growth {
        builder = builder.min_growth(v);
    }
    if let Some(v) = file.scoring.max_uptake {
        builder = builder.max_uptake(v);
    }
    if let Some(v) = file.scoring.n_solutions {
        builder = builder.n_solutions(v);
    }
    if let Some(v) = file.scoring.flux_epsilon {
        builder = builder.flux_epsilon(v);
    }
    if let Some(v) = file.scoring.seed {
        builder = builder.seed(v);
    }
    if let Some(v) = file.scoring.validate {
        builder = builder.validate(v);
    }
    if let Some(v) = file.scoring.mass_weighted {
        builder = builder.mass_weighted(v);
    }
    // command-line flags win over the file
    if let Some(v) = cli.min_growth {
        builder = builder.min_growth(v);
    }
    if let Some(v) = cli.max_uptake {
        builder = builder.max_uptake(v);
    }
    if let Some(v) = cli.n_solutions {
        builder = builder.n_solutions(v);
    }
    if let Some(v) = cli.seed {
        builder = builder.seed(v);
    }
    if cli.mass_weighted {
        builder = builder.mass_weighted(true);
    }
    let scoring = builder.build()?;

    let selection = match (cli.global, cli.detailed) {
        (true, false) => ScoreSelection::Global,
        (false, true) => ScoreSelection::Detailed,
        _ => ScoreSelection::All,
    };

    let flavor = match file.run.flavor.as_deref() {
        // explicit --flavor beats the file only when the user set it; clap has
        // no "was provided" signal for defaulted values, so the file fills in
        // only when the flag kept its default
        Some(name) if cli.flavor == Flavor::default() => Flavor::from_str(name)
            .map_err(CliError::Config)?,
        _ => cli.flavor,
    };

    let solver = match file.run.solver.as_deref() {
        Some(name) if cli.solver == "minilp" => SolverChoice::from_str(name)?,
        _ => SolverChoice::from_str(&cli.solver)?,
    };

    let media = match &cli.media {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect(),
        None => file.run.media.clone().unwrap_or_default(),
    };
    if !media.is_empty() && cli.mediadb.is_none() {
        return Err(CliError::Config(
            "--media requires --mediadb to resolve compound sets".into(),
        ));
    }

    Ok(RunConfig {
        communities_path: cli.communities,
        models_dir: cli.models,
        model_table: cli.model_table,
        output_path: cli.output,
        compounds_path: cli.compounds,
        inorganic_path: cli.inorganic,
        mediadb_path: cli.mediadb,
        media,
        flavor,
        selection,
        part: cli.part,
        parts_total: cli.parts_total,
        scoring,
        solver,
    })
}
