//! Batch orchestration: sharding, the per-community pipeline, and incremental
//! output.
//!
//! Each community advances through an explicit stage sequence and short-circuits
//! to a failed row on the first error; the partial row is still written and the
//! batch moves on. Only configuration errors — raised before any scoring — abort
//! the run. Communities are partitioned into disjoint shards by index modulo
//! `parts_total`, so separate processes can work the same configuration without
//! any coordination.

use crate::config::RunConfig;
use crate::data::{self, CommunitySpec, CompoundCatalogue};
use crate::error::{CliError, Result};
use crate::output::{self, Schema, TableWriter};
use crossfeed::core::environment::Environment;
use crossfeed::core::lp::LpOracle;
use crossfeed::core::models::community::CommunityModel;
use crossfeed::workflows::score::{self, ScoreResult};
use indexmap::IndexMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use tracing::{error, info, info_span, warn};

/// Pipeline position of one community evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    ModelsLoaded,
    CommunityBuilt,
    MediaResolved,
    Scored,
    Written,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Pending => "pending",
            Stage::ModelsLoaded => "models-loaded",
            Stage::CommunityBuilt => "community-built",
            Stage::MediaResolved => "media-resolved",
            Stage::Scored => "scored",
            Stage::Written => "written",
        };
        write!(f, "{label}")
    }
}

/// One community's work item, resolved from configuration at load time.
#[derive(Debug, Clone)]
pub struct CommunityJob {
    pub index: usize,
    pub id: String,
    pub species: Vec<String>,
    /// Species paired with their resolved model-file paths.
    pub paths: Vec<(String, PathBuf)>,
    /// Species whose model file does not exist on disk.
    pub missing: Vec<String>,
}

/// Resolves model paths for every community.
pub fn build_jobs(
    specs: &[CommunitySpec],
    models_dir: &std::path::Path,
    overrides: &IndexMap<String, PathBuf>,
) -> Vec<CommunityJob> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let paths: Vec<(String, PathBuf)> = spec
                .species
                .iter()
                .map(|sp| {
                    let path = overrides
                        .get(sp)
                        .cloned()
                        .unwrap_or_else(|| models_dir.join(format!("{sp}.json")));
                    (sp.clone(), path)
                })
                .collect();
            let missing = paths
                .iter()
                .filter(|(_, path)| !path.exists())
                .map(|(sp, _)| sp.clone())
                .collect();
            CommunityJob {
                index,
                id: spec.id.clone(),
                species: spec.species.clone(),
                paths,
                missing,
            }
        })
        .collect()
}

/// The jobs of one shard: indices `part - 1`, `part - 1 + parts_total`, ...
pub fn shard<'a>(
    jobs: &'a [CommunityJob],
    part: usize,
    parts_total: usize,
) -> impl Iterator<Item = &'a CommunityJob> {
    jobs.iter()
        .filter(move |job| job.index % parts_total == part - 1)
}

/// Completion log entry emitted at the community boundary no matter how the
/// evaluation terminates.
struct CommunityScope {
    community: String,
    medium: String,
    outcome: Option<String>,
}

impl CommunityScope {
    fn new(community: &str, medium: &str) -> Self {
        Self {
            community: community.to_string(),
            medium: medium.to_string(),
            outcome: None,
        }
    }

    fn finish(&mut self, outcome: impl Into<String>) {
        self.outcome = Some(outcome.into());
    }
}

impl Drop for CommunityScope {
    fn drop(&mut self) {
        let outcome = self.outcome.as_deref().unwrap_or("aborted");
        info!(
            community = %self.community,
            medium = %self.medium,
            outcome,
            "community evaluation closed"
        );
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub scored: usize,
    pub failed: usize,
    pub rows: usize,
}

/// Runs one shard of the batch.
///
/// Errors returned from here are configuration errors; anything going wrong
/// inside a single community is logged, written as a failed row, and skipped.
pub fn run(config: &RunConfig) -> Result<BatchSummary> {
    let specs = data::load_communities(&config.communities_path)?;
    let catalogue = match &config.compounds_path {
        Some(path) => data::load_compounds(path)?,
        None => CompoundCatalogue::default(),
    };
    let inorganic = match &config.inorganic_path {
        Some(path) => data::load_inorganic(path)?,
        None => Vec::new(),
    };
    let media_db = match &config.mediadb_path {
        Some(path) => data::load_media_db(path)?,
        None => IndexMap::new(),
    };
    let overrides = match &config.model_table {
        Some(path) => data::load_model_locations(path)?,
        None => IndexMap::new(),
    };

    // every requested medium must resolve before any scoring starts
    let media: Vec<(String, Option<Vec<String>>)> = if config.media.is_empty() {
        vec![("complete".to_string(), None)]
    } else {
        config
            .media
            .iter()
            .map(|id| {
                media_db
                    .get(id)
                    .cloned()
                    .map(|compounds| (id.clone(), Some(compounds)))
                    .ok_or_else(|| {
                        CliError::Config(format!("medium '{id}' is not in the media database"))
                    })
            })
            .collect::<Result<_>>()?
    };

    if config.selection.detailed() && catalogue.is_empty() {
        warn!("no compound catalogue provided; per-metabolite score columns will be absent");
    }

    let max_size = specs.iter().map(|s| s.species.len()).max().unwrap_or(0);
    let schema = Schema::build(max_size, &catalogue);
    let mut writer = TableWriter::create(&config.output_path, &schema)?;
    let jobs = build_jobs(&specs, &config.models_dir, &overrides);
    let oracle = config.solver.oracle();

    info!(
        communities = jobs.len(),
        part = config.part,
        parts_total = config.parts_total,
        media = media.len(),
        compounds = catalogue.len(),
        "batch starting"
    );

    let mut summary = BatchSummary::default();
    for job in shard(&jobs, config.part, config.parts_total) {
        for (medium_id, compounds) in &media {
            let span = info_span!("community", id = %job.id, medium = %medium_id);
            let _enter = span.enter();
            let mut scope = CommunityScope::new(&job.id, medium_id);

            let outcome = catch_unwind(AssertUnwindSafe(|| {
                evaluate(job, medium_id, compounds.as_deref(), &inorganic, config, oracle.as_ref())
            }))
            .unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "opaque panic".to_string());
                Err((Stage::Pending, CliError::Other(anyhow::anyhow!(
                    "panic during community evaluation: {message}"
                ))))
            });

            let mut row = schema.row();
            row.set("community", &job.id);
            row.set("medium", medium_id);
            row.set("size", job.species.len());
            for (slot, species) in job.species.iter().enumerate().take(schema.max_size()) {
                row.set(&format!("org{}", slot + 1), species);
            }

            match outcome {
                Ok(result) => {
                    output::populate(&mut row, &result, &catalogue, config.flavor);
                    row.set("stage", Stage::Written);
                    scope.finish(Stage::Scored.to_string());
                    summary.scored += 1;
                }
                Err((stage, err)) => {
                    error!(stage = %stage, error = %err, "community failed; continuing batch");
                    row.set("stage", format!("failed:{stage}"));
                    scope.finish(format!("failed at {stage}"));
                    summary.failed += 1;
                }
            }

            writer.write(&row)?;
            summary.rows += 1;
        }
    }

    info!(
        scored = summary.scored,
        failed = summary.failed,
        rows = summary.rows,
        "batch finished"
    );
    Ok(summary)
}

/// The per-community pipeline. Returns the stage reached alongside any error so
/// failures stay attributable.
fn evaluate(
    job: &CommunityJob,
    medium_id: &str,
    compounds: Option<&[String]>,
    inorganic: &[String],
    config: &RunConfig,
    oracle: &dyn LpOracle,
) -> std::result::Result<ScoreResult, (Stage, CliError)> {
    let stage = Stage::Pending;
    if !job.missing.is_empty() {
        return Err((
            stage,
            CliError::MissingOrganisms {
                community: job.id.clone(),
                organisms: job.missing.clone(),
            },
        ));
    }

    let mut members = Vec::with_capacity(job.paths.len());
    for (_, path) in &job.paths {
        members.push(data::load_model(path, config.flavor).map_err(|e| (stage, e))?);
    }
    let stage = Stage::ModelsLoaded;

    let community =
        CommunityModel::merge(&job.id, &members).map_err(|e| (stage, CliError::from(e)))?;
    let stage = Stage::CommunityBuilt;

    let always_present =
        Environment::from_compounds(inorganic, config.flavor, config.scoring.max_uptake);
    let environment = match compounds {
        Some(compounds) => {
            Environment::from_compounds(compounds, config.flavor, config.scoring.max_uptake)
        }
        None => Environment::from_reactions(
            community.community_exchanges.keys().cloned(),
            config.scoring.max_uptake,
        ),
    }
    .union(&always_present);
    if environment.is_empty() {
        warn!(community = %job.id, "resolved environment is empty; growth will be infeasible");
    }
    let stage = Stage::MediaResolved;

    let result = score::run(
        &community,
        &members,
        medium_id,
        &environment,
        &always_present,
        config.selection,
        &config.scoring,
        oracle,
    )
    .map_err(|e| (stage, CliError::from(e)))?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn spec(id: &str, species: &[&str]) -> CommunitySpec {
        CommunitySpec {
            id: id.to_string(),
            species: species.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn shards_reconstruct_the_full_job_list() {
        let specs: Vec<CommunitySpec> = (0..7)
            .map(|i| spec(&format!("C{i}"), &["X"]))
            .collect();
        let jobs = build_jobs(&specs, Path::new("models"), &IndexMap::new());

        for parts_total in 1..=jobs.len() {
            let mut seen: Vec<usize> = Vec::new();
            for part in 1..=parts_total {
                seen.extend(shard(&jobs, part, parts_total).map(|j| j.index));
            }
            seen.sort_unstable();
            assert_eq!(
                seen,
                (0..jobs.len()).collect::<Vec<_>>(),
                "parts_total={parts_total} must partition the job list"
            );
        }
    }

    #[test]
    fn missing_model_files_are_flagged_on_the_job() {
        let dir = tempfile::tempdir().unwrap();
        write_model(&dir, "Present");
        let specs = vec![spec("C0", &["Present", "Absent"])];
        let jobs = build_jobs(&specs, dir.path(), &IndexMap::new());
        assert_eq!(jobs[0].missing, vec!["Absent"]);
    }

    fn write_model(dir: &TempDir, id: &str) {
        // a self-sufficient glucose grower
        let json = format!(
            r#"{{
                "id": "{id}",
                "reactions": [
                    {{"id": "R_EX_glc_e", "stoichiometry": {{"M_glc_e": -1.0}},
                      "lower_bound": -10.0, "upper_bound": 1000.0}},
                    {{"id": "R_biomass", "stoichiometry": {{"M_glc_e": -1.0}},
                      "lower_bound": 0.0, "upper_bound": 1000.0}}
                ]
            }}"#
        );
        fs::write(dir.path().join(format!("{id}.json")), json).unwrap();
    }

    fn run_config(dir: &TempDir, communities: &str) -> RunConfig {
        let communities_path = dir.path().join("communities.tsv");
        fs::write(&communities_path, communities).unwrap();
        let cli = Cli::parse_from([
            "crossfeed",
            communities_path.to_str().unwrap(),
            "--models",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().join("scores.tsv").to_str().unwrap(),
            "--n-solutions",
            "2",
        ]);
        crate::config::resolve(cli).unwrap()
    }

    #[test]
    fn batch_scores_and_writes_each_community() {
        let dir = tempfile::tempdir().unwrap();
        write_model(&dir, "Ecoli");
        write_model(&dir, "Bsub");
        let config = run_config(
            &dir,
            "community\tspecies\nC1\tEcoli\nC1\tBsub\nC2\tEcoli\n",
        );

        let summary = run(&config).unwrap();
        assert_eq!(summary.scored, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.rows, 2);

        let content = fs::read_to_string(&config.output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3, "header plus one row per community");
        assert!(lines[1].starts_with("C1\tcomplete\t2"));
        assert!(lines[2].starts_with("C2\tcomplete\t1"));
        assert!(lines[1].contains("written"));
    }

    #[test]
    fn a_failing_community_does_not_stop_the_shard() {
        let dir = tempfile::tempdir().unwrap();
        write_model(&dir, "Ecoli");
        // C1 references a model that does not exist; C2 must still score
        let config = run_config(
            &dir,
            "community\tspecies\nC1\tGhost\nC2\tEcoli\n",
        );

        let summary = run(&config).unwrap();
        assert_eq!(summary.scored, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.rows, 2);

        let content = fs::read_to_string(&config.output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[1].contains("failed:pending"));
        assert!(lines[2].contains("written"));
    }

    #[test]
    fn unknown_medium_aborts_before_scoring() {
        let dir = tempfile::tempdir().unwrap();
        write_model(&dir, "Ecoli");
        let mediadb = dir.path().join("media.tsv");
        fs::write(&mediadb, "medium\tcompound\nM9\tglc\n").unwrap();
        let communities_path = dir.path().join("communities.tsv");
        fs::write(&communities_path, "community\tspecies\nC1\tEcoli\n").unwrap();

        let cli = Cli::parse_from([
            "crossfeed",
            communities_path.to_str().unwrap(),
            "--models",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().join("scores.tsv").to_str().unwrap(),
            "--mediadb",
            mediadb.to_str().unwrap(),
            "--media",
            "NoSuchMedium",
        ]);
        let config = crate::config::resolve(cli).unwrap();
        assert!(matches!(run(&config), Err(CliError::Config(_))));
    }

    #[test]
    fn named_media_produce_one_row_per_community_medium() {
        let dir = tempfile::tempdir().unwrap();
        write_model(&dir, "Ecoli");
        let mediadb = dir.path().join("media.tsv");
        fs::write(&mediadb, "medium\tcompound\nM9\tglc\nempty\tnone\n").unwrap();
        let communities_path = dir.path().join("communities.tsv");
        fs::write(&communities_path, "community\tspecies\nC1\tEcoli\n").unwrap();

        let cli = Cli::parse_from([
            "crossfeed",
            communities_path.to_str().unwrap(),
            "--models",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().join("scores.tsv").to_str().unwrap(),
            "--mediadb",
            mediadb.to_str().unwrap(),
            "--media",
            "M9,empty",
            "--n-solutions",
            "1",
        ]);
        let config = crate::config::resolve(cli).unwrap();
        let summary = run(&config).unwrap();
        assert_eq!(summary.rows, 2);

        let content = fs::read_to_string(&config.output_path).unwrap();
        assert!(content.contains("C1\tM9"));
        assert!(content.contains("C1\tempty"));
    }
}
