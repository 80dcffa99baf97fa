use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The crossfeed developers",
    version,
    about = "crossfeed - batch scoring of metabolic cross-feeding potential in microbial communities.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Path to the community membership table (TSV: community, species).
    #[arg(value_name = "COMMUNITIES")]
    pub communities: PathBuf,

    /// Directory holding model files, one `<species>.json` per organism.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub models: PathBuf,

    /// Path for the output score table (one TSV per shard).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Optional model-location table overriding `<models>/<species>.json`
    /// (TSV: species, path).
    #[arg(long, value_name = "PATH")]
    pub model_table: Option<PathBuf>,

    /// Exchange-metabolite catalogue driving the per-compound output columns
    /// (TSV: compound, name).
    #[arg(long, value_name = "PATH")]
    pub compounds: Option<PathBuf>,

    /// Always-present inorganic compounds, merged into every sampling medium
    /// (TSV: compound).
    #[arg(long, value_name = "PATH")]
    pub inorganic: Option<PathBuf>,

    /// Named medium compound sets (TSV: medium, compound).
    #[arg(long, value_name = "PATH")]
    pub mediadb: Option<PathBuf>,

    /// Comma-separated media to score; requires --mediadb. Defaults to one
    /// complete pseudo-medium opening every community exchange.
    #[arg(long, value_name = "IDS")]
    pub media: Option<String>,

    /// Identifier dialect of the model files.
    #[arg(long, value_name = "NAME", default_value = "cobra")]
    pub flavor: crossfeed::core::models::model::Flavor,

    /// Compute only the community-level scores (minimal medium, MIP, MRO).
    #[arg(long, conflicts_with = "detailed")]
    pub global: bool,

    /// Compute only the pairwise scores (SCS, MUS, MPS, SMETANA).
    #[arg(long)]
    pub detailed: bool,

    /// 1-based shard to process.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub part: usize,

    /// Total number of disjoint shards.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub parts_total: usize,

    /// Number of perturbed-objective trials per sampled score.
    #[arg(long, value_name = "INT")]
    pub n_solutions: Option<usize>,

    /// Growth-rate floor a viable organism must attain.
    #[arg(long, value_name = "FLOAT")]
    pub min_growth: Option<f64>,

    /// Uptake magnitude an opened exchange reaction permits.
    #[arg(long, value_name = "FLOAT")]
    pub max_uptake: Option<f64>,

    /// Base seed of the objective-perturbation sequence.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Weight minimal-medium selection by metabolite molecular mass.
    #[arg(long)]
    pub mass_weighted: bool,

    /// LP solver backend.
    #[arg(long, value_name = "NAME", default_value = "minilp")]
    pub solver: String,

    /// Main configuration file in TOML format; command-line flags win.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
