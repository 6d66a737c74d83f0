use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "CompOmics",
    version,
    about = "MS²Rescore - Sensitive PSM rescoring with predicted MS² peak intensities.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Logging level. Defaults to `log_level` from the configuration.
    #[arg(short = 'l', long, value_enum, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Suppress all console log output
    #[arg(short, long, global = true, conflicts_with = "log_level")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rescore the PSMs in a search engine output file.
    Run(RunArgs),
    /// Print the merged configuration.
    Config(ShowConfigArgs),
    /// Check whether MS²PIP and Percolator can be called.
    CheckTools(CheckToolsArgs),
}

/// Configuration sources shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a JSON or TOML configuration file. Later files take priority.
    #[arg(short = 'c', long = "config-file", value_name = "PATH")]
    pub config_files: Vec<PathBuf>,

    /// Set a specific configuration value, overriding every other source.
    /// Can be used multiple times. Example: -S feature_generators.ms2pip.model=CID
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the PSM file (PEPREC, MaxQuant msms.txt, MS-GF+ mzid or X!Tandem XML).
    #[arg(value_name = "PSM_FILE")]
    pub psm_file: PathBuf,

    /// Path to an MGF file or a directory containing MGF files.
    #[arg(short = 'm', long, value_name = "PATH")]
    pub spectrum_path: Option<PathBuf>,

    /// Directory for the output files. Defaults to the directory of the PSM file.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// PSM file type. Inferred from the file name when not given.
    #[arg(short = 't', long, value_name = "TYPE")]
    pub psm_file_type: Option<String>,

    /// Number of parallel processes. -1 uses every available CPU.
    #[arg(short = 'n', long, value_name = "NUM", allow_negative_numbers = true)]
    pub processes: Option<i64>,

    /// Keep intermediate files.
    #[arg(long)]
    pub keep_tmp_files: bool,

    /// Do not render progress bars.
    #[arg(long)]
    pub no_progress: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct CheckToolsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Toml,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Critical,
    Error,
    #[value(alias = "warn")]
    Warning,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parses a level name as written in a configuration file.
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name.trim(), true).ok()
    }
}

impl Commands {
    pub fn config_args(&self) -> &ConfigArgs {
        match self {
            Commands::Run(args) => &args.config,
            Commands::Config(args) => &args.config,
            Commands::CheckTools(args) => &args.config,
        }
    }
}
