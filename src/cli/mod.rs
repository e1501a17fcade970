use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "kuml",
    version,
    about = "Kubernetes manifest visualizer",
    long_about = "Read Kubernetes YAML manifests and output a PlantUML diagram of the resources and the relationships between them (owners, selectors, volumes, scale targets, ingress backends). Directory arguments respect .gitignore and .ignore; use --no-ignore to bypass them."
)]
pub struct Cli {
    /// Suppress non-essential output (only errors are logged)
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

/// Where manifests come from and how they are decoded.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Manifest files or directories
    #[arg(required = true, value_name = "FILE | DIRECTORY")]
    pub paths: Vec<PathBuf>,
    /// Descend into subdirectories of directory arguments
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,
    /// Bypass ignore rules (.gitignore/.ignore) when discovering files
    #[arg(long, default_value_t = false)]
    pub no_ignore: bool,
    /// Skip documents that fail to decode instead of aborting
    #[arg(long, default_value_t = false)]
    pub lenient: bool,
    /// Path to a TOML configuration file (defaults to ./kuml.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the diagram for a set of manifests
    Render {
        #[command(flatten)]
        input: InputArgs,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<RenderFormat>,
        /// Write output to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Display the label of links between elements
        #[arg(short = 's', long = "show-link-label", default_value_t = false)]
        show_link_label: bool,
        /// Group elements by namespace
        #[arg(long, default_value_t = false)]
        namespaces: bool,
        /// Diagram title
        #[arg(long)]
        title: Option<String>,
        /// DOT: theme
        #[arg(long, value_enum)]
        dot_theme: Option<DotThemeArg>,
        /// DOT: rank direction
        #[arg(long, value_enum)]
        dot_rankdir: Option<DotRankDirArg>,
    },
    /// Run queries over the inferred relationships
    Query {
        #[command(subcommand)]
        query: QueryCommands,
    },
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum QueryCommands {
    /// List references that resolved to nothing (PDBs without pods, HPAs without deployments, dangling ingress backends)
    Unmatched {
        #[command(flatten)]
        input: InputArgs,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// List the relationships of one resource
    Related {
        #[command(flatten)]
        input: InputArgs,
        /// Resource identifier, e.g. default_Deployment_web
        #[arg(long, value_name = "ID")]
        resource: String,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    Plantuml,
    Dot,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DotThemeArg {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[allow(clippy::upper_case_acronyms)]
pub enum DotRankDirArg {
    #[value(name = "TB")]
    TB,
    #[value(name = "LR")]
    LR,
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
