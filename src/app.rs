use crate::cli::{
    Cli, Commands, DotRankDirArg, DotThemeArg, InputArgs, OutputFormat, QueryCommands,
    RenderFormat,
};
use crate::errors::KumlError;
use crate::graph::Diagram;
use crate::parser::{load_resources, LoadOptions};
use crate::query::{Query, RelatedQuery, UnmatchedQuery};
use crate::utils::config::{self, Config};
use crate::visualization::{
    DotGenerator, DotOptions, DotTheme, PlantUmlGenerator, PlantUmlOptions, RankDir,
};
use clap::CommandFactory;
use clap_complete::generate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `KUML_LOG` (or `RUST_LOG`) takes precedence; otherwise `quiet` selects
/// `error` and each `verbose` step raises the level from `warn`.
pub fn init_logging(quiet: bool, verbose: u8) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_env("KUML_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn load_config(input: &InputArgs) -> Config {
    let found = match input.config.as_ref() {
        Some(path) => config::load_config_at(path),
        None => std::env::current_dir().ok().and_then(|dir| config::load_config_near(&dir)),
    };
    found.unwrap_or_default()
}

/// Decode the manifests named by `input` and infer the diagram.
///
/// # Errors
/// Returns an error if reading or decoding the manifests fails.
pub fn build_diagram(input: &InputArgs, cfg: &Config) -> Result<Diagram, KumlError> {
    let options =
        LoadOptions { recursive: input.recursive, no_ignore: input.no_ignore, lenient: input.lenient };
    let resources = load_resources(&input.paths, options)?;
    Ok(Diagram::build(&resources, &cfg.inference_options()))
}

fn write_output(output: Option<&Path>, content: &str) -> io::Result<()> {
    match output {
        Some(path) => fs::write(path, content),
        None => {
            use std::io::Write;
            let mut out = io::stdout().lock();
            out.write_all(content.as_bytes())?;
            out.flush()
        }
    }
}

fn query_format(flag: Option<OutputFormat>, cfg: &Config) -> OutputFormat {
    flag.unwrap_or_else(|| {
        match cfg.query.as_ref().and_then(|q| q.default_format.as_deref()) {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            0
        }
        Err(e) => {
            eprintln!("JSON encode error: {e}");
            1
        }
    }
}

/// Run the CLI logic in-process.
///
/// Returns an exit code (0 = success, 1 = input or output failure, 2 = bad query argument).
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn run_cli(cli: Cli) -> i32 {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = crate::cli::Cli::command();
            let bin_name = env!("CARGO_PKG_NAME");
            let mut out = io::stdout();
            generate(shell, &mut cmd, bin_name, &mut out);
            0
        }
        Commands::Render {
            input,
            format,
            output,
            show_link_label,
            namespaces,
            title,
            dot_theme,
            dot_rankdir,
        } => {
            let cfg = load_config(&input);
            let diagram = match build_diagram(&input, &cfg) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Build failed: {e}");
                    return 1;
                }
            };

            // Flags win when given; config fills in the rest
            let render_cfg = cfg.render.clone().unwrap_or_default();
            let dot_cfg = cfg.dot.clone().unwrap_or_default();
            let format = format.unwrap_or(match render_cfg.format.as_deref() {
                Some("dot") => RenderFormat::Dot,
                Some("json") => RenderFormat::Json,
                _ => RenderFormat::Plantuml,
            });
            let show_link_labels = show_link_label || render_cfg.show_link_labels.unwrap_or(false);
            let namespaces = namespaces || render_cfg.namespaces.unwrap_or(false);

            // `None` once the diagram has been saved directly
            let content = match format {
                RenderFormat::Plantuml => {
                    let opts = PlantUmlOptions {
                        show_link_labels,
                        namespaces,
                        title: title.or(render_cfg.title),
                    };
                    Some(PlantUmlGenerator::new().generate_with_options(&diagram, &opts))
                }
                RenderFormat::Dot => {
                    let theme = match dot_theme {
                        Some(DotThemeArg::Dark) => DotTheme::Dark,
                        Some(DotThemeArg::Light) => DotTheme::Light,
                        None if dot_cfg.theme.as_deref() == Some("dark") => DotTheme::Dark,
                        None => DotTheme::Light,
                    };
                    let rankdir = match dot_rankdir {
                        Some(DotRankDirArg::LR) => RankDir::LR,
                        Some(DotRankDirArg::TB) => RankDir::TB,
                        None if dot_cfg.rankdir.as_deref() == Some("LR") => RankDir::LR,
                        None => RankDir::TB,
                    };
                    let opts = DotOptions {
                        clusters: namespaces || dot_cfg.clusters.unwrap_or(false),
                        theme,
                        rankdir,
                        show_link_labels,
                    };
                    Some(DotGenerator::new().generate_dot_with_options(&diagram, opts))
                }
                RenderFormat::Json => match output.as_deref() {
                    Some(path) => {
                        if let Err(e) = diagram.save_json(path) {
                            eprintln!("Failed to write output {}: {e}", path.display());
                            return 1;
                        }
                        None
                    }
                    None => match serde_json::to_string_pretty(&diagram) {
                        Ok(s) => Some(s + "\n"),
                        Err(e) => {
                            eprintln!("JSON encode error: {e}");
                            return 1;
                        }
                    },
                },
            };

            if let Some(content) = content {
                if let Err(e) = write_output(output.as_deref(), &content) {
                    let target =
                        output.as_ref().map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
                    eprintln!("Failed to write output {target}: {e}");
                    return 1;
                }
            }
            if let (Some(path), false) = (output.as_ref(), quiet) {
                println!(
                    "Wrote {} elements and {} relationships to {}",
                    diagram.elements.len(),
                    diagram.edges.len(),
                    path.display()
                );
            }
            0
        }
        Commands::Query { query } => match query {
            QueryCommands::Unmatched { input, format } => {
                let cfg = load_config(&input);
                let diagram = match build_diagram(&input, &cfg) {
                    Ok(d) => d,
                    Err(e) => {
                        eprintln!("Build failed: {e}");
                        return 1;
                    }
                };
                let rows = UnmatchedQuery::new().run(&diagram);
                if matches!(query_format(format, &cfg), OutputFormat::Json) {
                    return print_json(&rows);
                }
                if rows.is_empty() {
                    println!("<no unmatched references>");
                } else {
                    let body: Vec<Vec<String>> =
                        rows.into_iter().map(|r| vec![r.from, r.target, r.label]).collect();
                    println!("{}", crate::utils::table::render(&["From", "Target", "Label"], &body));
                }
                0
            }
            QueryCommands::Related { input, resource, format } => {
                let cfg = load_config(&input);
                let diagram = match build_diagram(&input, &cfg) {
                    Ok(d) => d,
                    Err(e) => {
                        eprintln!("Build failed: {e}");
                        return 1;
                    }
                };
                let q = RelatedQuery::new(resource);
                let rows = q.run(&diagram);
                if rows.is_empty() && diagram.element(&q.id).is_none() {
                    eprintln!("{}", KumlError::Query(format!("unknown resource {}", q.id)));
                    return 2;
                }
                if matches!(query_format(format, &cfg), OutputFormat::Json) {
                    return print_json(&rows);
                }
                let body: Vec<Vec<String>> = rows
                    .into_iter()
                    .map(|r| {
                        let dir = match r.direction {
                            crate::query::Direction::Outgoing => "->",
                            crate::query::Direction::Incoming => "<-",
                        };
                        vec![dir.to_string(), r.other, r.label]
                    })
                    .collect();
                println!("{}", crate::utils::table::render(&["Dir", "Resource", "Label"], &body));
                0
            }
        },
    }
}

/// Paths as given on the command line, for callers building `InputArgs` in-process.
#[must_use]
pub fn input_args(paths: Vec<PathBuf>) -> InputArgs {
    InputArgs { paths, recursive: false, no_ignore: false, lenient: false, config: None }
}
