use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{self, filter::EnvFilter};

use rules_compiler::{
    Compiler, CompilerConfig, Language, ReportFormat, ReportFormatter,
    project_config::ProjectConfig,
};

/// Aggregates the rule files into a unique JSON file for each targeted language.
#[derive(Parser, Debug)]
#[command(name = "compile-rules")]
#[command(about = "Aggregates the rule set into one JSON file per language")]
#[command(version)]
struct Args {
    /// The source language the rules are written in
    #[arg(short = 's', long = "source", value_enum)]
    source: Option<Language>,

    /// The target language(s) to translate to
    #[arg(short = 't', long = "target", value_enum, num_args = 1..)]
    targets: Vec<Language>,

    /// Compile a single fragment file (or glob) instead of every rule file
    #[arg(short = 'p', long = "file", value_name = "GLOB")]
    file: Option<String>,

    /// Keep untranslated values for malformed translated attributes instead of failing the language
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// Drop translations of rules that no longer exist
    #[arg(short = 'r', long = "remove")]
    remove: bool,

    /// Print the result in a Markdown table (same as `--format markdown`)
    #[arg(short = 'm', long = "markdown", conflicts_with = "format")]
    markdown: bool,

    /// Report format
    #[arg(long = "format", value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Project root (default: directory of rules-compiler.yml, or the current directory)
    #[arg(short = 'C', long = "root", value_name = "PATH")]
    root: Option<PathBuf>,

    /// Explicit project configuration file
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory receiving the compiled artifacts, relative to the project root
    #[arg(short = 'o', long = "output-dir", value_name = "PATH")]
    output_dir: Option<PathBuf>,

    /// Rule that must be defined for the rule set to be valid (default: bilan, empty to skip)
    #[arg(long = "root-rule", value_name = "RULE")]
    root_rule: Option<String>,
}

impl Args {
    fn report_format(&self) -> ReportFormat {
        if self.markdown {
            ReportFormat::Markdown
        } else {
            self.format
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::debug!("Starting rules compilation with args: {:?}", args);

    let format = args.report_format();
    let config = create_config_from_args(args)?;
    let compiler = Compiler::new(config).context("Invalid compiler configuration")?;

    let report = compiler.run().await;
    print!("{}", ReportFormatter::render(&report, format));

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Build the configuration: defaults, then the project file, then arguments.
fn create_config_from_args(args: Args) -> Result<CompilerConfig> {
    let start_dir = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };

    let project = match &args.config {
        Some(path) => {
            let config = ProjectConfig::from_file(path)?;
            Some((path.clone(), config))
        }
        None => ProjectConfig::discover(&start_dir)?,
    };

    let mut project_targets = false;
    let mut config = match project {
        Some((path, mut project)) => {
            tracing::info!("Using project configuration {}", path.display());
            let config_dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| start_dir.clone());
            project.resolve_paths(&config_dir);
            project_targets = !project.target_languages.is_empty();
            let root = args.root.clone().unwrap_or(config_dir);
            project.apply_to(CompilerConfig::for_root(root))
        }
        None => CompilerConfig::for_root(start_dir),
    };

    if let Some(source) = args.source {
        config.source_language = source;
        if args.targets.is_empty() && !project_targets {
            config.target_languages = Language::targets_for(source);
        }
    }
    if !args.targets.is_empty() {
        config.target_languages = args.targets;
    }
    if let Some(file) = args.file {
        config.fragment_patterns = vec![file];
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if args.root_rule.is_some() {
        config.root_rule = args.root_rule;
    }
    config.overlay.lenient = args.force;
    config.overlay.prune_unknown_rules = args.remove;

    Ok(config)
}
