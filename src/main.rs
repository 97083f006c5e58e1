// SPDX-License-Identifier: PMPL-1.0-or-later
//! Privacybot CLI - GDPR/NDPR Privacy Compliance Bot

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use privacybot::config::{self, Config};
use privacybot::inspect::{FixtureSite, HttpSessionProvider, SessionProvider};
use privacybot::report::{generate_report, OutputFormat};
use privacybot::{default_registry, PrivacyError, Report};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit code when any check failed or errored
const EXIT_NON_COMPLIANT: i32 = 1;
/// Exit code when no inspection session could be started
const EXIT_SESSION_FAILURE: i32 = 2;

/// GDPR/NDPR privacy compliance checks for websites
#[derive(Parser)]
#[command(name = "privacybot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a live website
    Check {
        /// URL to audit; https:// is assumed when no scheme is given
        url: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Configuration file (TOML or YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Audit local HTML files
    Analyze {
        /// HTML file or directory of pages
        path: PathBuf,

        /// URL the local pages are served under
        #[arg(long, default_value = "https://localhost/")]
        base_url: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Configuration file (TOML or YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the checks that would run
    List {
        /// Configuration file (TOML or YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Where to write it (the user config directory if not specified)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for CI
    Sarif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("privacybot=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("privacybot=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    privacybot::checks::install_panic_hook();
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);
    config::load_config(&path).with_context(|| format!("loading {}", path.display()))
}

/// Prefix `https://` when the target has no scheme
fn normalize_url(target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{}", target)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { url, format, output, config, verbose } => {
            init_logging(verbose);
            let config = load(config.as_deref())?;
            let url = normalize_url(&url);
            let provider = HttpSessionProvider::new(config.session.clone());
            let report = audit(&config, &provider, &url)?;
            finish(&report, format.into(), output.as_deref())?;
        }

        Commands::Analyze { path, base_url, format, output, config, verbose } => {
            init_logging(verbose);
            let config = load(config.as_deref())?;
            let site = FixtureSite::from_path(&path, &base_url)?;
            info!("Loaded {} local pages from {}", site.len(), path.display());
            let report = audit(&config, &site, &base_url)?;
            finish(&report, format.into(), output.as_deref())?;
        }

        Commands::List { config } => {
            let config = load(config.as_deref())?;
            let registry = default_registry(&config)?;
            for check in registry.checks() {
                println!(
                    "{:<24} {:<7} {}",
                    check.id(),
                    check.severity().to_string(),
                    check.name()
                );
            }
        }

        Commands::Init { path, force } => {
            let path = path.unwrap_or_else(config::default_config_path);
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config::write_default_config(&path)?;
            eprintln!("Configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Run the configured checks, exiting with a distinct code when no session starts
fn audit<P: SessionProvider>(config: &Config, provider: &P, url: &str) -> anyhow::Result<Report> {
    let registry = default_registry(config)?;
    match registry.audit(provider, url) {
        Ok(report) => Ok(report),
        Err(e @ PrivacyError::SessionUnavailable(_)) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_SESSION_FAILURE);
        }
        Err(e) => Err(e.into()),
    }
}

fn finish(report: &Report, format: OutputFormat, output: Option<&Path>) -> anyhow::Result<()> {
    write_output(&generate_report(report, format), output)?;
    if report.has_failures() {
        std::process::exit(EXIT_NON_COMPLIANT);
    }
    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
