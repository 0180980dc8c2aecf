use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

use loadcmp_common::format_duration;
use loadcmp_report::ReportGenerator;
use loadcmp_runner::{HarnessConfig, TestRunner};

/// Instrumentation overhead comparison harness
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a comparison: both phases under identical load, then report
    Run {
        /// Configuration file path (YAML)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// App to test (must be configured)
        #[arg(short, long)]
        app: String,

        /// Load profile name
        #[arg(short, long, default_value = "medium_load")]
        profile: String,

        /// Skip report generation after the run
        #[arg(long)]
        no_report: bool,
    },
    /// Generate a report from a persisted comparison record
    Report {
        /// Path of the comparison JSON
        comparison_file: PathBuf,

        /// Output directory (defaults to the record's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List the load profiles a config can resolve
    Profiles {
        /// Configuration file path (YAML); omit for the built-in table only
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    initialize_logging(args.debug)?;

    match args.command {
        Command::Run {
            config,
            app,
            profile,
            no_report,
        } => run_comparison(&config, &app, &profile, no_report).await,
        Command::Report {
            comparison_file,
            output_dir,
        } => generate_report(&comparison_file, output_dir),
        Command::Profiles { config } => list_profiles(config.as_deref()),
    }
}

async fn run_comparison(
    config_path: &std::path::Path,
    app: &str,
    profile: &str,
    no_report: bool,
) -> Result<()> {
    let config = HarnessConfig::load_from_file(config_path)?;
    info!(
        "Loaded configuration for {} app(s) from {}",
        config.apps.len(),
        config_path.display()
    );

    let results_dir = config.results_dir.clone();
    let mut runner = TestRunner::new(config);

    // Race the run against Ctrl+C so teardown always happens before exit.
    let outcome = tokio::select! {
        result = runner.run_comparison(app, profile) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cleaning up spawned processes");
            None
        }
    };
    runner.cleanup().await;

    let Some(result) = outcome else {
        anyhow::bail!("comparison interrupted");
    };
    let (comparison, path) = result?;

    if !comparison.is_complete() {
        warn!("At least one phase failed; see {}", path.display());
    }

    if !no_report {
        let artifacts = ReportGenerator::new(&results_dir).generate(&comparison)?;
        info!("Report: {}", artifacts.markdown.display());
    }

    if comparison.is_complete() {
        Ok(())
    } else {
        error!("Comparison incomplete");
        std::process::exit(1);
    }
}

fn generate_report(comparison_file: &std::path::Path, output_dir: Option<PathBuf>) -> Result<()> {
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => comparison_file
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let artifacts = ReportGenerator::new(output_dir).generate_from_file(comparison_file)?;
    println!("{}", artifacts.markdown.display());
    Ok(())
}

fn list_profiles(config_path: Option<&std::path::Path>) -> Result<()> {
    let table = match config_path {
        Some(path) => HarnessConfig::load_from_file(path)?.profile_table(),
        None => loadcmp_common::builtin_profiles(),
    };
    for (name, profile) in table {
        println!(
            "{:<16} {:>4} users, spawn rate {:>3}/s, {:>6}  {}",
            name,
            profile.users,
            profile.spawn_rate,
            format_duration(profile.duration),
            profile.description
        );
    }
    Ok(())
}

fn initialize_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    Ok(())
}
