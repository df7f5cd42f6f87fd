use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use apiguard::commands::{check, fix, OutputMode};
use apiguard::config::Config;
use apiguard::extractor::ToolExtractor;

#[derive(Parser)]
#[command(name = "apiguard")]
#[command(about = "Guard the public API surface of source packages", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the gate configuration file
    #[arg(short, long, default_value = ".apiguard.toml", global = true)]
    config: PathBuf,

    /// Use this extractor binary instead of locating or building one
    #[arg(long, global = true)]
    extractor_bin: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the public API changed relative to the recorded baselines
    Check {
        /// Projects to check; empty means every project that requires the gate
        projects: Vec<String>,

        /// Print only per-package counts instead of each entry
        #[arg(long)]
        summary: bool,
    },

    /// Rewrite baseline files to match the current public API
    Fix {
        /// Projects to fix; empty means all configured projects
        projects: Vec<String>,
    },
}

enum Outcome {
    Clean,
    Findings,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Findings) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let config = Config::load(&cli.config)?;
    let extractor = ToolExtractor::prepare(&config.extractor, cli.extractor_bin.as_deref())?;
    let stdout = io::stdout();

    match cli.command {
        Commands::Check { projects, summary } => {
            let mode = if summary {
                OutputMode::Summary
            } else {
                OutputMode::Detailed
            };
            let findings = check::execute(
                &config,
                &projects,
                mode,
                &extractor,
                &mut stdout.lock(),
            )?;
            Ok(if findings {
                Outcome::Findings
            } else {
                Outcome::Clean
            })
        }
        Commands::Fix { projects } => {
            fix::execute(&config, &projects, &extractor, &mut stdout.lock())?;
            Ok(Outcome::Clean)
        }
    }
}
