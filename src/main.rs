use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use phenomatch::analyzer::CommandAnalyzer;
use phenomatch::prompt::{FixedAnswer, TerminalConfirm};
use phenomatch::{config, render, storage, Category, Session};
use phenomatch_core::Confirm;

#[derive(Parser)]
#[command(name = "phenomatch")]
#[command(version, about = "Rank phenotype reference faces by similarity to a photo")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a photo and print the closest phenotypes
    Analyze {
        /// Photo to analyze
        image: PathBuf,
        /// Catalog file (overrides config)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        /// Skip gender detection gating and use this category
        #[arg(long)]
        category: Option<Category>,
        /// Number of rows to show (overrides config)
        #[arg(short, long)]
        top: Option<usize>,
        /// Accept low-confidence predictions without asking
        #[arg(long, conflicts_with = "no")]
        yes: bool,
        /// Reject low-confidence predictions without asking
        #[arg(long)]
        no: bool,
        /// Print the leaderboard as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load the catalog and report anything that failed to decode
    Inspect {
        /// Catalog file (overrides config)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
    /// Open config file in editor
    Config,
}

fn main() -> ExitCode {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            image,
            catalog,
            category,
            top,
            yes,
            no,
            json,
        } => {
            if let Some(path) = catalog {
                cfg.catalog = path;
            }
            if let Some(n) = top {
                cfg.top_n = n;
            }
            let confirm: Box<dyn Confirm> = if yes || no {
                Box::new(FixedAnswer(yes))
            } else {
                Box::new(TerminalConfirm)
            };
            analyze(cfg, &image, category, confirm, json)
        }
        Commands::Inspect { catalog } => {
            if let Some(path) = catalog {
                cfg.catalog = path;
            }
            inspect(&cfg)
        }
        Commands::Config => open_config(cli.config),
    }
}

fn analyze(
    cfg: config::Config,
    image: &std::path::Path,
    forced: Option<Category>,
    mut confirm: Box<dyn Confirm>,
    json: bool,
) -> Result<ExitCode> {
    let mut analyzer =
        CommandAnalyzer::new(&cfg.analyzer).context("Failed to initialize face analyzer")?;
    let session = Session::open(cfg).context("Failed to load phenotype data")?;

    match session.analyze(image, &mut analyzer, confirm.as_mut(), forced) {
        Ok(analysis) => {
            info!("{}", render::score_report_text(&analysis.scores));
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis.leaderboard)?);
            } else {
                println!("{}", render::leaderboard_text(&analysis.leaderboard));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("{}", e);
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn inspect(cfg: &config::Config) -> Result<ExitCode> {
    let (catalog, report) =
        storage::load_catalog(&cfg.catalog).context("Failed to load phenotype data")?;

    let primaries = catalog.groups.iter().filter(|g| g.primary.is_some()).count();
    let degenerate = catalog.groups.iter().filter(|g| g.is_degenerate()).count();
    println!(
        "{} groups ({} with a primary entry, {} empty), {} entries",
        catalog.groups.len(),
        primaries,
        degenerate,
        catalog.entry_count()
    );

    if report.is_clean() {
        println!("All entries decoded.");
    } else {
        println!("{} decode issue(s):", report.issues.len());
        print!("{}", render::decode_report_text(&report));
    }
    Ok(ExitCode::SUCCESS)
}

fn open_config(path: Option<PathBuf>) -> Result<ExitCode> {
    let config_path = path.unwrap_or_else(|| config::CONFIG_PATH.clone());
    if !config_path.exists() {
        config::save_config(&config::Config::default(), Some(&config_path))
            .context("Failed to write default config")?;
    }
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(ExitCode::SUCCESS)
}
