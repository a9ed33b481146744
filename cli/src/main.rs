mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt};

use crate::commands::{
    cmd_add, cmd_analyze, cmd_clear, cmd_export, cmd_import, cmd_log, cmd_recommend, cmd_remove,
    cmd_search, cmd_show, cmd_stats, cmd_summary, cmd_top,
};
use crate::config::Config;
use platewise_core::service::NutritionService;

#[derive(Parser)]
#[command(
    name = "platewise",
    version,
    about = "Log what you eat, check it against daily targets, find foods to fill the gaps"
)]
struct Cli {
    /// Food dataset CSV (overrides $PLATEWISE_DATASET; default: probe ./usda_food_data.csv etc.)
    #[arg(long, global = true, value_name = "PATH")]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search foods by description
    Search {
        /// Text to look for (at least 2 characters)
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show every nutrient for one food
    Show {
        /// Food code
        code: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a food to the log
    Add {
        /// Food code (see `search`)
        code: String,
        /// Serving multiplier of the per-100g values (e.g. 1, 1.5, 2x)
        #[arg(default_value = "1")]
        serving: String,
        /// When it was eaten: HH:MM or "YYYY-MM-DD HH:MM" (default: now)
        #[arg(long)]
        at: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List logged entries
    Log {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a log entry by position (1-based) or id prefix
    Remove {
        /// Entry number or id prefix
        entry: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every log entry
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show totals and progress toward each target
    Summary {
        /// Day to use (YYYY-MM-DD, today, yesterday; default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify totals as deficient, excessive or in range, with advice
    Analyze {
        /// Day to use (YYYY-MM-DD, today, yesterday; default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recommend foods, recipes and pairings for current deficiencies
    Recommend {
        /// Day to use (YYYY-MM-DD, today, yesterday; default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the foods richest in a nutrient
    Top {
        /// Nutrient key (protein, fiber, iron, vitamin_c, ...)
        nutrient: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show dataset origin and summary statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the log as CSV (default file: nutrition_log_YYYYMMDD.csv, `-` for stdout)
    Export {
        /// Output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import entries from an exported CSV log
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Replace the current log instead of appending
        #[arg(long)]
        replace: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.dataset)?;
    // Log-only commands never load the dataset.
    let service = || -> Result<NutritionService> {
        Ok(NutritionService::load(
            config.dataset_path.as_deref(),
            config.analysis_config()?,
        ))
    };

    match cli.command {
        Commands::Search { query, limit, json } => cmd_search(&service()?, &query, limit, json),
        Commands::Show { code, json } => cmd_show(&service()?, &code, json),
        Commands::Add {
            code,
            serving,
            at,
            json,
        } => cmd_add(&service()?, &config, &code, &serving, at.as_deref(), json),
        Commands::Log { json } => cmd_log(&config, json),
        Commands::Remove { entry, json } => cmd_remove(&config, &entry, json),
        Commands::Clear { json } => cmd_clear(&config, json),
        Commands::Summary { date, json } => {
            cmd_summary(&service()?, &config, date.as_deref(), json)
        }
        Commands::Analyze { date, json } => {
            cmd_analyze(&service()?, &config, date.as_deref(), json)
        }
        Commands::Recommend { date, json } => {
            cmd_recommend(&service()?, &config, date.as_deref(), json)
        }
        Commands::Top {
            nutrient,
            limit,
            json,
        } => cmd_top(&service()?, &nutrient, limit, json),
        Commands::Stats { json } => cmd_stats(&service()?, json),
        Commands::Export { output, json } => cmd_export(&config, output.as_deref(), json),
        Commands::Import {
            file,
            replace,
            json,
        } => cmd_import(&config, &file, replace, json),
    }
}
