use anyhow::{Context, Result, bail};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use platewise_core::models::LogEntry;
use platewise_core::service::NutritionService;
use platewise_core::session::{DailyLog, export_file_name};

use crate::config::Config;

use super::helpers::{
    json_error, no_neg_zero, now, parse_serving, parse_time, resolve_entry, today, truncate,
};

pub(crate) fn cmd_add(
    svc: &NutritionService,
    config: &Config,
    code: &str,
    serving: &str,
    at: Option<&str>,
    json: bool,
) -> Result<()> {
    let serving_size = parse_serving(serving)?;
    let timestamp = parse_time(at, now())?;

    let Some(food) = svc.get_by_code(code) else {
        if json {
            println!("{}", json_error(&format!("Food {code} not found")));
        } else {
            eprintln!("Food {code} not found. Try `platewise search <name>` to find its code");
        }
        process::exit(2);
    };

    let mut log = config.load_log()?;
    let entry = log.add(food, serving_size, timestamp)?.clone();
    config.save_log(&log)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let name = &entry.name;
        let cal = entry.calories;
        let time = entry.timestamp.format("%H:%M");
        println!("Logged {name} x{serving_size} at {time} ({cal:.0} kcal)");
    }

    Ok(())
}

pub(crate) fn cmd_log(config: &Config, json: bool) -> Result<()> {
    let log = config.load_log()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
        return Ok(());
    }

    if log.is_empty() {
        eprintln!("Log is empty");
        process::exit(2);
    }

    print_log_table(log.entries());
    Ok(())
}

pub(crate) fn print_log_table(entries: &[LogEntry]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Eaten")]
        time: String,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| EntryRow {
            idx: i + 1,
            id: e.id.chars().take(8).collect(),
            time: e.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            name: truncate(&e.name, 35),
            serving: format!("x{}", e.serving_size),
            calories: format!("{:.0}", no_neg_zero(e.calories)),
            protein: format!("{:.1}g", no_neg_zero(e.protein)),
            carbs: format!("{:.1}g", no_neg_zero(e.carbs)),
            fat: format!("{:.1}g", no_neg_zero(e.fat)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_remove(config: &Config, selector: &str, json: bool) -> Result<()> {
    let mut log = config.load_log()?;

    let Some(index) = resolve_entry(&log, selector)? else {
        if json {
            println!("{}", json_error(&format!("Entry {selector} not found")));
        } else {
            eprintln!("Entry {selector} not found");
        }
        process::exit(2);
    };

    let removed = log
        .remove_at(index)
        .with_context(|| format!("Entry {selector} not found"))?;
    config.save_log(&log)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": removed.id }));
    } else {
        let name = &removed.name;
        println!("Removed {name}");
    }

    Ok(())
}

pub(crate) fn cmd_clear(config: &Config, json: bool) -> Result<()> {
    let mut log = config.load_log()?;
    let count = log.len();
    log.clear();
    config.save_log(&log)?;

    if json {
        println!("{}", serde_json::json!({ "cleared": count }));
    } else {
        println!("Cleared {count} entries");
    }

    Ok(())
}

/// Write the log to `output`, a generated file name, or stdout for `-`.
pub(crate) fn cmd_export(config: &Config, output: Option<&Path>, json: bool) -> Result<()> {
    let log = config.load_log()?;

    if output == Some(Path::new("-")) {
        return log.export_csv(io::stdout().lock());
    }

    let path = output.map_or_else(|| PathBuf::from(export_file_name(today())), Path::to_path_buf);
    log.save(&path)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "path": path.display().to_string(), "entries": log.len() })
        );
    } else {
        let count = log.len();
        println!("Exported {count} entries to {}", path.display());
    }

    Ok(())
}

/// Load entries from an exported log. Entries already in the log (same id)
/// are skipped; `replace` discards the current log first.
pub(crate) fn cmd_import(config: &Config, file: &Path, replace: bool, json: bool) -> Result<()> {
    if !file.is_file() {
        bail!("File not found: {}", file.display());
    }
    let imported = DailyLog::load(file)?;

    let mut entries = if replace {
        Vec::new()
    } else {
        config.load_log()?.entries().to_vec()
    };
    let before = entries.len();
    for entry in imported.entries() {
        if !entries.iter().any(|e| e.id == entry.id) {
            entries.push(entry.clone());
        }
    }
    let count = entries.len() - before;
    let log = DailyLog::from_entries(entries)?;
    config.save_log(&log)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "imported": count, "total": log.len() })
        );
    } else {
        let total = log.len();
        println!("Imported {count} entries ({total} in log)");
    }

    Ok(())
}
