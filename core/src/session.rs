use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::analysis::sum_totals;
use crate::models::{FoodRecord, LogEntry, Nutrient, NutrientTotals, validate_log_entry};

/// The day's food log. Owned by the caller and passed to every operation
/// that needs it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DailyLog {
    entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSummary {
    pub entry_count: usize,
    pub totals: NutrientTotals,
    pub average_calories: f64,
    pub first_entry: Option<NaiveDateTime>,
    pub last_entry: Option<NaiveDateTime>,
    /// Hours between the first and last entry; `None` below two entries.
    pub eating_window_hours: Option<f64>,
}

impl DailyLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from existing entries, validating each one.
    pub fn from_entries(entries: Vec<LogEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            validate_log_entry(entry).with_context(|| format!("Invalid log entry {}", i + 1))?;
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Log `serving_size` portions of `food` at `timestamp`.
    pub fn add(
        &mut self,
        food: &FoodRecord,
        serving_size: f64,
        timestamp: NaiveDateTime,
    ) -> Result<&LogEntry> {
        let entry = LogEntry::from_food(food, serving_size, timestamp)?;
        debug!(id = %entry.id, name = %entry.name, serving_size, "logged food");
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn remove(&mut self, id: &str) -> Option<LogEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Remove by zero-based position in the log.
    pub fn remove_at(&mut self, index: usize) -> Option<LogEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Entry ids starting with `prefix`.
    #[must_use]
    pub fn find_by_id_prefix(&self, prefix: &str) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.id.starts_with(prefix))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn totals(&self) -> NutrientTotals {
        sum_totals(&self.entries)
    }

    /// Entries eaten on `date`, in log order.
    #[must_use]
    pub fn on_date(&self, date: NaiveDate) -> DailyLog {
        DailyLog {
            entries: self
                .entries
                .iter()
                .filter(|e| e.timestamp.date() == date)
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> LogSummary {
        let totals = self.totals();
        let first_entry = self.entries.iter().map(|e| e.timestamp).min();
        let last_entry = self.entries.iter().map(|e| e.timestamp).max();
        let eating_window_hours = match (first_entry, last_entry) {
            (Some(first), Some(last)) if self.entries.len() > 1 => {
                Some((last - first).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        };
        let average_calories = if self.entries.is_empty() {
            0.0
        } else {
            totals.get(Nutrient::Calories) / self.entries.len() as f64
        };

        LogSummary {
            entry_count: self.entries.len(),
            totals,
            average_calories,
            first_entry,
            last_entry,
            eating_window_hours,
        }
    }

    /// Write the log as delimited text: a header row, then one row per entry.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        if self.entries.is_empty() {
            wtr.write_record(EXPORT_HEADER)
                .context("Failed to write CSV header")?;
        }
        for entry in &self.entries {
            wtr.serialize(entry)
                .with_context(|| format!("Failed to write log entry {}", entry.id))?;
        }
        wtr.flush().context("Failed to flush CSV output")?;
        Ok(())
    }

    /// Read a log written by [`DailyLog::export_csv`]. Nutrient columns that
    /// are absent count as zero; every row is validated.
    pub fn import_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (line_num, result) in rdr.deserialize::<LogEntry>().enumerate() {
            let row = line_num + 2;
            let entry = result.with_context(|| format!("Failed to parse log row {row}"))?;
            validate_log_entry(&entry).with_context(|| format!("Invalid log row {row}"))?;
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// Load a saved log. A missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let file = File::open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        Self::import_csv(file).with_context(|| format!("In log file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to write log file: {}", path.display()))?;
        self.export_csv(file)
    }
}

/// Column order of an exported log.
pub const EXPORT_HEADER: [&str; 15] = [
    "id",
    "food_code",
    "name",
    "serving_size",
    "timestamp",
    "calories",
    "protein",
    "carbs",
    "fat",
    "fiber",
    "sugar",
    "sodium",
    "calcium",
    "iron",
    "vitamin_c",
];

/// Suggested file name for a log exported on `date`.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("nutrition_log_{}.csv", date.format("%Y%m%d"))
}
