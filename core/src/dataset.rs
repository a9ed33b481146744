use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{FoodRecord, Nutrient};

/// Files probed, relative to the working directory, when no dataset path is given.
pub const DEFAULT_DATASET_PATHS: &[&str] = &[
    "usda_food_data.csv",
    "food_database.csv",
    "data/usda_food_data.csv",
    "data/food_database.csv",
];

pub const COL_FOOD_CODE: &str = "Food code";
pub const COL_DESCRIPTION: &str = "Main food description";

pub const REQUIRED_COLUMNS: &[&str] = &[
    COL_FOOD_CODE,
    COL_DESCRIPTION,
    "Energy (kcal)",
    "Protein (g)",
    "Carbohydrate (g)",
    "Total Fat (g)",
];

/// Header names accepted for each nutrient column, canonical name first.
#[must_use]
pub fn nutrient_columns(nutrient: Nutrient) -> &'static [&'static str] {
    match nutrient {
        Nutrient::Calories => &["Energy (kcal)"],
        Nutrient::Protein => &["Protein (g)"],
        Nutrient::Carbs => &["Carbohydrate (g)"],
        Nutrient::Fat => &["Total Fat (g)"],
        Nutrient::Fiber => &["Fiber, total dietary (g)", "Fibre (g)"],
        Nutrient::Sugar => &["Sugars, total (g)", "Sugars (g)"],
        Nutrient::Sodium => &["Sodium (mg)"],
        Nutrient::Calcium => &["Calcium (mg)"],
        Nutrient::Iron => &["Iron (mg)"],
        Nutrient::VitaminC => &["Vitamin C (mg)"],
    }
}

/// Where a [`FoodTable`] came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableOrigin {
    File { path: PathBuf },
    Sample { reason: String },
}

/// The read-only food table.
#[derive(Debug, Clone, Serialize)]
pub struct FoodTable {
    pub origin: TableOrigin,
    pub records: Vec<FoodRecord>,
}

impl FoodTable {
    /// Load a dataset, falling back to [`sample_table`] on any failure.
    ///
    /// With no `source`, the [`DEFAULT_DATASET_PATHS`] are probed in order.
    /// Never fails; a fallback is reported through `origin` and a warning.
    #[must_use]
    pub fn load(source: Option<&Path>) -> Self {
        let path = match source {
            Some(p) => p.to_path_buf(),
            None => match find_default_dataset(Path::new(".")) {
                Some(p) => p,
                None => return Self::sample("no dataset file found"),
            },
        };

        match read_food_csv(&path) {
            Ok(records) => {
                debug!(path = %path.display(), rows = records.len(), "loaded food dataset");
                Self {
                    origin: TableOrigin::File { path },
                    records,
                }
            }
            Err(e) => Self::sample(format!("{e:#}")),
        }
    }

    #[must_use]
    pub fn sample(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(%reason, "using built-in sample food table");
        Self {
            origin: TableOrigin::Sample { reason },
            records: sample_table(),
        }
    }

    #[must_use]
    pub fn is_sample(&self) -> bool {
        matches!(self.origin, TableOrigin::Sample { .. })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// First of the [`DEFAULT_DATASET_PATHS`] that exists under `base`.
#[must_use]
pub fn find_default_dataset(base: &Path) -> Option<PathBuf> {
    DEFAULT_DATASET_PATHS
        .iter()
        .map(|p| base.join(p))
        .find(|p| p.is_file())
}

pub fn read_food_csv(path: &Path) -> Result<Vec<FoodRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open food dataset: {}", path.display()))?;
    parse_food_csv(file).with_context(|| format!("Invalid food dataset: {}", path.display()))
}

/// Parse a food dataset from any reader.
///
/// Required columns are [`REQUIRED_COLUMNS`]; header matching is
/// case-insensitive. Numeric cells that are blank, unparsable, negative or
/// non-finite become 0. Rows without a description are skipped.
pub fn parse_food_csv<R: Read>(reader: R) -> Result<Vec<FoodRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|&name| col(name).is_none())
        .collect();
    if !missing.is_empty() {
        bail!("Missing required columns: {}", missing.join(", "));
    }

    let idx_code = col(COL_FOOD_CODE).context("Missing 'Food code' column")?;
    let idx_desc = col(COL_DESCRIPTION).context("Missing 'Main food description' column")?;
    let nutrient_idx: Vec<Option<usize>> = Nutrient::ALL
        .iter()
        .map(|&n| nutrient_columns(n).iter().find_map(|&name| col(name)))
        .collect();

    let mut records = Vec::new();

    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;

        let description = record.get(idx_desc).unwrap_or("").trim();
        if description.is_empty() {
            continue;
        }
        let code = record.get(idx_code).unwrap_or("").trim();

        let mut values = [0.0; 10];
        for (slot, idx) in values.iter_mut().zip(&nutrient_idx) {
            *slot = idx
                .and_then(|i| record.get(i))
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
        }

        records.push(FoodRecord::from_values(code, description, values));
    }

    Ok(records)
}

/// Records whose description contains `query`, case-insensitively, in table order.
///
/// Queries shorter than two characters after trimming match nothing.
#[must_use]
pub fn search<'a>(records: &'a [FoodRecord], query: &str, limit: usize) -> Vec<&'a FoodRecord> {
    let query = query.trim().to_lowercase();
    if query.chars().count() < 2 {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| r.description.to_lowercase().contains(&query))
        .take(limit)
        .collect()
}

#[must_use]
pub fn get_by_code<'a>(records: &'a [FoodRecord], code: &str) -> Option<&'a FoodRecord> {
    let code = code.trim();
    records.iter().find(|r| r.code == code)
}

/// All records sorted by `nutrient`, highest first. Ties keep table order.
pub(crate) fn ranked_by(records: &[FoodRecord], nutrient: Nutrient) -> Vec<&FoodRecord> {
    let mut ranked: Vec<&FoodRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.value(nutrient).total_cmp(&a.value(nutrient)));
    ranked
}

/// The `limit` richest records in `nutrient`, minus any with none of it.
#[must_use]
pub fn rich_in(records: &[FoodRecord], nutrient: Nutrient, limit: usize) -> Vec<&FoodRecord> {
    ranked_by(records, nutrient)
        .into_iter()
        .take(limit)
        .filter(|r| r.value(nutrient) > 0.0)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientStats {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; 0 for a single row.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Summary statistics for the energy and macronutrient columns.
#[must_use]
pub fn nutrient_statistics(records: &[FoodRecord]) -> BTreeMap<Nutrient, NutrientStats> {
    const STAT_NUTRIENTS: [Nutrient; 4] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
    ];

    if records.is_empty() {
        return BTreeMap::new();
    }

    STAT_NUTRIENTS
        .iter()
        .map(|&n| {
            let mut values: Vec<f64> = records.iter().map(|r| r.value(n)).collect();
            values.sort_by(f64::total_cmp);
            (n, stats_of_sorted(&values))
        })
        .collect()
}

fn stats_of_sorted(values: &[f64]) -> NutrientStats {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    let std_dev = if values.len() > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0);
        var.sqrt()
    } else {
        0.0
    };
    NutrientStats {
        mean,
        median,
        std_dev,
        min: values[0],
        max: values[values.len() - 1],
    }
}

/// Built-in table used when no usable dataset is available.
#[must_use]
pub fn sample_table() -> Vec<FoodRecord> {
    // energy, protein, carbs, fat, fiber, sugar, sodium, calcium, iron, vitamin C
    #[rustfmt::skip]
    let rows: [(&str, &str, [f64; 10]); 10] = [
        ("11100000", "Milk, reduced fat", [52.0, 3.33, 4.83, 2.14, 0.0, 4.88, 39.0, 125.0, 0.0, 0.1]),
        ("11111000", "Milk, whole", [61.0, 3.27, 4.63, 3.2, 0.0, 4.81, 38.0, 123.0, 0.0, 0.0]),
        ("21201000", "Apple, raw", [52.0, 0.26, 13.81, 0.17, 2.4, 10.39, 1.0, 6.0, 0.12, 4.6]),
        ("23101000", "Chicken breast, cooked", [165.0, 31.02, 0.0, 3.57, 0.0, 0.0, 74.0, 15.0, 1.04, 0.0]),
        ("13101000", "Egg, whole, cooked", [155.0, 13.0, 1.1, 10.6, 0.0, 0.6, 124.0, 50.0, 1.8, 0.0]),
        ("15121000", "Salmon, cooked", [208.0, 25.4, 0.0, 12.4, 0.0, 0.0, 59.0, 12.0, 0.8, 0.0]),
        ("18601000", "White bread", [265.0, 9.0, 49.0, 3.2, 2.7, 5.0, 681.0, 151.0, 3.6, 0.0]),
        ("19101000", "Rice, cooked", [130.0, 2.7, 28.2, 0.3, 0.4, 0.1, 1.0, 10.0, 0.8, 0.0]),
        ("63101000", "Broccoli, cooked", [34.0, 2.8, 7.0, 0.4, 5.1, 1.5, 41.0, 47.0, 0.7, 89.2]),
        ("74101000", "Banana, raw", [89.0, 1.1, 22.8, 0.3, 2.6, 12.2, 1.0, 5.0, 0.3, 8.7]),
    ];
    rows.iter()
        .map(|(code, desc, values)| FoodRecord::from_values(code, desc, *values))
        .collect()
}
