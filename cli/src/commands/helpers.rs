use anyhow::{Context, Result, bail};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use platewise_core::models::{FoodRecord, Nutrient};
use platewise_core::session::DailyLog;

/// Parse the time an entry was eaten, relative to `now`.
/// Accepts: "HH:MM" (today), "YYYY-MM-DD HH:MM", "YYYY-MM-DDTHH:MM[:SS]".
pub(crate) fn parse_time(s: Option<&str>, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let Some(s) = s.map(str::trim) else {
        return Ok(now);
    };
    if s == "now" {
        return Ok(now);
    }

    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
        return Ok(now.date().and_time(t));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    bail!("Invalid time '{s}'. Use HH:MM or 'YYYY-MM-DD HH:MM'")
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a day: "YYYY-MM-DD", "today" or "yesterday". Defaults to `today`.
pub(crate) fn parse_date(s: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match s.map(str::trim) {
        None | Some("today") => Ok(today),
        Some("yesterday") => Ok(today - Duration::days(1)),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")),
    }
}

pub(crate) fn parse_nutrient(s: &str) -> Result<Nutrient> {
    Nutrient::from_key(s).with_context(|| {
        let keys: Vec<&str> = Nutrient::ALL.iter().map(|n| n.key()).collect();
        format!("Unknown nutrient '{s}'. Use one of: {}", keys.join(", "))
    })
}

pub(crate) fn parse_serving(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches('x').trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("Invalid serving size: '{s}'. Use a multiplier like '1' or '1.5'"))?;
    if !value.is_finite() || value <= 0.0 {
        bail!("Serving size must be greater than 0");
    }
    Ok(value)
}

/// Find a log entry by 1-based position or by id prefix. Returns its index.
/// A number past the end of the log is tried as an id prefix.
pub(crate) fn resolve_entry(log: &DailyLog, selector: &str) -> Result<Option<usize>> {
    let selector = selector.trim();
    if let Ok(n) = selector.parse::<usize>() {
        if (1..=log.len()).contains(&n) {
            return Ok(Some(n - 1));
        }
    }

    let matches = log.find_by_id_prefix(selector);
    match matches.as_slice() {
        [] => Ok(None),
        [entry] => Ok(log.entries().iter().position(|e| e.id == entry.id)),
        _ => bail!("Entry id prefix '{selector}' is ambiguous ({} matches)", matches.len()),
    }
}

pub(crate) fn print_food_table(foods: &[&FoodRecord]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Code")]
        code: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Cal/100g")]
        calories: String,
        #[tabled(rename = "P/100g")]
        protein: String,
        #[tabled(rename = "C/100g")]
        carbs: String,
        #[tabled(rename = "F/100g")]
        fat: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            code: f.code.clone(),
            name: truncate(&f.description, 40),
            calories: format!("{:.0}", f.energy_kcal),
            protein: format!("{:.1}", f.protein_g),
            carbs: format!("{:.1}", f.carbohydrate_g),
            fat: format!("{:.1}", f.fat_g),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Format a nutrient amount with sensible precision for its unit.
pub(crate) fn fmt_amount(value: f64, nutrient: Nutrient) -> String {
    let value = no_neg_zero(value);
    let unit = nutrient.unit();
    match nutrient {
        Nutrient::Calories => format!("{value:.0} {unit}"),
        Nutrient::Iron => format!("{value:.1} {unit}"),
        _ if unit == "mg" => format!("{value:.0} {unit}"),
        _ => format!("{value:.1} {unit}"),
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
