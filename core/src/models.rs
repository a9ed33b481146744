use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, bail};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The nutrients tracked per food and per log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fat,
    Fiber,
    Sugar,
    Sodium,
    Calcium,
    Iron,
    VitaminC,
}

impl Nutrient {
    pub const ALL: [Nutrient; 10] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::Sodium,
        Nutrient::Calcium,
        Nutrient::Iron,
        Nutrient::VitaminC,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Carbs => "carbs",
            Nutrient::Fat => "fat",
            Nutrient::Fiber => "fiber",
            Nutrient::Sugar => "sugar",
            Nutrient::Sodium => "sodium",
            Nutrient::Calcium => "calcium",
            Nutrient::Iron => "iron",
            Nutrient::VitaminC => "vitamin_c",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Nutrient::Calories => "Calories",
            Nutrient::Protein => "Protein",
            Nutrient::Carbs => "Carbs",
            Nutrient::Fat => "Fat",
            Nutrient::Fiber => "Fiber",
            Nutrient::Sugar => "Sugar",
            Nutrient::Sodium => "Sodium",
            Nutrient::Calcium => "Calcium",
            Nutrient::Iron => "Iron",
            Nutrient::VitaminC => "Vitamin C",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            Nutrient::Protein
            | Nutrient::Carbs
            | Nutrient::Fat
            | Nutrient::Fiber
            | Nutrient::Sugar => "g",
            Nutrient::Sodium | Nutrient::Calcium | Nutrient::Iron | Nutrient::VitaminC => "mg",
        }
    }

    /// Nutrients where staying under the target is the goal.
    #[must_use]
    pub fn is_limit(self) -> bool {
        matches!(self, Nutrient::Sodium | Nutrient::Sugar)
    }

    /// Parse a nutrient key. Case-insensitive; `-` and spaces count as `_`.
    #[must_use]
    pub fn from_key(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "calories" | "energy" | "kcal" => Some(Nutrient::Calories),
            "protein" => Some(Nutrient::Protein),
            "carbs" | "carbohydrate" | "carbohydrates" => Some(Nutrient::Carbs),
            "fat" => Some(Nutrient::Fat),
            "fiber" | "fibre" => Some(Nutrient::Fiber),
            "sugar" | "sugars" => Some(Nutrient::Sugar),
            "sodium" => Some(Nutrient::Sodium),
            "calcium" => Some(Nutrient::Calcium),
            "iron" => Some(Nutrient::Iron),
            "vitamin_c" | "vitaminc" => Some(Nutrient::VitaminC),
            _ => None,
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One row of the food dataset. Nutrient values are per 100 g.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub code: String,
    pub description: String,
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub carbohydrate_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub sodium_mg: f64,
    pub calcium_mg: f64,
    pub iron_mg: f64,
    pub vitamin_c_mg: f64,
}

impl FoodRecord {
    /// Build a record from values ordered like [`Nutrient::ALL`]. Values are
    /// coerced with [`non_negative`].
    #[must_use]
    pub fn from_values(code: &str, description: &str, values: [f64; 10]) -> Self {
        let [energy, protein, carbs, fat, fiber, sugar, sodium, calcium, iron, vitamin_c] =
            values.map(non_negative);
        Self {
            code: code.trim().to_string(),
            description: description.trim().to_string(),
            energy_kcal: energy,
            protein_g: protein,
            carbohydrate_g: carbs,
            fat_g: fat,
            fiber_g: fiber,
            sugar_g: sugar,
            sodium_mg: sodium,
            calcium_mg: calcium,
            iron_mg: iron,
            vitamin_c_mg: vitamin_c,
        }
    }

    #[must_use]
    pub fn value(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.energy_kcal,
            Nutrient::Protein => self.protein_g,
            Nutrient::Carbs => self.carbohydrate_g,
            Nutrient::Fat => self.fat_g,
            Nutrient::Fiber => self.fiber_g,
            Nutrient::Sugar => self.sugar_g,
            Nutrient::Sodium => self.sodium_mg,
            Nutrient::Calcium => self.calcium_mg,
            Nutrient::Iron => self.iron_mg,
            Nutrient::VitaminC => self.vitamin_c_mg,
        }
    }
}

/// A logged consumption event. Nutrient fields hold the source value times
/// `serving_size`; fields absent on deserialization count as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    #[serde(default)]
    pub food_code: String,
    pub name: String,
    pub serving_size: f64,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub sodium: f64,
    #[serde(default)]
    pub calcium: f64,
    #[serde(default)]
    pub iron: f64,
    #[serde(default)]
    pub vitamin_c: f64,
}

impl LogEntry {
    pub fn from_food(
        food: &FoodRecord,
        serving_size: f64,
        timestamp: NaiveDateTime,
    ) -> Result<Self> {
        validate_serving_size(serving_size)?;
        let scaled = |n: Nutrient| food.value(n) * serving_size;
        let entry = Self {
            id: Uuid::new_v4().to_string(),
            food_code: food.code.clone(),
            name: food.description.clone(),
            serving_size,
            timestamp,
            calories: scaled(Nutrient::Calories),
            protein: scaled(Nutrient::Protein),
            carbs: scaled(Nutrient::Carbs),
            fat: scaled(Nutrient::Fat),
            fiber: scaled(Nutrient::Fiber),
            sugar: scaled(Nutrient::Sugar),
            sodium: scaled(Nutrient::Sodium),
            calcium: scaled(Nutrient::Calcium),
            iron: scaled(Nutrient::Iron),
            vitamin_c: scaled(Nutrient::VitaminC),
        };
        validate_log_entry(&entry)?;
        Ok(entry)
    }

    #[must_use]
    pub fn nutrient(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugar => self.sugar,
            Nutrient::Sodium => self.sodium,
            Nutrient::Calcium => self.calcium,
            Nutrient::Iron => self.iron,
            Nutrient::VitaminC => self.vitamin_c,
        }
    }
}

/// Summed nutrient values. Missing nutrients read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutrientTotals(BTreeMap<Nutrient, f64>);

impl NutrientTotals {
    /// Every tracked nutrient present with a value of zero.
    #[must_use]
    pub fn zeroed() -> Self {
        Nutrient::ALL.iter().map(|&n| (n, 0.0)).collect()
    }

    #[must_use]
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        self.0.get(&nutrient).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn contains(&self, nutrient: Nutrient) -> bool {
        self.0.contains_key(&nutrient)
    }

    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        self.0.insert(nutrient, value);
    }

    pub fn add(&mut self, nutrient: Nutrient, value: f64) {
        *self.0.entry(nutrient).or_insert(0.0) += value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        self.0.iter().map(|(&n, &v)| (n, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Nutrient, f64)> for NutrientTotals {
    fn from_iter<I: IntoIterator<Item = (Nutrient, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Acceptable intake as multiples of the target. `max: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientRange {
    pub min: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

impl NutrientRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max: Some(max) }
    }

    #[must_use]
    pub const fn at_least(min: f64) -> Self {
        Self { min, max: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientStatus {
    Deficient,
    Excess,
    WithinRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientAssessment {
    pub current: f64,
    pub target: f64,
    pub percentage: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub deficiencies: BTreeMap<Nutrient, NutrientAssessment>,
    pub excesses: BTreeMap<Nutrient, NutrientAssessment>,
    pub within_range: BTreeMap<Nutrient, NutrientAssessment>,
    /// Mean achievement across scored nutrients, 0 to 100.
    pub overall_score: f64,
}

impl Analysis {
    #[must_use]
    pub fn status(&self, nutrient: Nutrient) -> Option<NutrientStatus> {
        if self.deficiencies.contains_key(&nutrient) {
            Some(NutrientStatus::Deficient)
        } else if self.excesses.contains_key(&nutrient) {
            Some(NutrientStatus::Excess)
        } else if self.within_range.contains_key(&nutrient) {
            Some(NutrientStatus::WithinRange)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Excellent,
    Good,
    Caution,
    Exceeded,
    Achieved,
    Close,
    Moderate,
    Low,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GoalStatus::Excellent => "excellent",
            GoalStatus::Good => "good",
            GoalStatus::Caution => "caution",
            GoalStatus::Exceeded => "exceeded",
            GoalStatus::Achieved => "achieved",
            GoalStatus::Close => "close",
            GoalStatus::Moderate => "moderate",
            GoalStatus::Low => "low",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub current: f64,
    pub target: f64,
    /// Share of the target reached, capped at 100.
    pub percentage: f64,
    pub remaining: f64,
    pub unit: String,
    pub status: GoalStatus,
}

/// Percentage of calories coming from each macronutrient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroSplit {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub food_code: String,
    pub nutrient_value: f64,
    pub unit: String,
    pub calories_per_100g: f64,
}

/// Coerce a raw nutrient value: anything negative or non-finite becomes 0.
#[must_use]
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn validate_serving_size(serving_size: f64) -> Result<()> {
    if !serving_size.is_finite() || serving_size <= 0.0 {
        bail!("Serving size must be a positive number (got {serving_size})");
    }
    Ok(())
}

/// Validate an imported log entry: name present, serving positive, nutrients non-negative.
pub fn validate_log_entry(entry: &LogEntry) -> Result<()> {
    if entry.name.trim().is_empty() {
        bail!("Log entry name must not be empty");
    }
    validate_serving_size(entry.serving_size)?;
    for nutrient in Nutrient::ALL {
        let value = entry.nutrient(nutrient);
        if !value.is_finite() || value < 0.0 {
            bail!("{nutrient} must be a non-negative number (got {value})");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn salmon() -> FoodRecord {
        FoodRecord::from_values(
            "15121000",
            "Salmon, cooked",
            [208.0, 25.4, 0.0, 12.4, 0.0, 0.0, 59.0, 12.0, 0.8, 0.0],
        )
    }

    #[test]
    fn test_nutrient_keys_round_trip() {
        for n in Nutrient::ALL {
            assert_eq!(Nutrient::from_key(n.key()), Some(n));
        }
    }

    #[test]
    fn test_nutrient_from_key_aliases() {
        assert_eq!(Nutrient::from_key("Vitamin C"), Some(Nutrient::VitaminC));
        assert_eq!(Nutrient::from_key("vitamin-c"), Some(Nutrient::VitaminC));
        assert_eq!(Nutrient::from_key("FIBRE"), Some(Nutrient::Fiber));
        assert_eq!(Nutrient::from_key("energy"), Some(Nutrient::Calories));
        assert!(Nutrient::from_key("zinc").is_none());
    }

    #[test]
    fn test_nutrient_units() {
        assert_eq!(Nutrient::Calories.unit(), "kcal");
        assert_eq!(Nutrient::Protein.unit(), "g");
        assert_eq!(Nutrient::Sodium.unit(), "mg");
        assert_eq!(Nutrient::VitaminC.unit(), "mg");
    }

    #[test]
    fn test_nutrient_serializes_snake_case() {
        let json = serde_json::to_string(&Nutrient::VitaminC).unwrap();
        assert_eq!(json, "\"vitamin_c\"");
    }

    #[test]
    fn test_from_values_coerces_invalid_numbers() {
        let food = FoodRecord::from_values(
            " 1 ",
            "  Odd  ",
            [-5.0, f64::NAN, f64::INFINITY, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        );
        assert_eq!(food.code, "1");
        assert_eq!(food.description, "Odd");
        assert!(food.energy_kcal.abs() < f64::EPSILON);
        assert!(food.protein_g.abs() < f64::EPSILON);
        assert!(food.carbohydrate_g.abs() < f64::EPSILON);
        assert!((food.fat_g - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_log_entry_scales_by_serving() {
        let entry = LogEntry::from_food(&salmon(), 1.5, noon()).unwrap();
        assert_eq!(entry.name, "Salmon, cooked");
        assert_eq!(entry.food_code, "15121000");
        assert!((entry.calories - 312.0).abs() < 1e-9);
        assert!((entry.protein - 38.1).abs() < 1e-9);
        assert!((entry.sodium - 88.5).abs() < 1e-9);
        assert!((entry.nutrient(Nutrient::Iron) - 1.2).abs() < 1e-9);
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_log_entry_ids_are_unique() {
        let a = LogEntry::from_food(&salmon(), 1.0, noon()).unwrap();
        let b = LogEntry::from_food(&salmon(), 1.0, noon()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_log_entry_rejects_bad_serving() {
        assert!(LogEntry::from_food(&salmon(), 0.0, noon()).is_err());
        assert!(LogEntry::from_food(&salmon(), -1.0, noon()).is_err());
        assert!(LogEntry::from_food(&salmon(), f64::NAN, noon()).is_err());
    }

    #[test]
    fn test_log_entry_rejects_overflowing_serving() {
        let err = LogEntry::from_food(&salmon(), 1e307, noon()).unwrap_err();
        assert!(err.to_string().contains("calories"), "{err}");
    }

    #[test]
    fn test_log_entry_missing_fields_default_to_zero() {
        let json = r#"{
            "id": "a",
            "name": "Toast",
            "serving_size": 1.0,
            "timestamp": "2024-06-15T08:30:00",
            "calories": 80.0
        }"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert!((entry.calories - 80.0).abs() < f64::EPSILON);
        assert!(entry.protein.abs() < f64::EPSILON);
        assert!(entry.food_code.is_empty());
    }

    #[test]
    fn test_totals_missing_nutrient_reads_zero() {
        let totals: NutrientTotals = [(Nutrient::Protein, 40.0)].into_iter().collect();
        assert!((totals.get(Nutrient::Protein) - 40.0).abs() < f64::EPSILON);
        assert!(totals.get(Nutrient::Iron).abs() < f64::EPSILON);
        assert!(!totals.contains(Nutrient::Iron));
        assert_eq!(totals.len(), 1);
    }

    #[test]
    fn test_totals_zeroed_has_every_nutrient() {
        let totals = NutrientTotals::zeroed();
        assert_eq!(totals.len(), Nutrient::ALL.len());
        assert!(totals.iter().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn test_totals_serialize_as_map() {
        let mut totals = NutrientTotals::default();
        totals.add(Nutrient::VitaminC, 10.0);
        totals.add(Nutrient::VitaminC, 5.0);
        let json = serde_json::to_string(&totals).unwrap();
        assert_eq!(json, r#"{"vitamin_c":15.0}"#);
    }

    #[test]
    fn test_non_negative() {
        assert!((non_negative(3.5) - 3.5).abs() < f64::EPSILON);
        assert!(non_negative(-1.0).abs() < f64::EPSILON);
        assert!(non_negative(f64::NAN).abs() < f64::EPSILON);
        assert!(non_negative(f64::NEG_INFINITY).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_log_entry() {
        let mut entry = LogEntry::from_food(&salmon(), 1.0, noon()).unwrap();
        assert!(validate_log_entry(&entry).is_ok());

        entry.iron = -0.5;
        let err = validate_log_entry(&entry).unwrap_err();
        assert!(err.to_string().contains("iron"));

        entry.iron = 0.0;
        entry.name = "  ".to_string();
        assert!(validate_log_entry(&entry).is_err());
    }

    #[test]
    fn test_analysis_status_lookup() {
        let mut analysis = Analysis::default();
        analysis.deficiencies.insert(
            Nutrient::Iron,
            NutrientAssessment {
                current: 2.0,
                target: 18.0,
                percentage: 11.1,
                unit: "mg".to_string(),
            },
        );
        assert_eq!(
            analysis.status(Nutrient::Iron),
            Some(NutrientStatus::Deficient)
        );
        assert_eq!(analysis.status(Nutrient::Fat), None);
    }
}
