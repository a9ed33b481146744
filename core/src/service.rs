use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::analysis::{self, MealTiming};
use crate::config::AnalysisConfig;
use crate::dataset::{self, FoodTable, NutrientStats};
use crate::models::{
    Analysis, FoodRecord, GoalProgress, LogEntry, MacroSplit, Nutrient, NutrientTotals,
    Recommendation,
};
use crate::recommend::{self, RecipeSuggestion, Suggestion, SupplementNote};

/// Everything the analysis view shows for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub totals: NutrientTotals,
    pub analysis: Analysis,
    pub goals: BTreeMap<Nutrient, GoalProgress>,
    pub macros: MacroSplit,
    pub meal_timing: Option<MealTiming>,
    pub advice: Vec<String>,
}

/// Foods and hints addressing a day's deficiencies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationReport {
    pub foods: BTreeMap<Nutrient, Vec<Recommendation>>,
    pub recipes: Vec<RecipeSuggestion>,
    pub supplements: Vec<SupplementNote>,
    pub suggestions: Vec<Suggestion>,
}

/// UI-facing entry point: a loaded food table plus analysis settings.
///
/// Holds no log state. Callers own their [`crate::session::DailyLog`] and
/// pass its entries in.
pub struct NutritionService {
    table: FoodTable,
    config: AnalysisConfig,
}

impl NutritionService {
    /// Load the dataset at `source` (or a default location), falling back to
    /// the sample table.
    #[must_use]
    pub fn load(source: Option<&Path>, config: AnalysisConfig) -> Self {
        Self::with_table(FoodTable::load(source), config)
    }

    #[must_use]
    pub fn with_table(table: FoodTable, config: AnalysisConfig) -> Self {
        Self { table, config }
    }

    #[must_use]
    pub fn table(&self) -> &FoodTable {
        &self.table
    }

    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    // --- Data access ---

    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<&FoodRecord> {
        dataset::search(&self.table.records, query, limit)
    }

    #[must_use]
    pub fn get_by_code(&self, code: &str) -> Option<&FoodRecord> {
        dataset::get_by_code(&self.table.records, code)
    }

    #[must_use]
    pub fn rich_in(&self, nutrient: Nutrient, limit: usize) -> Vec<&FoodRecord> {
        dataset::rich_in(&self.table.records, nutrient, limit)
    }

    #[must_use]
    pub fn statistics(&self) -> BTreeMap<Nutrient, NutrientStats> {
        dataset::nutrient_statistics(&self.table.records)
    }

    // --- Aggregation ---

    #[must_use]
    pub fn sum_totals(&self, entries: &[LogEntry]) -> NutrientTotals {
        analysis::sum_totals(entries)
    }

    #[must_use]
    pub fn analyze(&self, totals: &NutrientTotals) -> Analysis {
        analysis::analyze(totals, &self.config)
    }

    #[must_use]
    pub fn goal_progress(&self, totals: &NutrientTotals) -> BTreeMap<Nutrient, GoalProgress> {
        analysis::goal_progress(totals, &self.config)
    }

    #[must_use]
    pub fn day_report(&self, entries: &[LogEntry]) -> DayReport {
        let totals = analysis::sum_totals(entries);
        let result = analysis::analyze(&totals, &self.config);
        DayReport {
            goals: analysis::goal_progress(&totals, &self.config),
            macros: analysis::macro_split(&totals),
            meal_timing: analysis::meal_timing(entries),
            advice: analysis::advice(&result),
            analysis: result,
            totals,
        }
    }

    // --- Recommendations ---

    #[must_use]
    pub fn recommend(&self, analysis: &Analysis) -> BTreeMap<Nutrient, Vec<Recommendation>> {
        recommend::recommend(
            &analysis.deficiencies,
            &self.table.records,
            &self.config.recommend,
        )
    }

    #[must_use]
    pub fn recommendation_report(&self, entries: &[LogEntry]) -> RecommendationReport {
        let totals = analysis::sum_totals(entries);
        let result = analysis::analyze(&totals, &self.config);
        RecommendationReport {
            foods: self.recommend(&result),
            recipes: recommend::recipe_suggestions(&result.deficiencies),
            supplements: recommend::supplement_notes(&result.deficiencies),
            suggestions: recommend::pairing_suggestions(entries, &totals),
        }
    }
}
