use std::collections::{BTreeMap, HashSet};

use chrono::Timelike;
use serde::Serialize;

use crate::analysis::macro_split;
use crate::config::RecommendConfig;
use crate::dataset::ranked_by;
use crate::models::{
    FoodRecord, LogEntry, Nutrient, NutrientAssessment, NutrientTotals, Recommendation,
};

/// Nutrients the recommender ranks foods by. Calories, sugar and sodium are
/// never worth recommending more of.
#[must_use]
pub fn is_recommendable(nutrient: Nutrient) -> bool {
    matches!(
        nutrient,
        Nutrient::Protein
            | Nutrient::Fiber
            | Nutrient::Calcium
            | Nutrient::Iron
            | Nutrient::VitaminC
            | Nutrient::Fat
            | Nutrient::Carbs
    )
}

/// Foods rich in each deficient nutrient, best first.
///
/// Nutrients that cannot be recommended, or for which no food has a
/// positive value, are left out of the result.
#[must_use]
pub fn recommend(
    deficiencies: &BTreeMap<Nutrient, NutrientAssessment>,
    records: &[FoodRecord],
    config: &RecommendConfig,
) -> BTreeMap<Nutrient, Vec<Recommendation>> {
    deficiencies
        .keys()
        .copied()
        .filter(|&n| is_recommendable(n))
        .filter_map(|n| {
            let foods = foods_rich_in(records, n, config);
            (!foods.is_empty()).then_some((n, foods))
        })
        .collect()
}

/// Up to `config.limit` foods with a positive amount of `nutrient`, varied
/// by name.
#[must_use]
pub fn foods_rich_in(
    records: &[FoodRecord],
    nutrient: Nutrient,
    config: &RecommendConfig,
) -> Vec<Recommendation> {
    let candidates: Vec<&FoodRecord> = ranked_by(records, nutrient)
        .into_iter()
        .filter(|r| r.value(nutrient) > 0.0)
        .take(config.limit.saturating_mul(2))
        .collect();

    deduplicate(&candidates, config)
        .into_iter()
        .map(|food| Recommendation {
            name: food.description.clone(),
            food_code: food.code.clone(),
            nutrient_value: food.value(nutrient),
            unit: nutrient.unit().to_string(),
            calories_per_100g: food.energy_kcal,
        })
        .collect()
}

/// Lowercased words longer than `min_len`, at most `count` of them.
fn leading_keywords(name: &str, min_len: usize, count: usize) -> Vec<String> {
    name.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > min_len)
        .take(count)
        .map(str::to_string)
        .collect()
}

/// Keep candidates in order, skipping ones whose leading keywords were
/// already seen once half of the limit is filled.
fn deduplicate<'a>(
    candidates: &[&'a FoodRecord],
    config: &RecommendConfig,
) -> Vec<&'a FoodRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique: Vec<&FoodRecord> = Vec::new();

    for &food in candidates {
        let keywords = leading_keywords(
            &food.description,
            config.keyword_min_len,
            config.keywords_per_food,
        );
        let similar = keywords.iter().any(|k| seen.contains(k));

        if !similar || unique.len() < config.limit / 2 {
            unique.push(food);
            seen.extend(keywords);
        }
        if unique.len() >= config.limit {
            break;
        }
    }

    unique
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSuggestion {
    pub name: String,
    pub ingredients: Vec<String>,
    pub benefits: String,
}

const MAX_RECIPES: usize = 3;

/// Simple recipes that address the current deficiencies, at most three.
#[must_use]
pub fn recipe_suggestions(
    deficiencies: &BTreeMap<Nutrient, NutrientAssessment>,
) -> Vec<RecipeSuggestion> {
    let recipes: [(&[Nutrient], &str, &[&str], &str); 4] = [
        (
            &[Nutrient::Iron, Nutrient::VitaminC],
            "Spinach and Strawberry Salad",
            &["Fresh spinach", "Strawberries", "Walnuts", "Balsamic vinaigrette"],
            "High in iron (spinach) with vitamin C (strawberries) for better absorption",
        ),
        (
            &[Nutrient::Protein],
            "Quinoa Power Bowl",
            &["Quinoa", "Black beans", "Avocado", "Cherry tomatoes", "Lime"],
            "Complete protein from quinoa and beans combination",
        ),
        (
            &[Nutrient::Calcium],
            "Greek Yogurt Parfait",
            &["Greek yogurt", "Almonds", "Chia seeds", "Berries"],
            "Multiple calcium sources plus vitamin D for absorption",
        ),
        (
            &[Nutrient::Fiber],
            "Three-Bean Chili",
            &["Mixed beans", "Vegetables", "Tomatoes", "Spices"],
            "High fiber content supports digestive health",
        ),
    ];

    recipes
        .iter()
        .filter(|(needs, ..)| needs.iter().all(|n| deficiencies.contains_key(n)))
        .take(MAX_RECIPES)
        .map(|(_, name, ingredients, benefits)| RecipeSuggestion {
            name: (*name).to_string(),
            ingredients: ingredients.iter().map(|s| (*s).to_string()).collect(),
            benefits: (*benefits).to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplementNote {
    pub nutrient: Nutrient,
    pub name: String,
    pub note: String,
    pub warning: String,
}

/// Deficiencies below this share of target get a supplement note.
const SEVERE_DEFICIENCY_PCT: f64 = 50.0;

/// Educational notes for severe vitamin C, iron or calcium deficiencies.
#[must_use]
pub fn supplement_notes(
    deficiencies: &BTreeMap<Nutrient, NutrientAssessment>,
) -> Vec<SupplementNote> {
    deficiencies
        .iter()
        .filter(|(_, info)| info.percentage < SEVERE_DEFICIENCY_PCT)
        .filter_map(|(&nutrient, _)| {
            let (note, warning) = match nutrient {
                Nutrient::VitaminC => (
                    "Consider citrus fruits or supplements if dietary intake is insufficient",
                    "Consult healthcare provider before taking supplements",
                ),
                Nutrient::Iron => (
                    "Iron supplements may be needed for severe deficiency",
                    "Iron supplements can cause side effects - consult a doctor",
                ),
                Nutrient::Calcium => (
                    "Calcium supplements with Vitamin D for better absorption",
                    "Balance with magnesium and don't exceed recommended doses",
                ),
                _ => return None,
            };
            Some(SupplementNote {
                nutrient,
                name: nutrient.label().to_string(),
                note: note.to_string(),
                warning: warning.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    pub reason: String,
}

impl Suggestion {
    fn new(title: &str, description: &str, reason: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            reason: reason.to_string(),
        }
    }
}

const MAX_SUGGESTIONS: usize = 6;
const MORNING_PROTEIN_MIN_G: f64 = 20.0;

/// Food pairing and balance hints for the day so far, at most six.
#[must_use]
pub fn pairing_suggestions(entries: &[LogEntry], totals: &NutrientTotals) -> Vec<Suggestion> {
    let names: Vec<String> = entries.iter().map(|e| e.name.to_lowercase()).collect();
    let any_name = |words: &[&str]| names.iter().any(|n| words.iter().any(|w| n.contains(w)));

    let mut out = Vec::new();

    if any_name(&["iron", "meat", "spinach"]) && !any_name(&["citrus", "orange", "lemon"]) {
        out.push(Suggestion::new(
            "Boost Iron Absorption",
            "Add citrus fruits or bell peppers to your next meal",
            "Vitamin C enhances iron absorption from plant-based sources by up to 300%",
        ));
    }
    if any_name(&["beans", "lentil"]) && !any_name(&["rice", "grain"]) {
        out.push(Suggestion::new(
            "Complete Your Protein",
            "Pair your legumes with whole grains like brown rice or quinoa",
            "This combination provides all essential amino acids for complete protein",
        ));
    }
    if totals.get(Nutrient::Calcium) > 300.0 {
        out.push(Suggestion::new(
            "Maximize Calcium Absorption",
            "Consider adding fatty fish or spending time in sunlight",
            "Vitamin D is essential for calcium absorption and bone health",
        ));
    }
    if any_name(&["tomato"]) {
        out.push(Suggestion::new(
            "Enhance Antioxidant Power",
            "Add healthy fats like avocado or olive oil",
            "Fats help absorb lycopene and other fat-soluble antioxidants from tomatoes",
        ));
    }
    if totals.get(Nutrient::Fiber) > 15.0 {
        out.push(Suggestion::new(
            "Stay Hydrated",
            "Increase water intake with your high-fiber foods",
            "Adequate hydration prevents digestive discomfort from fiber-rich foods",
        ));
    }

    if !entries.is_empty() {
        let morning_protein: f64 = entries
            .iter()
            .filter(|e| e.timestamp.hour() < 12)
            .map(|e| e.protein)
            .sum();
        if morning_protein < MORNING_PROTEIN_MIN_G {
            out.push(Suggestion::new(
                "Morning Protein Boost",
                "Add protein-rich foods to your breakfast",
                "Morning protein helps maintain muscle mass and keeps you satisfied longer",
            ));
        }
    }

    out.extend(balance_suggestions(totals));
    out.truncate(MAX_SUGGESTIONS);
    out
}

fn balance_suggestions(totals: &NutrientTotals) -> Vec<Suggestion> {
    if totals.get(Nutrient::Calories) <= 0.0 {
        return Vec::new();
    }
    let split = macro_split(totals);
    let mut out = Vec::new();

    if split.protein_pct < 15.0 {
        out.push(Suggestion::new(
            "Increase Protein Intake",
            "Aim for 15-25% of calories from protein",
            "Adequate protein supports muscle maintenance and satiety",
        ));
    }
    if split.carbs_pct < 45.0 {
        out.push(Suggestion::new(
            "Add Healthy Carbs",
            "Include whole grains, fruits, and vegetables",
            "Carbohydrates are your body's preferred energy source",
        ));
    }
    if split.fat_pct < 20.0 {
        out.push(Suggestion::new(
            "Include Healthy Fats",
            "Add nuts, seeds, olive oil, or fatty fish",
            "Healthy fats support hormone production and nutrient absorption",
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, sum_totals};
    use crate::config::AnalysisConfig;
    use crate::dataset::sample_table;
    use chrono::NaiveDate;

    fn food(code: &str, name: &str, iron: f64) -> FoodRecord {
        FoodRecord::from_values(code, name, [100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, iron, 0.0])
    }

    fn deficient(pairs: &[(Nutrient, f64)]) -> BTreeMap<Nutrient, NutrientAssessment> {
        pairs
            .iter()
            .map(|&(n, percentage)| {
                (
                    n,
                    NutrientAssessment {
                        current: 0.0,
                        target: 1.0,
                        percentage,
                        unit: n.unit().to_string(),
                    },
                )
            })
            .collect()
    }

    fn entry(name: &str, hour: u32, protein: f64) -> LogEntry {
        let record = FoodRecord::from_values(
            "1",
            name,
            [100.0, protein, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        );
        let ts = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        LogEntry::from_food(&record, 1.0, ts).unwrap()
    }

    fn titles(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_recommend_iron_scenario() {
        let table = vec![
            food("1", "Spinach, raw", 2.7),
            food("2", "Lentils, boiled", 3.3),
            food("3", "Beef, ground", 2.6),
        ];
        let recs = recommend(
            &deficient(&[(Nutrient::Iron, 20.0)]),
            &table,
            &RecommendConfig::default(),
        );

        let iron = &recs[&Nutrient::Iron];
        let names: Vec<&str> = iron.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Lentils, boiled", "Spinach, raw", "Beef, ground"]);
        assert!((iron[0].nutrient_value - 3.3).abs() < f64::EPSILON);
        assert_eq!(iron[0].unit, "mg");
        assert_eq!(iron[0].food_code, "2");
        assert!((iron[0].calories_per_100g - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recommend_ties_keep_table_order() {
        let table = vec![
            food("1", "Tofu, firm", 2.7),
            food("2", "Lentils, boiled", 3.3),
            food("3", "Spinach, raw", 2.7),
            food("4", "Oats, rolled", 0.0),
            food("5", "Beef, ground", 2.6),
        ];
        let deficiencies = deficient(&[(Nutrient::Iron, 20.0)]);
        let config = RecommendConfig::default();

        let recs = recommend(&deficiencies, &table, &config);
        let codes: Vec<&str> = recs[&Nutrient::Iron]
            .iter()
            .map(|r| r.food_code.as_str())
            .collect();
        assert_eq!(codes, vec!["2", "1", "3", "5"]);

        let swapped = vec![table[2].clone(), table[1].clone(), table[0].clone()];
        let recs = recommend(&deficiencies, &swapped, &config);
        let codes: Vec<&str> = recs[&Nutrient::Iron]
            .iter()
            .map(|r| r.food_code.as_str())
            .collect();
        assert_eq!(codes, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_recommend_skips_unrankable_and_empty() {
        let table = vec![food("1", "Spinach, raw", 2.7)];
        let recs = recommend(
            &deficient(&[
                (Nutrient::Calories, 10.0),
                (Nutrient::Sodium, 10.0),
                (Nutrient::Calcium, 10.0),
            ]),
            &table,
            &RecommendConfig::default(),
        );
        // calcium is rankable but no food has any
        assert!(recs.is_empty());
    }

    #[test]
    fn test_recommend_limit_and_positive_values() {
        let table = sample_table();
        let config = RecommendConfig {
            limit: 3,
            ..RecommendConfig::default()
        };
        let all: BTreeMap<_, _> = deficient(
            &Nutrient::ALL.iter().map(|&n| (n, 10.0)).collect::<Vec<_>>(),
        );
        let recs = recommend(&all, &table, &config);

        assert!(!recs.contains_key(&Nutrient::Calories));
        assert!(!recs.contains_key(&Nutrient::Sugar));
        for (n, foods) in &recs {
            assert!(foods.len() <= 3, "{n}");
            assert!(foods.iter().all(|f| f.nutrient_value > 0.0), "{n}");
            assert!(
                foods
                    .windows(2)
                    .all(|w| w[0].nutrient_value >= w[1].nutrient_value),
                "{n} not sorted"
            );
        }
    }

    #[test]
    fn test_dedup_skips_similar_after_half_limit() {
        let table = vec![
            food("a", "Beef liver fried", 9.0),
            food("b", "Beef liver raw", 8.0),
            food("c", "Beef steak", 7.0),
            food("d", "Spinach raw", 6.0),
            food("e", "Lentils boiled", 5.0),
            food("f", "Tofu firm", 4.0),
        ];
        let config = RecommendConfig {
            limit: 4,
            ..RecommendConfig::default()
        };
        let codes: Vec<String> = foods_rich_in(&table, Nutrient::Iron, &config)
            .into_iter()
            .map(|r| r.food_code)
            .collect();
        assert_eq!(codes, vec!["a", "b", "d", "e"]);
    }

    #[test]
    fn test_dedup_falls_short_when_candidates_repeat() {
        let table: Vec<FoodRecord> = (0..8_u32)
            .map(|i| food(&i.to_string(), "Cereal fortified dry", 20.0 - f64::from(i)))
            .collect();
        let config = RecommendConfig {
            limit: 4,
            ..RecommendConfig::default()
        };
        // only the first limit/2 similar foods get through
        assert_eq!(foods_rich_in(&table, Nutrient::Iron, &config).len(), 2);
    }

    #[test]
    fn test_leading_keywords() {
        assert_eq!(
            leading_keywords("Chicken Breast, cooked w/ skin", 3, 2),
            vec!["chicken", "breast,"]
        );
        assert_eq!(leading_keywords("Egg, raw", 3, 2), vec!["egg,"]);
        assert!(leading_keywords("Egg raw", 3, 2).is_empty());
    }

    #[test]
    fn test_recommend_end_to_end_from_analysis() {
        let log = vec![entry("Apple, raw", 9, 0.3)];
        let analysis = analyze(&sum_totals(&log), &AnalysisConfig::default());
        let recs = recommend(
            &analysis.deficiencies,
            &sample_table(),
            &RecommendConfig::default(),
        );
        assert_eq!(recs[&Nutrient::Protein][0].name, "Chicken breast, cooked");
        assert_eq!(recs[&Nutrient::VitaminC][0].name, "Broccoli, cooked");
    }

    #[test]
    fn test_recipe_suggestions() {
        let recipes = recipe_suggestions(&deficient(&[
            (Nutrient::Iron, 10.0),
            (Nutrient::VitaminC, 10.0),
            (Nutrient::Protein, 10.0),
            (Nutrient::Calcium, 10.0),
            (Nutrient::Fiber, 10.0),
        ]));
        let names: Vec<&str> = recipes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Spinach and Strawberry Salad",
                "Quinoa Power Bowl",
                "Greek Yogurt Parfait"
            ]
        );

        // the salad needs both iron and vitamin C
        let recipes = recipe_suggestions(&deficient(&[(Nutrient::Iron, 10.0)]));
        assert!(recipes.is_empty());

        let recipes = recipe_suggestions(&deficient(&[(Nutrient::Fiber, 10.0)]));
        assert_eq!(recipes[0].name, "Three-Bean Chili");
        assert_eq!(recipes[0].ingredients.len(), 4);
    }

    #[test]
    fn test_supplement_notes_only_when_severe() {
        let notes = supplement_notes(&deficient(&[
            (Nutrient::Iron, 30.0),
            (Nutrient::Calcium, 70.0),
            (Nutrient::VitaminC, 49.9),
            (Nutrient::Protein, 10.0),
        ]));
        let names: Vec<&str> = notes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Iron", "Vitamin C"]);
        assert!(notes[0].warning.contains("consult a doctor"));
    }

    #[test]
    fn test_pairing_iron_without_citrus() {
        let log = vec![entry("Spinach, raw", 13, 30.0)];
        let totals = sum_totals(&log);
        let s = pairing_suggestions(&log, &totals);
        assert!(titles(&s).contains(&"Boost Iron Absorption"));

        let log = vec![entry("Spinach, raw", 13, 30.0), entry("Orange juice", 13, 0.0)];
        let s = pairing_suggestions(&log, &sum_totals(&log));
        assert!(!titles(&s).contains(&"Boost Iron Absorption"));
    }

    #[test]
    fn test_pairing_legumes_and_tomato() {
        let log = vec![entry("Black beans", 8, 25.0), entry("Tomato soup", 13, 0.0)];
        let s = pairing_suggestions(&log, &sum_totals(&log));
        let t = titles(&s);
        assert!(t.contains(&"Complete Your Protein"));
        assert!(t.contains(&"Enhance Antioxidant Power"));
        assert!(!t.contains(&"Morning Protein Boost"));

        let log = vec![entry("Black beans", 8, 25.0), entry("Brown rice", 13, 0.0)];
        let s = pairing_suggestions(&log, &sum_totals(&log));
        assert!(!titles(&s).contains(&"Complete Your Protein"));
    }

    #[test]
    fn test_pairing_morning_protein() {
        let log = vec![entry("Toast", 8, 5.0), entry("Chicken", 19, 40.0)];
        let s = pairing_suggestions(&log, &sum_totals(&log));
        assert!(titles(&s).contains(&"Morning Protein Boost"));
    }

    #[test]
    fn test_pairing_empty_log() {
        assert!(pairing_suggestions(&[], &NutrientTotals::zeroed()).is_empty());
    }

    #[test]
    fn test_pairing_totals_and_balance() {
        let totals: NutrientTotals = [
            (Nutrient::Calories, 1000.0),
            (Nutrient::Protein, 10.0),
            (Nutrient::Carbs, 200.0),
            (Nutrient::Fat, 10.0),
            (Nutrient::Calcium, 400.0),
            (Nutrient::Fiber, 20.0),
        ]
        .into_iter()
        .collect();
        let s = pairing_suggestions(&[], &totals);
        assert_eq!(
            titles(&s),
            vec![
                "Maximize Calcium Absorption",
                "Stay Hydrated",
                "Increase Protein Intake",
                "Include Healthy Fats"
            ]
        );
    }

    #[test]
    fn test_pairing_capped_at_six() {
        let log = vec![entry("Spinach and lentil stew with tomato", 8, 1.0)];
        let mut totals = sum_totals(&log);
        totals.set(Nutrient::Calcium, 500.0);
        totals.set(Nutrient::Fiber, 30.0);
        let s = pairing_suggestions(&log, &totals);
        // iron, legumes, calcium, tomato, fiber, morning protein, then balance
        assert_eq!(s.len(), 6);
        assert_eq!(s[5].title, "Morning Protein Boost");
    }
}
