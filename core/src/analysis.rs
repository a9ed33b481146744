use std::collections::BTreeMap;

use chrono::Timelike;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::models::{
    Analysis, GoalProgress, GoalStatus, LogEntry, MacroSplit, Nutrient, NutrientAssessment,
    NutrientTotals,
};

/// Field-wise sum of every tracked nutrient across `entries`.
#[must_use]
pub fn sum_totals(entries: &[LogEntry]) -> NutrientTotals {
    let mut totals = NutrientTotals::zeroed();
    for entry in entries {
        for nutrient in Nutrient::ALL {
            totals.add(nutrient, entry.nutrient(nutrient));
        }
    }
    totals
}

/// Classify each nutrient in `totals` against its target and acceptable range.
///
/// Nutrients without a positive target are skipped. Each classified nutrient
/// contributes a score in `[0, 1]`: its share of the lower bound when
/// deficient, `upper / percentage` when in excess, 1 otherwise. The overall
/// score is their mean scaled to 0-100.
#[must_use]
pub fn analyze(totals: &NutrientTotals, config: &AnalysisConfig) -> Analysis {
    let mut analysis = Analysis::default();
    let mut scores: Vec<f64> = Vec::new();

    for (nutrient, current) in totals.iter() {
        let Some(target) = config.target(nutrient) else {
            continue;
        };
        if target <= 0.0 {
            continue;
        }

        let percentage = current / target * 100.0;
        let range = config.range(nutrient);
        let min_pct = range.min * 100.0;
        let max_pct = range.max.map(|m| m * 100.0);

        let info = NutrientAssessment {
            current,
            target,
            percentage,
            unit: nutrient.unit().to_string(),
        };

        if percentage < min_pct {
            scores.push((percentage / 100.0).min(1.0));
            analysis.deficiencies.insert(nutrient, info);
        } else if let Some(max_pct) = max_pct.filter(|&m| percentage > m) {
            scores.push((max_pct / percentage).min(1.0));
            analysis.excesses.insert(nutrient, info);
        } else {
            scores.push(1.0);
            analysis.within_range.insert(nutrient, info);
        }
    }

    if !scores.is_empty() {
        analysis.overall_score = scores.iter().sum::<f64>() / scores.len() as f64 * 100.0;
    }

    analysis
}

/// Progress toward each target, for nutrients in `totals` that have one.
#[must_use]
pub fn goal_progress(
    totals: &NutrientTotals,
    config: &AnalysisConfig,
) -> BTreeMap<Nutrient, GoalProgress> {
    totals
        .iter()
        .filter_map(|(nutrient, current)| {
            let target = config.target(nutrient)?;
            let raw_pct = if target > 0.0 {
                current / target * 100.0
            } else {
                0.0
            };
            Some((
                nutrient,
                GoalProgress {
                    current,
                    target,
                    percentage: raw_pct.min(100.0),
                    remaining: (target - current).max(0.0),
                    unit: nutrient.unit().to_string(),
                    status: goal_status(nutrient, raw_pct),
                },
            ))
        })
        .collect()
}

/// Status label for a share of target reached. Limit nutrients read the
/// scale the other way round.
#[must_use]
pub fn goal_status(nutrient: Nutrient, percentage: f64) -> GoalStatus {
    if nutrient.is_limit() {
        if percentage <= 50.0 {
            GoalStatus::Excellent
        } else if percentage <= 75.0 {
            GoalStatus::Good
        } else if percentage <= 100.0 {
            GoalStatus::Caution
        } else {
            GoalStatus::Exceeded
        }
    } else if percentage >= 100.0 {
        GoalStatus::Achieved
    } else if percentage >= 80.0 {
        GoalStatus::Close
    } else if percentage >= 50.0 {
        GoalStatus::Moderate
    } else {
        GoalStatus::Low
    }
}

/// Share of calories from protein and carbs (4 kcal/g) and fat (9 kcal/g).
#[must_use]
pub fn macro_split(totals: &NutrientTotals) -> MacroSplit {
    let calories = totals.get(Nutrient::Calories);
    if calories <= 0.0 {
        return MacroSplit::default();
    }
    MacroSplit {
        protein_pct: totals.get(Nutrient::Protein) * 4.0 / calories * 100.0,
        carbs_pct: totals.get(Nutrient::Carbs) * 4.0 / calories * 100.0,
        fat_pct: totals.get(Nutrient::Fat) * 9.0 / calories * 100.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MealPeriod {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealPeriod {
    pub const ALL: [MealPeriod; 4] = [
        MealPeriod::Breakfast,
        MealPeriod::Lunch,
        MealPeriod::Dinner,
        MealPeriod::Snacks,
    ];

    /// Breakfast 05-11, lunch 11-15, dinner 17-21, anything else is a snack.
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=10 => MealPeriod::Breakfast,
            11..=14 => MealPeriod::Lunch,
            17..=20 => MealPeriod::Dinner,
            _ => MealPeriod::Snacks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealTiming {
    pub meal_calories: BTreeMap<MealPeriod, f64>,
    pub meal_percentages: BTreeMap<MealPeriod, f64>,
    pub total_calories: f64,
    /// Number of periods with at least one entry.
    pub meal_count: usize,
}

/// Calories per meal period. `None` for an empty log.
#[must_use]
pub fn meal_timing(entries: &[LogEntry]) -> Option<MealTiming> {
    if entries.is_empty() {
        return None;
    }

    let mut meal_calories: BTreeMap<MealPeriod, f64> =
        MealPeriod::ALL.iter().map(|&p| (p, 0.0)).collect();
    let mut counts: BTreeMap<MealPeriod, usize> = BTreeMap::new();

    for entry in entries {
        let period = MealPeriod::from_hour(entry.timestamp.hour());
        *meal_calories.entry(period).or_insert(0.0) += entry.calories;
        *counts.entry(period).or_insert(0) += 1;
    }

    let total_calories: f64 = meal_calories.values().sum();
    let meal_percentages = meal_calories
        .iter()
        .map(|(&p, &cal)| {
            let pct = if total_calories > 0.0 {
                cal / total_calories * 100.0
            } else {
                0.0
            };
            (p, pct)
        })
        .collect();

    Some(MealTiming {
        meal_calories,
        meal_percentages,
        total_calories,
        meal_count: counts.len(),
    })
}

/// Plain-language feedback: a score band line, then per-nutrient hints.
#[must_use]
pub fn advice(analysis: &Analysis) -> Vec<String> {
    let score = analysis.overall_score;
    let headline = if score >= 90.0 {
        "Excellent! Your nutrition is well-balanced."
    } else if score >= 75.0 {
        "Good nutrition overall, with room for minor improvements."
    } else if score >= 60.0 {
        "Your nutrition needs some attention in key areas."
    } else {
        "Your nutrition needs significant improvement."
    };

    let mut lines = vec![headline.to_string()];

    let deficiency_hints = [
        (
            Nutrient::Protein,
            "Increase protein intake with lean meats, fish, eggs, legumes, or dairy products.",
        ),
        (
            Nutrient::Fiber,
            "Add more fiber with whole grains, fruits, vegetables, and legumes.",
        ),
        (
            Nutrient::Calcium,
            "Boost calcium with dairy products, leafy greens, or fortified foods.",
        ),
        (
            Nutrient::Iron,
            "Increase iron with red meat, spinach, lentils, or fortified cereals.",
        ),
        (
            Nutrient::VitaminC,
            "Add vitamin C with citrus fruits, berries, bell peppers, or broccoli.",
        ),
    ];
    let excess_hints = [
        (
            Nutrient::Sodium,
            "Reduce sodium intake by limiting processed foods and restaurant meals.",
        ),
        (
            Nutrient::Sugar,
            "Cut back on added sugars from sweets, sodas, and processed foods.",
        ),
        (
            Nutrient::Calories,
            "Consider reducing portion sizes or choosing lower-calorie alternatives.",
        ),
    ];

    lines.extend(
        deficiency_hints
            .iter()
            .filter(|(n, _)| analysis.deficiencies.contains_key(n))
            .map(|(_, hint)| (*hint).to_string()),
    );
    lines.extend(
        excess_hints
            .iter()
            .filter(|(n, _)| analysis.excesses.contains_key(n))
            .map(|(_, hint)| (*hint).to_string()),
    );

    lines
}
