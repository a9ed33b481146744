use anyhow::Result;
use std::collections::BTreeMap;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use platewise_core::analysis::MealPeriod;
use platewise_core::models::{Nutrient, NutrientAssessment};
use platewise_core::service::NutritionService;

use crate::config::Config;

use super::helpers::{fmt_amount, no_neg_zero, parse_date, today, truncate};

pub(crate) fn cmd_summary(
    svc: &NutritionService,
    config: &Config,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "Nutrient")]
        nutrient: String,
        #[tabled(rename = "Current")]
        current: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Progress")]
        progress: String,
        #[tabled(rename = "Remaining")]
        remaining: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let date = parse_date(date, today())?;
    let log = config.load_log()?.on_date(date);
    let summary = log.summary();
    let goals = svc.goal_progress(&summary.totals);

    if json {
        let out = serde_json::json!({ "date": date, "summary": summary, "goals": goals });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if log.is_empty() {
        eprintln!("No entries for {date}. Add foods with `platewise add <code>`");
        process::exit(2);
    }

    println!("=== {date} ===");
    let count = summary.entry_count;
    let avg = summary.average_calories;
    println!("Foods logged: {count}  |  Avg per food: {avg:.0} kcal");
    if let Some(hours) = summary.eating_window_hours {
        println!("Eating window: {hours:.1} h");
    }
    println!();

    let rows: Vec<GoalRow> = goals
        .iter()
        .map(|(&n, g)| GoalRow {
            nutrient: n.label().to_string(),
            current: fmt_amount(g.current, n),
            target: fmt_amount(g.target, n),
            progress: format!("{:.0}%", no_neg_zero(g.percentage)),
            remaining: fmt_amount(g.remaining, n),
            status: g.status.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_analyze(
    svc: &NutritionService,
    config: &Config,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, today())?;
    let log = config.load_log()?.on_date(date);
    let report = svc.day_report(log.entries());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let score = report.analysis.overall_score;
    println!("=== {date} ===");
    println!("Nutrition score: {score:.0}/100\n");

    print_assessments("Deficient", &report.analysis.deficiencies);
    print_assessments("Excess", &report.analysis.excesses);
    print_assessments("Within range", &report.analysis.within_range);

    let m = report.macros;
    println!(
        "Macros: protein {:.0}% | carbs {:.0}% | fat {:.0}% of calories",
        no_neg_zero(m.protein_pct),
        no_neg_zero(m.carbs_pct),
        no_neg_zero(m.fat_pct)
    );

    if let Some(timing) = &report.meal_timing {
        let parts: Vec<String> = MealPeriod::ALL
            .iter()
            .map(|p| {
                let cal = timing.meal_calories.get(p).copied().unwrap_or(0.0);
                let pct = timing.meal_percentages.get(p).copied().unwrap_or(0.0);
                format!("{} {cal:.0} kcal ({pct:.0}%)", period_label(*p))
            })
            .collect();
        println!("Meals: {}", parts.join(" | "));
    }

    println!();
    for line in &report.advice {
        println!("  * {line}");
    }

    Ok(())
}

fn print_assessments(title: &str, items: &BTreeMap<Nutrient, NutrientAssessment>) {
    #[derive(Tabled)]
    struct AssessmentRow {
        #[tabled(rename = "Nutrient")]
        nutrient: String,
        #[tabled(rename = "Current")]
        current: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "% of target")]
        percentage: String,
    }

    if items.is_empty() {
        return;
    }

    let rows: Vec<AssessmentRow> = items
        .iter()
        .map(|(&n, a)| AssessmentRow {
            nutrient: n.label().to_string(),
            current: fmt_amount(a.current, n),
            target: fmt_amount(a.target, n),
            percentage: format!("{:.0}%", no_neg_zero(a.percentage)),
        })
        .collect();

    println!("{title}:");
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}\n");
}

fn period_label(period: MealPeriod) -> &'static str {
    match period {
        MealPeriod::Breakfast => "Breakfast",
        MealPeriod::Lunch => "Lunch",
        MealPeriod::Dinner => "Dinner",
        MealPeriod::Snacks => "Snacks",
    }
}

pub(crate) fn cmd_recommend(
    svc: &NutritionService,
    config: &Config,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct RecRow {
        #[tabled(rename = "Code")]
        code: String,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Amount/100g")]
        amount: String,
        #[tabled(rename = "Cal/100g")]
        calories: String,
    }

    let date = parse_date(date, today())?;
    let log = config.load_log()?.on_date(date);
    let report = svc.recommendation_report(log.entries());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.foods.is_empty() && report.suggestions.is_empty() {
        eprintln!("No recommendations: nothing is deficient");
        process::exit(2);
    }

    for (&n, foods) in &report.foods {
        println!("Rich in {}:", n.label());
        let rows: Vec<RecRow> = foods
            .iter()
            .map(|r| RecRow {
                code: r.food_code.clone(),
                name: truncate(&r.name, 40),
                amount: fmt_amount(r.nutrient_value, n),
                calories: format!("{:.0}", r.calories_per_100g),
            })
            .collect();
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
            .to_string();
        println!("{table}\n");
    }

    if !report.recipes.is_empty() {
        println!("Recipe ideas:");
        for r in &report.recipes {
            let name = &r.name;
            let benefits = &r.benefits;
            println!("  {name}: {}", r.ingredients.join(", "));
            println!("    {benefits}");
        }
        println!();
    }

    if !report.supplements.is_empty() {
        println!("Supplement notes (educational only):");
        for s in &report.supplements {
            let name = &s.name;
            let note = &s.note;
            let warning = &s.warning;
            println!("  {name}: {note}");
            println!("    Caution: {warning}");
        }
        println!();
    }

    if !report.suggestions.is_empty() {
        println!("Suggestions:");
        for s in &report.suggestions {
            let title = &s.title;
            let description = &s.description;
            let reason = &s.reason;
            println!("  {title}: {description}");
            println!("    {reason}");
        }
    }

    Ok(())
}
