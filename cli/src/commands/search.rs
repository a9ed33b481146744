use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use platewise_core::dataset::TableOrigin;
use platewise_core::models::Nutrient;
use platewise_core::service::NutritionService;

use super::helpers::{fmt_amount, json_error, parse_nutrient, print_food_table, truncate};

pub(crate) fn cmd_search(
    svc: &NutritionService,
    query: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    let foods = svc.search(query, limit);

    if foods.is_empty() {
        if json {
            println!("[]");
        } else if query.trim().chars().count() < 2 {
            eprintln!("Search needs at least 2 characters");
        } else {
            eprintln!("No results found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(&foods);
    }

    Ok(())
}

pub(crate) fn cmd_show(svc: &NutritionService, code: &str, json: bool) -> Result<()> {
    let Some(food) = svc.get_by_code(code) else {
        if json {
            println!("{}", json_error(&format!("Food {code} not found")));
        } else {
            eprintln!("Food {code} not found");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(food)?);
        return Ok(());
    }

    let name = &food.description;
    let code = &food.code;
    println!("{name} [{code}]  (per 100 g)\n");
    for n in Nutrient::ALL {
        let label = n.label();
        let amount = fmt_amount(food.value(n), n);
        println!("  {label:<10} {amount:>12}");
    }

    Ok(())
}

pub(crate) fn cmd_top(
    svc: &NutritionService,
    nutrient: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct TopRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Code")]
        code: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Amount/100g")]
        amount: String,
        #[tabled(rename = "Cal/100g")]
        calories: String,
    }

    let nutrient = parse_nutrient(nutrient)?;
    let foods = svc.rich_in(nutrient, limit);

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods contain any {}", nutrient.label());
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    let rows: Vec<TopRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| TopRow {
            idx: i + 1,
            code: f.code.clone(),
            name: truncate(&f.description, 40),
            amount: fmt_amount(f.value(nutrient), nutrient),
            calories: format!("{:.0}", f.energy_kcal),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_stats(svc: &NutritionService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct StatsRow {
        #[tabled(rename = "Nutrient")]
        nutrient: String,
        #[tabled(rename = "Mean")]
        mean: String,
        #[tabled(rename = "Median")]
        median: String,
        #[tabled(rename = "Std dev")]
        std_dev: String,
        #[tabled(rename = "Min")]
        min: String,
        #[tabled(rename = "Max")]
        max: String,
    }

    let table = svc.table();
    let stats = svc.statistics();

    if json {
        let out = serde_json::json!({
            "origin": table.origin,
            "foods": table.len(),
            "statistics": stats,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match &table.origin {
        TableOrigin::File { path } => println!("Dataset: {}", path.display()),
        TableOrigin::Sample { reason } => println!("Dataset: built-in sample ({reason})"),
    }
    println!("Foods: {}\n", table.len());

    if stats.is_empty() {
        eprintln!("Dataset has no foods");
        process::exit(2);
    }

    let rows: Vec<StatsRow> = stats
        .iter()
        .map(|(n, s)| StatsRow {
            nutrient: format!("{} ({})", n.label(), n.unit()),
            mean: format!("{:.1}", s.mean),
            median: format!("{:.1}", s.median),
            std_dev: format!("{:.1}", s.std_dev),
            min: format!("{:.1}", s.min),
            max: format!("{:.1}", s.max),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
