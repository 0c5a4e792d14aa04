use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::import::{replace_catalog, replace_results, CatalogCounts, TransactionalStore, VariableRecord};
use crate::model::{ChartSettingUpdate, NewChartSetting, NewResult, PageUpdate};
use crate::resolver::COMBINATION_KEYS;
use crate::store::Store;

pub const FIRST_YEAR: i32 = 2020;
pub const LAST_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub catalog: CatalogCounts,
    pub results: usize,
    pub chart_settings: usize,
    pub pages: usize,
}

struct DemoSet {
    name: &'static str,
    description: &'static str,
    parameters: [(&'static str, [(&'static str, f64); 3]); 3],
}

const DEMO_SETS: [DemoSet; 4] = [
    DemoSet {
        name: "Discount rate",
        description: "Parameters converting future damages to present value",
        parameters: [
            ("Pure rate of time preference (PRTP)", [("0.1%", 0.001), ("1.5%", 0.015), ("3.0%", 0.03)]),
            ("Consumption elasticity (eta)", [("1.0", 1.0), ("1.5", 1.5), ("2.0", 2.0)]),
            ("Growth adjustment", [("Low growth", 0.01), ("Baseline", 0.02), ("High growth", 0.03)]),
        ],
    },
    DemoSet {
        name: "Climate scenario",
        description: "Emission pathways and climate sensitivity",
        parameters: [
            ("SSP-RCP scenario", [("SSP1-2.6", 2.6), ("SSP2-4.5", 4.5), ("SSP5-8.5", 8.5)]),
            ("Climate sensitivity (ECS)", [("2.0C", 2.0), ("3.0C", 3.0), ("4.5C", 4.5)]),
            ("Carbon cycle model", [("Conservative", 1.0), ("Intermediate", 2.0), ("Aggressive", 3.0)]),
        ],
    },
    DemoSet {
        name: "Damage function",
        description: "Economic damage as a function of warming",
        parameters: [
            ("Damage function type", [("Howard-Sterner", 1.0), ("DICE-2016", 2.0), ("Burke et al.", 3.0)]),
            ("Regional weighting", [("Equal", 1.0), ("GDP weighted", 2.0), ("Population weighted", 3.0)]),
            ("Non-linearity", [("Linear", 1.0), ("Quadratic", 2.0), ("Exponential", 3.0)]),
        ],
    },
    DemoSet {
        name: "Socioeconomic pathway",
        description: "GDP, population and technology outlook",
        parameters: [
            ("GDP growth", [("Low growth", 0.015), ("Intermediate", 0.025), ("High growth", 0.04)]),
            ("Population outlook", [("Declining", -0.005), ("Stable", 0.0), ("Growing", 0.005)]),
            ("Technology progress", [("Gradual", 1.0), ("Baseline", 2.0), ("Breakthrough", 3.0)]),
        ],
    },
];

const DEMO_CHARTS: [(&str, &str, &str, &str, &str, &str); 4] = [
    (
        "scc-timeline",
        "Social cost of carbon (SCC) over time",
        "Year",
        "SCC ($/tCO2)",
        "$/tCO2",
        "How the social cost of carbon evolves over time",
    ),
    (
        "scenario-comparison",
        "Damage cost by scenario",
        "Scenario",
        "Damage cost",
        "trillion KRW",
        "Cumulative damage cost per scenario",
    ),
    (
        "temp-damage",
        "Warming vs economic damage",
        "Temperature rise (C)",
        "GDP loss (%)",
        "%",
        "GDP loss by degree of warming",
    ),
    (
        "damage-distribution",
        "Damage cost distribution",
        "Damage cost (trillion KRW)",
        "Frequency",
        "",
        "Probability distribution of damage costs",
    ),
];

const DEMO_PAGES: [(&str, &str, &str); 4] = [
    (
        "about",
        "About the model",
        "The Korean ensemble climate-economy integrated assessment model (IAM) adapts \
         international social cost of carbon (SCC) estimation to Korean conditions.",
    ),
    (
        "about/background",
        "Background",
        "Quantifying the economic damage of climate change is central to effective climate \
         policy. This work builds on DICE, FUND and PAGE.",
    ),
    (
        "about/methodology",
        "Methodology",
        "The model couples a climate module, an economy module and a damage module.",
    ),
    (
        "about/applications",
        "Applications",
        "Results inform carbon pricing, adaptation cost-benefit analysis and NDC planning.",
    ),
];

pub fn demo_catalog() -> Vec<VariableRecord> {
    let mut rows = Vec::new();
    for (set_idx, set) in DEMO_SETS.iter().enumerate() {
        for (param_idx, (param_name, values)) in set.parameters.iter().enumerate() {
            for (value_idx, (label, value)) in values.iter().enumerate() {
                rows.push(VariableRecord {
                    set_name: set.name.to_string(),
                    set_description: Some(set.description.to_string()),
                    set_order: set_idx as i32 + 1,
                    param_name: param_name.to_string(),
                    param_order: param_idx as i32 + 1,
                    value_label: label.to_string(),
                    value: *value,
                    value_order: value_idx as i32 + 1,
                });
            }
        }
    }
    rows
}

pub fn demo_results(rng_seed: u64) -> Vec<NewResult> {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    let mut rows = Vec::new();
    for key in COMBINATION_KEYS {
        let base = match key {
            "default" => 50.0,
            "high-damage" => 120.0,
            "low-discount" => 80.0,
            _ => 200.0,
        };
        let warming = if key == "extreme" { 4.5 } else { 2.5 };
        let gdp_slope = if key == "high-damage" { 8.0 } else { 3.0 };
        for year in FIRST_YEAR..=LAST_YEAR {
            let progress = f64::from(year - FIRST_YEAR) / f64::from(LAST_YEAR - FIRST_YEAR);
            let noise = (rng.gen::<f64>() - 0.5) * 10.0;
            rows.push(NewResult {
                combination_key: key.to_string(),
                year,
                scc_value: Some(base * (1.0 + progress * 2.0) + noise),
                temperature: Some(1.1 + progress * warming),
                damage_cost: Some(base * progress * 100.0),
                gdp_loss: Some(progress * gdp_slope),
            });
        }
    }
    rows
}

/// Replaces the catalog and results with demo data; chart settings and pages
/// are only added when missing.
pub fn seed_demo(store: &Store, rng_seed: u64) -> Result<SeedSummary> {
    let catalog_rows = demo_catalog();
    let result_rows = demo_results(rng_seed);
    let (catalog, results) = store.transaction(|tx| {
        let (_, catalog) = replace_catalog(tx, &catalog_rows)?;
        let (_, results) = replace_results(tx, &result_rows)?;
        Ok((catalog, results))
    })?;

    let mut chart_settings = 0;
    for (key, title, x_label, y_label, unit, description) in DEMO_CHARTS {
        let inserted = store.insert_chart_setting(&NewChartSetting {
            chart_key: key.to_string(),
            fields: ChartSettingUpdate {
                title: title.to_string(),
                x_label: Some(x_label.to_string()),
                y_label: Some(y_label.to_string()),
                unit: Some(unit.to_string()),
                description: Some(description.to_string()),
            },
        })?;
        chart_settings += usize::from(inserted);
    }

    let mut pages = 0;
    for (slug, title, content) in DEMO_PAGES {
        let inserted = store.insert_page(
            slug,
            &PageUpdate {
                title: title.to_string(),
                content: Some(content.to_string()),
                published: Some(true),
            },
        )?;
        pages += usize::from(inserted);
    }

    let summary = SeedSummary {
        catalog,
        results,
        chart_settings,
        pages,
    };
    info!(
        sets = catalog.sets,
        parameters = catalog.parameters,
        values = catalog.values,
        results,
        chart_settings,
        pages,
        "demo data seeded"
    );
    Ok(summary)
}
