use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categorizer::{load_rules, RuleSet};
use crate::cli::rules_path_opt;
use crate::fmt::pct;
use crate::settings::load_settings;

pub fn list(rules: Option<String>) -> Result<()> {
    let settings = load_settings();
    let path = rules_path_opt(&rules, &settings);
    let rules = load_rules(&path);

    if rules.is_empty() {
        println!("No category rules in {}. Every expense will be reported as Other.", path.display());
        return Ok(());
    }

    println!("Rules ({})\n{}", path.display(), format_rules(&rules));
    if let Some(line) = budget_check(&rules) {
        println!("\n{line}");
    }
    Ok(())
}

pub fn format_rules(rules: &RuleSet) -> String {
    let mut table = Table::new();
    table.set_header(vec!["#", "Category", "Keywords", "Budget"]);
    for (i, rule) in rules.categories.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&rule.label),
            Cell::new(rule.keywords.join(", ")),
            Cell::new(rule.budget_percent.map(pct).unwrap_or_default()),
        ]);
    }
    table.to_string()
}

/// Warn when budgets add up past 100%; `None` when no budgets are configured.
pub fn budget_check(rules: &RuleSet) -> Option<String> {
    if rules.categories.iter().all(|r| r.budget_percent.is_none()) {
        return None;
    }
    let total = pct(rules.budget_total());
    if rules.budget_overcommitted() {
        Some(
            format!("Warning: category budgets add up to {total}. Check the budget configuration.")
                .yellow()
                .to_string(),
        )
    } else {
        Some(format!("Budget configuration OK ({total} assigned).").green().to_string())
    }
}
