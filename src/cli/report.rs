use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categorizer::{resolve, RuleBook, RuleSet};
use crate::cli::rules_path_opt;
use crate::fmt::{money, pct, truncate};
use crate::importer::{format_from_key, import_file, Separator};
use crate::reports::{budget_overages, Overage, Summary};
use crate::settings::load_settings;

const DESCRIPTION_WIDTH: usize = 60;

pub struct ReportArgs {
    pub file: String,
    pub rules: Option<String>,
    pub format: Option<String>,
    pub separator: Option<char>,
    pub budget: Option<f64>,
    pub json: bool,
    pub limit: Option<usize>,
}

pub fn run(args: ReportArgs) -> Result<()> {
    let settings = load_settings();
    let rules_path = rules_path_opt(&args.rules, &settings);
    let book = RuleBook::load(&rules_path);
    let rules = book.snapshot();

    let mut options = settings.import_options()?;
    if let Some(key) = args.format.as_deref() {
        options.format = Some(format_from_key(key)?);
    }
    if let Some(c) = args.separator {
        options.separator = Separator::from_char(c)?;
    }

    let file_path = PathBuf::from(&args.file);
    let summary = import_file(&file_path, &rules, &options)
        .with_context(|| format!("could not import {}", file_path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let budget = args.budget.or(settings.reference_budget);
    println!("{}", format_report(&summary, &rules, budget, args.limit));
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting functions (summary → String)
// ---------------------------------------------------------------------------

pub fn format_report(summary: &Summary, rules: &RuleSet, budget: Option<f64>, limit: Option<usize>) -> String {
    let mut out = format_totals(summary);
    if !summary.category_expenses.is_empty() {
        out.push_str("\n\n");
        out.push_str(&format_categories(summary));
    }
    if let Some(b) = budget {
        let overages = budget_overages(summary, rules, b);
        if !overages.is_empty() {
            out.push_str("\n\n");
            out.push_str(&format_overages(&overages));
        }
    }
    out.push_str("\n\n");
    out.push_str(&format_transactions(summary, rules, limit));
    out
}

pub fn format_totals(summary: &Summary) -> String {
    let balance = money(summary.balance);
    let balance = if summary.balance >= 0.0 {
        balance.blue().bold()
    } else {
        balance.yellow().bold()
    };

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![
        Cell::new("Income".green()),
        Cell::new(money(summary.total_income)),
    ]);
    table.add_row(vec![
        Cell::new("Expenses".red()),
        Cell::new(money(summary.total_expense.abs())),
    ]);
    table.add_row(vec![Cell::new("Balance".bold()), Cell::new(balance)]);
    format!("Summary\n{table}")
}

pub fn format_categories(summary: &Summary) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "% of expenses", "Transactions"]);
    for share in summary.category_breakdown() {
        table.add_row(vec![
            Cell::new(&share.label),
            Cell::new(money(share.amount)),
            Cell::new(pct(share.pct)),
            Cell::new(share.count),
        ]);
    }
    format!("Spending by category\n{table}")
}

pub fn format_overages(overages: &[Overage]) -> String {
    let mut lines = vec!["Budget alerts".bold().to_string()];
    for o in overages {
        let past = match o.overage_pct {
            Some(p) => format!("{} past the limit", pct(p)),
            None => "no budget assigned".to_string(),
        };
        let line = format!(
            "  {}: spent {} over a {} budget ({} of the reference), {past}",
            o.label,
            money(o.overage),
            money(o.limit),
            pct(o.budget_percent),
        );
        lines.push(if o.is_severe() {
            line.red().to_string()
        } else {
            line.yellow().to_string()
        });
    }
    lines.join("\n")
}

pub fn format_transactions(summary: &Summary, rules: &RuleSet, limit: Option<usize>) -> String {
    let shown = limit.unwrap_or(summary.transactions.len());
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Category", "Channel", "Amount"]);
    for txn in summary.transactions.iter().take(shown) {
        let amount = money(txn.amount);
        let amount = if txn.amount >= 0.0 { amount.green() } else { amount.red() };
        table.add_row(vec![
            Cell::new(&txn.posting_date),
            Cell::new(truncate(&txn.description, DESCRIPTION_WIDTH)),
            Cell::new(resolve(&txn.description, rules)),
            Cell::new(&txn.channel),
            Cell::new(amount),
        ]);
    }
    format!("Transactions ({})\n{table}", summary.transactions.len())
}
