use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::categorizer::{resolve, RuleSet};
use crate::models::Transaction;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: f64,
    /// Sum of negative amounts, so never positive.
    pub total_expense: f64,
    pub balance: f64,
    /// Category label → summed (negative) expense.
    pub category_expenses: BTreeMap<String, f64>,
    /// Category label → number of expense transactions.
    pub category_counts: BTreeMap<String, usize>,
    /// Most recent posting date first; equal dates keep input order.
    pub transactions: Vec<Transaction>,
}

pub fn aggregate(mut transactions: Vec<Transaction>, rules: &RuleSet) -> Summary {
    // fold from +0.0: an empty f64 `sum()` is -0.0
    let total_income = transactions
        .iter()
        .filter(|t| t.is_income())
        .fold(0.0f64, |acc, t| acc + t.amount);

    let mut total_expense = 0.0f64;
    let mut category_expenses: BTreeMap<String, f64> = BTreeMap::new();
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for txn in transactions.iter().filter(|t| t.is_expense()) {
        total_expense += txn.amount;
        let label = resolve(&txn.description, rules);
        *category_expenses.entry(label.to_string()).or_default() += txn.amount;
        *category_counts.entry(label.to_string()).or_default() += 1;
    }

    sort_by_posting_date(&mut transactions);

    Summary {
        total_income,
        total_expense,
        balance: total_income + total_expense,
        category_expenses,
        category_counts,
        transactions,
    }
}

/// Stable sort, newest posting date first. Rows whose date does not parse go last.
pub fn sort_by_posting_date(transactions: &mut [Transaction]) {
    transactions.sort_by_cached_key(|t| Reverse(t.posting_day()));
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub label: String,
    /// Magnitude of the category's spend.
    pub amount: f64,
    /// Share of total expenses, 0–100.
    pub pct: f64,
    pub count: usize,
}

impl Summary {
    /// Per-category spend, largest first.
    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        let total = self.total_expense.abs();
        let mut shares: Vec<CategoryShare> = self
            .category_expenses
            .iter()
            .map(|(label, spent)| {
                let amount = spent.abs();
                CategoryShare {
                    label: label.clone(),
                    amount,
                    pct: if total != 0.0 { amount / total * 100.0 } else { 0.0 },
                    count: self.category_counts.get(label).copied().unwrap_or(0),
                }
            })
            .collect();
        shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        shares
    }

    pub fn expense_for(&self, label: &str) -> f64 {
        self.category_expenses.get(label).copied().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Budget overage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overage {
    pub label: String,
    pub budget_percent: f64,
    /// Budget share in currency: `budget_percent` of the reference budget.
    pub limit: f64,
    pub spent: f64,
    pub overage: f64,
    /// How far past the limit, as a percentage of the limit.
    /// `None` for a 0% budget, where any spend is over.
    pub overage_pct: Option<f64>,
}

impl Overage {
    /// More than 10% past the limit. Always true for a 0% budget.
    pub fn is_severe(&self) -> bool {
        self.overage_pct.map_or(true, |p| p > 10.0)
    }
}

/// Categories whose spend exceeds their share of `reference_budget`, in rule order.
pub fn budget_overages(summary: &Summary, rules: &RuleSet, reference_budget: f64) -> Vec<Overage> {
    if reference_budget <= 0.0 {
        return Vec::new();
    }
    rules
        .categories
        .iter()
        .filter_map(|rule| {
            let budget_percent = rule.budget_percent.filter(|p| *p >= 0.0)?;
            let limit = reference_budget * budget_percent / 100.0;
            let spent = summary.expense_for(&rule.label).abs();
            if spent <= limit {
                return None;
            }
            let overage = spent - limit;
            Some(Overage {
                label: rule.label.clone(),
                budget_percent,
                limit,
                spent,
                overage,
                overage_pct: (limit > 0.0).then(|| overage / limit * 100.0),
            })
        })
        .collect()
}
