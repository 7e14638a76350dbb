use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by Italian bank exports for both date columns.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub const DEFAULT_CURRENCY: &str = "EUR";

/// Number of positional columns in a statement row:
/// posting date, value date, amount, currency, description, channel.
pub const FIELD_COUNT: usize = 6;

/// One data row as it came out of the file, before any typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub fields: [String; FIELD_COUNT],
}

impl RawRecord {
    /// Build from the first six values of a row. Callers drop shorter rows.
    pub fn from_fields<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = values.into_iter();
        let fields = std::array::from_fn(|_| iter.next().map(Into::into).unwrap_or_default());
        Self { fields }
    }
}

/// Intermediate representation from the normalizer before the retention filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub posting_date: String,
    pub value_date: String,
    pub amount: Option<f64>,
    pub currency: String,
    pub description: String,
    pub channel: String,
}

impl ParsedRow {
    /// Keep the row only when it has a posting date and a usable amount.
    pub fn into_transaction(self) -> Option<Transaction> {
        if self.posting_date.is_empty() {
            return None;
        }
        let amount = self.amount?;
        Some(Transaction {
            posting_date: self.posting_date,
            value_date: self.value_date,
            amount,
            currency: self.currency,
            description: self.description,
            channel: self.channel,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub posting_date: String,
    pub value_date: String,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub channel: String,
}

impl Transaction {
    pub fn posting_day(&self) -> Option<NaiveDate> {
        parse_day(&self.posting_date)
    }

    pub fn value_day(&self) -> Option<NaiveDate> {
        parse_day(&self.value_date)
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// A label plus the ordered keywords that assign it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub label: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Share of the reference budget reserved for this category, in percent.
    #[serde(rename = "budget", default, skip_serializing_if = "Option::is_none")]
    pub budget_percent: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(posting_date: &str, amount: Option<f64>) -> ParsedRow {
        ParsedRow {
            posting_date: posting_date.to_string(),
            value_date: String::new(),
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            description: "bonifico".to_string(),
            channel: "online".to_string(),
        }
    }

    #[test]
    fn test_retention_requires_posting_date_and_amount() {
        assert!(row("07/07/2025", Some(-9.5)).into_transaction().is_some());
        assert!(row("", Some(-9.5)).into_transaction().is_none());
        assert!(row("07/07/2025", None).into_transaction().is_none());
    }

    #[test]
    fn test_zero_amount_is_retained() {
        let txn = row("07/07/2025", Some(0.0)).into_transaction().unwrap();
        assert!(!txn.is_income());
        assert!(!txn.is_expense());
    }

    #[test]
    fn test_raw_record_pads_and_truncates() {
        let short = RawRecord::from_fields(["a", "b"]);
        assert_eq!(short.fields[1], "b");
        assert_eq!(short.fields[5], "");
        let long = RawRecord::from_fields(["1", "2", "3", "4", "5", "6", "7"]);
        assert_eq!(long.fields[5], "6");
    }

    #[test]
    fn test_posting_day_parses_italian_dates() {
        let txn = row("07/08/2025", Some(1.0)).into_transaction().unwrap();
        assert_eq!(txn.posting_day(), NaiveDate::from_ymd_opt(2025, 8, 7));
        assert_eq!(txn.value_day(), None);
        assert_eq!(parse_day("2025-08-07"), None);
        assert_eq!(parse_day("31/02/2025"), None);
    }

    #[test]
    fn test_category_rule_budget_is_optional() {
        let rule: CategoryRule =
            serde_json::from_str(r#"{"label": "Salute", "keywords": ["farmacia"]}"#).unwrap();
        assert_eq!(rule.budget_percent, None);
        let rule: CategoryRule =
            serde_json::from_str(r#"{"label": "Casa", "keywords": [], "budget": 30}"#).unwrap();
        assert_eq!(rule.budget_percent, Some(30.0));
    }
}
