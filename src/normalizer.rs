use crate::models::{ParsedRow, RawRecord};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an Italian-formatted amount: `.` groups thousands, `,` marks decimals.
///
/// Returns `None` for empty or unparsable input so the row can be rejected
/// instead of being counted as zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '€' && *c != '.' && !c.is_whitespace())
        .collect();
    if s.is_empty() {
        return None;
    }
    let s = s.replacen(',', ".", 1);
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn text_or(raw: &str, fallback: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        fallback.to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Map a raw six-field row positionally onto typed fields. Never fails;
/// rejection happens later in [`ParsedRow::into_transaction`].
pub fn normalize(record: RawRecord, default_currency: &str) -> ParsedRow {
    let [posting_date, value_date, amount, currency, description, channel] = record.fields;
    ParsedRow {
        posting_date: posting_date.trim().to_string(),
        value_date: value_date.trim().to_string(),
        amount: parse_amount(&amount),
        currency: text_or(&currency, default_currency),
        description: description.trim().to_string(),
        channel: channel.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_CURRENCY;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("-9,5"), Some(-9.5));
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("  250  "), Some(250.0));
        assert_eq!(parse_amount("0"), Some(0.0));
    }

    #[test]
    fn test_parse_amount_strips_grouping_and_symbol() {
        assert_eq!(parse_amount("1.000.000,99"), Some(1000000.99));
        assert_eq!(parse_amount("-1.234,56 €"), Some(-1234.56));
        assert_eq!(parse_amount("+12,00"), Some(12.0));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("not_a_number"), None);
        assert_eq!(parse_amount("1,2,3"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_normalize_maps_positionally() {
        let raw = RawRecord::from_fields([
            " 07/07/2025 ",
            "08/07/2025",
            "-9,5",
            "EUR",
            " spesa pagobancomat ",
            "online",
        ]);
        let row = normalize(raw, DEFAULT_CURRENCY);
        assert_eq!(row.posting_date, "07/07/2025");
        assert_eq!(row.value_date, "08/07/2025");
        assert_eq!(row.amount, Some(-9.5));
        assert_eq!(row.currency, "EUR");
        assert_eq!(row.description, "spesa pagobancomat");
        assert_eq!(row.channel, "online");
    }

    #[test]
    fn test_normalize_defaults_currency() {
        let raw = RawRecord::from_fields(["07/07/2025", "", "10", "  ", "stipendio", ""]);
        let row = normalize(raw, DEFAULT_CURRENCY);
        assert_eq!(row.currency, "EUR");
        assert_eq!(row.value_date, "");

        let raw = RawRecord::from_fields(["07/07/2025", "", "10", "", "stipendio", ""]);
        assert_eq!(normalize(raw, "CHF").currency, "CHF");
    }

    #[test]
    fn test_normalize_keeps_unparsable_amount_for_the_filter() {
        let raw = RawRecord::from_fields(["07/07/2025", "", "n/d", "EUR", "x", ""]);
        let row = normalize(raw, DEFAULT_CURRENCY);
        assert_eq!(row.amount, None);
        assert!(row.into_transaction().is_none());
    }
}
