/// Format a float as euros the Italian way: `1.234,56 €`, `-9,50 €`.
pub fn money(val: f64) -> String {
    let cents = format!("{:.2}", val.abs());
    let negative = val < 0.0 && cents != "0.00";
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped},{dec_part} €")
    } else {
        format!("{grouped},{dec_part} €")
    }
}

pub fn pct(val: f64) -> String {
    format!("{:.1}%", val).replace('.', ",")
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}
