use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Brazilian-locale numeric parsing. Nothing here returns an error: anything
// that cannot be read as a number is 0.
// ---------------------------------------------------------------------------

/// Largest quantity a single row may carry. Anything above is treated as
/// unreadable so per-period sums stay far from `i64` overflow.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)").expect("valid leading-float regex")
});

/// Parse the longest leading `[sign]digits[.digits]` prefix, the way a lenient
/// float reader does.
fn leading_float(s: &str) -> Option<f64> {
    LEADING_FLOAT
        .find(s)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Quantity column: keep digits, `,` and `.`, read the first comma as the
/// decimal point and truncate. Values above `MAX_QUANTITY` read as 0.
pub fn parse_quantity(raw: &str) -> i64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let cleaned = cleaned.replacen(',', ".", 1);
    leading_float(&cleaned)
        .filter(|v| *v <= MAX_QUANTITY as f64)
        .map(|v| v.trunc() as i64)
        .unwrap_or(0)
}

/// Monetary column: `R$ 1.234,56` -> 1234.56, `12,5` -> 12.5, `99.90` -> 99.9.
pub fn parse_value(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, 'R' | '$') && !c.is_whitespace())
        .collect();
    let cleaned = if cleaned.contains(',') && cleaned.contains('.') {
        cleaned.replace('.', "").replacen(',', ".", 1)
    } else if cleaned.contains(',') {
        cleaned.replacen(',', ".", 1)
    } else {
        cleaned
    };
    leading_float(&cleaned).unwrap_or(0.0)
}
