use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
#[error("Invalid amount for conversion to cents: {0:?}")]
pub struct CentsError(pub String);

/// Convert a decimal amount to integer cents, rounding half away from zero.
///
/// Accepts `12.5`, `"12,50"`, `"R$ 12,50"` and `"1.234,56"`.
pub fn to_cents(value: &str) -> Result<i64, CentsError> {
    let cleaned: String = value
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    // With a comma present, dots are thousands separators
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    let amount: f64 = normalized
        .parse()
        .map_err(|_| CentsError(value.to_string()))?;
    if !amount.is_finite() {
        return Err(CentsError(value.to_string()));
    }
    Ok((amount * 100.0).round() as i64)
}

/// Render cents as `R$ 1.234,56`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let reais = (abs / 100).to_string();
    let centavos = abs % 100;

    let mut grouped = String::new();
    for (i, c) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{}R$ {},{:02}", sign, grouped, centavos)
}

/// Format an ISO timestamp as `dd/mm/yyyy`; other input is returned as-is
pub fn format_date_br(date: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.with_timezone(&Utc).format("%d/%m/%Y").to_string()
    } else if let Ok(day) = NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d") {
        day.format("%d/%m/%Y").to_string()
    } else {
        date.to_string()
    }
}

/// Parse `dd/mm/yyyy` into an ISO timestamp at midnight UTC
pub fn parse_date_br(date: &str) -> Option<String> {
    let day = NaiveDate::parse_from_str(date.trim(), "%d/%m/%Y").ok()?;
    let midnight = day.and_hms_opt(0, 0, 0)?;
    Some(
        Utc.from_utc_datetime(&midnight)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
