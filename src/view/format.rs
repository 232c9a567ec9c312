/// Date, time, duration and money formatting for rendered views.
///
/// Timestamps are formatted in the offset they were sent with; inputs that
/// do not parse are returned unchanged so a malformed field still shows.
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `2026-10-18T09:05:00Z` → `Oct 18, 2026`.
pub fn format_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// `2026-10-18T09:05:00Z` → `09:05`.
pub fn format_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// `2026-10-18T09:05:00Z` → `2026-10-18 09:05`.
pub fn format_datetime(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Uptime counter text, e.g. `26h 3m 9s`.
pub fn format_uptime(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    format!("{h}h {m}m {s}s")
}

/// `1234.5` → `$1,234.50`, `-12.0` → `-$12.00`.
pub fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    format_cents(cents)
}

/// Whole cents, e.g. `123450` → `$1,234.50`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Amount from a JSON number or numeric string.
pub fn money_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Coarse distance between two instants: `just now`, `5m ago`, `in 2h`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let secs = delta.num_seconds();
    let abs = secs.unsigned_abs();
    if abs < 45 {
        return "just now".to_string();
    }
    let amount = if abs < 3600 {
        format!("{}m", (abs + 30) / 60)
    } else if abs < 86_400 {
        format!("{}h", abs / 3600)
    } else {
        format!("{}d", abs / 86_400)
    };
    if secs >= 0 {
        format!("{amount} ago")
    } else {
        format!("in {amount}")
    }
}
