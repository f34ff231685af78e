//! Time related utils.

/// DateTime in UTC, the only time zone signing works with.
pub type DateTime = chrono::DateTime<chrono::Utc>;

/// Return current time in UTC.
pub fn now() -> DateTime {
    chrono::Utc::now()
}

/// Format a date like `20220313`.
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

/// Format a basic ISO 8601 timestamp like `20220313T072004Z`.
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}
