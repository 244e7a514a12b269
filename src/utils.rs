use chrono::{DateTime, Utc};

/// Timestamp layout used by the feed (second precision, `Z` suffix)
pub const FEED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render a UTC instant the way the feed expects and reports timestamps
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(FEED_TIMESTAMP_FORMAT).to_string()
}

/// Turn a display title into its article path form
pub fn title_to_path(title: &str) -> String {
    title.trim().replace(' ', "_")
}

/// Human wording for a window length: `hour`, `3 hours`, `90 minutes`
pub fn describe_window(minutes: u64) -> String {
    match minutes {
        60 => "hour".to_string(),
        1 => "minute".to_string(),
        m if m % 60 == 0 => format!("{} hours", m / 60),
        m => format!("{m} minutes"),
    }
}
