pub mod clear_cmd;
pub mod completions_cmd;
pub mod doctor;
pub mod history_cmd;
pub mod notify_cmd;
pub mod onboard;
pub mod run_cmd;
pub mod scan_cmd;
pub mod status;

/// Render a millisecond timestamp relative to now ("Just now", "5m ago").
pub(crate) fn format_relative(now_ms: i64, timestamp_ms: i64) -> String {
    let diff_minutes = (now_ms - timestamp_ms).max(0) / (1000 * 60);
    let diff_hours = diff_minutes / 60;
    let diff_days = diff_hours / 24;

    if diff_minutes < 1 {
        "Just now".to_string()
    } else if diff_minutes < 60 {
        format!("{}m ago", diff_minutes)
    } else if diff_hours < 24 {
        format!("{}h ago", diff_hours)
    } else {
        format!("{}d ago", diff_days)
    }
}

#[cfg(test)]
mod tests {
    use super::format_relative;

    #[test]
    fn test_format_relative_buckets() {
        let now = 10_000_000_000;
        assert_eq!(format_relative(now, now - 30_000), "Just now");
        assert_eq!(format_relative(now, now - 5 * 60_000), "5m ago");
        assert_eq!(format_relative(now, now - 3 * 3_600_000), "3h ago");
        assert_eq!(format_relative(now, now - 49 * 3_600_000), "2d ago");
    }
}
