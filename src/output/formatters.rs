//! Reusable formatting utilities for CLI output

use chrono::{DateTime, Local};

/// Format a Unix timestamp (seconds) as local date/time.
///
/// Returns "unknown" for out-of-range values.
pub fn format_unix_local(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Format an optional expiry, where `None` means the entry is persisted
pub fn format_expiry(expires_at: Option<i64>) -> String {
    match expires_at {
        Some(secs) => format_unix_local(secs),
        None => "never".to_string(),
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry(None), "never");
        assert_ne!(format_expiry(Some(1_700_000_000)), "never");
    }

    #[test]
    fn test_format_unix_out_of_range() {
        assert_eq!(format_unix_local(i64::MAX), "unknown");
    }
}
