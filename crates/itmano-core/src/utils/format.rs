use chrono::{DateTime, Utc};

/// Truncate a string to a maximum length in characters, adding ellipsis if needed
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

/// Format a timestamp as e.g. "Mar 01, 2024"
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Héllo wörld", 8), "Héllo...");
    }

    #[test]
    fn test_format_date() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap();
        assert_eq!(format_date(&dt), "Mar 01, 2024");
    }
}
