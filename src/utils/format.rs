/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Case-insensitive substring check
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Strip HTML tags from CMS-delivered rich text, collapsing runs of whitespace
pub fn strip_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    // Try to parse ISO format and convert to readable
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 {
        // Try to parse YYYY-MM-DD format
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Indiranagar Flagship Gym", "flagship"));
        assert!(contains_ignore_case("YOGA", "yoga"));
        assert!(!contains_ignore_case("Pilates", "yoga"));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Open <b>daily</b></p>"), "Open daily");
        assert_eq!(strip_html("no markup"), "no markup");
        assert_eq!(strip_html("<br/>"), "");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-03-14T18:30:00+05:30"), "Mar 14, 2026");
        assert_eq!(format_date("2026-03-14"), "2026-03-14");
        assert_eq!(format_date("TBD"), "TBD");
    }
}
