use crate::error::{AnalyticsError, Result};

/// Parse a period clock (`M:SS`, `MM:SS`, or bare seconds) into seconds remaining.
pub fn parse_clock(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let fail = || AnalyticsError::ClockParse {
        raw: raw.to_string(),
    };
    if trimmed.is_empty() {
        return Err(fail());
    }

    if !trimmed.contains(':') {
        return parse_part(trimmed).ok_or_else(fail);
    }

    let mut parts = trimmed.split(':');
    let (Some(minutes), Some(seconds), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(fail());
    };
    let minutes = parse_part(minutes).ok_or_else(fail)?;
    let seconds = parse_part(seconds).ok_or_else(fail)?;
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(fail)
}

/// Inverse of [`parse_clock`] for canonical values.
pub fn format_clock(seconds_remaining: u32) -> String {
    format!("{}:{:02}", seconds_remaining / 60, seconds_remaining % 60)
}

fn parse_part(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_forms() {
        assert_eq!(parse_clock("5:00").unwrap(), 300);
        assert_eq!(parse_clock("12:00").unwrap(), 720);
        assert_eq!(parse_clock("0:07").unwrap(), 7);
        assert_eq!(parse_clock("45").unwrap(), 45);
    }

    #[test]
    fn rejects_malformed() {
        for raw in ["", "  ", "1:2:3", "a:10", "1:xx", ":30", "1:", "-5", "1.5"] {
            assert!(
                matches!(parse_clock(raw), Err(AnalyticsError::ClockParse { .. })),
                "{raw:?} should not parse"
            );
        }
    }
}
