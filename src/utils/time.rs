//! Time parsing and formatting utilities

use thiserror::Error;

/// Rejected clock string
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid time '{input}': {reason}. Expected seconds, M:SS or H:MM:SS")]
pub struct TimeParseError {
    pub input: String,
    pub reason: &'static str,
}

impl TimeParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Format seconds as `m:ss`, flooring both fields
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}

/// Parse `ss[.ms]`, `m:ss[.ms]` or `h:mm:ss[.ms]` into seconds
pub fn parse_clock(input: &str) -> Result<f64, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::new(input, "empty value"));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let seconds = match parts.as_slice() {
        [secs] => parse_field(input, secs)?,
        [minutes, secs] => {
            let minutes = parse_whole(input, minutes)?;
            let secs = parse_sexagesimal(input, secs)?;
            minutes * 60.0 + secs
        }
        [hours, minutes, secs] => {
            let hours = parse_whole(input, hours)?;
            let minutes = parse_whole(input, minutes)?;
            if minutes >= 60.0 {
                return Err(TimeParseError::new(input, "minutes must be less than 60"));
            }
            let secs = parse_sexagesimal(input, secs)?;
            hours * 3600.0 + minutes * 60.0 + secs
        }
        _ => return Err(TimeParseError::new(input, "too many ':' separators")),
    };

    Ok(seconds)
}

fn parse_field(input: &str, field: &str) -> Result<f64, TimeParseError> {
    let value: f64 = field
        .parse()
        .map_err(|_| TimeParseError::new(input, "not a number"))?;
    if !value.is_finite() {
        return Err(TimeParseError::new(input, "not a finite number"));
    }
    if value < 0.0 {
        return Err(TimeParseError::new(input, "time cannot be negative"));
    }
    Ok(value)
}

fn parse_whole(input: &str, field: &str) -> Result<f64, TimeParseError> {
    let value: u32 = field
        .parse()
        .map_err(|_| TimeParseError::new(input, "hours and minutes must be whole numbers"))?;
    Ok(value as f64)
}

fn parse_sexagesimal(input: &str, field: &str) -> Result<f64, TimeParseError> {
    let value = parse_field(input, field)?;
    if value >= 60.0 {
        return Err(TimeParseError::new(input, "seconds must be less than 60"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(9.99), "0:09");
        assert_eq!(format_clock(65.4), "1:05");
        assert_eq!(format_clock(3725.0), "62:05");
    }

    #[test]
    fn test_format_clock_degenerate_input() {
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(f64::INFINITY), "0:00");
    }

    #[test]
    fn test_parse_clock_formats() {
        assert_eq!(parse_clock("90.5").unwrap(), 90.5);
        assert_eq!(parse_clock("1:30").unwrap(), 90.0);
        assert_eq!(parse_clock(" 1:30.5 ").unwrap(), 90.5);
        assert_eq!(parse_clock("1:02:03.5").unwrap(), 3723.5);
    }

    #[test]
    fn test_parse_clock_rejects_bad_input() {
        assert!(parse_clock("").is_err());
        assert!(parse_clock("abc").is_err());
        assert!(parse_clock("-10").is_err());
        assert!(parse_clock("1:60").is_err());
        assert!(parse_clock("1:75:00").is_err());
        assert!(parse_clock("1:2:3:4").is_err());
        assert!(parse_clock("1.5:30").is_err());
    }

    #[test]
    fn test_format_then_parse_whole_seconds() {
        assert_eq!(parse_clock(&format_clock(125.0)).unwrap(), 125.0);
    }
}
