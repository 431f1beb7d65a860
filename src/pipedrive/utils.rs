//! Input conversion utilities
//!
//! Tool arguments arrive as loosely typed strings. These helpers turn them into
//! typed values, treating blank input as "not provided".

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use crate::config::pipedrive::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::error::ValidationError;

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid UUID regex")
});

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}):(\d{2}):(\d{2})$").expect("valid time regex"));

// Accepts H:MM, HH:MM, H:MM:SS and HH:MM:SS
static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("valid duration regex")
});

/// Treat blank strings as absent
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Trimmed, non-blank view of an optional string
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Convert a string ID into a positive integer
pub fn convert_id_string(value: Option<&str>, field: &str) -> Result<Option<i64>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(Some(id)),
        _ => Err(ValidationError::InvalidId {
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Validate a UUID string, normalizing it to lowercase hyphenated form
pub fn validate_uuid_string(value: Option<&str>, field: &str) -> Result<Option<String>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    let invalid = || ValidationError::InvalidUuid {
        field: field.to_string(),
        value: raw.to_string(),
    };

    if !UUID_PATTERN.is_match(raw) {
        return Err(invalid());
    }

    Uuid::parse_str(raw)
        .map(|uuid| Some(uuid.hyphenated().to_string()))
        .map_err(|_| invalid())
}

/// Validate a `YYYY-MM-DD` calendar date
pub fn validate_date_string(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    let invalid = || ValidationError::InvalidDate {
        field: field.to_string(),
        value: raw.to_string(),
    };

    if !DATE_PATTERN.is_match(raw) {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| invalid())
}

/// Validate an `HH:MM:SS` time of day
pub fn validate_time_string(value: Option<&str>, field: &str) -> Result<Option<String>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    let invalid = || ValidationError::InvalidTime {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let caps = TIME_PATTERN.captures(raw).ok_or_else(invalid)?;
    let (hours, minutes, seconds) = (
        parse_component(&caps[1]),
        parse_component(&caps[2]),
        parse_component(&caps[3]),
    );

    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(invalid());
    }

    Ok(Some(raw.to_string()))
}

/// Validate a duration, padding short forms to `HH:MM:SS`
pub fn normalize_duration(value: Option<&str>, field: &str) -> Result<Option<String>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    let invalid = || ValidationError::InvalidTime {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let caps = DURATION_PATTERN.captures(raw).ok_or_else(invalid)?;
    let hours = parse_component(&caps[1]);
    let minutes = parse_component(&caps[2]);
    let seconds = caps.get(3).map(|m| parse_component(m.as_str())).unwrap_or(0);

    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(invalid());
    }

    Ok(Some(format!("{:02}:{:02}:{:02}", hours, minutes, seconds)))
}

fn parse_component(digits: &str) -> u32 {
    // The regexes only capture ASCII digits, so this cannot overflow
    digits.parse().unwrap_or(u32::MAX)
}

/// Validate an RFC 3339 timestamp such as `2025-01-01T10:20:00Z`
pub fn validate_timestamp_string(value: Option<&str>, field: &str) -> Result<Option<String>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    DateTime::parse_from_rfc3339(raw)
        .map(|_| Some(raw.to_string()))
        .map_err(|_| ValidationError::InvalidParameter {
            name: field.to_string(),
            message: format!("'{}' is not an RFC 3339 timestamp (e.g. 2025-01-01T10:20:00Z)", raw),
        })
}

/// Convert a string into a finite floating point number
pub fn convert_number_string(value: Option<&str>, field: &str) -> Result<Option<f64>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Convert a string into a non-negative integer (counts, cycles, order numbers)
pub fn convert_integer_string(value: Option<&str>, field: &str) -> Result<Option<i64>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    raw.parse::<i64>().map(Some).map_err(|_| ValidationError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Convert a boolean-like string (`true`, `1`, `yes`, `y`, `on` and their negations)
pub fn convert_bool_string(value: Option<&str>, field: &str) -> Result<Option<bool>, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "n" | "off" => Ok(Some(false)),
        _ => Err(ValidationError::InvalidParameter {
            name: field.to_string(),
            message: format!("'{}' is not a boolean (use true or false)", raw),
        }),
    }
}

/// Check a value against a fixed set of accepted strings
pub fn validate_choice(value: &str, field: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::choice(field, value, allowed))
    }
}

/// Parse a page size, clamping it to the range the API accepts
pub fn parse_limit(value: Option<&str>) -> u32 {
    let Some(raw) = non_blank(value) else {
        return DEFAULT_LIMIT;
    };

    match raw.parse::<i64>() {
        Ok(limit) if limit < 1 => {
            warn!("Invalid limit value: {}. Using default value {}.", limit, DEFAULT_LIMIT);
            DEFAULT_LIMIT
        }
        Ok(limit) if limit > MAX_LIMIT as i64 => {
            warn!("Limit value {} exceeds maximum ({}). Using maximum.", limit, MAX_LIMIT);
            MAX_LIMIT
        }
        Ok(limit) => limit as u32,
        Err(_) => {
            warn!("Invalid limit value: {}. Using default value {}.", raw, DEFAULT_LIMIT);
            DEFAULT_LIMIT
        }
    }
}

/// Split a comma-separated string into trimmed, non-empty items
pub fn safe_split_to_list(value: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_id_string_valid() {
        assert_eq!(convert_id_string(Some("123"), "owner_id"), Ok(Some(123)));
        assert_eq!(convert_id_string(Some(" 42 "), "owner_id"), Ok(Some(42)));
        assert_eq!(convert_id_string(Some("9007199254740993"), "deal_id"), Ok(Some(9007199254740993)));
    }

    #[test]
    fn test_convert_id_string_blank() {
        assert_eq!(convert_id_string(None, "owner_id"), Ok(None));
        assert_eq!(convert_id_string(Some(""), "owner_id"), Ok(None));
        assert_eq!(convert_id_string(Some("   "), "owner_id"), Ok(None));
    }

    #[test]
    fn test_convert_id_string_invalid() {
        for bad in ["abc", "12.5", "0", "-4", "1e3"] {
            let err = convert_id_string(Some(bad), "person_id").unwrap_err();
            assert!(
                err.to_string().contains("person_id must be a numeric string"),
                "unexpected message for {bad}: {err}"
            );
        }
    }

    #[test]
    fn test_validate_uuid_string() {
        let lower = "123e4567-e89b-12d3-a456-426614174000";
        assert_eq!(validate_uuid_string(Some(lower), "lead_id"), Ok(Some(lower.to_string())));

        let upper = "123E4567-E89B-12D3-A456-426614174000";
        assert_eq!(validate_uuid_string(Some(upper), "lead_id"), Ok(Some(lower.to_string())));

        assert_eq!(validate_uuid_string(Some("  "), "lead_id"), Ok(None));
        assert_eq!(validate_uuid_string(None, "lead_id"), Ok(None));
    }

    #[test]
    fn test_validate_uuid_string_rejects_other_shapes() {
        for bad in [
            "not-a-uuid",
            "123e4567e89b12d3a456426614174000",
            "{123e4567-e89b-12d3-a456-426614174000}",
            "123e4567-e89b-12d3-a456-42661417400g",
            "123e4567-e89b-12d3-a456-4266141740",
        ] {
            let err = validate_uuid_string(Some(bad), "lead_id").unwrap_err();
            assert!(err.to_string().contains("lead_id"));
        }
    }

    #[test]
    fn test_validate_date_string() {
        assert_eq!(
            validate_date_string(Some("2025-01-15"), "due_date"),
            Ok(NaiveDate::from_ymd_opt(2025, 1, 15))
        );
        assert_eq!(validate_date_string(Some(""), "due_date"), Ok(None));
        assert!(validate_date_string(Some("2025-02-30"), "due_date").is_err());
        assert!(validate_date_string(Some("15/01/2025"), "due_date").is_err());
        assert!(validate_date_string(Some("2025-1-15"), "due_date").is_err());
    }

    #[test]
    fn test_validate_time_string() {
        assert_eq!(validate_time_string(Some("09:30:00"), "due_time"), Ok(Some("09:30:00".to_string())));
        assert!(validate_time_string(Some("24:00:00"), "due_time").is_err());
        assert!(validate_time_string(Some("10:60:00"), "due_time").is_err());
        assert!(validate_time_string(Some("9:30"), "due_time").is_err());
    }

    #[test]
    fn test_normalize_duration() {
        let pad = |s| normalize_duration(Some(s), "duration").unwrap();
        assert_eq!(pad("1:00"), Some("01:00:00".to_string()));
        assert_eq!(pad("01:00"), Some("01:00:00".to_string()));
        assert_eq!(pad("1:00:00"), Some("01:00:00".to_string()));
        assert_eq!(pad("01:30:15"), Some("01:30:15".to_string()));
        assert!(normalize_duration(Some("25:00:00"), "duration").is_err());
        assert!(normalize_duration(Some("1:75"), "duration").is_err());
        assert!(normalize_duration(Some("an hour"), "duration").is_err());
    }

    #[test]
    fn test_validate_timestamp_string() {
        assert!(validate_timestamp_string(Some("2025-01-01T10:20:00Z"), "updated_since").is_ok());
        assert!(validate_timestamp_string(Some("yesterday"), "updated_since").is_err());
    }

    #[test]
    fn test_convert_number_and_bool() {
        assert_eq!(convert_number_string(Some("1500.50"), "value"), Ok(Some(1500.5)));
        assert!(convert_number_string(Some("lots"), "value").is_err());
        assert!(convert_number_string(Some("NaN"), "value").is_err());
        assert_eq!(convert_bool_string(Some("Yes"), "done"), Ok(Some(true)));
        assert_eq!(convert_bool_string(Some("off"), "done"), Ok(Some(false)));
        assert!(convert_bool_string(Some("maybe"), "done").is_err());
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None), 100);
        assert_eq!(parse_limit(Some("25")), 25);
        assert_eq!(parse_limit(Some("0")), 100);
        assert_eq!(parse_limit(Some("1000")), 500);
        assert_eq!(parse_limit(Some("many")), 100);
    }

    #[test]
    fn test_safe_split_to_list() {
        assert_eq!(
            safe_split_to_list(Some("name, email ,,phone")),
            Some(vec!["name".to_string(), "email".to_string(), "phone".to_string()])
        );
        assert_eq!(safe_split_to_list(Some(" , ")), None);
        assert_eq!(safe_split_to_list(None), None);
    }

    #[test]
    fn test_validate_choice() {
        assert!(validate_choice("won", "status", &["open", "won", "lost"]).is_ok());
        let err = validate_choice("closed", "status", &["open", "won", "lost"]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid status: 'closed'. Must be one of: open, won, lost");
    }
}
