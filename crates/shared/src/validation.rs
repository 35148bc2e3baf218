//! Common validation utilities.

use chrono::{TimeZone, Utc};
use validator::ValidationError;

/// Maximum length of an application package identifier.
const MAX_PACKAGE_ID_LENGTH: usize = 255;

/// Maximum number of days a relative range may cover.
pub const MAX_RANGE_DAYS: u32 = 365;

lazy_static::lazy_static! {
    /// Dot-separated segments, each starting with a letter.
    pub static ref PACKAGE_ID_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").unwrap();
}

/// Validates that a package identifier looks like `com.example.app`.
pub fn validate_package_id(package_id: &str) -> Result<(), ValidationError> {
    if package_id.is_empty() || package_id.len() > MAX_PACKAGE_ID_LENGTH {
        let mut err = ValidationError::new("package_id_length");
        err.message = Some("Package identifier must be between 1 and 255 characters".into());
        return Err(err);
    }

    if !PACKAGE_ID_REGEX.is_match(package_id) {
        let mut err = ValidationError::new("package_id_format");
        err.message = Some(
            "Package identifier must be dot-separated segments starting with a letter".into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a timestamp (milliseconds since epoch) is non-negative and representable.
pub fn validate_epoch_millis(timestamp_millis: i64) -> Result<(), ValidationError> {
    if timestamp_millis < 0 {
        let mut err = ValidationError::new("timestamp_negative");
        err.message = Some("Timestamp cannot be before the Unix epoch".into());
        return Err(err);
    }

    if Utc.timestamp_millis_opt(timestamp_millis).single().is_none() {
        let mut err = ValidationError::new("timestamp_invalid");
        err.message = Some("Invalid timestamp format".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a half-open `[start, end)` range in epoch milliseconds.
///
/// An empty range (`start == end`) is accepted.
pub fn validate_time_range(start_millis: i64, end_millis: i64) -> Result<(), ValidationError> {
    validate_epoch_millis(start_millis)?;
    validate_epoch_millis(end_millis)?;

    if start_millis > end_millis {
        let mut err = ValidationError::new("time_range_order");
        err.message = Some("Range start must not be after range end".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a relative range length in days (1 to 365).
pub fn validate_range_days(days: u32) -> Result<(), ValidationError> {
    if (1..=MAX_RANGE_DAYS).contains(&days) {
        Ok(())
    } else {
        let mut err = ValidationError::new("range_days");
        err.message = Some("Range must cover between 1 and 365 days".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_package_id() {
        assert!(validate_package_id("com.example.app").is_ok());
        assert!(validate_package_id("com.a").is_ok());
        assert!(validate_package_id("org.mozilla.firefox_beta").is_ok());
        assert!(validate_package_id("Com.Example2.App_3").is_ok());
    }

    #[test]
    fn test_validate_package_id_rejects_malformed() {
        assert!(validate_package_id("").is_err());
        assert!(validate_package_id("nodots").is_err());
        assert!(validate_package_id("com..example").is_err());
        assert!(validate_package_id("1com.example").is_err());
        assert!(validate_package_id("com.example.").is_err());
        assert!(validate_package_id("com.exa mple").is_err());
    }

    #[test]
    fn test_validate_package_id_too_long() {
        let long = format!("com.{}", "a".repeat(300));
        let err = validate_package_id(&long).unwrap_err();
        assert_eq!(err.code, "package_id_length");
    }

    #[test]
    fn test_validate_package_id_error_message() {
        let err = validate_package_id("bad").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Package identifier must be dot-separated segments starting with a letter"
        );
    }

    #[test]
    fn test_validate_epoch_millis() {
        assert!(validate_epoch_millis(0).is_ok());
        assert!(validate_epoch_millis(Utc::now().timestamp_millis()).is_ok());
        assert!(validate_epoch_millis(-1).is_err());
        assert!(validate_epoch_millis(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_time_range() {
        assert!(validate_time_range(500, 1000).is_ok());
        assert!(validate_time_range(1000, 1000).is_ok());

        let err = validate_time_range(1000, 500).unwrap_err();
        assert_eq!(err.code, "time_range_order");
    }

    #[test]
    fn test_validate_time_range_negative_start() {
        let err = validate_time_range(-5, 500).unwrap_err();
        assert_eq!(err.code, "timestamp_negative");
    }

    #[test]
    fn test_validate_range_days() {
        assert!(validate_range_days(1).is_ok());
        assert!(validate_range_days(7).is_ok());
        assert!(validate_range_days(365).is_ok());
        assert!(validate_range_days(0).is_err());
        assert!(validate_range_days(366).is_err());
    }
}
