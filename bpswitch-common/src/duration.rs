use std::time::Duration;
use std::str::FromStr;
use crate::error::ValidationError;
use crate::Result;

/// Parses a humantime duration such as `"1s"` or `"750ms"`.
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    humantime::Duration::from_str(duration_str.trim())
        .map(|d| d.into())
        .map_err(|_| ValidationError::InvalidDuration { duration: duration_str.to_string() }.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_forms() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("750ms").unwrap(), Duration::from_millis(750));
        assert_eq!(parse_duration(" 2s 500ms ").unwrap(), Duration::from_millis(2500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
    }
}
