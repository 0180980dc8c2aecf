//! String duration format used in config files and load profiles.
//!
//! Durations are written as `"500ms"`, `"5s"`, or `"1m"`. The serde helper
//! modules are meant for `#[serde(with = "...")]` on `Duration` fields.

use std::time::Duration;

/// Parse a duration string ending in `ms`, `s`, or `m`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    // Check for "ms" BEFORE "s" since "ms" ends with 's'
    if s.ends_with("ms") {
        let num_str = &s[..s.len() - 2];
        let millis: u64 = num_str
            .parse()
            .map_err(|_| format!("Invalid duration: {}", s))?;
        Ok(Duration::from_millis(millis))
    } else if s.ends_with('s') {
        let num_str = &s[..s.len() - 1];
        let secs: u64 = num_str
            .parse()
            .map_err(|_| format!("Invalid duration: {}", s))?;
        Ok(Duration::from_secs(secs))
    } else if s.ends_with('m') {
        let num_str = &s[..s.len() - 1];
        let mins: u64 = num_str
            .parse()
            .map_err(|_| format!("Invalid duration: {}", s))?;
        Ok(Duration::from_secs(mins * 60))
    } else {
        Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
    }
}

/// Format a duration as whole seconds (`"120s"`), the form load generators accept.
pub fn format_duration(d: Duration) -> String {
    format!("{}s", d.as_secs())
}

/// Serde adapter for `Duration` fields stored as duration strings.
pub mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&super::format_duration(*duration))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
