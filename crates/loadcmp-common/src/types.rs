//! Shared harness types: instrumentation state and load profiles.

use crate::duration::duration_serde;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Whether the monitored application runs with the overhead-measuring SDK
/// active or inactive. Each comparison executes both variants in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentationState {
    WithoutInstrumentation,
    WithInstrumentation,
}

impl InstrumentationState {
    /// Execution order of a comparison run: baseline first.
    pub const BOTH: [InstrumentationState; 2] = [
        InstrumentationState::WithoutInstrumentation,
        InstrumentationState::WithInstrumentation,
    ];

    /// JSON key under which this phase's result is persisted.
    pub fn key(&self) -> &'static str {
        match self {
            Self::WithoutInstrumentation => "without_instrumentation",
            Self::WithInstrumentation => "with_instrumentation",
        }
    }

    /// Suffix of the environment file consumed by the configuring phase:
    /// `.env.<app>.<suffix>`.
    pub fn env_suffix(&self) -> &'static str {
        match self {
            Self::WithoutInstrumentation => "without_insights",
            Self::WithInstrumentation => "with_insights",
        }
    }

    /// Human-readable label for reports.
    pub fn title(&self) -> &'static str {
        match self {
            Self::WithoutInstrumentation => "Without Instrumentation",
            Self::WithInstrumentation => "With Instrumentation",
        }
    }
}

/// One named synthetic load configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProfile {
    /// Concurrent simulated users.
    pub users: u32,
    /// Users spawned per second until `users` is reached.
    pub spawn_rate: u32,
    /// How long the load generator runs.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    #[serde(default)]
    pub description: String,
}

/// The built-in load profile table. Config files may override or extend it.
pub fn builtin_profiles() -> BTreeMap<String, LoadProfile> {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        "light_load".to_string(),
        LoadProfile {
            users: 10,
            spawn_rate: 2,
            duration: Duration::from_secs(60),
            description: "Light load test - 10 users over 1 minute".to_string(),
        },
    );
    profiles.insert(
        "medium_load".to_string(),
        LoadProfile {
            users: 50,
            spawn_rate: 5,
            duration: Duration::from_secs(300),
            description: "Medium load test - 50 users over 5 minutes".to_string(),
        },
    );
    profiles.insert(
        "heavy_load".to_string(),
        LoadProfile {
            users: 100,
            spawn_rate: 10,
            duration: Duration::from_secs(300),
            description: "Heavy load test - 100 users over 5 minutes".to_string(),
        },
    );
    profiles.insert(
        "burst_load".to_string(),
        LoadProfile {
            users: 200,
            spawn_rate: 50,
            duration: Duration::from_secs(180),
            description: "Burst load test - 200 users spawned quickly".to_string(),
        },
    );
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_keys_and_suffixes() {
        assert_eq!(
            InstrumentationState::WithoutInstrumentation.key(),
            "without_instrumentation"
        );
        assert_eq!(
            InstrumentationState::WithInstrumentation.env_suffix(),
            "with_insights"
        );
        assert_eq!(InstrumentationState::BOTH.len(), 2);
    }

    #[test]
    fn test_builtin_profiles_table() {
        let profiles = builtin_profiles();
        assert_eq!(profiles.len(), 4);
        let medium = &profiles["medium_load"];
        assert_eq!(medium.users, 50);
        assert_eq!(medium.duration, Duration::from_secs(300));
    }

    #[test]
    fn test_profile_yaml_round_trip() {
        let yaml = "users: 10\nspawn_rate: 2\nduration: 10s\ndescription: quick\n";
        let profile: LoadProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(profile.duration, Duration::from_secs(10));
        let back = serde_yaml::to_string(&profile).unwrap();
        assert!(back.contains("10s"));
    }
}
