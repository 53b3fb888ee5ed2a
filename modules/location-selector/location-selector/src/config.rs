//! Configuration for the location selector.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DashboardKind;

/// Selector configuration for one dashboard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationSelectorConfig {
    /// Caption of the synthetic option aggregating all children of a location.
    pub all_label: String,

    /// Caption of the synthetic top-level option.
    pub national_label: String,

    /// The user may act on every location; access flags never disable a level.
    pub have_access_to_all_locations: bool,

    /// Location the user is assigned to, if any. Opened as a deep link when
    /// the dashboard starts and used to lock single-option levels.
    pub user_location_id: Option<String>,

    /// Which dashboard the month filter serves.
    pub dashboard: DashboardKind,
}

impl Default for LocationSelectorConfig {
    fn default() -> Self {
        Self {
            all_label: "All".to_owned(),
            national_label: "National".to_owned(),
            have_access_to_all_locations: false,
            user_location_id: None,
            dashboard: DashboardKind::default(),
        }
    }
}

/// Connection settings of the HTTP location directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpDirectoryConfig {
    /// Base URL the `locations` endpoints are resolved against,
    /// e.g. `https://www.icds-cas.gov.in/a/icds-dashboard-qa/icds_dashboard/`.
    pub base_url: String,

    /// Per-request timeout.
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
}

impl Default for HttpDirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// `Duration` in humantime notation (`"30s"`, `"1m 30s"`).
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}
