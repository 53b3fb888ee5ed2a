//! Layered configuration: defaults, then the YAML file, then `ICDS_*`
//! environment variables (`ICDS_SELECTOR__ALL_LABEL=Sab`).

use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use location_selector::{HttpDirectoryConfig, LocationSelectorConfig};
use location_selector_sdk::LocationTypeDecl;
use serde::{Deserialize, Serialize};
use static_ld_plugin::StaticLdPluginConfig;

const ENV_PREFIX: &str = "ICDS_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub logging: LoggingConfig,

    pub selector: LocationSelectorConfig,

    /// Location types shared by every directory. Falls back to
    /// `static_directory.location_types` when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub location_types: Vec<LocationTypeDecl>,

    /// Dashboard backend. Locations are served from `static_directory` when
    /// unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<HttpDirectoryConfig>,

    /// In-memory locations used without a backend.
    pub static_directory: StaticLdPluginConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Location types the selector is built from.
    #[must_use]
    pub fn location_types(&self) -> &[LocationTypeDecl] {
        if self.location_types.is_empty() {
            &self.static_directory.location_types
        } else {
            &self.location_types
        }
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    /// Loads the configuration, reading `path` when given.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or a layer does not match the schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Self::defaults();
        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_defaults() {
        let yaml = r"
logging:
  level: debug
selector:
  all_label: Sab
  have_access_to_all_locations: true
directory:
  base_url: https://dashboard.example/icds_dashboard/
  timeout: 10s
static_directory:
  location_types:
    - [state, [null]]
";
        let cfg: AppConfig = AppConfig::defaults()
            .merge(Yaml::string(yaml))
            .extract()
            .unwrap();

        assert_eq!(cfg.logging.level, "debug");
        assert!(!cfg.logging.json);
        assert_eq!(cfg.selector.all_label, "Sab");
        assert_eq!(cfg.selector.national_label, "National");
        assert!(cfg.selector.have_access_to_all_locations);
        let directory = cfg.directory.unwrap();
        assert_eq!(directory.timeout, std::time::Duration::from_secs(10));
        assert_eq!(cfg.static_directory.location_types.len(), 1);
    }

    #[test]
    fn http_directory_takes_top_level_location_types() {
        let yaml = r"
location_types:
  - [state, [null]]
  - [district, [state]]
directory:
  base_url: https://dashboard.example/icds_dashboard/
";
        let cfg: AppConfig = AppConfig::defaults()
            .merge(Yaml::string(yaml))
            .extract()
            .unwrap();

        assert!(cfg.directory.is_some());
        assert!(cfg.static_directory.location_types.is_empty());
        let names: Vec<_> = cfg.location_types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["state", "district"]);
    }

    #[test]
    fn static_location_types_are_the_fallback() {
        let yaml = r"
static_directory:
  location_types:
    - [state, [null]]
";
        let cfg: AppConfig = AppConfig::defaults()
            .merge(Yaml::string(yaml))
            .extract()
            .unwrap();

        assert_eq!(cfg.location_types().len(), 1);
        assert_eq!(cfg.location_types()[0].name, "state");
    }

    #[test]
    fn defaults_use_static_directory() {
        let cfg: AppConfig = AppConfig::defaults().extract().unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.directory.is_none());
    }

    #[test]
    fn unknown_section_is_rejected() {
        let result: Result<AppConfig, _> = AppConfig::defaults()
            .merge(Yaml::string("reports: {}"))
            .extract();
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/explorer.yaml"))).is_err());
    }
}
