//! Configuration for the static location directory plugin.

use location_selector_sdk::LocationTypeDecl;
use serde::{Deserialize, Serialize};

/// Plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticLdPluginConfig {
    /// Location type hierarchy, as `[name, [parents]]` pairs or
    /// `{name, parents}` maps.
    pub location_types: Vec<LocationTypeDecl>,

    /// Static location definitions, in the order children are listed.
    pub locations: Vec<LocationConfig>,

    /// Locations the user is assigned to. Empty means national access.
    pub user_locations: Vec<String>,
}

/// Configuration for a single location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationConfig {
    pub id: String,

    pub name: String,

    /// Location type name, one of `location_types`.
    #[serde(rename = "type")]
    pub location_type: String,

    /// Parent location. `None` for top-level locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}
