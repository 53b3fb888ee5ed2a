//! Domain models for the location selector.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a location.
pub type LocationId = String;

/// Location id carried by the synthetic "All" / "National" option.
pub const ALL_LOCATION_ID: &str = "all";

/// Declaration of one rung of the administrative hierarchy.
///
/// The backend ships the hierarchy as `[name, [parent | null, ...]]` pairs,
/// configuration files usually spell it out as `{name, parents}`. Both forms
/// deserialize into this type; a `null` parent is dropped, so a root type
/// ends up with an empty `parents` list.
///
/// ```
/// use location_selector_sdk::LocationTypeDecl;
///
/// let decls: Vec<LocationTypeDecl> =
///     serde_json::from_str(r#"[["state", [null]], ["district", ["state"]]]"#).unwrap();
/// assert!(decls[0].is_root());
/// assert_eq!(decls[1].parents, vec!["state".to_owned()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LocationTypeRepr")]
pub struct LocationTypeDecl {
    /// Type name, e.g. `state`, `district`, `awc`.
    pub name: String,
    /// Names of the types this one can be parented by.
    pub parents: Vec<String>,
}

impl LocationTypeDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, parents: &[&str]) -> Self {
        Self {
            name: name.into(),
            parents: parents.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    /// A type without parents sits at level 0.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocationTypeRepr {
    Pair(String, Vec<Option<String>>),
    Named {
        name: String,
        #[serde(default)]
        parents: Vec<Option<String>>,
    },
}

impl From<LocationTypeRepr> for LocationTypeDecl {
    fn from(repr: LocationTypeRepr) -> Self {
        let (name, parents) = match repr {
            LocationTypeRepr::Pair(name, parents) | LocationTypeRepr::Named { name, parents } => {
                (name, parents)
            }
        };
        Self {
            name,
            parents: parents.into_iter().flatten().collect(),
        }
    }
}

/// One concrete location (a specific state, district, AWC, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNode {
    /// Unique location identifier.
    pub location_id: LocationId,
    /// Human-readable name.
    pub name: String,
    /// Parent location. `None` for top-level locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<LocationId>,
    /// Name of the location type. The children endpoint may omit it.
    #[serde(
        default,
        alias = "location_type_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub location_type: Option<String>,
    /// Whether the current user may act at this location.
    #[serde(default)]
    pub user_have_access: bool,
    /// Whether the location is visible because the user has access to one of
    /// its descendants.
    #[serde(default)]
    pub user_have_access_to_parent: bool,
}

impl LocationNode {
    /// Creates a location without access flags.
    #[must_use]
    pub fn new(location_id: impl Into<LocationId>, name: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            name: name.into(),
            parent_id: None,
            location_type: None,
            user_have_access: false,
            user_have_access_to_parent: false,
        }
    }

    /// The synthetic "no specific child, aggregate everything" option.
    #[must_use]
    pub fn all(label: impl Into<String>) -> Self {
        Self {
            user_have_access: true,
            ..Self::new(ALL_LOCATION_ID, label)
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<LocationId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, location_type: impl Into<String>) -> Self {
        self.location_type = Some(location_type.into());
        self
    }

    #[must_use]
    pub fn with_access(mut self, have_access: bool, have_access_to_parent: bool) -> Self {
        self.user_have_access = have_access;
        self.user_have_access_to_parent = have_access_to_parent;
        self
    }

    /// Returns `true` for the "All" / "National" option.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.location_id == ALL_LOCATION_ID
    }

    /// A location the user may pick from a drop-down.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.user_have_access || self.user_have_access_to_parent
    }

    /// Cache key under which this location is listed.
    #[must_use]
    pub fn parent_key(&self) -> ParentKey {
        self.parent_id
            .as_ref()
            .map_or(ParentKey::Root, |id| ParentKey::Location(id.clone()))
    }
}

/// Key of a children list: the top-level list or the children of a location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentKey {
    Root,
    Location(LocationId),
}

impl ParentKey {
    #[must_use]
    pub fn location(id: impl Into<LocationId>) -> Self {
        Self::Location(id.into())
    }
}

impl fmt::Display for ParentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Location(id) => f.write_str(id),
        }
    }
}

/// Payload of the children endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildrenResponse {
    #[serde(default)]
    pub locations: Vec<LocationNode>,
}

/// Payload of the ancestors endpoint.
///
/// `locations` holds the ancestors of `selected_location` together with the
/// siblings at every level of the chain and all top-level locations, which
/// is enough to fill every drop-down from the root down to the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorsResponse {
    #[serde(default)]
    pub locations: Vec<LocationNode>,
    pub selected_location: LocationNode,
}
