//! Domain service for the static location directory plugin.

use std::collections::{HashMap, HashSet};

use location_selector_sdk::{
    AncestorsResponse, DirectoryError, LocationId, LocationNode, LocationTypeDecl, ParentKey,
};

use crate::config::StaticLdPluginConfig;

/// Static location directory.
///
/// Stores the location tree in memory, loaded from configuration, and
/// derives the access flags of every location from the user's assigned
/// locations.
pub struct Service {
    /// Location by ID, without access flags.
    pub(super) locations: HashMap<LocationId, LocationNode>,

    /// Children index: parent -> child IDs in declaration order.
    pub(super) children: HashMap<ParentKey, Vec<LocationId>>,

    /// Locations the user is assigned to.
    pub(super) user_locations: HashSet<LocationId>,

    location_types: Vec<LocationTypeDecl>,
}

impl Service {
    /// Creates a new service from configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticLdPluginConfig) -> Self {
        let mut locations = HashMap::with_capacity(cfg.locations.len());
        let mut children: HashMap<ParentKey, Vec<LocationId>> = HashMap::new();

        for location in &cfg.locations {
            let mut node = LocationNode::new(location.id.clone(), location.name.clone())
                .with_type(location.location_type.clone());
            node.parent_id.clone_from(&location.parent_id);

            children
                .entry(node.parent_key())
                .or_default()
                .push(location.id.clone());
            locations.insert(location.id.clone(), node);
        }

        let user_locations: HashSet<LocationId> = cfg.user_locations.iter().cloned().collect();
        for id in &user_locations {
            if !locations.contains_key(id) {
                tracing::warn!(location_id = %id, "assigned location is not configured");
            }
        }

        Self {
            locations,
            children,
            user_locations,
            location_types: cfg.location_types.clone(),
        }
    }

    /// The configured type hierarchy.
    #[must_use]
    pub fn location_types(&self) -> &[LocationTypeDecl] {
        &self.location_types
    }

    /// A user without assigned locations sees the whole country.
    #[must_use]
    pub fn has_national_access(&self) -> bool {
        self.user_locations.is_empty()
    }

    /// Collect ancestors of a location, ordered from direct parent to root.
    ///
    /// The starting location is not included. Stops at an unknown parent or
    /// a cycle.
    pub(super) fn collect_ancestors(&self, id: &str) -> Vec<&LocationNode> {
        let mut ancestors = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(id);

        let Some(location) = self.locations.get(id) else {
            return ancestors;
        };
        let mut current_parent_id = location.parent_id.as_deref();

        while let Some(parent_id) = current_parent_id {
            if !visited.insert(parent_id) {
                break;
            }
            let Some(parent) = self.locations.get(parent_id) else {
                break;
            };
            ancestors.push(parent);
            current_parent_id = parent.parent_id.as_deref();
        }

        ancestors
    }

    /// The user may act at `id`: it is assigned or lies below an assigned
    /// location.
    pub(super) fn has_access(&self, id: &str) -> bool {
        self.has_national_access()
            || self.user_locations.contains(id)
            || self
                .collect_ancestors(id)
                .iter()
                .any(|a| self.user_locations.contains(&a.location_id))
    }

    /// `id` lies above an assigned location.
    pub(super) fn has_access_to_parent(&self, id: &str) -> bool {
        !self.has_national_access()
            && self.user_locations.iter().any(|assigned| {
                self.collect_ancestors(assigned)
                    .iter()
                    .any(|a| a.location_id == id)
            })
    }

    /// The location with the user's access flags, if the user may see it.
    pub(super) fn visible_node(&self, id: &str) -> Option<LocationNode> {
        let node = self.locations.get(id)?;
        let access = self.has_access(id);
        let parent_access = self.has_access_to_parent(id);
        (access || parent_access).then(|| node.clone().with_access(access, parent_access))
    }

    /// Visible children of `key`, in declaration order.
    pub(super) fn visible_children(&self, key: &ParentKey) -> Vec<LocationNode> {
        self.children
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.visible_node(id)).collect())
            .unwrap_or_default()
    }

    pub(super) fn children_of(&self, parent_id: &str) -> Result<Vec<LocationNode>, DirectoryError> {
        if self.visible_node(parent_id).is_none() {
            return Err(not_found(parent_id));
        }
        Ok(self.visible_children(&ParentKey::location(parent_id)))
    }

    pub(super) fn location(&self, id: &str) -> Result<LocationNode, DirectoryError> {
        self.visible_node(id).ok_or_else(|| not_found(id))
    }

    /// The location, its ancestors and the visible siblings at every level
    /// of the chain, top-level locations included.
    pub(super) fn ancestors(&self, id: &str) -> Result<AncestorsResponse, DirectoryError> {
        let selected = self.location(id)?;

        let mut keys = vec![selected.parent_key()];
        keys.extend(self.collect_ancestors(id).into_iter().map(LocationNode::parent_key));

        let mut seen = HashSet::new();
        let locations = keys
            .iter()
            .flat_map(|key| self.visible_children(key))
            .filter(|l| seen.insert(l.location_id.clone()))
            .collect();

        Ok(AncestorsResponse {
            locations,
            selected_location: selected,
        })
    }
}

fn not_found(id: &str) -> DirectoryError {
    DirectoryError::LocationNotFound {
        location_id: id.to_owned(),
    }
}
