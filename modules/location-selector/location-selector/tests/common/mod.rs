#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for location-selector integration tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use location_selector::{LocationSelectorConfig, LocationTree};
use location_selector_sdk::{
    AncestorsResponse, DirectoryError, LocationDirectoryClient, LocationNode, LocationTypeDecl,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Key under which root-list calls are counted.
pub const ROOT: &str = "root";

/// In-memory directory that counts calls per key, can fail a key a number
/// of times, and can hold a key's fetch until released.
#[derive(Default)]
pub struct FakeDirectory {
    roots: Vec<LocationNode>,
    children: HashMap<String, Vec<LocationNode>>,
    ancestors: HashMap<String, AncestorsResponse>,
    calls: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashMap<String, usize>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roots(mut self, roots: Vec<LocationNode>) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_children(mut self, parent_id: &str, children: Vec<LocationNode>) -> Self {
        self.children.insert(parent_id.to_owned(), children);
        self
    }

    pub fn with_ancestors(mut self, location_id: &str, response: AncestorsResponse) -> Self {
        self.ancestors.insert(location_id.to_owned(), response);
        self
    }

    /// The next `times` fetches of `key` fail with a network error.
    pub fn fail(&self, key: &str, times: usize) {
        self.failures.lock().insert(key.to_owned(), times);
    }

    /// Holds fetches of `key` until the returned gate is notified.
    pub fn hold(&self, key: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(key.to_owned(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().get(key).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    async fn enter(&self, key: &str) -> Result<(), DirectoryError> {
        *self.calls.lock().entry(key.to_owned()).or_default() += 1;

        let gate = self.gates.lock().get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(key)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(DirectoryError::Network(format!("{key}: connection reset")));
        }
        Ok(())
    }
}

#[async_trait]
impl LocationDirectoryClient for FakeDirectory {
    async fn get_root_locations(&self) -> Result<Vec<LocationNode>, DirectoryError> {
        self.enter(ROOT).await?;
        Ok(self.roots.clone())
    }

    async fn get_children(&self, parent_id: &str) -> Result<Vec<LocationNode>, DirectoryError> {
        self.enter(parent_id).await?;
        Ok(self.children.get(parent_id).cloned().unwrap_or_default())
    }

    async fn get_ancestors(&self, location_id: &str) -> Result<AncestorsResponse, DirectoryError> {
        self.enter(&format!("ancestors:{location_id}")).await?;
        self.ancestors
            .get(location_id)
            .cloned()
            .ok_or_else(|| DirectoryError::LocationNotFound {
                location_id: location_id.to_owned(),
            })
    }

    async fn get_location(&self, location_id: &str) -> Result<LocationNode, DirectoryError> {
        self.enter(&format!("location:{location_id}")).await?;
        self.roots
            .iter()
            .chain(self.children.values().flatten())
            .find(|l| l.location_id == location_id)
            .cloned()
            .ok_or_else(|| DirectoryError::LocationNotFound {
                location_id: location_id.to_owned(),
            })
    }
}

/// `state > district > block > supervisor > awc`
pub fn icds_types() -> Vec<LocationTypeDecl> {
    vec![
        LocationTypeDecl::new("state", &[]),
        LocationTypeDecl::new("district", &["state"]),
        LocationTypeDecl::new("block", &["district"]),
        LocationTypeDecl::new("supervisor", &["block"]),
        LocationTypeDecl::new("awc", &["supervisor"]),
    ]
}

/// `state > district > block`
pub fn three_level_types() -> Vec<LocationTypeDecl> {
    vec![
        LocationTypeDecl::new("state", &[]),
        LocationTypeDecl::new("district", &["state"]),
        LocationTypeDecl::new("block", &["district"]),
    ]
}

/// A location with access to itself.
pub fn open(id: &str, location_type: &str, parent: Option<&str>) -> LocationNode {
    node(id, location_type, parent, true, false)
}

/// A location visible only through an accessible descendant.
pub fn via_child(id: &str, location_type: &str, parent: Option<&str>) -> LocationNode {
    node(id, location_type, parent, false, true)
}

/// A location the user can neither act on nor reach.
pub fn closed(id: &str, location_type: &str, parent: Option<&str>) -> LocationNode {
    node(id, location_type, parent, false, false)
}

pub fn node(
    id: &str,
    location_type: &str,
    parent: Option<&str>,
    access: bool,
    parent_access: bool,
) -> LocationNode {
    let mut node = LocationNode::new(id, format!("Location {id}"))
        .with_type(location_type)
        .with_access(access, parent_access);
    if let Some(parent) = parent {
        node = node.with_parent(parent);
    }
    node
}

pub fn create_tree(
    directory: &Arc<FakeDirectory>,
    types: &[LocationTypeDecl],
    config: LocationSelectorConfig,
) -> Arc<LocationTree> {
    let client: Arc<dyn LocationDirectoryClient> = directory.clone();
    Arc::new(LocationTree::new(client, types, config).unwrap())
}

pub fn ids(list: &[LocationNode]) -> Vec<&str> {
    list.iter().map(|l| l.location_id.as_str()).collect()
}

pub fn path_ids(tree: &LocationTree) -> Vec<Option<String>> {
    tree.snapshot().location_ids
}

pub fn some(ids: &[Option<&str>]) -> Vec<Option<String>> {
    ids.iter().map(|id| id.map(str::to_owned)).collect()
}
