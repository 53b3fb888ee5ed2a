//! Client implementation for the static location directory plugin.
//!
//! Implements `LocationDirectoryClient` using the domain service.

use async_trait::async_trait;
use location_selector_sdk::{
    AncestorsResponse, DirectoryError, LocationDirectoryClient, LocationNode, ParentKey,
};

use super::service::Service;

#[async_trait]
impl LocationDirectoryClient for Service {
    async fn get_root_locations(&self) -> Result<Vec<LocationNode>, DirectoryError> {
        Ok(self.visible_children(&ParentKey::Root))
    }

    async fn get_children(&self, parent_id: &str) -> Result<Vec<LocationNode>, DirectoryError> {
        self.children_of(parent_id)
    }

    async fn get_ancestors(&self, location_id: &str) -> Result<AncestorsResponse, DirectoryError> {
        self.ancestors(location_id)
    }

    async fn get_location(&self, location_id: &str) -> Result<LocationNode, DirectoryError> {
        self.location(location_id)
    }
}
