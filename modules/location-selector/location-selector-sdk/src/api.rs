//! Public API trait for location directories.
//!
//! The location tree drives every backend round-trip through this trait, so
//! the HTTP implementation and the static plugin are interchangeable.

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::models::{AncestorsResponse, LocationNode};

/// Read access to the location hierarchy on behalf of the current user.
///
/// Every returned [`LocationNode`] carries the user's access flags for that
/// location; the directory decides them, callers only read them.
///
/// ```ignore
/// let roots = directory.get_root_locations().await?;
/// let children = directory.get_children(&roots[0].location_id).await?;
/// ```
#[async_trait]
pub trait LocationDirectoryClient: Send + Sync {
    /// List the top-level locations.
    ///
    /// # Errors
    ///
    /// - `Network` if the request does not complete
    async fn get_root_locations(&self) -> Result<Vec<LocationNode>, DirectoryError>;

    /// List the direct children of a location, in backend order.
    ///
    /// # Errors
    ///
    /// - `LocationNotFound` if the parent does not exist
    /// - `Network` if the request does not complete
    async fn get_children(&self, parent_id: &str) -> Result<Vec<LocationNode>, DirectoryError>;

    /// Fetch a location together with its ancestor chain and the siblings at
    /// every level of that chain.
    ///
    /// # Errors
    ///
    /// - `LocationNotFound` if the location does not exist
    /// - `Network` if the request does not complete
    async fn get_ancestors(&self, location_id: &str) -> Result<AncestorsResponse, DirectoryError>;

    /// Fetch a single location.
    ///
    /// # Errors
    ///
    /// - `LocationNotFound` if the location does not exist or is not accessible
    /// - `Network` if the request does not complete
    async fn get_location(&self, location_id: &str) -> Result<LocationNode, DirectoryError>;
}
