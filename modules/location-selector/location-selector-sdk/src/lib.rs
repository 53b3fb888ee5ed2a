//! Location Selector SDK
//!
//! This crate provides the public contract of the location selector:
//!
//! - [`LocationDirectoryClient`] - API trait over the location endpoints
//! - [`LocationNode`], [`LocationTypeDecl`] - Domain models
//! - [`AncestorsResponse`] - Payload used to open a dashboard on a deep link
//! - [`DirectoryError`] - Error types
//!
//! ## Usage
//!
//! Consumers hand a directory implementation to the location tree:
//!
//! ```ignore
//! use location_selector_sdk::LocationDirectoryClient;
//!
//! let directory: Arc<dyn LocationDirectoryClient> = Arc::new(HttpLocationDirectory::new(cfg)?);
//!
//! // Direct children of a state
//! let districts = directory.get_children("st-1").await?;
//!
//! // Everything needed to render the path down to a block
//! let ancestors = directory.get_ancestors("blk-7").await?;
//! ```

pub mod api;
pub mod error;
pub mod models;

// Re-export main types at crate root
pub use api::LocationDirectoryClient;
pub use error::DirectoryError;
pub use models::{
    ALL_LOCATION_ID, AncestorsResponse, ChildrenResponse, LocationId, LocationNode,
    LocationTypeDecl, ParentKey,
};
