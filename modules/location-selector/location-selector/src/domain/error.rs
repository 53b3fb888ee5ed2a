//! Domain error types for the location selector.

use location_selector_sdk::DirectoryError;
use thiserror::Error;

/// Domain-level errors for the location selector.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The backend delivered no location types at all.
    #[error("location type hierarchy is empty")]
    EmptyHierarchy,

    /// Two location types share a name.
    #[error("duplicate location type: {0}")]
    DuplicateLocationType(String),

    /// A location type names a parent type that was never declared.
    #[error("location type {type_name} references unknown parent type {parent}")]
    UnknownParentType { type_name: String, parent: String },

    /// A location type is its own transitive ancestor. Fatal for the view.
    #[error("cycle in location type hierarchy at {type_name}")]
    Cycle { type_name: String },

    /// A location carries a type that is not part of the hierarchy.
    #[error("unknown location type: {0}")]
    UnknownLocationType(String),

    /// A location arrived without the type needed to place it on the path.
    #[error("location {location_id} has no location type")]
    MissingLocationType { location_id: String },

    /// The requested depth is outside the selection path.
    #[error("depth {depth} is outside the hierarchy (max level {max_level})")]
    DepthOutOfRange { depth: usize, max_level: usize },

    /// A level was selected while the level above it holds no concrete location.
    #[error("level {depth} cannot be selected before a location is chosen above it")]
    ParentLevelNotSelected { depth: usize },

    /// The ancestors payload does not connect the location to the root.
    #[error("ancestor chain of {location_id} is incomplete")]
    BrokenAncestorChain { location_id: String },

    /// A directory request failed. The cache entry stays absent, so the
    /// request can be retried.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A fetch resolved after the selection moved on or the view was torn down.
    #[error("response superseded by a newer selection")]
    StaleResponse,
}

impl DomainError {
    /// Stale responses are dropped silently instead of being shown to the user.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleResponse)
    }

    /// Returns `true` when the UI should offer a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Directory(e) if e.is_retryable())
    }
}
