//! Static Location Directory Plugin
//!
//! Serves the location hierarchy and the current user's access flags from
//! configuration. Useful for development, demos and tests.
//!
//! ## Configuration
//!
//! ```yaml
//! location_types:
//!   - [state, [null]]
//!   - [district, [state]]
//!   - [block, [district]]
//! locations:
//!   - id: s1
//!     name: Andhra Pradesh
//!     type: state
//!   - id: d1
//!     name: Guntur
//!     type: district
//!     parent_id: s1
//! user_locations: [d1]
//! ```
//!
//! An empty `user_locations` list grants national access.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{LocationConfig, StaticLdPluginConfig};
pub use domain::Service;
