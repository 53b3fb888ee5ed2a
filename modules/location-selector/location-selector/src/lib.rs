//! Location Selector
//!
//! Drill-down location selection shared by every ICDS dashboard view:
//!
//! - [`LocationTree`] - selected path, lazily loaded children, access gating
//! - [`LocationHierarchy`] - location types with their computed levels
//! - [`PeriodFilter`] - month/year filter clamped to the report availability window
//! - [`ReportView`] - one report configured by a [`ReportSpec`], re-fetched on
//!   selection changes
//! - [`HttpLocationDirectory`] - `LocationDirectoryClient` over the dashboard endpoints
//!
//! ## Usage
//!
//! ```ignore
//! let directory = Arc::new(HttpLocationDirectory::new(&cfg.directory)?);
//! let tree = Arc::new(LocationTree::new(directory, &location_types, cfg.selector)?);
//!
//! tree.load_root().await?;
//! let outcome = tree.select(state, 0).await?;
//! if let Some(level) = tree.disabled_level() {
//!     // block submission and explain which level is not accessible
//! }
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;


pub use config::{HttpDirectoryConfig, LocationSelectorConfig};
pub use domain::{
    AggregationLevel, DashboardKind, DomainError, LocationCache, LocationHierarchy, LocationTree,
    PeriodFilter, ReportDataClient, ReportMonth, ReportQuery, ReportSpec, ReportView,
    SelectOutcome, Selection, SelectionPath, SelectionSnapshot,
};
pub use infra::HttpLocationDirectory;
