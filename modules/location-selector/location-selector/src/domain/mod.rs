//! Domain layer for the location selector.

pub mod cache;
pub mod error;
pub mod hierarchy;
pub mod path;
pub mod period;
pub mod report;
pub mod tree;

pub use cache::{ChildList, LocationCache};
pub use error::DomainError;
pub use hierarchy::{LocationHierarchy, LocationType};
pub use path::{Selection, SelectionPath};
pub use period::{DashboardKind, PeriodFilter, PeriodResolution, ReportMonth};
pub use report::{
    IndicatorFormat, IndicatorSpec, ReportData, ReportDataClient, ReportQuery, ReportSpec,
    ReportView, TooltipRow, location_type_label,
};
pub use tree::{AggregationLevel, LocationTree, SelectOutcome, SelectionSnapshot};
