//! Parametrized report views driven by the location selection.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use location_selector_sdk::{DirectoryError, LocationId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use super::{DomainError, LocationTree, ReportMonth, SelectionSnapshot};

const NOT_AVAILABLE: &str = "N/A";

/// How an indicator value is rendered in a tooltip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorFormat {
    /// Integer with Indian digit grouping (`12,34,567`).
    #[default]
    Count,
    /// The field divided by field `of`, two decimals. A zero or missing
    /// denominator counts as 1.
    Percent { of: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub label: String,
    pub field: String,
    #[serde(default)]
    pub format: IndicatorFormat,
}

/// Everything that distinguishes one dashboard report from another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSpec {
    pub name: String,
    /// Path of the data endpoint relative to the dashboard base URL.
    pub endpoint: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub indicators: Vec<IndicatorSpec>,
}

/// One line of a map tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipRow {
    pub indicator_name: String,
    pub indicator_value: String,
}

impl ReportSpec {
    /// Tooltip lines for a location's data row; every value is `N/A` when
    /// the location has no row.
    #[must_use]
    pub fn tooltip_rows(&self, row: Option<&Value>) -> Vec<TooltipRow> {
        self.indicators
            .iter()
            .map(|indicator| TooltipRow {
                indicator_name: indicator.label.clone(),
                indicator_value: row.map_or_else(
                    || NOT_AVAILABLE.to_owned(),
                    |row| render_indicator(indicator, row),
                ),
            })
            .collect()
    }
}

fn render_indicator(indicator: &IndicatorSpec, row: &Value) -> String {
    let value = row.get(&indicator.field);
    match &indicator.format {
        IndicatorFormat::Count => match value.and_then(as_integer) {
            Some(n) => format_indian(n),
            None => value.map_or_else(|| NOT_AVAILABLE.to_owned(), Value::to_string),
        },
        IndicatorFormat::Percent { of } => {
            let Some(numerator) = value.and_then(Value::as_f64) else {
                return NOT_AVAILABLE.to_owned();
            };
            let denominator = row.get(of).and_then(Value::as_f64);
            format_percent(numerator, denominator)
        }
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_u64().and_then(|n| i64::try_from(n).ok()))
}

/// Groups digits the Indian way: the last three, then pairs.
///
/// ```
/// use location_selector::domain::report::format_indian;
///
/// assert_eq!(format_indian(1_234_567), "12,34,567");
/// assert_eq!(format_indian(-999), "-999");
/// ```
#[must_use]
pub fn format_indian(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let (head, tail) = digits.split_at(digits.len().saturating_sub(3));

    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    if rest.len() % 2 == 1 {
        let (first, remaining) = rest.split_at(1);
        groups.push(first);
        rest = remaining;
    }
    while !rest.is_empty() {
        let (pair, remaining) = rest.split_at(2);
        groups.push(pair);
        rest = remaining;
    }
    groups.push(tail);

    let grouped = groups.join(",");
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// `numerator / denominator` as a percentage with two decimals.
#[must_use]
pub fn format_percent(numerator: f64, denominator: Option<f64>) -> String {
    let denominator = denominator
        .filter(|d| d.abs() > f64::EPSILON)
        .unwrap_or(1.0);
    format!("{:.2}%", numerator / denominator * 100.0)
}

/// Caption word for the level a report is shown at.
#[must_use]
pub fn location_type_label(location_type: Option<&str>) -> String {
    match location_type {
        None | Some("") => "National".to_owned(),
        Some("supervisor") => "Sector".to_owned(),
        Some(other) => {
            let mut chars = other.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        }
    }
}

/// Query parameters sent to a report endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    /// Omitted for the national view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<LocationId>,
    pub aggregation_level: usize,
    pub month: u32,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(flatten)]
    pub filters: BTreeMap<String, String>,
}

impl ReportQuery {
    #[must_use]
    pub fn new(snapshot: &SelectionSnapshot, period: ReportMonth) -> Self {
        Self {
            location_id: snapshot.selected_location_id.clone(),
            aggregation_level: snapshot.aggregation_level(),
            month: period.month,
            year: period.year,
            step: None,
            filters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Flattened `key=value` pairs in a stable order.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(5 + self.filters.len());
        if let Some(location_id) = &self.location_id {
            pairs.push(("location_id".to_owned(), location_id.clone()));
        }
        pairs.push((
            "aggregation_level".to_owned(),
            self.aggregation_level.to_string(),
        ));
        pairs.push(("month".to_owned(), self.month.to_string()));
        pairs.push(("year".to_owned(), self.year.to_string()));
        if let Some(step) = &self.step {
            pairs.push(("step".to_owned(), step.clone()));
        }
        pairs.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

/// Source of report payloads.
#[async_trait]
pub trait ReportDataClient: Send + Sync {
    /// Fetch the JSON payload of `endpoint` for `query`.
    ///
    /// # Errors
    ///
    /// - `Network` if the request does not complete
    /// - `InvalidResponse` if the body is not JSON
    async fn fetch_report(&self, endpoint: &str, query: &ReportQuery)
    -> Result<Value, DirectoryError>;
}

/// A fetched report together with the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    pub query: ReportQuery,
    pub payload: Value,
}

impl ReportData {
    /// The `report_data` member dashboards put their rows under.
    #[must_use]
    pub fn report_data(&self) -> Option<&Value> {
        self.payload.get("report_data")
    }
}

/// A single report component: one [`ReportSpec`] bound to a location tree.
pub struct ReportView {
    spec: ReportSpec,
    client: Arc<dyn ReportDataClient>,
    tree: Arc<LocationTree>,
    changes: watch::Receiver<SelectionSnapshot>,
    step: Option<String>,
}

impl ReportView {
    #[must_use]
    pub fn new(spec: ReportSpec, client: Arc<dyn ReportDataClient>, tree: Arc<LocationTree>) -> Self {
        let changes = tree.subscribe();
        Self {
            spec,
            client,
            tree,
            changes,
            step: None,
        }
    }

    /// Report step (`map`, `chart`) passed to the endpoint.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    #[must_use]
    pub fn spec(&self) -> &ReportSpec {
        &self.spec
    }

    /// Report name followed by the caption word of the selected level.
    #[must_use]
    pub fn title(&self) -> String {
        let selected = self.tree.selected_location();
        let level = location_type_label(selected.as_ref().and_then(|l| l.location_type.as_deref()));
        format!("{}: {level}", self.spec.name)
    }

    #[must_use]
    pub fn tooltip(&self, row: Option<&Value>) -> Vec<TooltipRow> {
        self.spec.tooltip_rows(row)
    }

    /// Fetches the report for the current selection.
    ///
    /// # Errors
    ///
    /// - `Directory` if the report endpoint fails
    pub async fn refresh(&mut self, period: ReportMonth) -> Result<ReportData, DomainError> {
        let snapshot = self.changes.borrow_and_update().clone();
        let mut query = ReportQuery::new(&snapshot, period);
        if let Some(step) = &self.step {
            query = query.with_step(step.clone());
        }

        debug!(report = %self.spec.name, location_id = ?query.location_id, "fetching report");
        let payload = self.client.fetch_report(&self.spec.endpoint, &query).await?;
        Ok(ReportData { query, payload })
    }

    /// Waits for the next selection change and refetches. Returns `None`
    /// once the tree is torn down.
    pub async fn next_change(
        &mut self,
        period: ReportMonth,
    ) -> Option<Result<ReportData, DomainError>> {
        tokio::select! {
            changed = self.changes.changed() => changed.ok()?,
            () = self.tree.closed() => return None,
        }
        if !self.tree.is_alive() {
            return None;
        }
        Some(self.refresh(period).await)
    }
}
