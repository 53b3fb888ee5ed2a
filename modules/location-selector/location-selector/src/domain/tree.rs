//! The location tree: selected path, lazily loaded children and access gating.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use location_selector_sdk::{
    AncestorsResponse, LocationDirectoryClient, LocationId, LocationNode, LocationTypeDecl,
    ParentKey,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ChildList, DomainError, LocationCache, LocationHierarchy, Selection, SelectionPath};
use crate::config::LocationSelectorConfig;

/// Immutable view of the path, published on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionSnapshot {
    /// Location id per level; `"all"` for an "All" slot.
    pub location_ids: Vec<Option<LocationId>>,
    pub selected_location_id: Option<LocationId>,
    pub selected_location_index: Option<usize>,
    pub disabled_level: Option<usize>,
}

impl SelectionSnapshot {
    /// 1-based aggregation level reports are grouped by.
    #[must_use]
    pub fn aggregation_level(&self) -> usize {
        self.selected_location_index.map_or(1, |i| i + 1)
    }
}

/// Result of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOutcome {
    /// Deepest level holding a concrete location once auto-drilling stopped.
    pub depth: Option<usize>,
    /// A newer selection or a teardown overtook this one; nothing more was
    /// applied after that point.
    pub superseded: bool,
}

impl SelectOutcome {
    fn reached(depth: Option<usize>) -> Self {
        Self {
            depth,
            superseded: false,
        }
    }

    fn superseded() -> Self {
        Self {
            depth: None,
            superseded: true,
        }
    }
}

/// A group-by granularity offered to report downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationLevel {
    /// 1-based level number.
    pub id: usize,
    pub name: String,
}

struct TreeState {
    path: SelectionPath,
    epoch: u64,
}

enum Step {
    All,
    Drill(LocationNode),
    Stop,
}

/// Drill-down location selection for one dashboard view.
///
/// Path mutations happen in short critical sections and bump an epoch. An
/// async step that finds the epoch moved on while it was waiting stops
/// without touching the path.
pub struct LocationTree {
    directory: Arc<dyn LocationDirectoryClient>,
    hierarchy: LocationHierarchy,
    cache: LocationCache,
    state: Mutex<TreeState>,
    changes: watch::Sender<SelectionSnapshot>,
    liveness: CancellationToken,
    config: LocationSelectorConfig,
}

impl LocationTree {
    /// Builds the hierarchy and an empty path.
    ///
    /// # Errors
    ///
    /// Any hierarchy error from [`LocationHierarchy::build`].
    pub fn new(
        directory: Arc<dyn LocationDirectoryClient>,
        location_types: &[LocationTypeDecl],
        config: LocationSelectorConfig,
    ) -> Result<Self, DomainError> {
        let hierarchy = LocationHierarchy::build(location_types)?;
        let path = SelectionPath::new(hierarchy.level_count());
        let liveness = CancellationToken::new();
        let (changes, _) = watch::channel(SelectionSnapshot {
            location_ids: path.location_ids(),
            ..SelectionSnapshot::default()
        });

        Ok(Self {
            directory,
            hierarchy,
            cache: LocationCache::new(liveness.clone()),
            state: Mutex::new(TreeState { path, epoch: 0 }),
            changes,
            liveness,
            config,
        })
    }

    #[must_use]
    pub fn hierarchy(&self) -> &LocationHierarchy {
        &self.hierarchy
    }

    #[must_use]
    pub fn config(&self) -> &LocationSelectorConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    #[must_use]
    pub fn max_level(&self) -> usize {
        self.hierarchy.max_level()
    }

    /// Copy of the current path.
    #[must_use]
    pub fn path(&self) -> SelectionPath {
        self.state.lock().path.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SelectionSnapshot {
        self.changes.borrow().clone()
    }

    /// Receiver notified after every path mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SelectionSnapshot> {
        self.changes.subscribe()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.liveness.is_cancelled()
    }

    /// Resolves once the tree has been torn down.
    pub async fn closed(&self) {
        self.liveness.cancelled().await;
    }

    /// Marks the tree dead and drops the cache. Fetches resolving afterwards
    /// are discarded and selections report themselves superseded.
    pub fn teardown(&self) {
        info!("tearing down location tree");
        self.liveness.cancel();
        self.cache.clear();
    }

    /// Top-level locations, prefixed with the national option when the user
    /// has access to all locations.
    ///
    /// # Errors
    ///
    /// - `Directory` if the root list cannot be fetched
    /// - `StaleResponse` after teardown
    #[tracing::instrument(skip(self))]
    pub async fn load_root(&self) -> Result<ChildList, DomainError> {
        let prefix = self
            .config
            .have_access_to_all_locations
            .then(|| LocationNode::all(self.config.national_label.clone()));
        let directory = Arc::clone(&self.directory);

        self.cache
            .get_or_fetch(ParentKey::Root, prefix, move || {
                async move { directory.get_root_locations().await }.boxed()
            })
            .await
            .inspect_err(|e| log_fetch_error("root", e))
    }

    /// Children of `node`, prefixed with "All" when the user may act at
    /// `node` itself. Served from the cache after the first fetch.
    ///
    /// # Errors
    ///
    /// - `Directory` if the list cannot be fetched; the next call retries
    /// - `StaleResponse` after teardown
    pub async fn get_children(&self, node: &LocationNode) -> Result<ChildList, DomainError> {
        let prefix = node
            .user_have_access
            .then(|| LocationNode::all(self.config.all_label.clone()));
        let directory = Arc::clone(&self.directory);
        let parent_id = node.location_id.clone();

        self.cache
            .get_or_fetch(ParentKey::location(node.location_id.clone()), prefix, move || {
                async move { directory.get_children(&parent_id).await }.boxed()
            })
            .await
            .inspect_err(|e| log_fetch_error(&node.location_id, e))
    }

    /// Looks up one location and the level its type occupies. Bypasses the
    /// cache and leaves the path untouched.
    ///
    /// # Errors
    ///
    /// - `Directory` if the location does not exist or cannot be fetched
    /// - `MissingLocationType` / `UnknownLocationType` if its type is not
    ///   part of the hierarchy
    pub async fn get_location(
        &self,
        location_id: &str,
    ) -> Result<(LocationNode, usize), DomainError> {
        let location = self
            .directory
            .get_location(location_id)
            .await
            .inspect_err(|e| warn!(location_id, error = %e, "failed to load location"))?;
        let level = self.level_of(&location)?;
        Ok((location, level))
    }

    /// Selects `node` at `depth`, clears deeper levels and drills down.
    ///
    /// After the children of the selection are loaded, the next level becomes
    /// "All" when the user may act at `node`, or the only selectable child
    /// when there is exactly one (repeating from there). Otherwise it stays
    /// unset. Selecting the "All" option sets the sentinel without fetching.
    ///
    /// # Errors
    ///
    /// - `DepthOutOfRange` / `ParentLevelNotSelected` for an invalid slot
    /// - `Directory` if children cannot be loaded; the path keeps what was
    ///   applied before the failure
    #[tracing::instrument(skip(self, node), fields(location_id = %node.location_id))]
    pub async fn select(
        &self,
        node: LocationNode,
        depth: usize,
    ) -> Result<SelectOutcome, DomainError> {
        if node.is_all() {
            return superseded_or(self.mutate(None, |path| path.set(depth, Selection::All)).map(
                |((), _)| {
                    debug!(depth, "all selected");
                    depth.checked_sub(1)
                },
            ));
        }

        let result = match self.mutate(None, |path| {
            path.set(depth, Selection::Location(node.clone()))
        }) {
            Ok(((), epoch)) => self.advance(node, depth, epoch).await.map(Some),
            Err(e) => Err(e),
        };
        superseded_or(result)
    }

    /// Opens the tree at `location_id`: one ancestors call fills the cache
    /// for every level of the chain, then the chain is placed on the path.
    ///
    /// # Errors
    ///
    /// - `Directory` if the ancestors cannot be fetched
    /// - `MissingLocationType` / `UnknownLocationType` if the location cannot
    ///   be placed on a level
    /// - `BrokenAncestorChain` if the payload does not reach the top level
    #[tracing::instrument(skip(self))]
    pub async fn open_at(&self, location_id: &str) -> Result<SelectOutcome, DomainError> {
        if !self.is_alive() {
            return Ok(SelectOutcome::superseded());
        }
        let epoch = self.state.lock().epoch;

        let AncestorsResponse {
            mut locations,
            selected_location: selected,
        } = self
            .directory
            .get_ancestors(location_id)
            .await
            .inspect_err(|e| warn!(location_id, error = %e, "failed to load ancestors"))?;
        if !self.is_alive() {
            return Ok(SelectOutcome::superseded());
        }

        if !locations
            .iter()
            .any(|l| l.location_id == selected.location_id)
        {
            locations.push(selected.clone());
        }

        let level = self.level_of(&selected)?;
        let chain = build_chain(&locations, &selected, level)?;
        self.seed_groups(&locations, &selected);
        info!(
            location_id,
            level,
            groups = self.cache.len(),
            "opened location tree from deep link"
        );

        let result = match self.mutate(Some(epoch), |path| path.assign_chain(chain)) {
            Ok(((), epoch)) => self.advance(selected, level, epoch).await.map(Some),
            Err(e) => Err(e),
        };
        superseded_or(result)
    }

    /// Clears the whole path.
    pub fn reset(&self) {
        if let Err(e) = self.mutate(None, |path| {
            path.clear();
            Ok(())
        }) {
            debug!(error = %e, "reset ignored");
        }
    }

    /// Shallowest level whose location the user cannot act on, if any.
    #[must_use]
    pub fn disabled_level(&self) -> Option<usize> {
        if self.config.have_access_to_all_locations {
            return None;
        }
        self.state.lock().path.disabled_level()
    }

    #[must_use]
    pub fn selected_location_index(&self) -> Option<usize> {
        self.state.lock().path.selected_location_index()
    }

    #[must_use]
    pub fn selected_location(&self) -> Option<LocationNode> {
        self.state.lock().path.selected_location().cloned()
    }

    /// Options of the drop-down at `level`, from the cache only.
    #[must_use]
    pub fn locations_for_level(&self, level: usize) -> ChildList {
        let key = if level == 0 {
            Some(ParentKey::Root)
        } else {
            let state = self.state.lock();
            state
                .path
                .get(level - 1)
                .and_then(Selection::location)
                .map(|parent| ParentKey::location(parent.location_id.clone()))
        };
        key.and_then(|key| self.cache.get(&key))
            .unwrap_or_else(|| Vec::new().into())
    }

    #[must_use]
    pub fn is_level_visible(&self, level: usize) -> bool {
        self.state.lock().path.is_visible(level)
    }

    /// A user scoped to a location cannot change a level that offers at
    /// most one selectable location.
    #[must_use]
    pub fn is_level_locked(&self, level: usize) -> bool {
        if self.config.user_location_id.is_none() {
            return false;
        }
        self.locations_for_level(level)
            .iter()
            .filter(|l| !l.is_all() && l.is_selectable())
            .count()
            <= 1
    }

    /// Levels still available as report granularity: the selected level and
    /// everything below it.
    #[must_use]
    pub fn aggregation_levels(&self) -> Vec<AggregationLevel> {
        let first = self.selected_location_index().unwrap_or(0);
        (first..self.hierarchy.level_count())
            .filter_map(|level| {
                self.hierarchy.level_label(level).map(|name| AggregationLevel {
                    id: level + 1,
                    name,
                })
            })
            .collect()
    }

    #[must_use]
    pub fn selected_aggregation_level(&self) -> usize {
        self.selected_location_index().map_or(1, |i| i + 1)
    }

    async fn advance(
        &self,
        mut node: LocationNode,
        mut depth: usize,
        mut epoch: u64,
    ) -> Result<usize, DomainError> {
        while depth < self.hierarchy.max_level() {
            let children = self.get_children(&node).await?;
            match next_step(&node, &children) {
                Step::All => {
                    self.mutate(Some(epoch), |path| path.set(depth + 1, Selection::All))?;
                    break;
                }
                Step::Drill(child) => {
                    debug!(
                        parent = %node.location_id,
                        child = %child.location_id,
                        "auto-selecting only accessible child"
                    );
                    let ((), next_epoch) = self.mutate(Some(epoch), |path| {
                        path.set(depth + 1, Selection::Location(child.clone()))
                    })?;
                    epoch = next_epoch;
                    node = child;
                    depth += 1;
                }
                Step::Stop => break,
            }
        }
        Ok(depth)
    }

    /// Applies `f` to the path if the tree is alive and, when given, the
    /// epoch still matches. Publishes the new snapshot before unlocking.
    fn mutate<T>(
        &self,
        expected_epoch: Option<u64>,
        f: impl FnOnce(&mut SelectionPath) -> Result<T, DomainError>,
    ) -> Result<(T, u64), DomainError> {
        if !self.is_alive() {
            return Err(DomainError::StaleResponse);
        }
        let mut state = self.state.lock();
        if expected_epoch.is_some_and(|expected| expected != state.epoch) {
            debug!("selection moved on, dropping step");
            return Err(DomainError::StaleResponse);
        }

        let value = f(&mut state.path)?;
        state.epoch += 1;
        self.changes.send_replace(self.snapshot_of(&state.path));
        Ok((value, state.epoch))
    }

    fn snapshot_of(&self, path: &SelectionPath) -> SelectionSnapshot {
        SelectionSnapshot {
            location_ids: path.location_ids(),
            selected_location_id: path.selected_location().map(|l| l.location_id.clone()),
            selected_location_index: path.selected_location_index(),
            disabled_level: if self.config.have_access_to_all_locations {
                None
            } else {
                path.disabled_level()
            },
        }
    }

    fn level_of(&self, location: &LocationNode) -> Result<usize, DomainError> {
        let type_name =
            location
                .location_type
                .as_deref()
                .ok_or_else(|| DomainError::MissingLocationType {
                    location_id: location.location_id.clone(),
                })?;
        self.hierarchy
            .level_of(type_name)
            .ok_or_else(|| DomainError::UnknownLocationType(type_name.to_owned()))
    }

    /// Seeds one sorted list per parent. Entries already cached win.
    fn seed_groups(&self, locations: &[LocationNode], selected: &LocationNode) {
        let mut groups: HashMap<ParentKey, Vec<LocationNode>> = HashMap::new();
        for location in locations {
            groups
                .entry(location.parent_key())
                .or_default()
                .push(location.clone());
        }

        for (key, mut group) in groups {
            group.sort_by(|a, b| a.name.cmp(&b.name));
            if selected.user_have_access {
                let label = match key {
                    ParentKey::Root => &self.config.national_label,
                    ParentKey::Location(_) => &self.config.all_label,
                };
                group.insert(0, LocationNode::all(label.clone()));
            }
            if !self.cache.seed(key.clone(), group) {
                debug!(key = %key, "keeping cached children over deep-link payload");
            }
        }
    }
}

fn next_step(node: &LocationNode, children: &[LocationNode]) -> Step {
    if node.user_have_access {
        return Step::All;
    }
    let mut selectable = children
        .iter()
        .filter(|child| !child.is_all() && child.is_selectable());
    match (selectable.next(), selectable.next()) {
        (Some(only), None) => Step::Drill(only.clone()),
        _ => Step::Stop,
    }
}

/// Root-first chain of concrete locations ending at `selected`.
fn build_chain(
    locations: &[LocationNode],
    selected: &LocationNode,
    level: usize,
) -> Result<Vec<LocationNode>, DomainError> {
    let by_id: HashMap<&str, &LocationNode> = locations
        .iter()
        .map(|l| (l.location_id.as_str(), l))
        .collect();
    let broken = || DomainError::BrokenAncestorChain {
        location_id: selected.location_id.clone(),
    };

    let mut chain = vec![selected.clone()];
    let mut current = selected;
    while let Some(parent_id) = current.parent_id.as_deref() {
        if chain.len() > level {
            return Err(broken());
        }
        let parent = by_id.get(parent_id).copied().ok_or_else(broken)?;
        chain.push(parent.clone());
        current = parent;
    }
    if chain.len() != level + 1 {
        return Err(broken());
    }

    chain.reverse();
    Ok(chain)
}

fn superseded_or(result: Result<Option<usize>, DomainError>) -> Result<SelectOutcome, DomainError> {
    match result {
        Ok(depth) => Ok(SelectOutcome::reached(depth)),
        Err(e) if e.is_stale() => Ok(SelectOutcome::superseded()),
        Err(e) => Err(e),
    }
}

fn log_fetch_error(key: &str, error: &DomainError) {
    if !error.is_stale() {
        warn!(key, error = %error, "failed to load locations");
    }
}
