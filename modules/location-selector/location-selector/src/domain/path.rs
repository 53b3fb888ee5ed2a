//! The selected path from the top level down.

use location_selector_sdk::{LocationId, LocationNode};

use super::DomainError;

/// What a single level of the path holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// "All" at this level: aggregate every child of the level above.
    All,
    Location(LocationNode),
}

impl Selection {
    /// Maps a drop-down option to a selection.
    #[must_use]
    pub fn from_node(node: LocationNode) -> Self {
        if node.is_all() {
            Self::All
        } else {
            Self::Location(node)
        }
    }

    #[must_use]
    pub fn location(&self) -> Option<&LocationNode> {
        match self {
            Self::All => None,
            Self::Location(node) => Some(node),
        }
    }

    #[must_use]
    pub fn location_id(&self) -> &str {
        match self {
            Self::All => location_selector_sdk::ALL_LOCATION_ID,
            Self::Location(node) => &node.location_id,
        }
    }
}

/// One slot per hierarchy level.
///
/// A concrete location at depth `d > 0` always has a concrete location at
/// depth `d - 1`, and nothing is selected below an "All" slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPath {
    slots: Vec<Option<Selection>>,
}

impl SelectionPath {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    #[must_use]
    pub fn get(&self, depth: usize) -> Option<&Selection> {
        self.slots.get(depth).and_then(Option::as_ref)
    }

    /// Places a selection at `depth` and clears every deeper slot.
    ///
    /// # Errors
    ///
    /// - `DepthOutOfRange` if `depth` is past the last level
    /// - `ParentLevelNotSelected` if the slot above holds no concrete location
    pub fn set(&mut self, depth: usize, selection: Selection) -> Result<(), DomainError> {
        if depth >= self.slots.len() {
            return Err(DomainError::DepthOutOfRange {
                depth,
                max_level: self.slots.len().saturating_sub(1),
            });
        }
        if depth > 0 && !matches!(self.slots[depth - 1], Some(Selection::Location(_))) {
            return Err(DomainError::ParentLevelNotSelected { depth });
        }

        self.slots[depth] = Some(selection);
        self.clear_below(depth);
        Ok(())
    }

    /// Clears every slot deeper than `depth`.
    pub fn clear_below(&mut self, depth: usize) {
        for slot in self.slots.iter_mut().skip(depth + 1) {
            *slot = None;
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Replaces the path with a root-first chain of concrete locations.
    ///
    /// # Errors
    ///
    /// - `DepthOutOfRange` if the chain is longer than the path
    pub fn assign_chain(&mut self, chain: Vec<LocationNode>) -> Result<(), DomainError> {
        if chain.len() > self.slots.len() {
            return Err(DomainError::DepthOutOfRange {
                depth: chain.len() - 1,
                max_level: self.slots.len().saturating_sub(1),
            });
        }
        self.clear();
        for (slot, node) in self.slots.iter_mut().zip(chain) {
            *slot = Some(Selection::Location(node));
        }
        Ok(())
    }

    /// Location ids per level, `"all"` for an "All" slot.
    #[must_use]
    pub fn location_ids(&self) -> Vec<Option<LocationId>> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().map(|s| s.location_id().to_owned()))
            .collect()
    }

    /// Deepest level holding a concrete location.
    #[must_use]
    pub fn selected_location_index(&self) -> Option<usize> {
        self.slots
            .iter()
            .rposition(|slot| matches!(slot, Some(Selection::Location(_))))
    }

    /// The location the dashboard reports on.
    #[must_use]
    pub fn selected_location(&self) -> Option<&LocationNode> {
        let index = self.selected_location_index()?;
        self.get(index).and_then(Selection::location)
    }

    /// Shallowest level whose location the user can neither act on nor
    /// reach through a descendant.
    #[must_use]
    pub fn disabled_level(&self) -> Option<usize> {
        self.slots.iter().position(|slot| {
            matches!(slot, Some(Selection::Location(node)) if !node.is_selectable())
        })
    }

    /// Level 0 is always visible; deeper levels once the level above holds
    /// a concrete location.
    #[must_use]
    pub fn is_visible(&self, level: usize) -> bool {
        if level >= self.slots.len() {
            return false;
        }
        level == 0 || matches!(self.slots[level - 1], Some(Selection::Location(_)))
    }
}
