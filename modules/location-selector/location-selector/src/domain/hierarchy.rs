//! Location type hierarchy with computed levels.

use std::collections::HashMap;

use location_selector_sdk::LocationTypeDecl;

use super::DomainError;

/// A rung of the administrative hierarchy with its level assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationType {
    pub name: String,
    pub parents: Vec<String>,
    /// Length of the longest parent chain from a root type (0 = root).
    pub level: usize,
}

/// Location types grouped into ordered levels.
///
/// A type with several declared parents is placed one level below the
/// deepest of them, so it sorts below every ancestor.
#[derive(Debug, Clone)]
pub struct LocationHierarchy {
    levels: Vec<Vec<LocationType>>,
    level_by_name: HashMap<String, usize>,
}

impl LocationHierarchy {
    /// Assigns a level to every declared type and groups them by level.
    ///
    /// Types keep their declaration order within a level.
    ///
    /// # Errors
    ///
    /// - `EmptyHierarchy` if `decls` is empty
    /// - `DuplicateLocationType` if a name is declared twice
    /// - `UnknownParentType` if a parent name is not declared
    /// - `Cycle` if a type is its own transitive ancestor
    pub fn build(decls: &[LocationTypeDecl]) -> Result<Self, DomainError> {
        if decls.is_empty() {
            return Err(DomainError::EmptyHierarchy);
        }

        let mut index: HashMap<&str, usize> = HashMap::with_capacity(decls.len());
        for (i, decl) in decls.iter().enumerate() {
            if index.insert(decl.name.as_str(), i).is_some() {
                return Err(DomainError::DuplicateLocationType(decl.name.clone()));
            }
        }

        let mut resolver = LevelResolver {
            decls,
            index: &index,
            levels: vec![None; decls.len()],
            visiting: vec![false; decls.len()],
        };
        let mut assigned = Vec::with_capacity(decls.len());
        for i in 0..decls.len() {
            assigned.push(resolver.resolve(i)?);
        }

        let level_count = assigned.iter().max().map_or(1, |max| max + 1);
        let mut levels: Vec<Vec<LocationType>> = vec![Vec::new(); level_count];
        let mut level_by_name = HashMap::with_capacity(decls.len());
        for (decl, level) in decls.iter().zip(assigned) {
            level_by_name.insert(decl.name.clone(), level);
            levels[level].push(LocationType {
                name: decl.name.clone(),
                parents: decl.parents.clone(),
                level,
            });
        }

        Ok(Self {
            levels,
            level_by_name,
        })
    }

    /// Deepest level index (0 when the hierarchy has a single level).
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Number of levels, i.e. the length of a selection path.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn levels(&self) -> &[Vec<LocationType>] {
        &self.levels
    }

    /// Level of a location type, if declared.
    #[must_use]
    pub fn level_of(&self, type_name: &str) -> Option<usize> {
        self.level_by_name.get(type_name).copied()
    }

    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&LocationType> {
        let level = self.level_of(type_name)?;
        self.levels[level].iter().find(|t| t.name == type_name)
    }

    /// Placeholder text of a level's drop-down: the type names joined.
    #[must_use]
    pub fn level_label(&self, level: usize) -> Option<String> {
        let types = self.levels.get(level)?;
        Some(
            types
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Depth-first level assignment with a visiting mark per type.
///
/// The walk keeps its own stack of `(type, next parent)` frames, so chain
/// length is bounded by memory rather than by the thread stack.
struct LevelResolver<'a> {
    decls: &'a [LocationTypeDecl],
    index: &'a HashMap<&'a str, usize>,
    levels: Vec<Option<usize>>,
    visiting: Vec<bool>,
}

impl LevelResolver<'_> {
    fn resolve(&mut self, root: usize) -> Result<usize, DomainError> {
        if let Some(level) = self.levels[root] {
            return Ok(level);
        }

        let decls = self.decls;
        let mut resolved = 0;
        let mut stack = vec![(root, 0_usize)];
        self.visiting[root] = true;

        while let Some(frame) = stack.last_mut() {
            let (i, cursor) = *frame;
            let decl = &decls[i];

            if let Some(parent) = decl.parents.get(cursor) {
                frame.1 += 1;
                let Some(&parent_idx) = self.index.get(parent.as_str()) else {
                    return Err(DomainError::UnknownParentType {
                        type_name: decl.name.clone(),
                        parent: parent.clone(),
                    });
                };
                if self.levels[parent_idx].is_some() {
                    continue;
                }
                if self.visiting[parent_idx] {
                    return Err(DomainError::Cycle {
                        type_name: decls[parent_idx].name.clone(),
                    });
                }
                self.visiting[parent_idx] = true;
                stack.push((parent_idx, 0));
                continue;
            }

            // Every parent is resolved: one below the deepest of them.
            let level = decl
                .parents
                .iter()
                .filter_map(|parent| self.index.get(parent.as_str()))
                .filter_map(|&p| self.levels[p])
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            self.visiting[i] = false;
            self.levels[i] = Some(level);
            resolved = level;
            stack.pop();
        }

        Ok(resolved)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn decl(name: &str, parents: &[&str]) -> LocationTypeDecl {
        LocationTypeDecl::new(name, parents)
    }

    fn icds_types() -> Vec<LocationTypeDecl> {
        vec![
            decl("state", &[]),
            decl("district", &["state"]),
            decl("block", &["district"]),
            decl("supervisor", &["block"]),
            decl("awc", &["supervisor"]),
        ]
    }

    #[test]
    fn build_linear_hierarchy() {
        let hierarchy = LocationHierarchy::build(&icds_types()).unwrap();

        assert_eq!(hierarchy.level_count(), 5);
        assert_eq!(hierarchy.max_level(), 4);
        assert_eq!(hierarchy.level_of("state"), Some(0));
        assert_eq!(hierarchy.level_of("block"), Some(2));
        assert_eq!(hierarchy.level_of("awc"), Some(4));
        assert_eq!(hierarchy.level_of("village"), None);
        assert_eq!(hierarchy.level_label(3).as_deref(), Some("supervisor"));
    }

    #[test]
    fn build_is_independent_of_declaration_order() {
        let mut types = icds_types();
        types.reverse();
        let hierarchy = LocationHierarchy::build(&types).unwrap();

        assert_eq!(hierarchy.level_of("state"), Some(0));
        assert_eq!(hierarchy.level_of("awc"), Some(4));
    }

    #[test]
    fn every_type_is_deeper_than_its_parents() {
        let types = vec![
            decl("state", &[]),
            decl("zone", &[]),
            decl("district", &["state", "zone"]),
            decl("block", &["district"]),
            decl("project", &["district"]),
            decl("sector", &["block", "state"]),
            decl("awc", &["sector", "project", "district"]),
        ];
        let hierarchy = LocationHierarchy::build(&types).unwrap();

        for t in hierarchy.levels().iter().flatten() {
            for parent in &t.parents {
                let parent_level = hierarchy.level_of(parent).unwrap();
                assert!(
                    t.level > parent_level,
                    "{} (level {}) must be below {} (level {})",
                    t.name,
                    t.level,
                    parent,
                    parent_level
                );
            }
        }
        // Levels are contiguous from 0 to max.
        assert!(hierarchy.levels().iter().all(|types| !types.is_empty()));
    }

    #[test]
    fn multi_parent_type_takes_deepest_parent() {
        let types = vec![
            decl("state", &[]),
            decl("district", &["state"]),
            decl("block", &["district"]),
            decl("awc", &["state", "block"]),
        ];
        let hierarchy = LocationHierarchy::build(&types).unwrap();

        assert_eq!(hierarchy.level_of("awc"), Some(3));
        assert_eq!(hierarchy.get("awc").unwrap().parents.len(), 2);
    }

    #[test]
    fn types_sharing_a_level_are_grouped() {
        let types = vec![
            decl("state", &[]),
            decl("district", &["state"]),
            decl("city", &["state"]),
        ];
        let hierarchy = LocationHierarchy::build(&types).unwrap();

        assert_eq!(hierarchy.level_count(), 2);
        assert_eq!(hierarchy.level_label(1).as_deref(), Some("district, city"));
    }

    #[test]
    fn long_chain_declared_leaf_first() {
        const DEPTH: usize = 100_000;
        // Leaf first, so the first resolution walks the whole chain.
        let types: Vec<LocationTypeDecl> = (0..DEPTH)
            .rev()
            .map(|i| match i {
                0 => decl("t0", &[]),
                _ => decl(&format!("t{i}"), &[&format!("t{}", i - 1)]),
            })
            .collect();

        let hierarchy = LocationHierarchy::build(&types).unwrap();

        assert_eq!(hierarchy.level_count(), DEPTH);
        assert_eq!(hierarchy.level_of("t0"), Some(0));
        assert_eq!(hierarchy.level_of("t99999"), Some(DEPTH - 1));
    }

    #[test]
    fn cycle_is_rejected() {
        let types = vec![
            decl("state", &[]),
            decl("district", &["state", "block"]),
            decl("block", &["district"]),
        ];
        let err = LocationHierarchy::build(&types).unwrap_err();
        assert!(matches!(err, DomainError::Cycle { .. }), "got {err:?}");
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let err = LocationHierarchy::build(&[decl("state", &["state"])]).unwrap_err();
        assert!(matches!(err, DomainError::Cycle { type_name } if type_name == "state"));
    }

    #[test]
    fn cycle_without_root_is_rejected() {
        let types = vec![decl("a", &["c"]), decl("b", &["a"]), decl("c", &["b"])];
        let err = LocationHierarchy::build(&types).unwrap_err();
        assert!(matches!(err, DomainError::Cycle { .. }));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let err = LocationHierarchy::build(&[decl("district", &["state"])]).unwrap_err();
        assert!(matches!(
            err,
            DomainError::UnknownParentType { type_name, parent }
                if type_name == "district" && parent == "state"
        ));
    }

    #[test]
    fn duplicate_and_empty_are_rejected() {
        let err = LocationHierarchy::build(&[decl("state", &[]), decl("state", &[])]).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateLocationType(name) if name == "state"));

        let err = LocationHierarchy::build(&[]).unwrap_err();
        assert!(matches!(err, DomainError::EmptyHierarchy));
    }
}
