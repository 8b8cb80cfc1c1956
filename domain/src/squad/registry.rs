//! Squad registry and dependency readiness.
//!
//! The registry does not reject unknown or cyclic dependencies up front. The
//! hybrid executor discovers them as a stalled resolution loop and asks
//! [`SquadRegistry::diagnose_stall`] which of the two it is.

use super::entities::Squad;
use crate::core::error::DomainError;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Why the dependency-resolution loop cannot make progress.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("Squad '{squad}' depends on unknown squad(s): {}", missing.join(", "))]
    UnknownDependency { squad: String, missing: Vec<String> },

    #[error("Dependency cycle among squads: {}", squads.join(", "))]
    Cycle { squads: Vec<String> },
}

impl DependencyError {
    /// Squads named by the error, for error reporting.
    pub fn squads(&self) -> Vec<&str> {
        match self {
            DependencyError::UnknownDependency { squad, .. } => vec![squad.as_str()],
            DependencyError::Cycle { squads } => squads.iter().map(String::as_str).collect(),
        }
    }
}

/// Squads by name.
#[derive(Debug, Clone, Default)]
pub struct SquadRegistry {
    squads: BTreeMap<String, Squad>,
}

impl SquadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting invalid and duplicate squads.
    pub fn from_squads(squads: impl IntoIterator<Item = Squad>) -> Result<Self, DomainError> {
        let mut registry = Self::new();
        for squad in squads {
            registry.register(squad)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, squad: Squad) -> Result<(), DomainError> {
        squad.validate()?;
        if self.squads.contains_key(&squad.name) {
            return Err(DomainError::DuplicateSquad(squad.name));
        }
        self.squads.insert(squad.name.clone(), squad);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Squad> {
        self.squads.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.squads.contains_key(name)
    }

    pub fn squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    pub fn len(&self) -> usize {
        self.squads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }

    /// Unexecuted squads whose every dependency has executed.
    ///
    /// Ordered by descending priority, then name.
    pub fn ready_set(&self, executed: &HashSet<String>) -> Vec<&Squad> {
        let mut ready: Vec<&Squad> = self
            .squads
            .values()
            .filter(|s| !executed.contains(&s.name))
            .filter(|s| s.dependencies.iter().all(|d| executed.contains(d)))
            .collect();
        ready.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        ready
    }

    /// Classify a stalled resolution loop.
    ///
    /// An unknown dependency is reported in preference to a cycle, since a
    /// squad waiting on a name that does not exist can never become ready
    /// regardless of what else is pending.
    pub fn diagnose_stall(&self, executed: &HashSet<String>) -> DependencyError {
        let remaining: Vec<&Squad> = self
            .squads
            .values()
            .filter(|s| !executed.contains(&s.name))
            .collect();

        for squad in &remaining {
            let missing: Vec<String> = squad
                .dependencies
                .iter()
                .filter(|d| !self.squads.contains_key(*d))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return DependencyError::UnknownDependency {
                    squad: squad.name.clone(),
                    missing,
                };
            }
        }

        DependencyError::Cycle {
            squads: remaining.iter().map(|s| s.name.clone()).collect(),
        }
    }
}
