//! Actor allow-list.

use std::collections::HashSet;

/// Checks whether an actor may emit records.
///
/// The allow-list is fixed at construction and never mutated, so a shared
/// gate can be read concurrently without synchronization.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    authorized: HashSet<String>,
}

impl AccessGate {
    /// Create a gate allowing exactly the given actors. Blank identifiers are
    /// ignored.
    pub fn new<I, S>(actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let authorized = actors
            .into_iter()
            .map(Into::into)
            .filter(|actor: &String| !actor.trim().is_empty())
            .collect();
        Self { authorized }
    }

    /// Whether `actor_id` is on the allow-list. Unknown or empty actors are not.
    pub fn is_authorized(&self, actor_id: &str) -> bool {
        self.authorized.contains(actor_id)
    }

    pub fn len(&self) -> usize {
        self.authorized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authorized.is_empty()
    }
}
