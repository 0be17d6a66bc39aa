//! Identity-keyed entity sets with directional difference and intersection.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};

/// An insertion-ordered collection of entities, compared by identity only.
///
/// These collections are small in practice (the members, roles, or
/// repositories of a single project; tens of elements, not thousands), so
/// containment checks are linear scans. Outputs of [`difference`] and
/// [`intersection`] preserve the receiver's insertion order, which makes
/// sequential bucket processing deterministic.
///
/// Construction rejects duplicate identities: a declared collection naming
/// the same entity twice is a caller error, surfaced as
/// [`CoreError::DuplicateIdentity`] before any remote call happens.
///
/// [`difference`]: EntitySet::difference
/// [`intersection`]: EntitySet::intersection
#[derive(Debug, Clone)]
pub struct EntitySet<T> {
    entries: Vec<T>,
}

impl<T: Entity> EntitySet<T> {
    /// An empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a set from a vector, rejecting duplicate identities.
    pub fn try_from_vec(entries: Vec<T>) -> CoreResult<Self> {
        for (i, entity) in entries.iter().enumerate() {
            if entries[..i].iter().any(|seen| seen.same_identity(entity)) {
                return Err(CoreError::DuplicateIdentity {
                    id: entity.id().to_string(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Build a set from an iterator, rejecting duplicate identities.
    pub fn try_from_iter(entries: impl IntoIterator<Item = T>) -> CoreResult<Self> {
        Self::try_from_vec(entries.into_iter().collect())
    }

    /// Whether some element of the set shares identity with `entity`.
    pub fn contains(&self, entity: &T) -> bool {
        self.entries.iter().any(|e| e.same_identity(entity))
    }

    /// Elements of `self` whose identity is also present in `other`.
    ///
    /// The returned copies are the receiver's, not `other`'s: the payload
    /// carried forward is always the one from the set the method was called
    /// on.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self
    where
        T: Clone,
    {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|e| other.contains(e))
                .cloned()
                .collect(),
        }
    }

    /// Elements of `self` whose identity is absent from `other`.
    ///
    /// Directional: `a.difference(&b)` keeps elements of `a` only.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self
    where
        T: Clone,
    {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|e| !other.contains(e))
                .cloned()
                .collect(),
        }
    }

    /// Number of entities in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entities in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// The identity keys in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(Entity::id)
    }

    /// Consume the set, returning the backing vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.entries
    }
}

impl<T: Entity> Default for EntitySet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, T: Entity> IntoIterator for &'a EntitySet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T: Entity> IntoIterator for EntitySet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
