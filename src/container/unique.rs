//! Insertion-ordered set backing.
//!
//! Values are kept in a dense `Vec` (keys are positions) and indexed by a
//! [`hashbrown::HashTable`] of positions, so pushing a value that is already
//! present returns the existing key instead of storing a duplicate.

use core::fmt::{self, Debug};
use core::hash::{BuildHasher, Hash};

use hashbrown::HashTable;
use hashbrown::hash_map::DefaultHashBuilder;

use super::backing::{Backing, KeyIndex};

/// Set-semantics backing with dense positions.
#[derive(Clone)]
pub struct UniqueSetBacking<T> {
    values: Vec<T>,
    index: HashTable<usize>,
    hasher: DefaultHashBuilder,
}

impl<T> Default for UniqueSetBacking<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            index: HashTable::new(),
            hasher: DefaultHashBuilder::default(),
        }
    }
}

impl<T> Debug for UniqueSetBacking<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueSetBacking")
            .field("len", &self.values.len())
            .finish()
    }
}

impl<T: Hash + Eq> UniqueSetBacking<T> {
    /// Read-only values in position order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    fn lookup(&self, value: &T) -> Option<usize> {
        let hash = self.hasher.hash_one(value);
        self.index.find(hash, |&i| self.values[i] == *value).copied()
    }

    fn unindex(&mut self, position: usize) {
        let hash = self.hasher.hash_one(&self.values[position]);
        if let Ok(entry) = self.index.find_entry(hash, |&i| i == position) {
            entry.remove();
        }
    }

    fn reindex(&mut self, position: usize) {
        let hash = self.hasher.hash_one(&self.values[position]);
        let (values, hasher) = (&self.values, &self.hasher);
        self.index
            .insert_unique(hash, position, |&i| hasher.hash_one(&values[i]));
    }
}

impl<T> KeyIndex for UniqueSetBacking<T> {
    type Key = usize;

    #[inline]
    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn key_at(&self, position: usize) -> Option<usize> {
        (position < self.values.len()).then_some(position)
    }

    #[inline]
    fn position_of(&self, key: usize) -> Option<usize> {
        (key < self.values.len()).then_some(key)
    }

    #[inline]
    fn contains_key(&self, key: usize) -> bool {
        key < self.values.len()
    }
}

impl<T: Hash + Eq> Backing<T> for UniqueSetBacking<T> {
    type Iter<'a>
        = core::iter::Enumerate<core::slice::Iter<'a, T>>
    where
        T: 'a;

    fn push(&mut self, value: T) -> (usize, bool) {
        if let Some(existing) = self.lookup(&value) {
            return (existing, false);
        }
        self.values.push(value);
        let position = self.values.len() - 1;
        self.reindex(position);
        (position, true)
    }

    #[inline]
    fn get(&self, key: usize) -> Option<&T> {
        self.values.get(key)
    }

    /// The closure must not make the value equal to another member.
    fn modify<R>(&mut self, key: usize, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        if key >= self.values.len() {
            return None;
        }
        self.unindex(key);
        let out = f(&mut self.values[key]);
        debug_assert!(
            self.lookup(&self.values[key]).is_none(),
            "modify produced a duplicate set member"
        );
        self.reindex(key);
        Some(out)
    }

    fn swap_remove(&mut self, key: usize) -> Option<(T, Option<usize>)> {
        if key >= self.values.len() {
            return None;
        }
        let last = self.values.len() - 1;
        self.unindex(key);
        if key != last {
            self.unindex(last);
        }
        let removed = self.values.swap_remove(key);
        if key != last {
            self.reindex(key);
        }
        Some((removed, (key != last).then_some(last)))
    }

    fn find(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.lookup(value)
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.values.iter().enumerate()
    }

    fn clear(&mut self) {
        self.values.clear();
        self.index.clear();
    }
}
