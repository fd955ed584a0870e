//! Generic containers with pluggable backing and handle policy.
//!
//! A [`Container`] pairs a [`Backing`] (array, deque, linked list, unique
//! set) with a [`HandlePolicy`] (position, cursor, stable id). Every
//! combination offers the same operations: insertion reporting whether the
//! value was new, iteration yielding `(value, handle)`, random access by
//! dense position, membership lookup and swap removal.
//!
//! A [`View`] is a container of handles into some base container; it never
//! owns or mutates the values it refers to.

pub mod backing;
pub mod handle;
pub mod list;
pub mod unique;
pub mod view;

use core::fmt::{self, Debug};
use core::marker::PhantomData;

pub use backing::{Backing, DequeBacking, KeyIndex, VecBacking};
pub use handle::{Cursor, Direct, HandlePolicy, StableHandle, StableId};
pub use list::{ListBacking, ListKey};
pub use unique::UniqueSetBacking;
pub use view::View;

use crate::mesh_error::MeshError;

/// Handle type produced by policy `P` over backing `B`.
pub type HandleOf<B, P> = <P as HandlePolicy<<B as KeyIndex>::Key>>::Handle;

/// Value removed by [`Container::swap_remove`].
#[derive(Clone, Debug, PartialEq)]
pub struct Removed<T, H> {
    pub value: T,
    /// Position the value occupied.
    pub position: usize,
    /// Position the last value was moved from, if one moved.
    pub moved_from: Option<usize>,
    /// Handle of the moved value after the move.
    pub moved_handle: Option<H>,
}

/// Ordered collection of `T` with configurable storage and handles.
pub struct Container<T, B = VecBacking<T>, P = Direct>
where
    B: Backing<T>,
    P: HandlePolicy<B::Key>,
{
    backing: B,
    policy: P,
    _marker: PhantomData<T>,
}

impl<T, B, P> Default for Container<T, B, P>
where
    B: Backing<T>,
    P: HandlePolicy<B::Key>,
{
    fn default() -> Self {
        Self {
            backing: B::default(),
            policy: P::default(),
            _marker: PhantomData,
        }
    }
}

impl<T, B, P> Clone for Container<T, B, P>
where
    B: Backing<T> + Clone,
    P: HandlePolicy<B::Key> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
            policy: self.policy.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, B, P> Debug for Container<T, B, P>
where
    B: Backing<T>,
    P: HandlePolicy<B::Key>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("backing", &self.backing)
            .field("stable", &P::STABLE)
            .finish()
    }
}

impl<T, B, P> Container<T, B, P>
where
    B: Backing<T>,
    P: HandlePolicy<B::Key>,
{
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.backing.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.backing.is_empty()
    }

    /// Underlying backing store.
    #[inline]
    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// Insert `value`; returns its handle and whether it was new.
    ///
    /// Set backings return the handle of an equal value already present.
    pub fn insert(&mut self, value: T) -> (HandleOf<B, P>, bool) {
        let (key, inserted) = self.backing.push(value);
        let position = if inserted {
            self.backing.len() - 1
        } else {
            self.backing.position_of(key).unwrap_or_default()
        };
        let handle = if inserted {
            self.policy.acquire(position, key)
        } else {
            self.policy.handle(position, key)
        };
        (handle, inserted)
    }

    /// Backing key behind `handle`.
    #[inline]
    pub fn key(&self, handle: HandleOf<B, P>) -> Result<B::Key, MeshError> {
        self.policy.resolve(&self.backing, handle)
    }

    pub fn get(&self, handle: HandleOf<B, P>) -> Result<&T, MeshError> {
        let key = self.key(handle)?;
        self.backing
            .get(key)
            .ok_or_else(|| MeshError::NotFound(format!("{handle:?}")))
    }

    /// Mutate the value behind `handle` in place.
    pub fn modify<R>(
        &mut self,
        handle: HandleOf<B, P>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, MeshError> {
        let key = self.key(handle)?;
        self.backing
            .modify(key, f)
            .ok_or_else(|| MeshError::NotFound(format!("{handle:?}")))
    }

    /// Value at dense `position`.
    pub fn at(&self, position: usize) -> Option<&T> {
        self.backing.key_at(position).and_then(|k| self.backing.get(k))
    }

    /// Mutate the value at dense `position`.
    pub fn modify_at<R>(&mut self, position: usize, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let key = self.backing.key_at(position)?;
        self.backing.modify(key, f)
    }

    /// Handle of the value at dense `position`.
    pub fn handle_at(&self, position: usize) -> Option<HandleOf<B, P>> {
        self.backing
            .key_at(position)
            .map(|k| self.policy.handle(position, k))
    }

    /// Dense position of the value behind `handle`.
    pub fn position(&self, handle: HandleOf<B, P>) -> Result<usize, MeshError> {
        let key = self.key(handle)?;
        self.backing
            .position_of(key)
            .ok_or_else(|| MeshError::NotFound(format!("{handle:?}")))
    }

    /// Iterate `(value, handle)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, HandleOf<B, P>)> + '_ {
        self.backing
            .iter()
            .enumerate()
            .map(|(pos, (key, value))| (value, self.policy.handle(pos, key)))
    }

    /// Iterate values in position order.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.backing.iter().map(|(_, v)| v)
    }

    /// Handle of a value equal to `value`, if any.
    pub fn find(&self, value: &T) -> Option<HandleOf<B, P>>
    where
        T: PartialEq,
    {
        let key = self.backing.find(value)?;
        let position = self.backing.position_of(key)?;
        Some(self.policy.handle(position, key))
    }

    #[inline]
    pub fn is_present(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.backing.find(value).is_some()
    }

    /// Remove the value behind `handle`; the last value takes its position.
    pub fn swap_remove(&mut self, handle: HandleOf<B, P>) -> Result<Removed<T, HandleOf<B, P>>, MeshError> {
        let key = self.key(handle)?;
        self.remove_key(key)
            .ok_or_else(|| MeshError::NotFound(format!("{handle:?}")))
    }

    /// Remove the value at dense `position`; the last value takes its place.
    pub fn swap_remove_at(&mut self, position: usize) -> Option<Removed<T, HandleOf<B, P>>> {
        let key = self.backing.key_at(position)?;
        self.remove_key(key)
    }

    fn remove_key(&mut self, key: B::Key) -> Option<Removed<T, HandleOf<B, P>>> {
        let position = self.backing.position_of(key)?;
        let last = self.backing.len().checked_sub(1)?;
        let (value, moved) = self.backing.swap_remove(key)?;
        self.policy.release(key);
        let moved_handle = moved.map(|from| {
            self.policy.relocate(from, key);
            self.policy.handle(position, key)
        });
        Some(Removed {
            value,
            position,
            moved_from: moved.map(|_| last),
            moved_handle,
        })
    }

    pub fn clear(&mut self) {
        self.backing.clear();
        self.policy.clear();
    }
}

impl<T, B, P> Extend<T> for Container<T, B, P>
where
    B: Backing<T>,
    P: HandlePolicy<B::Key>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill<B, P>(values: &[u32]) -> Container<u32, B, P>
    where
        B: Backing<u32>,
        P: HandlePolicy<B::Key>,
    {
        let mut c = Container::new();
        c.extend(values.iter().copied());
        c
    }

    #[test]
    fn iteration_yields_value_and_handle() {
        let c: Container<u32, ListBacking<u32>, Cursor> = fill(&[5, 6, 7]);
        for (value, handle) in c.iter() {
            assert_eq!(c.get(handle), Ok(value));
        }
        assert_eq!(c.at(1), Some(&6));
    }

    #[test]
    fn stable_ids_expire_only_for_removed_values() {
        let mut c: Container<u32, VecBacking<u32>, StableId<usize>> = Container::new();
        let (a, _) = c.insert(1);
        let (b, _) = c.insert(2);
        let (d, _) = c.insert(3);
        let removed = c.swap_remove(a).unwrap();
        assert_eq!(removed.value, 1);
        assert_eq!(removed.moved_from, Some(2));
        assert_eq!(removed.moved_handle, Some(d));
        assert!(matches!(c.get(a), Err(MeshError::NotFound(_))));
        assert_eq!(c.get(b), Ok(&2));
        assert_eq!(c.get(d), Ok(&3));
        assert_eq!(c.position(d), Ok(0));
    }

    #[test]
    fn unique_set_reports_existing_handle() {
        let mut c: Container<u32, UniqueSetBacking<u32>, StableId<usize>> = Container::new();
        let (first, inserted) = c.insert(4);
        assert!(inserted);
        let (again, inserted) = c.insert(4);
        assert!(!inserted);
        assert_eq!(first, again);
        assert_eq!(c.find(&4), Some(first));
        assert!(!c.is_present(&5));
    }

    #[test]
    fn direct_handle_after_removal_names_the_moved_value() {
        let mut c: Container<u32, DequeBacking<u32>, Direct> = fill(&[1, 2, 3]);
        c.swap_remove(0).unwrap();
        // position 0 now holds the former last value; no dangling access
        assert_eq!(c.get(0), Ok(&3));
        assert!(c.get(2).is_err());
    }
}
