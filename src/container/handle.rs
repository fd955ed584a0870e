//! Handle policies: how a [`Container`](super::Container) names its values.
//!
//! | Policy | Handle | Survives removal of *other* values |
//! |---|---|---|
//! | [`Direct`] | dense position | no (may now name another value) |
//! | [`Cursor`] | backing key | depends on the backing (list keys do) |
//! | [`StableId`] | monotonic [`StableHandle`] | yes; removed ids resolve to `NotFound` |
//!
//! Resolving an expired `Direct` or `Cursor` handle never touches freed
//! memory: it either fails or yields whatever value currently occupies
//! that position or key.

use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::backing::KeyIndex;
use crate::mesh_error::MeshError;

/// Strategy for minting and resolving handles over backing keys `K`.
pub trait HandlePolicy<K: Copy + Eq + Hash + Debug>: Debug + Default {
    type Handle: Copy + Eq + Hash + Ord + Debug;

    /// Whether handles stay valid across removal of other values.
    const STABLE: bool;

    /// Mint the handle for a freshly inserted value.
    fn acquire(&mut self, position: usize, key: K) -> Self::Handle;

    /// Handle of a live value.
    fn handle(&self, position: usize, key: K) -> Self::Handle;

    /// Translate a handle back to a backing key.
    fn resolve<I: KeyIndex<Key = K> + ?Sized>(
        &self,
        index: &I,
        handle: Self::Handle,
    ) -> Result<K, MeshError>;

    /// The value under `key` is gone.
    fn release(&mut self, key: K);

    /// The value under `from` now lives under `to`.
    fn relocate(&mut self, from: K, to: K);

    fn clear(&mut self);
}

/// Position handles: the cheapest handle, valid until the next removal.
#[derive(Copy, Clone, Debug, Default)]
pub struct Direct;

impl<K: Copy + Eq + Hash + Debug> HandlePolicy<K> for Direct {
    type Handle = usize;
    const STABLE: bool = false;

    #[inline]
    fn acquire(&mut self, position: usize, _key: K) -> usize {
        position
    }

    #[inline]
    fn handle(&self, position: usize, _key: K) -> usize {
        position
    }

    fn resolve<I: KeyIndex<Key = K> + ?Sized>(&self, index: &I, handle: usize) -> Result<K, MeshError> {
        index
            .key_at(handle)
            .ok_or_else(|| MeshError::NotFound(format!("position {handle}")))
    }

    #[inline]
    fn release(&mut self, _key: K) {}

    #[inline]
    fn relocate(&mut self, _from: K, _to: K) {}

    #[inline]
    fn clear(&mut self) {}
}

/// Backing-key handles (the container's native iterator position).
#[derive(Copy, Clone, Debug, Default)]
pub struct Cursor;

impl<K: Copy + Eq + Hash + Ord + Debug> HandlePolicy<K> for Cursor {
    type Handle = K;
    const STABLE: bool = false;

    #[inline]
    fn acquire(&mut self, _position: usize, key: K) -> K {
        key
    }

    #[inline]
    fn handle(&self, _position: usize, key: K) -> K {
        key
    }

    fn resolve<I: KeyIndex<Key = K> + ?Sized>(&self, index: &I, handle: K) -> Result<K, MeshError> {
        if index.contains_key(handle) {
            Ok(handle)
        } else {
            Err(MeshError::NotFound(format!("cursor {handle:?}")))
        }
    }

    #[inline]
    fn release(&mut self, _key: K) {}

    #[inline]
    fn relocate(&mut self, _from: K, _to: K) {}

    #[inline]
    fn clear(&mut self) {}
}

/// Opaque id minted by [`StableId`]; never reused within one container.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StableHandle(u64);

impl StableHandle {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Monotonic ids mapped to backing keys in both directions.
#[derive(Clone, Debug)]
pub struct StableId<K: Eq + Hash> {
    next: u64,
    by_id: HashMap<u64, K>,
    by_key: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for StableId<K> {
    fn default() -> Self {
        Self {
            next: 0,
            by_id: HashMap::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> HandlePolicy<K> for StableId<K> {
    type Handle = StableHandle;
    const STABLE: bool = true;

    fn acquire(&mut self, _position: usize, key: K) -> StableHandle {
        if let Some(&id) = self.by_key.get(&key) {
            return StableHandle(id);
        }
        let id = self.next;
        self.next += 1;
        self.by_id.insert(id, key);
        self.by_key.insert(key, id);
        StableHandle(id)
    }

    fn handle(&self, _position: usize, key: K) -> StableHandle {
        // every live key was acquired; the fallback is never observed
        StableHandle(self.by_key.get(&key).copied().unwrap_or(u64::MAX))
    }

    fn resolve<I: KeyIndex<Key = K> + ?Sized>(
        &self,
        _index: &I,
        handle: StableHandle,
    ) -> Result<K, MeshError> {
        self.by_id
            .get(&handle.0)
            .copied()
            .ok_or_else(|| MeshError::NotFound(format!("stable id {}", handle.0)))
    }

    fn release(&mut self, key: K) {
        if let Some(id) = self.by_key.remove(&key) {
            self.by_id.remove(&id);
        }
    }

    fn relocate(&mut self, from: K, to: K) {
        if let Some(id) = self.by_key.remove(&from) {
            self.by_id.insert(id, to);
            self.by_key.insert(to, id);
        }
    }

    fn clear(&mut self) {
        self.by_id.clear();
        self.by_key.clear();
    }
}
