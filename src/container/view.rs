//! Non-owning views: containers of handles into a base container.

use core::fmt::Debug;
use core::hash::Hash;

use super::backing::{Backing, VecBacking};
use super::handle::{Direct, HandlePolicy};
use super::unique::UniqueSetBacking;
use super::Container;
use crate::mesh_error::MeshError;

/// Ordered collection of handles `H` referring into some base container.
///
/// The backing decides membership semantics: with [`UniqueSetBacking`] a
/// handle is stored at most once and `contains` is a hash lookup.
#[derive(Debug)]
pub struct View<H, B = VecBacking<H>>
where
    B: Backing<H>,
{
    entries: Container<H, B, Direct>,
}

impl<H, B: Backing<H>> Default for View<H, B> {
    fn default() -> Self {
        Self {
            entries: Container::default(),
        }
    }
}

impl<H, B: Backing<H> + Clone> Clone for View<H, B> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<H, B> View<H, B>
where
    H: Copy + Eq + Hash + Debug,
    B: Backing<H>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// View over every entry of `base` accepted by `keep`.
    pub fn attach<T, BB, P>(base: &Container<T, BB, P>, mut keep: impl FnMut(&T) -> bool) -> Self
    where
        BB: Backing<T>,
        P: HandlePolicy<BB::Key, Handle = H>,
    {
        let mut view = Self::new();
        for (value, handle) in base.iter() {
            if keep(value) {
                view.insert_handle(handle);
            }
        }
        view
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `handle`; returns whether the view changed.
    pub fn insert_handle(&mut self, handle: H) -> bool {
        self.entries.insert(handle).1
    }

    #[inline]
    pub fn contains(&self, handle: &H) -> bool {
        self.entries.is_present(handle)
    }

    /// Drop `handle` (swap semantics); returns whether it was present.
    pub fn remove_handle(&mut self, handle: &H) -> bool {
        match self.entries.find(handle) {
            Some(position) => self.entries.swap_remove_at(position).is_some(),
            None => false,
        }
    }

    /// Handle at dense `position`.
    #[inline]
    pub fn get(&self, position: usize) -> Option<H> {
        self.entries.at(position).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = H> + '_ {
        self.entries.values().copied()
    }

    /// Map every entry through `f`, dropping those mapped to `None`.
    /// Relative order of surviving entries is kept.
    pub fn rewrite(&mut self, mut f: impl FnMut(H) -> Option<H>) {
        let mapped: Vec<H> = self.iter().filter_map(&mut f).collect();
        self.entries.clear();
        self.entries.extend(mapped);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Resolve every entry against `base`.
    pub fn resolve_in<'a, T, BB, P>(
        &'a self,
        base: &'a Container<T, BB, P>,
    ) -> impl Iterator<Item = Result<&'a T, MeshError>> + 'a
    where
        BB: Backing<T>,
        P: HandlePolicy<BB::Key, Handle = H>,
    {
        self.iter().map(move |h| base.get(h))
    }
}

impl<H: Copy + Eq + Hash + Debug> View<H, VecBacking<H>> {
    /// Entries as a slice, in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[H] {
        self.entries.backing().as_slice()
    }
}

impl<H: Copy + Eq + Hash + Debug> View<H, UniqueSetBacking<H>> {
    /// Entries as a slice, in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[H] {
        self.entries.backing().as_slice()
    }
}

impl<H, B> FromIterator<H> for View<H, B>
where
    H: Copy + Eq + Hash + Debug,
    B: Backing<H>,
{
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        let mut view = Self::new();
        for h in iter {
            view.insert_handle(h);
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ListBacking, StableId};

    #[test]
    fn attach_selects_without_touching_base() {
        let mut base: Container<u32, ListBacking<u32>, StableId<crate::container::ListKey>> =
            Container::new();
        base.extend([1, 2, 3, 4, 5, 6]);
        let evens: View<_> = View::attach(&base, |v| v % 2 == 0);
        assert_eq!(evens.len(), 3);
        let resolved: Vec<u32> = evens.resolve_in(&base).map(|r| *r.unwrap()).collect();
        assert_eq!(resolved, vec![2, 4, 6]);
        assert_eq!(base.len(), 6);
    }

    #[test]
    fn unique_view_ignores_repeats() {
        let mut view: View<usize, UniqueSetBacking<usize>> = View::new();
        assert!(view.insert_handle(3));
        assert!(!view.insert_handle(3));
        assert!(view.insert_handle(1));
        assert!(view.contains(&1));
        assert!(view.remove_handle(&3));
        assert_eq!(view.as_slice(), &[1]);
    }

    #[test]
    fn rewrite_keeps_order_and_drops() {
        let mut view: View<usize> = (0..6).collect();
        view.rewrite(|h| (h % 3 != 0).then_some(h * 10));
        assert_eq!(view.as_slice(), &[10, 20, 40, 50]);
    }
}
