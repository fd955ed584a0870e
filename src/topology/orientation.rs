//! Orientation of a boundary element relative to its parent.
//!
//! A boundary element has its own intrinsic vertex order, fixed when it was
//! first created. The parent expects the same vertices in the order of its
//! reference slot. [`Permutation`] records the mapping between the two:
//!
//! `boundary.vertices[i] == parent_slot[perm[i]]`
//!
//! Boundary elements have at most four vertices (quadrilateral faces), so
//! the permutation is a small copyable array, like a fixed `S_K` group.

use core::fmt::{self, Debug, Formatter};

use serde::{Deserialize, Serialize};

/// Longest boundary vertex list an orientation has to describe.
pub const MAX_PERMUTATION_LEN: usize = 4;

/// Small permutation of `0..len`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Permutation {
    len: u8,
    map: [u8; MAX_PERMUTATION_LEN],
}

impl Debug for Permutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Permutation").field(&self.as_slice()).finish()
    }
}

impl Permutation {
    /// Identity on `len` entries (`len` is clamped to [`MAX_PERMUTATION_LEN`]).
    pub fn identity(len: usize) -> Self {
        let len = len.min(MAX_PERMUTATION_LEN);
        let mut map = [0u8; MAX_PERMUTATION_LEN];
        for (i, slot) in map.iter_mut().enumerate().take(len) {
            *slot = i as u8;
        }
        Self { len: len as u8, map }
    }

    /// Permutation taking `actual` into `expected`, i.e. the `perm` with
    /// `actual[i] == expected[perm[i]]`. `None` when the two lists are not
    /// rearrangements of each other.
    pub fn between<T: PartialEq>(actual: &[T], expected: &[T]) -> Option<Self> {
        if actual.len() != expected.len() || actual.len() > MAX_PERMUTATION_LEN {
            return None;
        }
        let mut map = [0u8; MAX_PERMUTATION_LEN];
        let mut used = [false; MAX_PERMUTATION_LEN];
        for (i, a) in actual.iter().enumerate() {
            let j = expected
                .iter()
                .enumerate()
                .position(|(j, e)| !used[j] && e == a)?;
            used[j] = true;
            map[i] = j as u8;
        }
        Some(Self {
            len: actual.len() as u8,
            map,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.map[..self.len()]
    }

    /// Image of `i`.
    #[inline]
    pub fn apply(&self, i: usize) -> usize {
        self.map[i] as usize
    }

    pub fn is_identity(&self) -> bool {
        self.as_slice().iter().enumerate().all(|(i, &p)| i == p as usize)
    }

    pub fn inverse(&self) -> Self {
        let mut map = [0u8; MAX_PERMUTATION_LEN];
        for (i, &p) in self.as_slice().iter().enumerate() {
            map[p as usize] = i as u8;
        }
        Self { len: self.len, map }
    }

    /// `self ∘ other`: apply `other`, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        debug_assert_eq!(self.len, other.len);
        let mut map = [0u8; MAX_PERMUTATION_LEN];
        for (i, &p) in other.as_slice().iter().enumerate() {
            map[i] = self.map[p as usize];
        }
        Self { len: self.len, map }
    }

    /// Parity of the permutation. For lines and triangles an odd
    /// permutation means the boundary element runs against the parent;
    /// for quadrilaterals use [`reverses_cycle`](Self::reverses_cycle).
    pub fn is_odd(&self) -> bool {
        let mut seen = [false; MAX_PERMUTATION_LEN];
        let mut transpositions = 0;
        for start in 0..self.len() {
            if seen[start] {
                continue;
            }
            let mut cycle = 0;
            let mut i = start;
            while !seen[i] {
                seen[i] = true;
                i = self.apply(i);
                cycle += 1;
            }
            transpositions += cycle - 1;
        }
        transpositions % 2 == 1
    }

    /// Whether a rotation or reflection of a cyclic vertex list walks the
    /// cycle backwards. A quadrilateral rotated by one slot is an odd
    /// permutation but keeps its orientation.
    pub fn reverses_cycle(&self) -> bool {
        let n = self.len();
        match n {
            0 | 1 => false,
            2 => self.apply(0) == 1,
            _ => (self.apply(1) + n - self.apply(0)) % n == n - 1,
        }
    }

    /// Rearrange `actual` into the parent's expected order.
    pub fn reorder<T: Copy>(&self, actual: &[T]) -> Vec<T> {
        let mut out: Vec<T> = actual.to_vec();
        for (i, &value) in actual.iter().enumerate().take(self.len()) {
            out[self.apply(i)] = value;
        }
        out
    }
}
