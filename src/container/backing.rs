//! Pluggable backing stores for [`Container`](super::Container).
//!
//! A backing owns the values and hands out *keys*: the cheapest way that
//! particular store can find a value again. Positions (0..len) are the
//! dense order every backing also exposes.
//!
//! All backings remove with swap semantics: the last value moves into the
//! slot of the removed one, so positions stay dense. [`Backing::swap_remove`]
//! reports the key the moved value had before the move so handle policies
//! can follow it.

use core::fmt::{self, Debug};
use core::hash::Hash;
use std::collections::VecDeque;

/// Key and position bookkeeping shared by every backing.
pub trait KeyIndex {
    /// Native key of a stored value.
    type Key: Copy + Eq + Hash + Ord + Debug;

    /// Number of stored values.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key of the value at dense `position`.
    fn key_at(&self, position: usize) -> Option<Self::Key>;

    /// Dense position of the value under `key`.
    fn position_of(&self, key: Self::Key) -> Option<usize>;

    fn contains_key(&self, key: Self::Key) -> bool;
}

/// Ordered storage of `T` addressed by a backing-specific key.
pub trait Backing<T>: KeyIndex + Debug + Default {
    /// Iterator over `(key, value)` in position order.
    type Iter<'a>: Iterator<Item = (Self::Key, &'a T)>
    where
        Self: 'a,
        T: 'a;

    /// Append `value`. Returns its key and whether it was actually inserted;
    /// set-like backings return the key of an equal value with `false`.
    fn push(&mut self, value: T) -> (Self::Key, bool);

    fn get(&self, key: Self::Key) -> Option<&T>;

    /// Mutate the value under `key` in place.
    fn modify<R>(&mut self, key: Self::Key, f: impl FnOnce(&mut T) -> R) -> Option<R>;

    /// Remove the value under `key`, moving the last value into its place.
    ///
    /// Returns the removed value and, when a different value was moved, the
    /// key that value had before. After the call that value lives under `key`.
    fn swap_remove(&mut self, key: Self::Key) -> Option<(T, Option<Self::Key>)>;

    /// Key of the first value equal to `value` (linear unless overridden).
    fn find(&self, value: &T) -> Option<Self::Key>
    where
        T: PartialEq,
    {
        self.iter().find(|(_, v)| *v == value).map(|(k, _)| k)
    }

    fn iter(&self) -> Self::Iter<'_>;

    fn clear(&mut self);
}

/// Contiguous array backing; keys are positions.
#[derive(Clone)]
pub struct VecBacking<T>(pub(crate) Vec<T>);

impl<T> Default for VecBacking<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Debug for VecBacking<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecBacking").field("len", &self.0.len()).finish()
    }
}

impl<T> VecBacking<T> {
    /// Entire read-only buffer in position order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
}

/// Keys of positional backings are the positions themselves.
macro_rules! positional_key_index {
    ($backing:ident) => {
        impl<T> KeyIndex for $backing<T> {
            type Key = usize;

            #[inline]
            fn len(&self) -> usize {
                self.0.len()
            }

            #[inline]
            fn key_at(&self, position: usize) -> Option<usize> {
                (position < self.0.len()).then_some(position)
            }

            #[inline]
            fn position_of(&self, key: usize) -> Option<usize> {
                (key < self.0.len()).then_some(key)
            }

            #[inline]
            fn contains_key(&self, key: usize) -> bool {
                key < self.0.len()
            }
        }
    };
}

positional_key_index!(VecBacking);
positional_key_index!(DequeBacking);

impl<T> Backing<T> for VecBacking<T> {
    type Iter<'a>
        = core::iter::Enumerate<core::slice::Iter<'a, T>>
    where
        T: 'a;

    fn push(&mut self, value: T) -> (usize, bool) {
        self.0.push(value);
        (self.0.len() - 1, true)
    }

    #[inline]
    fn get(&self, key: usize) -> Option<&T> {
        self.0.get(key)
    }

    fn modify<R>(&mut self, key: usize, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.0.get_mut(key).map(f)
    }

    fn swap_remove(&mut self, key: usize) -> Option<(T, Option<usize>)> {
        if key >= self.0.len() {
            return None;
        }
        let last = self.0.len() - 1;
        let removed = self.0.swap_remove(key);
        Some((removed, (key != last).then_some(last)))
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.0.iter().enumerate()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

/// Double-ended queue backing; keys are positions.
#[derive(Clone)]
pub struct DequeBacking<T>(VecDeque<T>);

impl<T> Default for DequeBacking<T> {
    fn default() -> Self {
        Self(VecDeque::new())
    }
}

impl<T> Debug for DequeBacking<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DequeBacking")
            .field("len", &self.0.len())
            .finish()
    }
}

impl<T> Backing<T> for DequeBacking<T> {
    type Iter<'a>
        = core::iter::Enumerate<std::collections::vec_deque::Iter<'a, T>>
    where
        T: 'a;

    fn push(&mut self, value: T) -> (usize, bool) {
        self.0.push_back(value);
        (self.0.len() - 1, true)
    }

    #[inline]
    fn get(&self, key: usize) -> Option<&T> {
        self.0.get(key)
    }

    fn modify<R>(&mut self, key: usize, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.0.get_mut(key).map(f)
    }

    fn swap_remove(&mut self, key: usize) -> Option<(T, Option<usize>)> {
        let last = self.0.len().checked_sub(1)?;
        let removed = self.0.swap_remove_back(key)?;
        Some((removed, (key != last).then_some(last)))
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.0.iter().enumerate()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}
