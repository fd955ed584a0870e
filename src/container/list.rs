//! Index-linked list backing.
//!
//! Nodes live in a slab and are chained through `prev`/`next` links, so a
//! [`ListKey`] stays valid for as long as its node is alive no matter how
//! many other nodes come and go. Positional access walks the chain.

use core::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use super::backing::{Backing, KeyIndex};

/// Key of a node in a [`ListBacking`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ListKey(u32);

impl ListKey {
    #[inline]
    fn slot(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone)]
struct Node<T> {
    value: Option<T>,
    prev: Option<u32>,
    next: Option<u32>,
}

/// Doubly linked list stored in a slab with a free list.
#[derive(Clone)]
pub struct ListBacking<T> {
    nodes: Vec<Node<T>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> Default for ListBacking<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }
}

impl<T> Debug for ListBacking<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListBacking")
            .field("len", &self.len)
            .field("slots", &self.nodes.len())
            .finish()
    }
}

impl<T> ListBacking<T> {
    fn node(&self, key: ListKey) -> Option<&Node<T>> {
        self.nodes.get(key.slot()).filter(|n| n.value.is_some())
    }

    fn unlink(&mut self, slot: u32) -> Option<T> {
        let (prev, next, value) = {
            let node = self.nodes.get_mut(slot as usize)?;
            let value = node.value.take()?;
            (node.prev.take(), node.next.take(), value)
        };
        match prev {
            Some(p) => self.nodes[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n as usize].prev = prev,
            None => self.tail = prev,
        }
        self.free.push(slot);
        self.len -= 1;
        Some(value)
    }
}

/// Iterator over a [`ListBacking`] following the links.
pub struct ListIter<'a, T> {
    nodes: &'a [Node<T>],
    cursor: Option<u32>,
}

impl<'a, T> Iterator for ListIter<'a, T> {
    type Item = (ListKey, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = &self.nodes[slot as usize];
        self.cursor = node.next;
        node.value.as_ref().map(|v| (ListKey(slot), v))
    }
}

impl<T> KeyIndex for ListBacking<T> {
    type Key = ListKey;

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn key_at(&self, position: usize) -> Option<ListKey> {
        self.iter().nth(position).map(|(k, _)| k)
    }

    fn position_of(&self, key: ListKey) -> Option<usize> {
        self.node(key)?;
        self.iter().position(|(k, _)| k == key)
    }

    #[inline]
    fn contains_key(&self, key: ListKey) -> bool {
        self.node(key).is_some()
    }
}

impl<T> Backing<T> for ListBacking<T> {
    type Iter<'a>
        = ListIter<'a, T>
    where
        T: 'a;

    fn push(&mut self, value: T) -> (ListKey, bool) {
        let node = Node {
            value: Some(value),
            prev: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        };
        match self.tail {
            Some(t) => self.nodes[t as usize].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
        (ListKey(slot), true)
    }

    fn get(&self, key: ListKey) -> Option<&T> {
        self.node(key).and_then(|n| n.value.as_ref())
    }

    fn modify<R>(&mut self, key: ListKey, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.nodes
            .get_mut(key.slot())
            .and_then(|n| n.value.as_mut())
            .map(f)
    }

    fn swap_remove(&mut self, key: ListKey) -> Option<(T, Option<ListKey>)> {
        self.node(key)?;
        let tail = self.tail?;
        if tail == key.0 {
            return self.unlink(tail).map(|v| (v, None));
        }
        let moved = self.unlink(tail)?;
        let removed = self.nodes[key.slot()].value.replace(moved)?;
        Some((removed, Some(ListKey(tail))))
    }

    fn iter(&self) -> ListIter<'_, T> {
        ListIter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_survive_unrelated_removals() {
        let mut list = ListBacking::default();
        let (a, _) = list.push("a");
        let (b, _) = list.push("b");
        let (c, _) = list.push("c");
        let (d, _) = list.push("d");

        // removing b moves the tail value into b's node
        assert_eq!(list.swap_remove(b), Some(("b", Some(d))));
        assert_eq!(list.get(a), Some(&"a"));
        assert_eq!(list.get(c), Some(&"c"));
        assert_eq!(list.get(b), Some(&"d"));
        assert_eq!(list.get(d), None);

        let order: Vec<_> = list.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec!["a", "d", "c"]);
        assert_eq!(list.position_of(c), Some(2));
        assert_eq!(list.key_at(1), Some(b));
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut list = ListBacking::default();
        let (a, _) = list.push(1);
        list.push(2);
        list.swap_remove(a);
        list.swap_remove(a);
        assert!(list.is_empty());
        let (k, _) = list.push(3);
        assert!(k.slot() < 2);
        assert_eq!(list.iter().count(), 1);
    }
}
