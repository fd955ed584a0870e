//! Compile-time storage configuration of a [`Mesh`](super::Mesh).
//!
//! A configuration picks the backing of every per-dimension element store
//! and the handle policy callers get from [`Mesh::handle`](super::Mesh::handle).
//! Relations and algorithms work on dense [`ElementId`]s regardless of the
//! configuration, so every combination behaves identically; only handle
//! lifetime and access cost differ.

use serde::{Deserialize, Serialize};

use crate::container::{
    Backing, Container, Cursor, DequeBacking, Direct, HandleOf, HandlePolicy, KeyIndex,
    ListBacking, StableId, UniqueSetBacking, VecBacking,
};
use crate::topology::element::Element;

/// Backing and handle policy of a mesh's element stores.
pub trait MeshConfig: 'static {
    type Backing: Backing<Element> + Clone + Send + Sync;
    type Handles: HandlePolicy<<Self::Backing as KeyIndex>::Key> + Clone + Send + Sync;
}

/// Element store type of configuration `C`.
pub type ElementStore<C> = Container<Element, <C as MeshConfig>::Backing, <C as MeshConfig>::Handles>;

/// Raw handle type of configuration `C`.
pub type RawHandle<C> = HandleOf<<C as MeshConfig>::Backing, <C as MeshConfig>::Handles>;

/// Policy handle to an element: its dimension plus the store's raw handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle<H> {
    pub(crate) dim: u8,
    pub(crate) raw: H,
}

impl<H: Copy> ElementHandle<H> {
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim as usize
    }

    #[inline]
    pub fn raw(&self) -> H {
        self.raw
    }
}

/// Handle type of a `Mesh<C>`.
pub type MeshHandle<C> = ElementHandle<RawHandle<C>>;

/// Declare a unit type implementing [`MeshConfig`].
///
/// ```
/// use mesh_topo::container::{ListBacking, ListKey, StableId};
/// use mesh_topo::topology::element::Element;
///
/// mesh_topo::mesh_config!(
///     /// Linked stores with stable handles.
///     pub ListStableConfig => ListBacking<Element>, StableId<ListKey>
/// );
/// let mesh = mesh_topo::mesh::Mesh::<ListStableConfig>::configured(2);
/// assert_eq!(mesh.geometric_dimension(), 2);
/// ```
#[macro_export]
macro_rules! mesh_config {
    ($(#[$meta:meta])* $vis:vis $name:ident => $backing:ty, $handles:ty) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default)]
        $vis struct $name;

        impl $crate::mesh::config::MeshConfig for $name {
            type Backing = $backing;
            type Handles = $handles;
        }
    };
}

mesh_config!(
    /// Contiguous arrays, position handles. The fastest configuration.
    pub DefaultConfig => VecBacking<Element>, Direct
);
mesh_config!(
    /// Contiguous arrays, handles that survive erasure of other elements.
    pub StableConfig => VecBacking<Element>, StableId<usize>
);
mesh_config!(
    /// Double-ended queues, cursor handles.
    pub DequeConfig => DequeBacking<Element>, Cursor
);
mesh_config!(
    /// Linked lists, cursor handles.
    pub ListConfig => ListBacking<Element>, Cursor
);
mesh_config!(
    /// Unique sets, stable handles.
    pub UniqueConfig => UniqueSetBacking<Element>, StableId<usize>
);
