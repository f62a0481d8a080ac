#![forbid(unsafe_code)]

//! Binary split-tree layout engine for dockable workbench panels.
//!
//! The tree divides a rectangular region into nested, resizable panels
//! separated by draggable sashes. [`LayoutTree`] holds the recursive
//! structure, the cached size queries, and the constrained distribution
//! of space between siblings; [`SashContainer`] owns a tree and
//! translates high-level docking requests (drop side + target part +
//! ratio) into tree surgery and weight computations.
//!
//! Rendering, drag gesture recognition, and persistence formats live in
//! the embedding system. They reach this crate only through the
//! [`LayoutItem`] content contract, the [`SashFactory`] widget hooks, and
//! the relation records produced by [`SashContainer::compute_relation`].

pub mod container;
pub mod item;
pub mod sash;
pub mod size;
pub mod tree;

#[cfg(test)]
pub(crate) mod testutil;

pub use sashdock_core::{Point, Rect};

pub use container::{SashContainer, docking_ratio};
pub use item::{LayoutItem, PartId, PartKind};
pub use sash::{
    Orientation, Sash, SashDragEvent, SashFactory, SashId, UniformSashFactory,
};
pub use size::{Axis, INF, SizeFlags, add, assert_valid_size, subtract};
pub use tree::{
    ChildSizes, LayoutTree, NeighborSashes, NodeKey, RelationRecord, Relationship, RemovedLeaf,
    TreeInvariantIssue,
};
