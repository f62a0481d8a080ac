//! The binary split tree.
//!
//! A [`LayoutTree`] divides a rectangular region into nested, resizable
//! panels separated by sashes. Nodes live in a slotmap arena: a node is
//! either a leaf wrapping one content item or a split owning a [`Sash`]
//! and exactly two children. The non-owning `parent` back-reference is an
//! arena key, used only for upward cache invalidation and
//! common-ancestor search — never for ownership.
//!
//! # Size queries
//!
//! Minimum/maximum extents are cached per axis together with the
//! perpendicular extent they were computed for (the "hint"); a cached
//! value is only reused when the hint matches the query. Any
//! bounds-affecting mutation must call [`LayoutTree::flush_cache`], which
//! walks parent references to the root, before the next size query or
//! bounds pass on the same tree.
//!
//! # Coordinate normalization
//!
//! Horizontal sashes are handled by flipping bounds through
//! [`Rect::flip_xy`] so the distribution algorithm always reasons in
//! vertical-sash terms.

use std::collections::HashSet;
use std::fmt;

use sashdock_core::{Point, Rect};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::item::{LayoutItem, PartId};
use crate::sash::{Orientation, Sash, SashId};
use crate::size::{Axis, INF, SizeFlags, add, assert_valid_size, subtract};

new_key_type! {
    /// Key to reference a node in the split tree arena.
    pub struct NodeKey;
}

/// Docking side relative to another part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Left,
    Right,
    Top,
    Bottom,
}

impl Relationship {
    /// Orientation of the sash a split on this side introduces.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Relationship::Left | Relationship::Right => Orientation::Vertical,
            Relationship::Top | Relationship::Bottom => Orientation::Horizontal,
        }
    }

    /// True when the new part becomes the left/top child of the split.
    #[must_use]
    pub const fn places_first(self) -> bool {
        matches!(self, Relationship::Left | Relationship::Top)
    }
}

/// One row of the flattened layout relation, consumed by an external
/// persistence writer and replayable through the container's
/// weight-level add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub part: PartId,
    /// Part this one was placed relative to; `None` on the root record.
    pub relative: Option<PartId>,
    /// Side of `relative` the part sits on; `None` on the root record.
    pub relationship: Option<Relationship>,
    /// Recorded pixel allocation of the left/top side of the split.
    pub left_weight: i32,
    /// Recorded pixel allocation of the right/bottom side of the split.
    pub right_weight: i32,
}

/// Sashes bordering a part on each of its four sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighborSashes {
    pub left: Option<SashId>,
    pub right: Option<SashId>,
    pub top: Option<SashId>,
    pub bottom: Option<SashId>,
}

/// Pixel allocation for the two children of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSizes {
    pub left: i32,
    pub right: i32,
    /// True when both children have slack between their minimum and
    /// maximum, so the sash between them may be dragged.
    pub resizable: bool,
}

/// Parts handed back by [`LayoutTree::remove`].
pub struct RemovedLeaf {
    pub item: Box<dyn LayoutItem>,
    /// Sash of the collapsed split, when the removal collapsed one.
    pub sash: Option<Sash>,
}

/// A structural defect found by [`LayoutTree::check_invariants`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeInvariantIssue {
    MissingRoot { root: NodeKey },
    RootHasParent { root: NodeKey },
    MissingChild { parent: NodeKey },
    DuplicateChildren { node: NodeKey },
    ParentMismatch {
        node: NodeKey,
        expected: Option<NodeKey>,
        actual: Option<NodeKey>,
    },
    UnreachableNode { node: NodeKey },
    DuplicatePartId { part: PartId },
}

impl fmt::Display for TreeInvariantIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot { root } => write!(f, "root node {root:?} not in arena"),
            Self::RootHasParent { root } => write!(f, "root node {root:?} has a parent"),
            Self::MissingChild { parent } => {
                write!(f, "split node {parent:?} references a missing child")
            }
            Self::DuplicateChildren { node } => {
                write!(f, "split node {node:?} references the same child twice")
            }
            Self::ParentMismatch {
                node,
                expected,
                actual,
            } => write!(
                f,
                "node {node:?} parent is {actual:?}, expected {expected:?}"
            ),
            Self::UnreachableNode { node } => {
                write!(f, "node {node:?} is not reachable from the root")
            }
            Self::DuplicatePartId { part } => write!(f, "part id {part} appears in two leaves"),
        }
    }
}

impl std::error::Error for TreeInvariantIssue {}

#[derive(Clone, Copy)]
struct CacheEntry {
    /// Perpendicular extent the value was computed for.
    hint: i32,
    value: i32,
}

struct NodeCache {
    min: [Option<CacheEntry>; 2],
    max: [Option<CacheEntry>; 2],
    flags: [Option<SizeFlags>; 2],
    force_layout: bool,
    last_bounds: Option<Rect>,
}

impl Default for NodeCache {
    fn default() -> Self {
        Self {
            min: [None, None],
            max: [None, None],
            flags: [None, None],
            force_layout: true,
            last_bounds: None,
        }
    }
}

enum NodeKind {
    Leaf {
        part_id: PartId,
        item: Box<dyn LayoutItem>,
    },
    Split {
        sash: Sash,
        left: NodeKey,
        right: NodeKey,
    },
}

struct NodeData {
    parent: Option<NodeKey>,
    kind: NodeKind,
    cache: NodeCache,
}

impl NodeData {
    fn leaf(part_id: PartId, item: Box<dyn LayoutItem>) -> Self {
        Self {
            parent: None,
            kind: NodeKind::Leaf { part_id, item },
            cache: NodeCache::default(),
        }
    }

    fn split(sash: Sash, left: NodeKey, right: NodeKey, parent: Option<NodeKey>) -> Self {
        Self {
            parent,
            kind: NodeKind::Split { sash, left, right },
            cache: NodeCache::default(),
        }
    }
}

/// The recursive split-tree layout structure.
pub struct LayoutTree {
    nodes: SlotMap<NodeKey, NodeData>,
    root: Option<NodeKey>,
    /// Reading direction for child-size computation: when false, the
    /// right child is computed first and the left mirrors off the
    /// remainder.
    left_to_right: bool,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            left_to_right: true,
        }
    }

    /// Set the reading direction for child-size computation.
    pub fn set_left_to_right(&mut self, left_to_right: bool) {
        self.left_to_right = left_to_right;
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes.get(node)?.parent
    }

    /// Bounds assigned to a node by the last layout pass.
    pub fn node_bounds(&self, node: NodeKey) -> Option<Rect> {
        self.nodes.get(node)?.cache.last_bounds
    }

    /// All part IDs currently in the tree, in ascending order.
    pub fn parts(&self) -> Vec<PartId> {
        let mut out: Vec<PartId> = self
            .nodes
            .values()
            .filter_map(|node| match &node.kind {
                NodeKind::Leaf { part_id, .. } => Some(*part_id),
                NodeKind::Split { .. } => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    pub fn contains_part(&self, part: PartId) -> bool {
        self.find_leaf(part).is_some()
    }

    /// All sash IDs currently in the tree, in ascending order.
    pub fn sashes(&self) -> Vec<SashId> {
        let mut out: Vec<SashId> = self
            .nodes
            .values()
            .filter_map(|node| match &node.kind {
                NodeKind::Split { sash, .. } => Some(sash.id()),
                NodeKind::Leaf { .. } => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Borrow the content of a part.
    pub fn item(&self, part: PartId) -> Option<&dyn LayoutItem> {
        let leaf = self.find_leaf(part)?;
        match &self.nodes[leaf].kind {
            NodeKind::Leaf { item, .. } => Some(item.as_ref()),
            NodeKind::Split { .. } => None,
        }
    }

    /// Mutably borrow the content of a part.
    pub fn item_mut(&mut self, part: PartId) -> Option<&mut dyn LayoutItem> {
        let leaf = self.find_leaf(part)?;
        match &mut self.nodes[leaf].kind {
            NodeKind::Leaf { item, .. } => Some(item.as_mut()),
            NodeKind::Split { .. } => None,
        }
    }

    /// Borrow a sash by ID.
    pub fn sash(&self, sash: SashId) -> Option<&Sash> {
        let node = self.find_sash(sash)?;
        self.node_sash(node)
    }

    pub(crate) fn node_sash(&self, node: NodeKey) -> Option<&Sash> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Split { sash, .. } => Some(sash),
            NodeKind::Leaf { .. } => None,
        }
    }

    pub(crate) fn children(&self, node: NodeKey) -> Option<(NodeKey, NodeKey)> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Split { left, right, .. } => Some((*left, *right)),
            NodeKind::Leaf { .. } => None,
        }
    }

    // -----------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------

    /// A leaf is visible iff its content is materialized; a split is
    /// visible iff at least one child is.
    pub fn is_visible(&self, node: NodeKey) -> bool {
        match &self.nodes[node].kind {
            NodeKind::Leaf { item, .. } => !item.is_placeholder(),
            NodeKind::Split { left, right, .. } => {
                self.is_visible(*left) || self.is_visible(*right)
            }
        }
    }

    fn is_compressible(&self, node: NodeKey) -> bool {
        match &self.nodes[node].kind {
            NodeKind::Leaf { item, .. } => item.is_compressible(),
            NodeKind::Split { left, right, .. } => {
                self.is_compressible(*left) || self.is_compressible(*right)
            }
        }
    }

    /// -1 when the left child is fixed (only the right absorbs space
    /// changes), +1 when the right child is fixed, 0 when neither or
    /// both are compressible.
    pub(crate) fn compression_bias(&self, node: NodeKey) -> i32 {
        let Some((left, right)) = self.children(node) else {
            return 0;
        };
        let left_compressible = self.is_compressible(left);
        let right_compressible = self.is_compressible(right);
        if left_compressible == right_compressible {
            0
        } else if left_compressible {
            1
        } else {
            -1
        }
    }

    // -----------------------------------------------------------------
    // Cached size queries
    // -----------------------------------------------------------------

    /// Size flags of a subtree along `axis`, cached until the next flush.
    pub fn size_flags(&mut self, node: NodeKey, axis: Axis) -> SizeFlags {
        if let Some(flags) = self.nodes[node].cache.flags[axis.index()] {
            return flags;
        }
        let flags = self.do_size_flags(node, axis);
        self.nodes[node].cache.flags[axis.index()] = Some(flags);
        flags
    }

    fn do_size_flags(&mut self, node: NodeKey, axis: Axis) -> SizeFlags {
        let (left, right) = match &self.nodes[node].kind {
            NodeKind::Leaf { item, .. } => {
                if item.is_placeholder() {
                    return SizeFlags::empty();
                }
                return item.size_flags(axis);
            }
            NodeKind::Split { left, right, .. } => (*left, *right),
        };
        if !self.is_visible(left) {
            return self.size_flags(right, axis);
        }
        if !self.is_visible(right) {
            return self.size_flags(left, axis);
        }
        let left_flags = self.size_flags(left, axis);
        let right_flags = self.size_flags(right, axis);
        let mut flags = left_flags | right_flags;
        // A split is bounded only when both children are.
        if !(left_flags & right_flags).contains(SizeFlags::HAS_MAX) {
            flags.remove(SizeFlags::HAS_MAX);
        }
        flags
    }

    /// Minimum extent of a subtree along `axis`, given the perpendicular
    /// extent it will be laid out at.
    pub fn compute_minimum_size(
        &mut self,
        node: NodeKey,
        axis: Axis,
        mut available_perpendicular: i32,
    ) -> i32 {
        assert_valid_size(available_perpendicular);
        let flags = self.size_flags(node, axis);
        if !flags.contains(SizeFlags::HAS_MIN) {
            return 0;
        }
        // Non-wrapping content has a constant minimum; pin the hint so
        // every perpendicular extent hits the same cache entry.
        if !flags.contains(SizeFlags::WRAP) {
            available_perpendicular = INF;
        }
        if let Some(entry) = self.nodes[node].cache.min[axis.index()] {
            if entry.hint == available_perpendicular {
                return entry.value;
            }
        }
        let value = self.do_compute_minimum_size(node, axis, available_perpendicular);
        self.nodes[node].cache.min[axis.index()] = Some(CacheEntry {
            hint: available_perpendicular,
            value,
        });
        value
    }

    fn do_compute_minimum_size(
        &mut self,
        node: NodeKey,
        axis: Axis,
        available_perpendicular: i32,
    ) -> i32 {
        let result = self.do_compute_preferred_size(node, axis, INF, available_perpendicular, 0);
        assert_valid_size(result);
        result
    }

    /// Maximum extent of a subtree along `axis`, given the perpendicular
    /// extent it will be laid out at.
    pub fn compute_maximum_size(
        &mut self,
        node: NodeKey,
        axis: Axis,
        mut available_perpendicular: i32,
    ) -> i32 {
        assert_valid_size(available_perpendicular);
        let flags = self.size_flags(node, axis);
        if !flags.contains(SizeFlags::HAS_MAX) {
            return INF;
        }
        if !flags.contains(SizeFlags::WRAP) {
            available_perpendicular = INF;
        }
        if let Some(entry) = self.nodes[node].cache.max[axis.index()] {
            if entry.hint == available_perpendicular {
                return entry.value;
            }
        }
        let value = self.do_compute_maximum_size(node, axis, available_perpendicular);
        self.nodes[node].cache.max[axis.index()] = Some(CacheEntry {
            hint: available_perpendicular,
            value,
        });
        value
    }

    fn do_compute_maximum_size(
        &mut self,
        node: NodeKey,
        axis: Axis,
        available_perpendicular: i32,
    ) -> i32 {
        let result = self.do_compute_preferred_size(node, axis, INF, available_perpendicular, INF);
        assert_valid_size(result);
        result
    }

    /// Preferred extent of a subtree along `axis`.
    ///
    /// `preferred == 0` asks for the minimum; `preferred == INF` together
    /// with `available == INF` asks for the maximum. Content without the
    /// `FILL` flag accepts the offered size verbatim.
    pub fn compute_preferred_size(
        &mut self,
        node: NodeKey,
        axis: Axis,
        available: i32,
        perpendicular: i32,
        preferred: i32,
    ) -> i32 {
        assert_valid_size(available);
        assert_valid_size(perpendicular);
        assert_valid_size(preferred);
        if !self.is_visible(node) {
            return 0;
        }
        if available == 0 {
            return 0;
        }
        if preferred == 0 {
            return self.compute_minimum_size(node, axis, perpendicular).min(available);
        }
        if preferred == INF && available == INF {
            return self.compute_maximum_size(node, axis, perpendicular);
        }
        // Without quantized content anywhere below, the subtree accepts
        // any offered size between its bounds.
        if !self.size_flags(node, axis).contains(SizeFlags::FILL) {
            return preferred;
        }
        self.do_compute_preferred_size(node, axis, available, perpendicular, preferred)
    }

    fn do_compute_preferred_size(
        &mut self,
        node: NodeKey,
        axis: Axis,
        available: i32,
        perpendicular: i32,
        preferred: i32,
    ) -> i32 {
        let (left, right, sash_left, sash_right, thickness, splits_axis) =
            match &self.nodes[node].kind {
                NodeKind::Leaf { item, .. } => {
                    let result = item.preferred_size(axis, available, perpendicular, preferred);
                    assert_valid_size(result);
                    debug_assert!(result <= available, "content exceeded available space");
                    return result.min(available);
                }
                NodeKind::Split { sash, left, right } => (
                    *left,
                    *right,
                    sash.left(),
                    sash.right(),
                    sash.thickness(),
                    sash.splits(axis),
                ),
            };
        if !self.is_visible(left) {
            return self.compute_preferred_size(right, axis, available, perpendicular, preferred);
        }
        if !self.is_visible(right) {
            return self.compute_preferred_size(left, axis, available, perpendicular, preferred);
        }

        let total = if splits_axis {
            // Axis perpendicular to the sash line: the children sum up.
            let sizes =
                self.compute_child_sizes(node, available, perpendicular, sash_left, sash_right, preferred);
            add(sizes.left, add(sizes.right, thickness))
        } else {
            // Axis parallel to the sash line: find each child's allotment
            // across the sash, then take the larger of their preferences.
            let allotted = self.compute_child_sizes(
                node,
                perpendicular,
                available,
                sash_left,
                sash_right,
                perpendicular,
            );
            let left_size =
                self.compute_preferred_size(left, axis, available, allotted.left, preferred);
            let right_size =
                self.compute_preferred_size(right, axis, available, allotted.right, preferred);
            left_size.max(right_size)
        };
        assert_valid_size(total);
        total
    }

    /// Distribute `width` between the two children of a split.
    ///
    /// `width`/`height` are across/along the sash line, after any
    /// coordinate flip for horizontal sashes. `left_pref`/`right_pref`
    /// are the recorded weights; `preferred_width` is the extent the
    /// split is being asked to fill.
    pub(crate) fn compute_child_sizes(
        &mut self,
        node: NodeKey,
        width: i32,
        height: i32,
        left_pref: i32,
        right_pref: i32,
        preferred_width: i32,
    ) -> ChildSizes {
        let (left, right, thickness, divided_axis) = match &self.nodes[node].kind {
            NodeKind::Split { sash, left, right } => (
                *left,
                *right,
                sash.thickness(),
                if sash.is_vertical() {
                    Axis::Horizontal
                } else {
                    Axis::Vertical
                },
            ),
            NodeKind::Leaf { .. } => {
                debug_assert!(false, "child sizes requested on a leaf");
                return ChildSizes {
                    left: 0,
                    right: 0,
                    resizable: false,
                };
            }
        };
        debug_assert!(
            self.is_visible(left) && self.is_visible(right),
            "both children must be visible"
        );
        assert_valid_size(width);
        assert_valid_size(height);
        assert_valid_size(preferred_width);
        debug_assert!(left_pref >= 0 && right_pref >= 0, "weights must be non-negative");
        debug_assert!(
            preferred_width == INF || preferred_width <= width,
            "preferred exceeds available"
        );

        // No room for either child.
        if width <= thickness {
            return ChildSizes {
                left: 0,
                right: 0,
                resizable: false,
            };
        }

        if width == INF {
            if preferred_width == INF {
                return ChildSizes {
                    left: self.compute_maximum_size(left, divided_axis, height),
                    right: self.compute_maximum_size(right, divided_axis, height),
                    resizable: false,
                };
            }
            if preferred_width == 0 {
                return ChildSizes {
                    left: self.compute_minimum_size(left, divided_axis, height),
                    right: self.compute_minimum_size(right, divided_axis, height),
                    resizable: false,
                };
            }
        }

        let total = left_pref + right_pref;

        // Redistribution weights. A fixed child absorbs none of the
        // change; with no usable weights fall back to an even split.
        let (mut w_left, mut w_right) = (i64::from(left_pref), i64::from(right_pref));
        match self.compression_bias(node) {
            -1 => w_left = 0,
            1 => w_right = 0,
            _ => {}
        }
        if w_left + w_right == 0 {
            w_left = 1;
            w_right = 1;
        }
        let w_total = w_left + w_right;

        // From here on only the space handed to the two children matters.
        let width = subtract(width, thickness);
        let preferred_width = subtract(preferred_width, thickness);

        let redistribute = subtract(preferred_width, total);

        let left_minimum = self.compute_minimum_size(left, divided_axis, height);
        let right_minimum = self.compute_minimum_size(right, divided_axis, height);
        let left_maximum = self.compute_maximum_size(left, divided_axis, height);
        let right_maximum = self.compute_maximum_size(right, divided_axis, height);

        let (ideal_left, ideal_right);
        if self.left_to_right {
            let left_available = left_maximum.min(subtract(width, right_minimum).max(0));
            // The stored weight plus this side's share of the
            // redistributed space, snapped by the child itself.
            let share = (i64::from(redistribute) * w_left / w_total) as i32;
            let mut l = left_minimum.max(left_available.min(add(left_pref, share)));
            l = self.compute_preferred_size(left, divided_axis, left_available, height, l);
            l = left_minimum.max(left_available.min(l));
            ideal_left = l;

            let right_available = subtract(width, ideal_left).max(0);
            let mut r = right_minimum.max(subtract(preferred_width, ideal_left));
            r = r.min(right_available);
            r = self.compute_preferred_size(right, divided_axis, right_available, height, r);
            r = r.max(right_minimum);
            ideal_right = r;
        } else {
            let right_available = right_maximum.min(subtract(width, left_minimum).max(0));
            let share = (i64::from(redistribute) * w_right / w_total) as i32;
            let mut r = right_minimum.max(right_available.min(add(right_pref, share)));
            r = self.compute_preferred_size(right, divided_axis, right_available, height, r);
            r = right_minimum.max(right_available.min(r));
            ideal_right = r;

            let left_available = subtract(width, ideal_right).max(0);
            let mut l = left_minimum.max(subtract(preferred_width, ideal_right));
            l = l.min(left_available);
            l = self.compute_preferred_size(left, divided_axis, left_available, height, l);
            l = l.max(left_minimum);
            ideal_left = l;
        }

        let resizable = left_maximum > left_minimum
            && right_maximum > right_minimum
            && add(left_minimum, right_minimum) < width;

        ChildSizes {
            left: ideal_left,
            right: ideal_right,
            resizable,
        }
    }

    // -----------------------------------------------------------------
    // Bounds propagation
    // -----------------------------------------------------------------

    /// Assign bounds to a subtree.
    ///
    /// A no-op when the bounds match the last pass and nothing was
    /// flushed since.
    pub fn set_bounds(&mut self, node: NodeKey, bounds: Rect) {
        let cache = &mut self.nodes[node].cache;
        if cache.last_bounds == Some(bounds) && !cache.force_layout {
            return;
        }
        cache.last_bounds = Some(bounds);
        cache.force_layout = false;
        self.do_set_bounds(node, bounds);
    }

    fn do_set_bounds(&mut self, node: NodeKey, bounds: Rect) {
        let (left, right) = match &mut self.nodes[node].kind {
            NodeKind::Leaf { item, .. } => {
                item.set_bounds(bounds);
                return;
            }
            NodeKind::Split { left, right, .. } => (*left, *right),
        };

        // With a single visible child the split is a pass-through and
        // the sash disappears.
        if !self.is_visible(left) {
            self.set_sash_hidden(node);
            self.set_bounds(right, bounds);
            return;
        }
        if !self.is_visible(right) {
            self.set_sash_hidden(node);
            self.set_bounds(left, bounds);
            return;
        }

        let (horizontal, thickness, left_weight, right_weight) = match &self.nodes[node].kind {
            NodeKind::Split { sash, .. } => (
                sash.is_horizontal(),
                sash.thickness(),
                sash.left(),
                sash.right(),
            ),
            NodeKind::Leaf { .. } => unreachable!("split checked above"),
        };

        // Normalize to vertical-sash terms.
        let b = if horizontal { bounds.flip_xy() } else { bounds };

        let sizes = self.compute_child_sizes(node, b.width, b.height, left_weight, right_weight, b.width);

        let mut left_rect = Rect::new(b.x, b.y, sizes.left, b.height);
        let mut sash_rect = Rect::new(b.x + sizes.left, b.y, thickness, b.height);
        let mut right_rect = Rect::new(sash_rect.x + thickness, b.y, sizes.right, b.height);
        if horizontal {
            left_rect = left_rect.flip_xy();
            sash_rect = sash_rect.flip_xy();
            right_rect = right_rect.flip_xy();
        }

        if let NodeKind::Split { sash, .. } = &mut self.nodes[node].kind {
            sash.set_visible(true);
            sash.set_enabled(sizes.resizable);
            sash.set_bounds(sash_rect);
        }
        self.set_bounds(left, left_rect);
        self.set_bounds(right, right_rect);
    }

    fn set_sash_hidden(&mut self, node: NodeKey) {
        if let NodeKind::Split { sash, .. } = &mut self.nodes[node].kind {
            sash.set_visible(false);
            sash.set_enabled(false);
        }
    }

    // -----------------------------------------------------------------
    // Cache invalidation
    // -----------------------------------------------------------------

    /// Drop the cached extents of a node and every ancestor, and force
    /// their next bounds pass to re-layout.
    ///
    /// Must run to completion before the next size query or bounds pass
    /// on the same tree, or stale extents will be observed.
    pub fn flush_cache(&mut self, node: NodeKey) {
        let mut current = Some(node);
        while let Some(key) = current {
            self.flush_node(key);
            current = self.nodes[key].parent;
        }
    }

    fn flush_node(&mut self, node: NodeKey) {
        let cache = &mut self.nodes[node].cache;
        cache.min = [None, None];
        cache.max = [None, None];
        cache.flags = [None, None];
        cache.force_layout = true;
        // last_bounds survives: drag snapping reads it mid-gesture.
    }

    // -----------------------------------------------------------------
    // Structural mutation
    // -----------------------------------------------------------------

    /// Install the first part as the tree's only leaf.
    pub fn set_root(&mut self, part: PartId, item: Box<dyn LayoutItem>) {
        debug_assert!(self.root.is_none(), "tree already has a root");
        self.root = Some(self.nodes.insert(NodeData::leaf(part, item)));
    }

    /// Split the leaf of `relative` with a new leaf for `part`, joined
    /// under `sash`. `on_left` puts the new part on the left/top side.
    ///
    /// When `relative` cannot be found the new part is inserted beside
    /// the current root instead — a logged degradation, not an error.
    pub fn insert(
        &mut self,
        part: PartId,
        item: Box<dyn LayoutItem>,
        on_left: bool,
        sash: Sash,
        relative: Option<PartId>,
    ) {
        let Some(old_root) = self.root else {
            self.root = Some(self.nodes.insert(NodeData::leaf(part, item)));
            return;
        };

        let anchor = relative.and_then(|p| self.find_leaf(p));
        #[cfg(feature = "tracing")]
        if relative.is_some() && anchor.is_none() {
            tracing::warn!(part = %part, "relative part not in tree; inserting beside the root");
        }
        let (target, target_parent) = match anchor {
            Some(a) => (a, self.nodes[a].parent),
            None => (old_root, None),
        };

        let leaf = self.nodes.insert(NodeData::leaf(part, item));
        let (first, second) = if on_left { (leaf, target) } else { (target, leaf) };
        let split = self
            .nodes
            .insert(NodeData::split(sash, first, second, target_parent));
        self.nodes[leaf].parent = Some(split);
        self.nodes[target].parent = Some(split);
        match target_parent {
            None => self.root = Some(split),
            Some(p) => self.replace_child(p, target, split),
        }
        self.flush_cache(split);
    }

    /// Remove a part's leaf, collapsing its parent split: the sibling
    /// takes the split's place in the grandparent (or becomes the root).
    pub fn remove(&mut self, part: PartId) -> Option<RemovedLeaf> {
        let leaf = self.find_leaf(part)?;
        let Some(parent) = self.nodes[leaf].parent else {
            // The leaf was the whole tree.
            self.root = None;
            return take_leaf(self.nodes.remove(leaf)).map(|item| RemovedLeaf { item, sash: None });
        };

        let (left, right) = self.children(parent)?;
        let sibling = if left == leaf { right } else { left };
        let grandparent = self.nodes[parent].parent;
        self.nodes[sibling].parent = grandparent;
        match grandparent {
            None => {
                self.root = Some(sibling);
                self.flush_node(sibling);
            }
            Some(g) => {
                self.replace_child(g, parent, sibling);
                self.flush_cache(g);
            }
        }

        let sash = match self.nodes.remove(parent) {
            Some(NodeData {
                kind: NodeKind::Split { sash, .. },
                ..
            }) => Some(sash),
            _ => None,
        };
        take_leaf(self.nodes.remove(leaf)).map(|item| RemovedLeaf { item, sash })
    }

    /// Swap the payload of a leaf in place, with no tree restructuring.
    pub fn replace(
        &mut self,
        old: PartId,
        new: PartId,
        item: Box<dyn LayoutItem>,
    ) -> Option<Box<dyn LayoutItem>> {
        let leaf = self.find_leaf(old)?;
        let previous = match &mut self.nodes[leaf].kind {
            NodeKind::Leaf { part_id, item: slot } => {
                *part_id = new;
                std::mem::replace(slot, item)
            }
            NodeKind::Split { .. } => return None,
        };
        self.flush_cache(leaf);
        Some(previous)
    }

    /// Update a sash's recorded allocation and flush the owning node.
    pub fn set_sash_sizes(&mut self, sash: SashId, left: i32, right: i32) -> bool {
        let Some(node) = self.find_sash(sash) else {
            return false;
        };
        let changed = match &mut self.nodes[node].kind {
            NodeKind::Split { sash, .. } => sash.set_sizes(left, right),
            NodeKind::Leaf { .. } => false,
        };
        if changed {
            self.flush_cache(node);
        }
        changed
    }

    fn replace_child(&mut self, parent: NodeKey, old: NodeKey, new: NodeKey) {
        if let NodeKind::Split { left, right, .. } = &mut self.nodes[parent].kind {
            if *left == old {
                *left = new;
            } else if *right == old {
                *right = new;
            } else {
                debug_assert!(false, "node is not a child of its recorded parent");
            }
        }
    }

    pub(crate) fn hide_sashes(&mut self) -> Vec<SashId> {
        let mut out = Vec::new();
        for node in self.nodes.values_mut() {
            if let NodeKind::Split { sash, .. } = &mut node.kind {
                sash.set_visible(false);
                sash.set_enabled(false);
                out.push(sash.id());
            }
        }
        out.sort_unstable();
        out
    }

    // -----------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------

    /// The leaf node wrapping a part.
    pub fn find_leaf(&self, part: PartId) -> Option<NodeKey> {
        self.nodes.iter().find_map(|(key, node)| match &node.kind {
            NodeKind::Leaf { part_id, .. } if *part_id == part => Some(key),
            _ => None,
        })
    }

    /// The split node owning a sash.
    pub fn find_sash(&self, sash: SashId) -> Option<NodeKey> {
        self.nodes.iter().find_map(|(key, node)| match &node.kind {
            NodeKind::Split { sash: s, .. } if s.id() == sash => Some(key),
            _ => None,
        })
    }

    /// Hit-test a point against the visible leaves.
    pub fn part_at(&self, point: Point) -> Option<PartId> {
        self.part_at_node(self.root?, point)
    }

    fn part_at_node(&self, node: NodeKey, point: Point) -> Option<PartId> {
        let (left, right, sash_bounds, vertical) = match &self.nodes[node].kind {
            NodeKind::Leaf { part_id, .. } => return Some(*part_id),
            NodeKind::Split { sash, left, right } => {
                (*left, *right, sash.bounds(), sash.is_vertical())
            }
        };
        if !self.is_visible(left) {
            return self.part_at_node(right, point);
        }
        if !self.is_visible(right) {
            return self.part_at_node(left, point);
        }
        let before = if vertical {
            point.x < sash_bounds.x + sash_bounds.width / 2
        } else {
            point.y < sash_bounds.y + sash_bounds.height / 2
        };
        if before {
            self.part_at_node(left, point)
        } else {
            self.part_at_node(right, point)
        }
    }

    /// The bottom-right-most part, preferring visible subtrees. Default
    /// anchor for plain adds.
    pub fn bottom_right_part(&self) -> Option<PartId> {
        self.bottom_right_of(self.root?)
    }

    fn bottom_right_of(&self, node: NodeKey) -> Option<PartId> {
        match &self.nodes[node].kind {
            NodeKind::Leaf { part_id, .. } => Some(*part_id),
            NodeKind::Split { left, right, .. } => {
                if self.is_visible(*right) {
                    self.bottom_right_of(*right)
                } else {
                    self.bottom_right_of(*left)
                }
            }
        }
    }

    /// Collect the visible sashes bordering a part on each side.
    pub fn find_sashes(&self, part: PartId) -> NeighborSashes {
        let mut out = NeighborSashes::default();
        let Some(mut current) = self.find_leaf(part) else {
            return out;
        };
        while let Some(parent) = self.nodes[current].parent {
            if let NodeKind::Split { sash, left, .. } = &self.nodes[parent].kind {
                let left_or_top = *left == current;
                if sash.is_visible() {
                    // A left/top child sees this sash on its right/bottom.
                    match (left_or_top, sash.is_vertical()) {
                        (true, true) => {
                            if out.right.is_none() {
                                out.right = Some(sash.id());
                            }
                        }
                        (true, false) => {
                            if out.bottom.is_none() {
                                out.bottom = Some(sash.id());
                            }
                        }
                        (false, true) => {
                            if out.left.is_none() {
                                out.left = Some(sash.id());
                            }
                        }
                        (false, false) => {
                            if out.top.is_none() {
                                out.top = Some(sash.id());
                            }
                        }
                    }
                }
            }
            current = parent;
        }
        out
    }

    /// The deepest node whose subtree contains both parts.
    pub fn common_ancestor(&self, a: PartId, b: PartId) -> Option<NodeKey> {
        let mut current = Some(self.find_leaf(a)?);
        while let Some(node) = current {
            if self.subtree_contains(node, b) {
                return Some(node);
            }
            current = self.nodes[node].parent;
        }
        None
    }

    fn subtree_contains(&self, node: NodeKey, part: PartId) -> bool {
        match &self.nodes[node].kind {
            NodeKind::Leaf { part_id, .. } => *part_id == part,
            NodeKind::Split { left, right, .. } => {
                self.subtree_contains(*left, part) || self.subtree_contains(*right, part)
            }
        }
    }

    // -----------------------------------------------------------------
    // Persistence and diagnostics
    // -----------------------------------------------------------------

    /// Flatten the tree into an ordered list of relation records for an
    /// external persistence writer. Replaying the records in order
    /// through weight-level adds reproduces the tree.
    pub fn compute_relation(&self) -> Vec<RelationRecord> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let mut records = Vec::new();
        let root_part = self.relation_of(root, &mut records);
        records.insert(
            0,
            RelationRecord {
                part: root_part,
                relative: None,
                relationship: None,
                left_weight: 0,
                right_weight: 0,
            },
        );
        records
    }

    fn relation_of(&self, node: NodeKey, records: &mut Vec<RelationRecord>) -> PartId {
        match &self.nodes[node].kind {
            NodeKind::Leaf { part_id, .. } => *part_id,
            NodeKind::Split { sash, left, right } => {
                let relative = self.relation_of(*left, records);
                let part = self.relation_of(*right, records);
                records.insert(
                    0,
                    RelationRecord {
                        part,
                        relative: Some(relative),
                        relationship: Some(if sash.is_vertical() {
                            Relationship::Right
                        } else {
                            Relationship::Bottom
                        }),
                        left_weight: sash.left(),
                        right_weight: sash.right(),
                    },
                );
                relative
            }
        }
    }

    /// Deterministic, human-readable encoding of the visible tree shape:
    /// `(A|B)` for a vertical sash, `(A-B)` for a horizontal one.
    /// Intended for structural-equality testing only.
    pub fn describe_layout(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            self.describe_node(root, &mut out);
        }
        out
    }

    fn describe_node(&self, node: NodeKey, out: &mut String) {
        if !self.is_visible(node) {
            return;
        }
        match &self.nodes[node].kind {
            NodeKind::Leaf { item, .. } => out.push_str(item.label()),
            NodeKind::Split { sash, left, right } => {
                if !self.is_visible(*left) {
                    self.describe_node(*right, out);
                    return;
                }
                if !self.is_visible(*right) {
                    self.describe_node(*left, out);
                    return;
                }
                out.push('(');
                self.describe_node(*left, out);
                out.push(if sash.is_vertical() { '|' } else { '-' });
                self.describe_node(*right, out);
                out.push(')');
            }
        }
    }

    /// Validate the structural invariants; returns every defect found.
    pub fn check_invariants(&self) -> Vec<TreeInvariantIssue> {
        let mut issues = Vec::new();

        if let Some(root) = self.root {
            match self.nodes.get(root) {
                None => issues.push(TreeInvariantIssue::MissingRoot { root }),
                Some(node) if node.parent.is_some() => {
                    issues.push(TreeInvariantIssue::RootHasParent { root });
                }
                Some(_) => {}
            }
        }

        for (key, node) in &self.nodes {
            if let NodeKind::Split { left, right, .. } = &node.kind {
                if left == right {
                    issues.push(TreeInvariantIssue::DuplicateChildren { node: key });
                }
                for child in [*left, *right] {
                    match self.nodes.get(child) {
                        None => issues.push(TreeInvariantIssue::MissingChild { parent: key }),
                        Some(c) if c.parent != Some(key) => {
                            issues.push(TreeInvariantIssue::ParentMismatch {
                                node: child,
                                expected: Some(key),
                                actual: c.parent,
                            });
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        let mut reachable = HashSet::new();
        if let Some(root) = self.root {
            let mut stack = vec![root];
            while let Some(key) = stack.pop() {
                if !reachable.insert(key) {
                    continue;
                }
                if let Some((left, right)) = self.children(key) {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        for key in self.nodes.keys() {
            if !reachable.contains(&key) {
                issues.push(TreeInvariantIssue::UnreachableNode { node: key });
            }
        }

        let mut seen = HashSet::new();
        for node in self.nodes.values() {
            if let NodeKind::Leaf { part_id, .. } = &node.kind {
                if !seen.insert(*part_id) {
                    issues.push(TreeInvariantIssue::DuplicatePartId { part: *part_id });
                }
            }
        }

        issues
    }
}

fn take_leaf(data: Option<NodeData>) -> Option<Box<dyn LayoutItem>> {
    match data {
        Some(NodeData {
            kind: NodeKind::Leaf { item, .. },
            ..
        }) => Some(item),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sashdock_core::{Point, Rect};

    use super::{LayoutTree, Relationship};
    use crate::item::PartId;
    use crate::sash::{Orientation, Sash, SashId};
    use crate::size::{Axis, INF};
    use crate::testutil::StubPart;

    const THICKNESS: i32 = 4;

    fn part_id(raw: u64) -> PartId {
        PartId::new(raw).unwrap()
    }

    fn sash_id(raw: u64) -> SashId {
        SashId::new(raw).unwrap()
    }

    fn vertical_sash(raw: u64, left: i32, right: i32) -> Sash {
        let mut sash = Sash::new(sash_id(raw), Orientation::Vertical, THICKNESS);
        sash.set_sizes(left, right);
        sash
    }

    fn horizontal_sash(raw: u64, left: i32, right: i32) -> Sash {
        let mut sash = Sash::new(sash_id(raw), Orientation::Horizontal, THICKNESS);
        sash.set_sizes(left, right);
        sash
    }

    /// Two leaves split by a vertical sash with the given weights.
    fn two_leaf_tree(a: StubPart, b: StubPart, left: i32, right: i32) -> LayoutTree {
        let mut tree = LayoutTree::new();
        tree.set_root(part_id(1), Box::new(a));
        tree.insert(
            part_id(2),
            Box::new(b),
            false,
            vertical_sash(1, left, right),
            Some(part_id(1)),
        );
        tree
    }

    #[test]
    fn even_split_with_minimums() {
        let a = StubPart::new("a").with_min(50);
        let b = StubPart::new("b").with_min(50);
        let (ha, hb) = (a.handles(), b.handles());
        let mut tree = two_leaf_tree(a, b, 100, 100);
        let root = tree.root().unwrap();

        tree.set_bounds(root, Rect::new(0, 0, 200, 100));

        assert_eq!(ha.bounds.get(), Some(Rect::new(0, 0, 98, 100)));
        assert_eq!(hb.bounds.get(), Some(Rect::new(102, 0, 98, 100)));
        let sash = tree.sash(sash_id(1)).unwrap();
        assert_eq!(sash.bounds(), Rect::new(98, 0, THICKNESS, 100));
        assert!(sash.is_visible());
        assert!(sash.is_enabled());
    }

    #[test]
    fn horizontal_split_flips_coordinates() {
        let a = StubPart::new("a").with_min(20);
        let b = StubPart::new("b").with_min(20);
        let (ha, hb) = (a.handles(), b.handles());
        let mut tree = LayoutTree::new();
        tree.set_root(part_id(1), Box::new(a));
        tree.insert(
            part_id(2),
            Box::new(b),
            false,
            horizontal_sash(1, 50, 50),
            Some(part_id(1)),
        );
        let root = tree.root().unwrap();

        tree.set_bounds(root, Rect::new(0, 0, 80, 104));

        assert_eq!(ha.bounds.get(), Some(Rect::new(0, 0, 80, 50)));
        assert_eq!(hb.bounds.get(), Some(Rect::new(0, 54, 80, 50)));
        assert_eq!(
            tree.sash(sash_id(1)).unwrap().bounds(),
            Rect::new(0, 50, 80, THICKNESS)
        );
    }

    #[test]
    fn single_leaf_passes_preferred_through() {
        let mut tree = LayoutTree::new();
        tree.set_root(part_id(1), Box::new(StubPart::new("a")));
        let root = tree.root().unwrap();
        assert_eq!(
            tree.compute_preferred_size(root, Axis::Horizontal, 500, 300, 123),
            123
        );
    }

    #[test]
    fn quantized_leaf_snaps_preferred() {
        let mut tree = LayoutTree::new();
        tree.set_root(part_id(1), Box::new(StubPart::new("a").with_quantum(10)));
        let root = tree.root().unwrap();
        assert_eq!(
            tree.compute_preferred_size(root, Axis::Horizontal, 500, 300, 95),
            90
        );
    }

    #[test]
    fn minimum_query_skips_content_without_flag() {
        let a = StubPart::new("a");
        let handles = a.handles();
        let mut tree = LayoutTree::new();
        tree.set_root(part_id(1), Box::new(a));
        let root = tree.root().unwrap();
        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, INF), 0);
        assert_eq!(handles.measures.get(), 0);
    }

    #[test]
    fn minimum_is_cached_until_flush() {
        let a = StubPart::new("a").with_min(40);
        let handles = a.handles();
        let mut tree = LayoutTree::new();
        tree.set_root(part_id(1), Box::new(a));
        let root = tree.root().unwrap();

        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, 100), 40);
        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, 250), 40);
        assert_eq!(handles.measures.get(), 1, "non-wrapping minimum must hit the cache");

        tree.flush_cache(root);
        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, 100), 40);
        assert_eq!(handles.measures.get(), 2, "flush must force a recompute");
    }

    #[test]
    fn wrapping_minimum_is_keyed_on_perpendicular_extent() {
        let a = StubPart::new("a").with_wrap_area(1000);
        let handles = a.handles();
        let mut tree = LayoutTree::new();
        tree.set_root(part_id(1), Box::new(a));
        let root = tree.root().unwrap();

        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, 100), 10);
        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, 100), 10);
        assert_eq!(handles.measures.get(), 1);

        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, 50), 20);
        assert_eq!(handles.measures.get(), 2, "a new hint must recompute");
    }

    #[test]
    fn flush_propagates_to_ancestors() {
        let a = StubPart::new("a").with_min(30);
        let b = StubPart::new("b").with_min(30);
        let (ha, hb) = (a.handles(), b.handles());
        let mut tree = two_leaf_tree(a, b, 100, 100);
        let root = tree.root().unwrap();
        let leaf = tree.find_leaf(part_id(2)).unwrap();

        // Root minimum: both children plus the sash.
        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, INF), 64);
        assert_eq!((ha.measures.get(), hb.measures.get()), (1, 1));

        tree.flush_cache(leaf);
        // The recompute after a child flush must not see a stale root
        // entry; the untouched sibling keeps its cache.
        assert_eq!(tree.compute_minimum_size(root, Axis::Horizontal, INF), 64);
        assert_eq!((ha.measures.get(), hb.measures.get()), (1, 2));
    }

    #[test]
    fn set_bounds_is_idempotent_until_flush() {
        let a = StubPart::new("a").with_min(10);
        let b = StubPart::new("b").with_min(10);
        let (ha, hb) = (a.handles(), b.handles());
        let mut tree = two_leaf_tree(a, b, 100, 100);
        let root = tree.root().unwrap();
        let bounds = Rect::new(0, 0, 200, 100);

        tree.set_bounds(root, bounds);
        tree.set_bounds(root, bounds);
        assert_eq!(ha.bounds_sets.get(), 1, "identical bounds must not re-layout");
        assert_eq!(hb.bounds_sets.get(), 1);

        let leaf = tree.find_leaf(part_id(1)).unwrap();
        tree.flush_cache(leaf);
        tree.set_bounds(root, bounds);
        assert_eq!(ha.bounds_sets.get(), 2, "flushed subtree must re-layout");
        assert_eq!(hb.bounds_sets.get(), 1, "unflushed sibling with unchanged bounds must not");
    }

    #[test]
    fn insert_then_remove_restores_leaf_set() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 100, 100);
        let before = tree.parts();

        tree.insert(
            part_id(3),
            Box::new(StubPart::new("c")),
            true,
            horizontal_sash(2, 60, 60),
            Some(part_id(2)),
        );
        assert_eq!(tree.parts(), vec![part_id(1), part_id(2), part_id(3)]);

        let removed = tree.remove(part_id(3)).unwrap();
        assert!(removed.sash.is_some());
        assert_eq!(tree.parts(), before);
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn removing_a_child_collapses_the_split() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 100, 100);
        tree.insert(
            part_id(3),
            Box::new(StubPart::new("c")),
            false,
            horizontal_sash(2, 60, 60),
            Some(part_id(2)),
        );
        assert_eq!(tree.describe_layout(), "(a|(b-c))");

        tree.remove(part_id(2)).unwrap();
        assert_eq!(tree.describe_layout(), "(a|c)");

        // The survivor hangs directly off the former grandparent.
        let leaf = tree.find_leaf(part_id(3)).unwrap();
        assert_eq!(tree.parent(leaf), tree.root());
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn removing_last_part_empties_the_tree() {
        let mut tree = LayoutTree::new();
        tree.set_root(part_id(1), Box::new(StubPart::new("a")));
        let removed = tree.remove(part_id(1)).unwrap();
        assert!(removed.sash.is_none());
        assert!(tree.is_empty());
        assert_eq!(tree.describe_layout(), "");
    }

    #[test]
    fn replace_swaps_payload_in_place() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 100, 100);
        let old = tree
            .replace(part_id(2), part_id(9), Box::new(StubPart::new("z")))
            .unwrap();
        assert_eq!(old.label(), "b");
        assert_eq!(tree.describe_layout(), "(a|z)");
        assert!(tree.contains_part(part_id(9)));
        assert!(!tree.contains_part(part_id(2)));
    }

    #[test]
    fn insert_with_unknown_relative_lands_beside_root() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 100, 100);
        tree.insert(
            part_id(3),
            Box::new(StubPart::new("c")),
            false,
            vertical_sash(2, 50, 50),
            Some(part_id(77)),
        );
        assert_eq!(tree.describe_layout(), "((a|b)|c)");
        assert!(tree.check_invariants().is_empty());
    }

    #[test]
    fn describe_is_structural_and_orientation_sensitive() {
        let vertical = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 100, 100);
        let vertical_again = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 10, 300);
        assert_eq!(vertical.describe_layout(), vertical_again.describe_layout());

        let mut horizontal = LayoutTree::new();
        horizontal.set_root(part_id(1), Box::new(StubPart::new("a")));
        horizontal.insert(
            part_id(2),
            Box::new(StubPart::new("b")),
            false,
            horizontal_sash(1, 100, 100),
            Some(part_id(1)),
        );
        assert_ne!(vertical.describe_layout(), horizontal.describe_layout());
    }

    #[test]
    fn placeholder_child_turns_split_into_pass_through() {
        let a = StubPart::new("a");
        let ghost = StubPart::new("ghost").placeholder();
        let ha = a.handles();
        let mut tree = two_leaf_tree(a, ghost, 100, 100);
        let root = tree.root().unwrap();

        assert_eq!(tree.describe_layout(), "a");
        tree.set_bounds(root, Rect::new(0, 0, 200, 100));
        assert_eq!(ha.bounds.get(), Some(Rect::new(0, 0, 200, 100)));
        assert!(!tree.sash(sash_id(1)).unwrap().is_visible());
    }

    #[test]
    fn compressible_child_absorbs_redistribution() {
        let fixed = StubPart::new("panel");
        let editor = StubPart::new("editor").compressible();
        let mut tree = two_leaf_tree(fixed, editor, 100, 100);
        let root = tree.root().unwrap();

        // 300 to distribute beyond the recorded 204: all of it must go to
        // the compressible right child.
        let sizes = tree.compute_child_sizes(root, 504, 100, 100, 100, 504);
        assert_eq!((sizes.left, sizes.right), (100, 400));
    }

    #[test]
    fn zero_weights_fall_back_to_even_split() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 0, 0);
        let root = tree.root().unwrap();
        let sizes = tree.compute_child_sizes(root, 204, 100, 0, 0, 204);
        assert_eq!((sizes.left, sizes.right), (100, 100));
    }

    #[test]
    fn right_to_left_mirrors_the_rounding() {
        let a = StubPart::new("a");
        let b = StubPart::new("b");
        let mut tree = two_leaf_tree(a, b, 100, 101);
        tree.set_left_to_right(false);
        let root = tree.root().unwrap();
        let sizes = tree.compute_child_sizes(root, 300, 100, 100, 101, 300);
        assert_eq!(sizes.left + sizes.right + THICKNESS, 300);
    }

    #[test]
    fn resizable_requires_slack_on_both_sides() {
        let rigid_a = StubPart::new("a").with_min(50).with_max(50);
        let b = StubPart::new("b").with_min(10);
        let mut tree = two_leaf_tree(rigid_a, b, 100, 100);
        let root = tree.root().unwrap();
        let sizes = tree.compute_child_sizes(root, 200, 100, 100, 100, 200);
        assert!(!sizes.resizable);

        let a = StubPart::new("a").with_min(50).with_max(120);
        let b = StubPart::new("b").with_min(10);
        let mut tree = two_leaf_tree(a, b, 100, 100);
        let root = tree.root().unwrap();
        let sizes = tree.compute_child_sizes(root, 200, 100, 100, 100, 200);
        assert!(sizes.resizable);
    }

    #[test]
    fn unbounded_query_returns_child_extremes() {
        let a = StubPart::new("a").with_min(30).with_max(70);
        let b = StubPart::new("b").with_min(40).with_max(90);
        let mut tree = two_leaf_tree(a, b, 100, 100);
        let root = tree.root().unwrap();

        let maxes = tree.compute_child_sizes(root, INF, 100, 100, 100, INF);
        assert_eq!((maxes.left, maxes.right), (70, 90));
        let mins = tree.compute_child_sizes(root, INF, 100, 100, 100, 0);
        assert_eq!((mins.left, mins.right), (30, 40));
    }

    #[test]
    fn preferred_along_sash_takes_the_larger_child() {
        let a = StubPart::new("a").with_min(30).with_quantum(1);
        let b = StubPart::new("b").with_min(80).with_quantum(1);
        let mut tree = two_leaf_tree(a, b, 100, 100);
        let root = tree.root().unwrap();

        // Height of a vertical split is dictated by the taller child.
        let min_height = tree.compute_minimum_size(root, Axis::Vertical, 204);
        assert_eq!(min_height, 80);
    }

    #[test]
    fn common_ancestor_is_the_joining_split() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 100, 100);
        tree.insert(
            part_id(3),
            Box::new(StubPart::new("c")),
            false,
            horizontal_sash(2, 60, 60),
            Some(part_id(2)),
        );
        // b and c join under the inner split, a and c only at the root.
        let inner = tree.common_ancestor(part_id(2), part_id(3)).unwrap();
        let outer = tree.common_ancestor(part_id(1), part_id(3)).unwrap();
        assert_ne!(inner, outer);
        assert_eq!(Some(outer), tree.root());
        assert_eq!(tree.parent(inner), Some(outer));
    }

    #[test]
    fn neighbor_sashes_sit_on_the_expected_sides() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 100, 100);
        tree.insert(
            part_id(3),
            Box::new(StubPart::new("c")),
            false,
            horizontal_sash(2, 60, 60),
            Some(part_id(2)),
        );
        let root = tree.root().unwrap();
        tree.set_bounds(root, Rect::new(0, 0, 400, 300));

        let around_b = tree.find_sashes(part_id(2));
        assert_eq!(around_b.left, Some(sash_id(1)));
        assert_eq!(around_b.bottom, Some(sash_id(2)));
        assert_eq!(around_b.right, None);
        assert_eq!(around_b.top, None);

        let around_a = tree.find_sashes(part_id(1));
        assert_eq!(around_a.right, Some(sash_id(1)));
        assert_eq!(around_a.left, None);
    }

    #[test]
    fn hit_test_follows_the_sash_midpoint() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 100, 100);
        let root = tree.root().unwrap();
        tree.set_bounds(root, Rect::new(0, 0, 200, 100));

        assert_eq!(tree.part_at(Point::new(10, 50)), Some(part_id(1)));
        assert_eq!(tree.part_at(Point::new(190, 50)), Some(part_id(2)));
        // Just past the sash midpoint falls to the right child.
        assert_eq!(tree.part_at(Point::new(101, 50)), Some(part_id(2)));
    }

    #[test]
    fn relation_records_replay_in_order() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 120, 80);
        tree.insert(
            part_id(3),
            Box::new(StubPart::new("c")),
            false,
            horizontal_sash(2, 60, 40),
            Some(part_id(2)),
        );

        let records = tree.compute_relation();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].part, part_id(1));
        assert_eq!(records[0].relative, None);
        assert_eq!(records[1].part, part_id(2));
        assert_eq!(records[1].relative, Some(part_id(1)));
        assert_eq!(records[1].relationship, Some(Relationship::Right));
        assert_eq!((records[1].left_weight, records[1].right_weight), (120, 80));
        assert_eq!(records[2].part, part_id(3));
        assert_eq!(records[2].relative, Some(part_id(2)));
        assert_eq!(records[2].relationship, Some(Relationship::Bottom));
    }

    #[test]
    fn relation_records_serialize() {
        let tree = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), 120, 80);
        let records = tree.compute_relation();
        let json = serde_json::to_string(&records).unwrap();
        let back: Vec<super::RelationRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn bottom_right_prefers_visible_leaves() {
        let mut tree = two_leaf_tree(StubPart::new("a"), StubPart::new("ghost").placeholder(), 100, 100);
        assert_eq!(tree.bottom_right_part(), Some(part_id(1)));
        tree.insert(
            part_id(3),
            Box::new(StubPart::new("c")),
            false,
            vertical_sash(2, 50, 50),
            Some(part_id(1)),
        );
        assert_eq!(tree.bottom_right_part(), Some(part_id(3)));
    }

    proptest! {
        #[test]
        fn child_sizes_fill_the_width_exactly(
            left_min in 0i32..60,
            right_min in 0i32..60,
            left_weight in 0i32..400,
            right_weight in 0i32..400,
            extra in 0i32..500,
        ) {
            let width = THICKNESS + left_min + right_min + 1 + extra;
            let a = StubPart::new("a").with_min(left_min);
            let b = StubPart::new("b").with_min(right_min);
            let mut tree = two_leaf_tree(a, b, left_weight, right_weight);
            let root = tree.root().unwrap();

            let sizes = tree.compute_child_sizes(
                root, width, 100, left_weight, right_weight, width,
            );
            prop_assert_eq!(sizes.left + sizes.right + THICKNESS, width);
            prop_assert!(sizes.left >= left_min);
            prop_assert!(sizes.right >= right_min);
        }

        #[test]
        fn preferred_stays_between_minimum_and_maximum(
            left_min in 0i32..60,
            right_min in 0i32..60,
            left_slack in 1i32..200,
            right_slack in 1i32..200,
            weight in 1i32..300,
            offset in 0i32..600,
        ) {
            let a = StubPart::new("a").with_min(left_min).with_max(left_min + left_slack).with_quantum(1);
            let b = StubPart::new("b").with_min(right_min).with_max(right_min + right_slack).with_quantum(1);
            let mut tree = two_leaf_tree(a, b, weight, weight);
            let root = tree.root().unwrap();

            let minimum = tree.compute_minimum_size(root, Axis::Horizontal, INF);
            let maximum = tree.compute_maximum_size(root, Axis::Horizontal, INF);
            prop_assert!(minimum <= maximum);

            let preferred_in = minimum + offset % (maximum - minimum + 1);
            let available = maximum + 100;
            let preferred = tree.compute_preferred_size(
                root, Axis::Horizontal, available, INF, preferred_in,
            );
            prop_assert!(preferred >= minimum, "preferred {} below minimum {}", preferred, minimum);
            prop_assert!(preferred <= maximum, "preferred {} above maximum {}", preferred, maximum);
        }

        #[test]
        fn describe_depends_only_on_shape(weights in proptest::collection::vec(1i32..500, 4)) {
            let t1 = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), weights[0], weights[1]);
            let t2 = two_leaf_tree(StubPart::new("a"), StubPart::new("b"), weights[2], weights[3]);
            prop_assert_eq!(t1.describe_layout(), t2.describe_layout());
        }
    }
}
