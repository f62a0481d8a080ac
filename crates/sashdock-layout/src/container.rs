//! The split container.
//!
//! [`SashContainer`] owns the tree root, allocates part and sash IDs, and
//! translates high-level docking requests (drop side + target part +
//! ratio) into tree surgery and weight computations. It is the surface
//! the embedding drag-and-drop layer and layout-definition code talk to;
//! the tree itself stays a pure data structure.

use sashdock_core::{Point, Rect};

use crate::item::{LayoutItem, PartId, PartKind};
use crate::sash::{Sash, SashDragEvent, SashFactory, SashId, UniformSashFactory};
use crate::size::{Axis, SizeFlags};
use crate::tree::{LayoutTree, NeighborSashes, NodeKey, RelationRecord, Relationship};

/// Fraction of the available space handed to a newly docked part: a
/// panel dropped on the main-content region takes a quarter, every other
/// pairing splits evenly. A pure function of the two roles, never of
/// geometry.
pub fn docking_ratio(source: PartKind, target: PartKind) -> f32 {
    if source == PartKind::Panel && target == PartKind::MainContent {
        0.25
    } else {
        0.5
    }
}

/// Owns a split tree and exposes its structural operations.
pub struct SashContainer {
    tree: LayoutTree,
    bounds: Rect,
    factory: Box<dyn SashFactory>,
    next_part: PartId,
    next_sash: SashId,
}

impl SashContainer {
    /// Create an empty container backed by the given sash factory.
    pub fn new(factory: Box<dyn SashFactory>) -> Self {
        Self {
            tree: LayoutTree::new(),
            bounds: Rect::default(),
            factory,
            next_part: PartId::MIN,
            next_sash: SashId::MIN,
        }
    }

    /// Create an empty container with fixed-thickness sashes.
    pub fn with_thickness(thickness: i32) -> Self {
        Self::new(Box::new(UniformSashFactory(thickness)))
    }

    /// The owned tree, for read-only inspection.
    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn parts(&self) -> Vec<PartId> {
        self.tree.parts()
    }

    pub fn contains(&self, part: PartId) -> bool {
        self.tree.contains_part(part)
    }

    /// Borrow the content of a part.
    pub fn item(&self, part: PartId) -> Option<&dyn LayoutItem> {
        self.tree.item(part)
    }

    /// Mutably borrow the content of a part.
    pub fn item_mut(&mut self, part: PartId) -> Option<&mut dyn LayoutItem> {
        self.tree.item_mut(part)
    }

    /// Set the reading direction for child-size computation.
    pub fn set_left_to_right(&mut self, left_to_right: bool) {
        self.tree.set_left_to_right(left_to_right);
    }

    // -----------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------

    /// Assign the container's client area and lay out the whole tree.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.relayout();
    }

    fn relayout(&mut self) {
        if let Some(root) = self.tree.root() {
            self.tree.set_bounds(root, self.bounds);
        }
    }

    /// Preferred extent of the whole container along `axis`. An empty
    /// container accepts whatever is offered.
    pub fn compute_preferred_size(
        &mut self,
        axis: Axis,
        available: i32,
        perpendicular: i32,
        preferred: i32,
    ) -> i32 {
        match self.tree.root() {
            Some(root) => self
                .tree
                .compute_preferred_size(root, axis, available, perpendicular, preferred),
            None => preferred,
        }
    }

    /// Aggregated size flags of the whole container along `axis`.
    pub fn size_flags(&mut self, axis: Axis) -> SizeFlags {
        match self.tree.root() {
            Some(root) => self.tree.size_flags(root, axis),
            None => SizeFlags::empty(),
        }
    }

    // -----------------------------------------------------------------
    // Structural operations
    // -----------------------------------------------------------------

    /// Add a part beside the bottom-right-most one, splitting evenly.
    pub fn add(&mut self, item: Box<dyn LayoutItem>) -> PartId {
        let relative = self.tree.bottom_right_part();
        self.add_relative(item, Relationship::Right, 0.5, relative)
    }

    /// Add a part on the given side of `relative`, handing it `ratio` of
    /// the space measured there.
    pub fn add_relative(
        &mut self,
        item: Box<dyn LayoutItem>,
        side: Relationship,
        ratio: f32,
        relative: Option<PartId>,
    ) -> PartId {
        // Weights are stored for the upper-left side of the split.
        let upper_left_ratio = match side {
            Relationship::Right | Relationship::Bottom => 1.0 - ratio,
            Relationship::Left | Relationship::Top => ratio,
        };
        let horizontal = matches!(side, Relationship::Left | Relationship::Right);
        let anchor = relative.and_then(|p| self.tree.find_leaf(p));
        let total = self.measure_tree(self.bounds, anchor, horizontal);
        let left = (total as f32 * upper_left_ratio) as i32;
        let right = total - left;
        self.add_with_weights(item, side, left, right, relative)
    }

    /// Add a part with explicit pixel weights for the two sides of the
    /// new split. This is the replay path for persisted relation records.
    pub fn add_with_weights(
        &mut self,
        mut item: Box<dyn LayoutItem>,
        side: Relationship,
        left: i32,
        right: i32,
        relative: Option<PartId>,
    ) -> PartId {
        let id = self.allocate_part();
        item.set_visible(true);
        if self.tree.is_empty() {
            self.tree.set_root(id, item);
        } else {
            let orientation = side.orientation();
            let mut sash = Sash::new(
                self.allocate_sash(),
                orientation,
                self.factory.thickness(orientation),
            );
            sash.set_sizes(left, right);
            self.factory.sash_created(&sash);
            self.tree.insert(id, item, side.places_first(), sash, relative);
        }
        self.relayout();
        id
    }

    /// Remove a part, collapsing the split that held it.
    pub fn remove(&mut self, part: PartId) -> Option<Box<dyn LayoutItem>> {
        let removed = self.tree.remove(part)?;
        if let Some(sash) = &removed.sash {
            self.factory.sash_disposed(sash.id());
        }
        let mut item = removed.item;
        item.set_visible(false);
        self.relayout();
        Some(item)
    }

    /// Swap a part's payload in place, with no tree restructuring.
    /// Returns the new part's ID and the old content.
    pub fn replace(
        &mut self,
        old: PartId,
        mut item: Box<dyn LayoutItem>,
    ) -> Option<(PartId, Box<dyn LayoutItem>)> {
        if !self.tree.contains_part(old) {
            return None;
        }
        let id = self.allocate_part();
        item.set_visible(true);
        let mut previous = self.tree.replace(old, id, item)?;
        previous.set_visible(false);
        self.relayout();
        Some((id, previous))
    }

    /// Strip every sash from layout (the deactivation path); their
    /// widgets can be torn down by the factory.
    pub fn dispose_sashes(&mut self) {
        for id in self.tree.hide_sashes() {
            self.factory.sash_disposed(id);
        }
    }

    /// All sash IDs currently in the tree.
    pub fn sashes(&self) -> Vec<SashId> {
        self.tree.sashes()
    }

    // -----------------------------------------------------------------
    // Queries for the drag layer
    // -----------------------------------------------------------------

    /// Hit-test a point against the visible leaves.
    pub fn find_part(&self, point: Point) -> Option<PartId> {
        self.tree.part_at(point)
    }

    /// The split node owning a sash.
    pub fn find_sash(&self, sash: SashId) -> Option<NodeKey> {
        self.tree.find_sash(sash)
    }

    /// Borrow a sash by ID.
    pub fn sash(&self, sash: SashId) -> Option<&Sash> {
        self.tree.sash(sash)
    }

    /// Collect the visible sashes bordering a part.
    pub fn find_sashes(&self, part: PartId) -> NeighborSashes {
        self.tree.find_sashes(part)
    }

    /// The deepest node whose subtree contains both parts.
    pub fn find_common_parent(&self, a: PartId, b: PartId) -> Option<NodeKey> {
        self.tree.common_ancestor(a, b)
    }

    /// Docking ratio for dragging `source` onto `target`, looked up from
    /// the parts' roles. Unknown parts count as ordinary panels.
    pub fn docking_ratio_between(&self, source: PartId, target: PartId) -> f32 {
        let kind_of = |part| {
            self.tree
                .item(part)
                .map(|item| item.kind())
                .unwrap_or_default()
        };
        docking_ratio(kind_of(source), kind_of(target))
    }

    /// Snap a proposed sash position to one both children accept, writing
    /// the corrected position back into the event.
    pub fn constrain_sash_drag(&mut self, sash: SashId, event: &mut SashDragEvent) {
        let Some(node) = self.tree.find_sash(sash) else {
            return;
        };
        let Some(bounds) = self.tree.node_bounds(node) else {
            return;
        };
        let Some((horizontal, thickness)) = self
            .tree
            .node_sash(node)
            .map(|s| (s.is_horizontal(), s.thickness()))
        else {
            return;
        };

        // Normalize to vertical-sash terms.
        let (node_bounds, pos) = if horizontal {
            (bounds.flip_xy(), Point::new(event.x, event.y).flip_xy())
        } else {
            (bounds, Point::new(event.x, event.y))
        };
        if node_bounds.width <= thickness {
            return;
        }

        let left = (pos.x - node_bounds.x).clamp(0, node_bounds.width - thickness);
        let right = node_bounds.width - left - thickness;
        let sizes = self.tree.compute_child_sizes(
            node,
            node_bounds.width,
            node_bounds.height,
            left,
            right,
            node_bounds.width,
        );

        let mut accepted = Point::new(node_bounds.x + sizes.left, pos.y);
        if horizontal {
            accepted = accepted.flip_xy();
        }
        event.x = accepted.x;
        event.y = accepted.y;
    }

    /// Record the final sash position of a completed drag and re-layout.
    pub fn complete_sash_drag(&mut self, sash: SashId, position: Point) {
        let Some(node) = self.tree.find_sash(sash) else {
            return;
        };
        let Some(bounds) = self.tree.node_bounds(node) else {
            return;
        };
        let Some((vertical, thickness)) = self
            .tree
            .node_sash(node)
            .map(|s| (s.is_vertical(), s.thickness()))
        else {
            return;
        };

        let (left, right) = if vertical {
            let x = position.x - bounds.x;
            (x, bounds.width - x - thickness)
        } else {
            let y = position.y - bounds.y;
            (y, bounds.height - y - thickness)
        };
        if self.tree.set_sash_sizes(sash, left, right) {
            self.relayout();
        }
    }

    // -----------------------------------------------------------------
    // Persistence and diagnostics
    // -----------------------------------------------------------------

    /// Flatten the tree into relation records for an external
    /// persistence writer.
    pub fn compute_relation(&self) -> Vec<RelationRecord> {
        self.tree.compute_relation()
    }

    /// Deterministic, human-readable encoding of the visible tree shape.
    pub fn describe_layout(&self) -> String {
        self.tree.describe_layout()
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn allocate_part(&mut self) -> PartId {
        let id = self.next_part;
        self.next_part = id.next();
        id
    }

    fn allocate_sash(&mut self) -> SashId {
        let id = self.next_sash;
        self.next_sash = id.next();
        id
    }

    /// Pixel extent available at `node` along the given axis, walking up
    /// through ancestor sashes and accounting for fixed-size siblings.
    fn measure_tree(&self, outer: Rect, node: Option<NodeKey>, horizontal: bool) -> i32 {
        fn dimension(rect: Rect, horizontal: bool) -> i32 {
            if horizontal { rect.width } else { rect.height }
        }

        let Some(node) = node else {
            return dimension(outer, horizontal);
        };
        let Some(parent) = self.tree.parent(node) else {
            return dimension(outer, horizontal);
        };
        let Some(sash) = self.tree.node_sash(parent) else {
            return dimension(outer, horizontal);
        };

        // A sash along the measured axis doesn't divide it.
        if sash.is_horizontal() == horizontal {
            return self.measure_tree(outer, Some(parent), horizontal);
        }

        let Some((left_child, right_child)) = self.tree.children(parent) else {
            return dimension(outer, horizontal);
        };
        let is_left = left_child == node;
        let other = if is_left { right_child } else { left_child };
        if !self.tree.is_visible(other) {
            return self.measure_tree(outer, Some(parent), horizontal);
        }

        let left = sash.left();
        let right = sash.right();
        let child_size = if is_left { left } else { right };

        // Normalize: 1 = this child is fixed, -1 = the sibling is fixed.
        let mut bias = self.tree.compression_bias(parent);
        if is_left {
            bias = -bias;
        }
        if bias == 1 {
            return child_size;
        }
        if bias == -1 {
            return self.measure_tree(outer, Some(parent), horizontal) - (left + right - child_size);
        }

        let total = left + right;
        if total == 0 {
            // No recorded weights yet; assume an even split.
            return self.measure_tree(outer, Some(parent), horizontal) / 2;
        }
        let parent_measure = i64::from(self.measure_tree(outer, Some(parent), horizontal));
        (parent_measure * i64::from(child_size) / i64::from(total)) as i32
    }
}
