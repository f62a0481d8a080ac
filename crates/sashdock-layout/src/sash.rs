//! The draggable divider between two subtrees of a split.
//!
//! A [`Sash`] stores pure layout state: orientation, the last persisted
//! pixel allocation of its two sides (used both as the preferred split
//! point and as redistribution weights), and enabled/visible flags. The
//! platform widget that renders and drags it lives behind [`SashFactory`]
//! in the embedding system.

use std::fmt;

use sashdock_core::Rect;
use serde::{Deserialize, Serialize};

use crate::size::Axis;

/// Stable identifier for a sash, so the embedding drag layer can address
/// one without borrowing the tree.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SashId(u64);

impl SashId {
    /// Lowest valid sash ID.
    pub const MIN: Self = Self(1);

    /// Create a new sash ID, rejecting 0.
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Orientation of a sash line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// A vertical line; splits the horizontal axis (children side by side).
    Vertical,
    /// A horizontal line; splits the vertical axis (children stacked).
    Horizontal,
}

/// A draggable separator between the two children of a split node.
#[derive(Debug, Clone)]
pub struct Sash {
    id: SashId,
    orientation: Orientation,
    /// Last persisted pixel allocation of the left/top side.
    left: i32,
    /// Last persisted pixel allocation of the right/bottom side.
    right: i32,
    thickness: i32,
    enabled: bool,
    visible: bool,
    bounds: Rect,
}

impl Sash {
    /// Create a sash with no recorded allocation yet.
    pub fn new(id: SashId, orientation: Orientation, thickness: i32) -> Self {
        Self {
            id,
            orientation,
            left: 0,
            right: 0,
            thickness: thickness.max(0),
            enabled: false,
            visible: false,
            bounds: Rect::default(),
        }
    }

    pub fn id(&self) -> SashId {
        self.id
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation == Orientation::Vertical
    }

    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    /// Which axis this sash divides: a vertical line splits widths, a
    /// horizontal line splits heights.
    pub fn splits(&self, axis: Axis) -> bool {
        match self.orientation {
            Orientation::Vertical => axis == Axis::Horizontal,
            Orientation::Horizontal => axis == Axis::Vertical,
        }
    }

    /// Pixel allocation recorded for the left/top side.
    pub fn left(&self) -> i32 {
        self.left
    }

    /// Pixel allocation recorded for the right/bottom side.
    pub fn right(&self) -> i32 {
        self.right
    }

    /// Pixel thickness of the sash line.
    pub fn thickness(&self) -> i32 {
        self.thickness
    }

    /// Record a new pixel allocation for the two sides.
    ///
    /// Negative values are rejected. Returns true if the allocation
    /// changed; the caller is responsible for flushing caches when it did.
    pub fn set_sizes(&mut self, left: i32, right: i32) -> bool {
        if left < 0 || right < 0 {
            return false;
        }
        if left == self.left && right == self.right {
            return false;
        }
        self.left = left;
        self.right = right;
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Bounds assigned by the last layout pass.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }
}

/// Creates and retires the platform widgets standing behind sashes, and
/// reports their metrics.
///
/// Drag-delta events from those widgets are routed back through the
/// container's drag entry points.
pub trait SashFactory {
    /// Pixel thickness of a sash line for the given orientation.
    fn thickness(&self, orientation: Orientation) -> i32;

    /// A sash was added to the tree.
    fn sash_created(&mut self, _sash: &Sash) {}

    /// A sash left the tree; its widget can be torn down.
    fn sash_disposed(&mut self, _id: SashId) {}
}

/// Fixed-thickness metrics for embeddings without a widget toolkit
/// (tests, headless layout).
#[derive(Debug, Clone, Copy)]
pub struct UniformSashFactory(pub i32);

impl SashFactory for UniformSashFactory {
    fn thickness(&self, _orientation: Orientation) -> i32 {
        self.0
    }
}

/// A proposed sash position during a drag, in container coordinates.
///
/// The container writes the accepted position back into the event so the
/// visual tracker never shows a position the layout would reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SashDragEvent {
    pub x: i32,
    pub y: i32,
}
