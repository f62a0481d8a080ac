//! Content capability contract for tree leaves.
//!
//! The split tree treats everything placed in it as an opaque strategy
//! object behind [`LayoutItem`]: it never looks past this trait. Parts are
//! addressed by [`PartId`], a stable non-zero identifier allocated by the
//! container so structural operations and persistence records can refer to
//! content without borrowing it.

use std::fmt;

use sashdock_core::Rect;
use serde::{Deserialize, Serialize};

use crate::size::{Axis, SizeFlags};

/// Stable identifier for a part placed in the split tree.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(u64);

impl PartId {
    /// Lowest valid part ID.
    pub const MIN: Self = Self(1);

    /// Create a new part ID, rejecting 0.
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

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a part, used to resolve docking ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    /// An ordinary dockable panel.
    #[default]
    Panel,
    /// The distinguished main-content region. Gives up less space to
    /// panels docked against it and absorbs resizes in preference to
    /// its siblings.
    MainContent,
}

/// Capability contract for content placed in the split tree.
///
/// Implementations wrap whatever the embedding system puts in a panel; the
/// engine only ever asks for size behavior and pushes bounds/visibility
/// down.
pub trait LayoutItem {
    /// Size behavior flags along `axis`.
    fn size_flags(&self, axis: Axis) -> SizeFlags;

    /// Preferred extent along `axis` given the available space.
    ///
    /// The result must lie in `[0, available]`. `available == INF` with
    /// `preferred == INF` asks for the maximum size; `preferred == 0` asks
    /// for the minimum.
    fn preferred_size(&self, axis: Axis, available: i32, perpendicular: i32, preferred: i32)
    -> i32;

    /// Position and size the content.
    fn set_bounds(&mut self, bounds: Rect);

    /// Show or hide the content.
    fn set_visible(&mut self, visible: bool);

    /// Label used by layout descriptions.
    fn label(&self) -> &str;

    /// True for a reserved position whose content is not materialized.
    /// Placeholders are skipped by layout and contribute no size.
    fn is_placeholder(&self) -> bool {
        false
    }

    /// True if this content should absorb available-space changes in
    /// preference to its siblings.
    fn is_compressible(&self) -> bool {
        false
    }

    /// Role used to resolve docking ratios.
    fn kind(&self) -> PartKind {
        PartKind::Panel
    }
}

#[cfg(test)]
mod tests {
    use super::{PartId, PartKind};

    #[test]
    fn zero_part_id_is_rejected() {
        assert!(PartId::new(0).is_none());
        assert_eq!(PartId::new(7).map(PartId::get), Some(7));
    }

    #[test]
    fn part_ids_are_ordered() {
        let a = PartId::MIN;
        let b = a.next();
        assert!(a < b);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn part_id_serializes_transparently() {
        let id = PartId::new(42).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: PartId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn part_kind_default_is_panel() {
        assert_eq!(PartKind::default(), PartKind::Panel);
    }
}
