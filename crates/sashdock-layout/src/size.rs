//! Size sentinel arithmetic and per-axis size flags.
//!
//! All extents in the layout engine are `i32` pixel counts, with one
//! reserved sentinel [`INF`] meaning "unbounded". Arithmetic that may touch
//! the sentinel must go through the saturating [`add`]/[`subtract`] helpers
//! so an unbounded size never silently decays into a large-but-finite
//! number.

use bitflags::bitflags;

/// Sentinel meaning "unbounded" in all size computations.
pub const INF: i32 = i32::MAX;

/// Add two sizes, saturating to [`INF`] when either operand is unbounded.
#[inline]
pub fn add(a: i32, b: i32) -> i32 {
    if a == INF || b == INF {
        return INF;
    }
    a + b
}

/// Subtract a finite size `b` from `a`, saturating to [`INF`] when `a` is
/// unbounded. The result may be negative.
#[inline]
pub fn subtract(a: i32, b: i32) -> i32 {
    debug_assert!((0..INF).contains(&b), "subtrahend must be finite: {b}");
    add(a, -b)
}

/// Fail-fast guard for values entering size arithmetic: a size is either
/// the [`INF`] sentinel or small enough that additions cannot reach the
/// sentinel range.
#[inline]
pub fn assert_valid_size(v: i32) {
    debug_assert!(
        v >= 0 && (v == INF || v < INF / 2),
        "invalid size: {v}"
    );
}

bitflags! {
    /// Per-axis size behavior, reported by content and aggregated up the
    /// split tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SizeFlags: u8 {
        /// The subtree has a minimum size along the axis.
        const HAS_MIN = 1 << 0;
        /// The subtree has a maximum size along the axis.
        const HAS_MAX = 1 << 1;
        /// The minimum size depends on the perpendicular extent
        /// (wrapping content).
        const WRAP = 1 << 2;
        /// The preferred size is quantized: the content may adjust an
        /// offered size rather than accept it verbatim.
        const FILL = 1 << 3;
    }
}

/// A layout axis. `Horizontal` measures widths, `Vertical` heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// The other axis.
    #[inline]
    #[must_use]
    pub const fn perpendicular(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Axis::Horizontal => 0,
            Axis::Vertical => 1,
        }
    }
}
