//! Shared test fixtures.

use std::cell::Cell;
use std::rc::Rc;

use sashdock_core::Rect;

use crate::item::{LayoutItem, PartKind};
use crate::size::{Axis, INF, SizeFlags};

/// Scripted content item for driving the tree in tests.
///
/// Size behavior is configured through the builder methods; the shared
/// [`StubHandles`] let a test observe calls after the part has been
/// boxed into the tree.
pub(crate) struct StubPart {
    label: String,
    min: i32,
    max: i32,
    quantum: Option<i32>,
    wrap_area: Option<i32>,
    placeholder: bool,
    compressible: bool,
    kind: PartKind,
    measures: Rc<Cell<u32>>,
    bounds: Rc<Cell<Option<Rect>>>,
    bounds_sets: Rc<Cell<u32>>,
    shown: Rc<Cell<Option<bool>>>,
}

/// Observation handles shared with a [`StubPart`].
pub(crate) struct StubHandles {
    pub measures: Rc<Cell<u32>>,
    pub bounds: Rc<Cell<Option<Rect>>>,
    pub bounds_sets: Rc<Cell<u32>>,
    pub shown: Rc<Cell<Option<bool>>>,
}

impl StubPart {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            min: 0,
            max: INF,
            quantum: None,
            wrap_area: None,
            placeholder: false,
            compressible: false,
            kind: PartKind::Panel,
            measures: Rc::new(Cell::new(0)),
            bounds: Rc::new(Cell::new(None)),
            bounds_sets: Rc::new(Cell::new(0)),
            shown: Rc::new(Cell::new(None)),
        }
    }

    pub fn with_min(mut self, min: i32) -> Self {
        self.min = min;
        self
    }

    pub fn with_max(mut self, max: i32) -> Self {
        self.max = max;
        self
    }

    /// Quantized preferred size: offered extents snap down to a multiple
    /// of `quantum` (and up to the minimum).
    pub fn with_quantum(mut self, quantum: i32) -> Self {
        self.quantum = Some(quantum);
        self
    }

    /// Wrapping minimum: the minimum extent is `area / perpendicular`.
    pub fn with_wrap_area(mut self, area: i32) -> Self {
        self.wrap_area = Some(area);
        self
    }

    pub fn placeholder(mut self) -> Self {
        self.placeholder = true;
        self
    }

    pub fn compressible(mut self) -> Self {
        self.compressible = true;
        self
    }

    pub fn main_content(mut self) -> Self {
        self.kind = PartKind::MainContent;
        self.compressible = true;
        self
    }

    pub fn handles(&self) -> StubHandles {
        StubHandles {
            measures: Rc::clone(&self.measures),
            bounds: Rc::clone(&self.bounds),
            bounds_sets: Rc::clone(&self.bounds_sets),
            shown: Rc::clone(&self.shown),
        }
    }

    fn min_for(&self, perpendicular: i32) -> i32 {
        match self.wrap_area {
            Some(area) if perpendicular > 0 && perpendicular != INF => {
                (area + perpendicular - 1) / perpendicular
            }
            _ => self.min,
        }
    }
}

impl LayoutItem for StubPart {
    fn size_flags(&self, _axis: Axis) -> SizeFlags {
        let mut flags = SizeFlags::empty();
        if self.min > 0 || self.wrap_area.is_some() {
            flags |= SizeFlags::HAS_MIN;
        }
        if self.max != INF {
            flags |= SizeFlags::HAS_MAX;
        }
        if self.quantum.is_some() {
            flags |= SizeFlags::FILL;
        }
        if self.wrap_area.is_some() {
            flags |= SizeFlags::WRAP;
        }
        flags
    }

    fn preferred_size(
        &self,
        _axis: Axis,
        available: i32,
        perpendicular: i32,
        preferred: i32,
    ) -> i32 {
        self.measures.set(self.measures.get() + 1);
        if available == 0 {
            return 0;
        }
        let min = self.min_for(perpendicular);
        if preferred == 0 {
            return min.min(available);
        }
        if preferred == INF && available == INF {
            return self.max;
        }
        let mut size = preferred.min(self.max);
        if let Some(quantum) = self.quantum {
            if size != INF && quantum > 1 {
                size = size / quantum * quantum;
            }
        }
        size.max(min).min(available)
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds.set(Some(bounds));
        self.bounds_sets.set(self.bounds_sets.get() + 1);
    }

    fn set_visible(&mut self, visible: bool) {
        self.shown.set(Some(visible));
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    fn is_compressible(&self) -> bool {
        self.compressible
    }

    fn kind(&self) -> PartKind {
        self.kind
    }
}
