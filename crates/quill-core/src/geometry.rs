// Plain geometry records shared by the layout engine.
//
// All values are layout units (pixels in a desktop host, cells in the
// terminal shell). Pointer positions may be negative or past the container
// edge; panel geometry is kept non-negative by clamping.

use serde::{Deserialize, Serialize};

/// A pointer position relative to the container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// Container dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Size { width, height }
    }
}

/// Position and size of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Whether the rect lies entirely inside a container of `bounds`.
    pub fn fits_within(&self, bounds: Size) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= bounds.width && self.bottom() <= bounds.height
    }

    /// Move the rect so its top-left corner is at `(x, y)`, clamped so the
    /// whole rect stays inside `bounds`.
    ///
    /// When the rect is larger than the container on an axis, that axis is
    /// pinned to 0 and the overflow hangs off the far edge.
    pub fn placed_within(&self, x: i32, y: i32, bounds: Size) -> Rect {
        Rect {
            x: clamp_axis(x, bounds.width - self.width),
            y: clamp_axis(y, bounds.height - self.height),
            width: self.width,
            height: self.height,
        }
    }

    /// Clamp both position and size into `bounds`. Sizes shrink only when
    /// the rect cannot fit at all; otherwise the rect is slid back inside.
    pub fn clamped_to(&self, bounds: Size) -> Rect {
        let width = self.width.clamp(0, bounds.width.max(0));
        let height = self.height.clamp(0, bounds.height.max(0));
        Rect {
            width,
            height,
            ..*self
        }
        .placed_within(self.x, self.y, bounds)
    }
}

/// `0 <= v <= max`, with the lower bound winning when `max < 0`.
fn clamp_axis(v: i32, max: i32) -> i32 {
    v.min(max).max(0)
}
