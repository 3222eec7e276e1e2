// Adaptive list/editor split for two-pane sections.
//
// The editor gets most of the width but never less than its readable
// minimum; the list keeps its own floor. The importance view groups cards
// side by side, so it leaves the list a little more room.

use crate::geometry::{Rect, Size};

/// Sub-view of the list panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Card,
    Importance,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Card => "card",
            ViewMode::Importance => "importance",
        }
    }

    /// Next mode in list -> card -> importance -> list order.
    pub fn next(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Card,
            ViewMode::Card => ViewMode::Importance,
            ViewMode::Importance => ViewMode::List,
        }
    }
}

/// Inputs to one split computation. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLayoutParams {
    pub container: Size,
    pub view_mode: ViewMode,
    pub editor_visible: bool,
}

/// Size limits for the split, in layout units. Fractions are per-mille so
/// the arithmetic stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitBounds {
    pub min_editor_width: i32,
    pub min_list_width: i32,
    pub gap: i32,
    pub max_editor_permille: i32,
    pub importance_max_editor_permille: i32,
}

impl Default for SplitBounds {
    /// Pixel units.
    fn default() -> Self {
        SplitBounds {
            min_editor_width: 320,
            min_list_width: 280,
            gap: 10,
            max_editor_permille: 700,
            importance_max_editor_permille: 650,
        }
    }
}

impl SplitBounds {
    /// Terminal cell units (one cell is roughly ten pixels wide).
    pub fn cells() -> Self {
        SplitBounds {
            min_editor_width: 32,
            min_list_width: 28,
            gap: 1,
            ..SplitBounds::default()
        }
    }

    fn max_editor_permille(&self, mode: ViewMode) -> i32 {
        match mode {
            ViewMode::Importance => self.importance_max_editor_permille,
            ViewMode::List | ViewMode::Card => self.max_editor_permille,
        }
    }
}

/// Computed geometry for the two panels. `editor` is `None` when the
/// editor is hidden and must be left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLayout {
    pub list: Rect,
    pub editor: Option<Rect>,
}

/// Compute the list/editor split for a container.
pub fn compute_split(params: SplitLayoutParams, bounds: &SplitBounds) -> SplitLayout {
    let w = params.container.width.max(0);
    let h = params.container.height.max(0);

    if !params.editor_visible {
        return SplitLayout {
            list: Rect::new(0, 0, w, h),
            editor: None,
        };
    }

    // The editor takes its full share of the width, never less than its
    // minimum; the list gets the remainder, subject to its own floor.
    let permille = bounds.max_editor_permille(params.view_mode);
    let editor_width = floor_permille(w, permille).max(bounds.min_editor_width);
    let list_width = clamp_low_wins(w - editor_width - bounds.gap, bounds.min_list_width, w);

    SplitLayout {
        list: Rect::new(0, 0, list_width, h),
        editor: Some(Rect::new(list_width + bounds.gap, 0, editor_width, h)),
    }
}

fn floor_permille(w: i32, permille: i32) -> i32 {
    ((w as i64 * permille as i64) / 1000) as i32
}

/// `max(lo, min(hi, v))`: when the bounds cross, the floor wins.
fn clamp_low_wins(v: i32, lo: i32, hi: i32) -> i32 {
    v.min(hi).max(lo)
}
