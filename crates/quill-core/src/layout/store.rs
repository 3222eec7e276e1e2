// Panel geometry store: the authoritative set of mounted panels.
//
// Each instance keeps its template config untouched and carries a separate
// live geometry record. Drags, splits and restores only ever change the
// live record, and snapshots read only the live record.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::drag::DragEnd;
use super::template::PanelConfig;
use crate::geometry::{Point, Rect, Size};
use crate::state::{PanelSnapshot, SectionLayoutState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("panel `{id}` already exists")]
    DuplicatePanel { id: String },
}

/// Result of a best-effort layout operation. Callers doing cosmetic work
/// (show/hide/remove on a possibly stale id) are expected to ignore
/// `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    NotFound,
}

impl Outcome {
    pub fn applied(self) -> bool {
        self == Outcome::Applied
    }
}

/// The surface panels are mounted into. One container per section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub bounds: Size,
}

impl Container {
    pub fn new(name: &str, bounds: Size) -> Self {
        Container {
            name: name.to_string(),
            bounds,
        }
    }
}

/// Opaque reference to whatever renders a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

/// Called when a drag of the panel finishes.
pub type DragEndHook = Arc<dyn Fn(&DragEnd) + Send + Sync>;

/// A live, mounted panel.
pub struct PanelInstance {
    config: PanelConfig,
    rect: Rect,
    hidden: bool,
    z: u32,
    surface: SurfaceHandle,
    container: String,
    on_drag_end: Option<DragEndHook>,
}

impl PanelInstance {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    /// The config the panel was created from (never mutated).
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn z(&self) -> u32 {
        self.z
    }

    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub(crate) fn drag_end_hook(&self) -> Option<&DragEndHook> {
        self.on_drag_end.as_ref()
    }

    fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            id: self.config.id.clone(),
            title: self.config.title.clone(),
            x: self.rect.x,
            y: self.rect.y,
            width: self.rect.width,
            height: self.rect.height,
        }
    }
}

impl fmt::Debug for PanelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelInstance")
            .field("id", &self.config.id)
            .field("rect", &self.rect)
            .field("hidden", &self.hidden)
            .field("z", &self.z)
            .field("container", &self.container)
            .field("has_drag_end_hook", &self.on_drag_end.is_some())
            .finish()
    }
}

/// All mounted panels, in insertion order.
#[derive(Debug)]
pub struct PanelStore {
    panels: Vec<PanelInstance>,
    next_surface: u64,
    /// Rows at the top of each panel that start a drag.
    header_rows: i32,
}

impl Default for PanelStore {
    fn default() -> Self {
        PanelStore::new()
    }
}

impl PanelStore {
    pub fn new() -> Self {
        PanelStore {
            panels: Vec::new(),
            next_surface: 1,
            header_rows: 1,
        }
    }

    pub fn with_header_rows(mut self, rows: i32) -> Self {
        self.header_rows = rows.max(1);
        self
    }

    /// Mount a panel at `config`'s geometry, clamped into the container.
    ///
    /// Rejects an id that is already mounted; the existing panel is left
    /// exactly as it was.
    pub fn create_panel(
        &mut self,
        config: &PanelConfig,
        container: &Container,
        on_drag_end: Option<DragEndHook>,
    ) -> Result<&PanelInstance, LayoutError> {
        if self.contains(&config.id) {
            return Err(LayoutError::DuplicatePanel {
                id: config.id.clone(),
            });
        }

        let z = self.highest_z_order() + 1;
        let surface = SurfaceHandle(self.next_surface);
        self.next_surface += 1;

        debug!(
            "Creating panel '{}' in '{}' at {:?}",
            config.id,
            container.name,
            config.rect()
        );
        self.panels.push(PanelInstance {
            config: config.clone(),
            rect: config.rect().clamped_to(container.bounds),
            hidden: config.hidden,
            z,
            surface,
            container: container.name.clone(),
            on_drag_end,
        });
        let idx = self.panels.len() - 1;
        Ok(&self.panels[idx])
    }

    pub fn remove_panel(&mut self, id: &str) -> Outcome {
        match self.index_of(id) {
            Some(idx) => {
                self.panels.remove(idx);
                Outcome::Applied
            }
            None => Outcome::NotFound,
        }
    }

    /// Remove every panel mounted into `container`. Returns how many went.
    pub fn clear_all(&mut self, container: &Container) -> usize {
        let before = self.panels.len();
        self.panels.retain(|p| p.container != container.name);
        before - self.panels.len()
    }

    pub fn show(&mut self, id: &str) -> Outcome {
        self.with_panel(id, |p| p.hidden = false)
    }

    pub fn hide(&mut self, id: &str) -> Outcome {
        self.with_panel(id, |p| p.hidden = true)
    }

    pub fn toggle(&mut self, id: &str) -> Outcome {
        self.with_panel(id, |p| p.hidden = !p.hidden)
    }

    /// Set a panel's geometry, clamped into `bounds`.
    pub fn set_rect(&mut self, id: &str, rect: Rect, bounds: Size) -> Outcome {
        self.with_panel(id, |p| p.rect = rect.clamped_to(bounds))
    }

    /// Move a panel's top-left corner, keeping its size, clamped into
    /// `bounds`.
    pub fn move_to(&mut self, id: &str, x: i32, y: i32, bounds: Size) -> Outcome {
        self.with_panel(id, |p| p.rect = p.rect.placed_within(x, y, bounds))
    }

    /// Change a panel's size, keeping its corner where possible.
    pub fn resize_panel(&mut self, id: &str, width: i32, height: i32, bounds: Size) -> Outcome {
        self.with_panel(id, |p| {
            p.rect = Rect::new(p.rect.x, p.rect.y, width.max(0), height.max(0)).clamped_to(bounds)
        })
    }

    /// Bring a panel above every other panel.
    pub fn raise(&mut self, id: &str) -> Outcome {
        let top = self.highest_z_order() + 1;
        self.with_panel(id, |p| p.z = top)
    }

    pub fn get(&self, id: &str) -> Option<&PanelInstance> {
        self.panels.iter().find(|p| p.config.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PanelInstance> {
        self.panels.iter()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Current live geometry of every panel, in insertion order.
    pub fn snapshot(&self) -> SectionLayoutState {
        self.panels.iter().map(PanelInstance::snapshot).collect()
    }

    /// Apply saved geometry to panels that are already mounted.
    ///
    /// Entries without a matching panel are dropped; restore never mounts
    /// anything. Geometry is clamped into the container. Returns how many
    /// panels were updated.
    pub fn restore(&mut self, state: &[PanelSnapshot], container: &Container) -> usize {
        let mut applied = 0;
        for entry in state {
            let outcome = self.set_rect(&entry.id, entry.rect(), container.bounds);
            if outcome.applied() {
                applied += 1;
            } else {
                debug!("Restore skipped unknown panel '{}'", entry.id);
            }
        }
        applied
    }

    /// Re-fit every panel in `container` after its bounds changed.
    pub fn clamp_all(&mut self, container: &Container) {
        for p in self.panels.iter_mut().filter(|p| p.container == container.name) {
            p.rect = p.rect.clamped_to(container.bounds);
        }
    }

    /// Highest stacking order among mounted panels; 0 when empty.
    pub fn highest_z_order(&self) -> u32 {
        self.panels.iter().map(|p| p.z).max().unwrap_or(0)
    }

    /// Topmost visible panel under `point`.
    pub fn panel_at(&self, point: Point) -> Option<&PanelInstance> {
        self.topmost(|p| p.rect.contains(point))
    }

    /// Topmost visible panel whose header row(s) are under `point`.
    pub fn header_at(&self, point: Point) -> Option<&PanelInstance> {
        let rows = self.header_rows;
        self.topmost(|p| {
            let header = Rect::new(p.rect.x, p.rect.y, p.rect.width, rows.min(p.rect.height));
            header.contains(point)
        })
    }

    // Later-inserted panels win ties in z because `max_by_key` keeps the
    // last maximum.
    fn topmost(&self, hit: impl Fn(&PanelInstance) -> bool) -> Option<&PanelInstance> {
        self.panels
            .iter()
            .filter(|p| !p.hidden && hit(p))
            .max_by_key(|p| p.z)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.panels.iter().position(|p| p.config.id == id)
    }

    fn with_panel(&mut self, id: &str, f: impl FnOnce(&mut PanelInstance)) -> Outcome {
        match self.panels.iter_mut().find(|p| p.config.id == id) {
            Some(p) => {
                f(p);
                Outcome::Applied
            }
            None => Outcome::NotFound,
        }
    }
}
