// Panel layout engine: templates, the geometry store, dragging, the
// adaptive split, and per-section setup.

pub mod debounce;
pub mod drag;
pub mod setup;
pub mod split;
pub mod store;
pub mod template;

pub use debounce::{ResizeDebounce, RESIZE_DEBOUNCE};
pub use drag::{DragController, DragEnd, DragSession, DragSignal, PointerEvent};
pub use setup::{SectionPhase, SectionPlan, SetupChoice, SetupError, SetupPrompt};
pub use split::{compute_split, SplitBounds, SplitLayout, SplitLayoutParams, ViewMode};
pub use store::{Container, DragEndHook, LayoutError, Outcome, PanelInstance, PanelStore};
pub use template::{PanelConfig, SectionTemplate, SplitPanels, TemplateRegistry};
