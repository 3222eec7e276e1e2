// Application orchestrator: owns the workspace and runs the event loop.
//
// The loop is the single owner of `Workspace`. Commands arrive from the TUI,
// drag completions arrive from the panels' drag-end hook, and debounced
// resizes fire from a restartable deadline. Saves run in the background on
// an owned copy of the saved state, through a single ordered writer.

use std::sync::Arc;
use std::time::Duration;

use quill_core::layout::{DragEnd, DragEndHook, DragSignal, ResizeDebounce};
use quill_core::persist::{StateSaver, StateStore};
use quill_core::state::SavedState;
use quill_core::workspace::{EnterOutcome, Workspace};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::protocol::{LayoutSnapshot, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// Drag-end wiring
// ---------------------------------------------------------------------------

/// A drag-end hook that forwards completions to the app loop, and the
/// receiving end for `run`.
pub fn drag_end_channel() -> (DragEndHook, mpsc::UnboundedReceiver<DragEnd>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let hook: DragEndHook = Arc::new(move |end: &DragEnd| {
        let _ = tx.send(end.clone());
    });
    (hook, rx)
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub workspace: Workspace,
    saver: StateSaver,
    debounce: ResizeDebounce,
}

impl AppState {
    pub fn new(workspace: Workspace, store: Arc<dyn StateStore>, resize_debounce: Duration) -> Self {
        AppState {
            workspace,
            saver: StateSaver::spawn(store),
            debounce: ResizeDebounce::new(resize_debounce),
        }
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::from_workspace(&self.workspace)
    }

    fn save(&self, state: SavedState) {
        self.saver.save(state);
    }

    /// Wait for every save queued so far.
    pub async fn flush_saves(&self) {
        self.saver.flush().await;
    }

    /// Enter a section and tell the TUI what happened.
    pub async fn enter_section(&mut self, section: &str, ui_tx: &mpsc::Sender<UiUpdate>) {
        match self.workspace.enter_section(section) {
            Ok(EnterOutcome::Ready { .. }) => {
                let _ = ui_tx.send(UiUpdate::SetupClosed).await;
            }
            Ok(EnterOutcome::NeedsSetup(prompt)) => {
                let _ = ui_tx.send(UiUpdate::SetupRequested(prompt)).await;
            }
            Err(e) => {
                warn!("Cannot enter section: {}", e);
                return;
            }
        }
        self.push_layout(ui_tx).await;
    }

    /// The workspace committed the drag when it finished; persist it.
    pub fn handle_drag_end(&mut self, end: DragEnd) {
        debug!("Drag of '{}' ended at {:?}", end.panel_id, end.rect);
        self.save(self.workspace.persistable());
    }

    /// Apply the pending resize if its quiet period is over.
    pub fn apply_due_resize(&mut self, now: Instant) -> bool {
        match self.debounce.take_due(now) {
            Some(size) => {
                self.workspace.resize(size);
                true
            }
            None => false,
        }
    }

    /// Final save on the way out. Waits for it, unlike every other save.
    pub async fn shutdown(self) {
        self.flush_saves().await;
        if self.workspace.saved() != &SavedState::default() {
            self.save(self.workspace.persistable());
            info!("Final state save queued");
        }
        self.saver.close().await;
    }

    async fn push_layout(&self, ui_tx: &mpsc::Sender<UiUpdate>) {
        let _ = ui_tx
            .send(UiUpdate::Layout(Box::new(self.snapshot())))
            .await;
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop until `Quit` or until the TUI goes away.
///
/// Opens the first section, then listens on:
/// 1. User commands from the TUI
/// 2. Drag completions from the panels' drag-end hook
/// 3. The resize debounce deadline
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut drag_rx: mpsc::UnboundedReceiver<DragEnd>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let first = state
        .workspace
        .registry()
        .sections()
        .next()
        .map(|t| t.section.clone());
    match first {
        Some(section) => state.enter_section(&section, &ui_tx).await,
        None => warn!("No sections registered"),
    }

    let mut drag_open = true;

    loop {
        let deadline = state.debounce.deadline();
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Drag completions ---
            end = drag_rx.recv(), if drag_open => {
                match end {
                    Some(end) => {
                        state.handle_drag_end(end);
                        state.push_layout(&ui_tx).await;
                    }
                    None => drag_open = false,
                }
            }

            // --- Debounced resize ---
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if state.apply_due_resize(Instant::now()) {
                    state.push_layout(&ui_tx).await;
                }
            }
        }
    }

    // A drag can finish right before quit; save it ahead of the final save.
    while let Ok(end) = drag_rx.try_recv() {
        state.handle_drag_end(end);
    }
    state.shutdown().await;
    info!("Application event loop stopped");
    Ok(())
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::SwitchSection(section) => {
            info!("Switching to section '{}'", section);
            state.enter_section(&section, ui_tx).await;
        }
        UserCommand::Pointer(event) => {
            if state.workspace.pointer(event) != DragSignal::Ignored {
                state.push_layout(ui_tx).await;
            }
        }
        UserCommand::ToggleEditor => {
            let visible = state.workspace.toggle_editor();
            debug!("Editor visible: {}", visible);
            state.push_layout(ui_tx).await;
        }
        UserCommand::CycleViewMode => {
            let mode = state.workspace.cycle_view_mode();
            debug!("View mode: {}", mode.label());
            state.push_layout(ui_tx).await;
        }
        UserCommand::TogglePanel(id) => {
            if !state.workspace.toggle_panel(&id).applied() {
                debug!("Toggle ignored for unknown panel '{}'", id);
            }
            state.push_layout(ui_tx).await;
        }
        UserCommand::CycleFocus => {
            if state.workspace.cycle_focus().is_some() {
                state.push_layout(ui_tx).await;
            }
        }
        UserCommand::CompleteSetup { section, selected } => {
            match state.workspace.complete_setup(&section, &selected) {
                Ok(saved) => {
                    state.save(saved);
                    let _ = ui_tx.send(UiUpdate::SetupClosed).await;
                    state.push_layout(ui_tx).await;
                }
                Err(e) => warn!("Setup rejected: {}", e),
            }
        }
        UserCommand::RevertLayout => {
            let applied = state.workspace.revert_layout();
            info!("Reverted {} panels to saved layout", applied);
            state.push_layout(ui_tx).await;
        }
        UserCommand::Resize(size) => {
            state.debounce.bump(size, Instant::now());
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
