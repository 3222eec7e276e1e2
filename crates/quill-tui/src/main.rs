// Quill entry point.
//
// Startup sequence:
// 1. Load config (before tracing: the log directory comes from it)
// 2. Initialize tracing (log to file, not terminal)
// 3. Load saved state
// 4. Build the workspace for the current terminal size
// 5. Create mpsc channels
// 6. Spawn app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use quill_core::config;
use quill_core::layout::{SplitBounds, TemplateRegistry};
use quill_core::persist::{JsonFileStore, StateStore};
use quill_core::workspace::Workspace;
use quill_tui::{app, tui};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let (config, paths) = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing
    init_tracing(&paths.log_dir(&config), &config.logging.filter)?;
    info!("Quill starting up");
    info!("Config loaded from {}", paths.config_file().display());

    // 3. Load saved state
    let store = Arc::new(JsonFileStore::new(paths.state_file(&config)));
    let saved = store.load_state().await.unwrap_or_default();
    info!(
        "State: {} saved layouts, {} configured sections",
        saved.panel_layouts.len(),
        saved.setup_sections.values().filter(|done| **done).count()
    );

    // 4. Build the workspace
    let (cols, rows) = crossterm::terminal::size().context("failed to read terminal size")?;
    let (drag_hook, drag_rx) = app::drag_end_channel();
    let workspace = Workspace::new(
        TemplateRegistry::builtin(),
        saved,
        tui::layout::workspace_size(cols, rows),
    )
    .with_split_bounds(SplitBounds::cells())
    .with_header_rows(config.layout.drag_header_rows)
    .with_drag_end_hook(drag_hook);
    let app_state = app::AppState::new(workspace, store, config.layout.resize_debounce());

    // 5. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, drag_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI (blocks until the user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 8. Give the app loop time for its final save
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), app_handle).await;

    info!("Quill shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal belongs to the TUI).
/// `RUST_LOG` overrides the configured filter.
fn init_tracing(log_dir: &Path, filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_file = std::fs::File::create(log_dir.join("quill.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
