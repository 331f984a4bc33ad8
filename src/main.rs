//! user-panel binary entry point.
//!
//! Parses the command line, opens the user table, initializes the terminal in
//! raw mode, runs the TUI event loop, and restores the terminal state on exit.
//!
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::sync::Arc;

use user_panel::app::{self, AppState};
use user_panel::config::{self, Cli};
use user_panel::error::{Context, Result};
use user_panel::store::{FileStore, MemoryStore, UserStore};

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = cli.paths();
    config::init_logging(&paths.log, cli.log_level.as_deref())?;

    let route = cli.start_route()?;
    let store: Arc<dyn UserStore> = if cli.in_memory {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            FileStore::open(&paths.db)
                .with_ctx(|| format!("open user table {}", paths.db.display()))?,
        )
    };
    tracing::info!(db = %paths.db.display(), in_memory = cli.in_memory, "starting");

    let mut app = AppState::new(store, cli.app_options(&paths)?);
    app.navigate(route);

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    Ok(())
}
