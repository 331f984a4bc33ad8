use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::Backend;
use std::time::{Duration, Instant};

use crate::app::{AppState, KeyAction, Route, Screen};
use crate::ui;

/// Drive the TUI until the user quits: draw, wait up to one tick for input, advance timers.
pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut AppState) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                handle_key(app, key);
            }
        }

        app.tick(Instant::now());
    }

    tracing::info!(uptime = ?app.started_at.elapsed(), "exiting");
    Ok(())
}

/// Dispatch one key press to the mounted screen.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match app.screen {
        Screen::List(_) => handle_list_key(app, key),
        Screen::Create(_) | Screen::Edit { .. } => handle_form_key(app, key),
    }
}

fn handle_list_key(app: &mut AppState, key: KeyEvent) {
    let Some(action) = app.keymap.resolve(&key) else {
        return;
    };
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::MoveUp => app.move_cursor(-1),
        KeyAction::MoveDown => app.move_cursor(1),
        KeyAction::ToggleSelect => app.toggle_select(),
        KeyAction::ToggleSelectAll => app.toggle_select_all(),
        KeyAction::DeleteSelected => app.delete_selected(),
        KeyAction::Refresh => app.refresh(),
        KeyAction::NewUser => app.navigate(Route::Create),
        KeyAction::EditUser => app.edit_at_cursor(),
        KeyAction::Ignore => {}
    }
}

fn handle_form_key(app: &mut AppState, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.should_quit = true;
        }
        return;
    }
    match key.code {
        KeyCode::Esc => app.navigate(Route::List),
        KeyCode::Enter => app.submit(),
        code => {
            let view = match &mut app.screen {
                Screen::Create(v) | Screen::Edit { view: v, .. } => v,
                Screen::List(_) => return,
            };
            match code {
                KeyCode::Tab | KeyCode::Down => view.focus = view.focus.next(),
                KeyCode::BackTab | KeyCode::Up => view.focus = view.focus.prev(),
                KeyCode::Backspace => view.backspace(),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => view.input(c),
                _ => {}
            }
        }
    }
}
