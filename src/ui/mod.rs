//! Rendering entry point: header, the mounted screen, status bar, toasts.
pub mod components;
pub mod form;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::app::{AppState, Screen};

/// Terminal width (columns) from which the full layout is used.
pub const WIDE_BREAKPOINT: u16 = 100;

pub fn render(f: &mut Frame, app: &mut AppState) {
    let area = f.area();
    app.wide = area.width >= WIDE_BREAKPOINT;

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let app = &*app;
    components::render_header(f, root[0], app);

    let body = inset(root[1], if app.wide { 2 } else { 1 });
    match &app.screen {
        Screen::List(_) => users::render_users_screen(f, body, app),
        Screen::Create(_) | Screen::Edit { .. } => form::render_form_screen(f, body, app),
    }

    components::render_status_bar(f, root[2], app);
    components::render_toasts(f, area, app);
}

fn inset(area: Rect, horizontal: u16) -> Rect {
    let h = horizontal.min(area.width / 4);
    Rect {
        x: area.x + h,
        y: area.y,
        width: area.width.saturating_sub(h * 2),
        height: area.height,
    }
}
