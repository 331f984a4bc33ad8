//! Shared UI components: header with logo, status bar, toasts, layout helpers.
//!
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{AppState, KeyAction, Screen, ToastKind};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Current spinner frame, advancing every 100 ms of uptime.
pub fn spinner(app: &AppState) -> &'static str {
    let i = (app.started_at.elapsed().as_millis() / 100) as usize % SPINNER_FRAMES.len();
    SPINNER_FRAMES[i]
}

/// Logo: the screen title followed by an accent dot.
pub fn logo(app: &AppState) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            app.route.title(),
            Style::default().fg(app.theme.header_fg).add_modifier(Modifier::BOLD),
        ),
        Span::styled(".", Style::default().fg(app.theme.accent).add_modifier(Modifier::BOLD)),
    ])
}

/// Render the top bar. Narrow terminals get a menu glyph in front of the logo.
pub fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = Vec::new();
    if !app.wide {
        spans.push(Span::styled("≡ ", Style::default().fg(app.theme.text)));
    }
    spans.extend(logo(app).spans);
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(app.theme.border))
        .style(Style::default().bg(app.theme.header_bg));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(Line::from(spans)), inner);
    if app.wide {
        let path = Paragraph::new(app.route.path())
            .style(Style::default().fg(app.theme.muted))
            .alignment(Alignment::Right);
        f.render_widget(path, inner);
    }
}

fn first_key(app: &AppState, action: KeyAction) -> String {
    app.keymap
        .keys_for(action)
        .into_iter()
        .next()
        .unwrap_or_else(|| "-".to_string())
}

/// Render the bottom status bar with the keys that apply to the mounted screen.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let msg = match &app.screen {
        Screen::List(view) => {
            let hints = [
                (KeyAction::ToggleSelect, "select"),
                (KeyAction::ToggleSelectAll, "all"),
                (KeyAction::DeleteSelected, "delete"),
                (KeyAction::Refresh, "refresh"),
                (KeyAction::NewUser, "new"),
                (KeyAction::EditUser, "edit"),
                (KeyAction::Quit, "quit"),
            ]
            .iter()
            .map(|(a, label)| format!("{} {}", first_key(app, *a), label))
            .collect::<Vec<_>>()
            .join("  ");
            format!(
                " {hints}   users:{} selected:{}",
                app.visible_users().len(),
                view.selected.len()
            )
        }
        Screen::Create(_) | Screen::Edit { .. } => {
            " Tab/Shift+Tab move  Enter submit  Esc cancel  Ctrl+c quit".to_string()
        }
    };
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Stack live toasts in the top-right corner, oldest first.
pub fn render_toasts(f: &mut Frame, area: Rect, app: &AppState) {
    let width = 44u16.min(area.width.saturating_sub(2));
    if width < 10 {
        return;
    }
    let x = area.x + area.width.saturating_sub(width + 1);
    let mut y = area.y + 1;
    for toast in app.toasts.iter() {
        if y + 3 > area.y + area.height {
            break;
        }
        let (title, color) = match toast.kind {
            ToastKind::Success => ("Success", app.theme.success),
            ToastKind::Error => ("Error", app.theme.error),
            ToastKind::Info => ("Info", app.theme.title),
        };
        let rect = Rect { x, y, width, height: 3 };
        let p = Paragraph::new(toast.message.clone())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(app.theme.text))
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
        y += 3;
    }
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
