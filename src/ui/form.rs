//! Create and edit forms.
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, FormView, Screen};
use crate::validation::Field;

pub fn render_form_screen(f: &mut Frame, area: Rect, app: &AppState) {
    let (heading, view, missing) = match &app.screen {
        Screen::Create(view) => ("Create User", view, None),
        Screen::Edit { id, view, found } => ("User Info", view, (!*found).then_some(*id)),
        Screen::List(_) => return,
    };

    let block = Block::default()
        .title(Span::styled(
            format!(" {heading} "),
            Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(1)];
    constraints.extend(Field::ALL.iter().map(|_| Constraint::Length(4)));
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    if let Some(id) = missing {
        f.render_widget(
            Paragraph::new(format!("No user with id {id}")).style(Style::default().fg(app.theme.error)),
            rows[0],
        );
    }

    for (i, field) in Field::ALL.iter().enumerate() {
        render_field(f, rows[i + 1], app, view, *field);
    }

    let confirm = match &app.screen {
        Screen::Create(_) => "Confirm",
        _ => "Save",
    };
    let mut footer = vec![
        Span::styled("[ Cancel: Esc ]", Style::default().fg(app.theme.muted)),
        Span::raw("  "),
        Span::styled(
            format!("[ {confirm}: Enter ]"),
            Style::default().fg(app.theme.accent).add_modifier(Modifier::BOLD),
        ),
    ];
    if view.submitting {
        footer.insert(0, Span::styled("Saving... ", Style::default().fg(app.theme.muted)));
    }
    let last = rows[rows.len() - 1];
    f.render_widget(Paragraph::new(Line::from(footer)).alignment(Alignment::Right), last);
}

fn render_field(f: &mut Frame, area: Rect, app: &AppState, view: &FormView, field: Field) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    let focused = view.focus == field;
    let error = view.errors.message(field);
    let border = if error.is_some() {
        app.theme.error
    } else if focused {
        app.theme.accent
    } else {
        app.theme.border
    };

    let raw = view.form.value(field);
    let shown = if field.is_secret() {
        "*".repeat(raw.chars().count())
    } else {
        raw.to_string()
    };
    let input = Paragraph::new(shown.clone())
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title(field.label())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    f.render_widget(input, parts[0]);

    if let Some(msg) = error {
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(app.theme.error)),
            parts[1],
        );
    }

    if focused {
        let max_x = parts[0].x + parts[0].width.saturating_sub(2);
        let x = (parts[0].x + 1 + shown.chars().count() as u16).min(max_x);
        f.set_cursor_position(Position::new(x, parts[0].y + 1));
    }
}
