use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::app::{AppState, ListView, Screen};
use crate::ui::components::{centered_rect, spinner};

/// Render the user list: title with refresh spinner, table or load/failure state, action row.
pub fn render_users_screen(f: &mut Frame, area: Rect, app: &AppState) {
    let Screen::List(view) = &app.screen else {
        return;
    };

    let mut title = vec![Span::styled(
        " Users ",
        Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
    )];
    if !app.users.is_loading() && app.users.is_fetching() {
        title.push(Span::styled(
            format!("{} ", spinner(app)),
            Style::default().fg(app.theme.muted),
        ));
    }
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    if app.users.is_loading() {
        let rect = centered_rect(16, 1, parts[0]);
        f.render_widget(
            Paragraph::new(format!("{} Loading...", spinner(app))).style(Style::default().fg(app.theme.text)),
            rect,
        );
    } else if app.users.error().is_some() {
        let rect = centered_rect(22, 1, parts[0]);
        f.render_widget(
            Paragraph::new("Failed to Fetch Data").style(Style::default().fg(app.theme.error)),
            rect,
        );
    } else {
        render_users_table(f, parts[0], app, view);
    }

    render_actions(f, parts[1], app);
}

fn checkbox(on: bool) -> &'static str {
    if on { "[x]" } else { "[ ]" }
}

fn render_users_table(f: &mut Frame, area: Rect, app: &AppState, view: &ListView) {
    let users = app.visible_users();

    let mut header_cells = vec![Cell::from(checkbox(view.all_selected(users))), Cell::from("USER")];
    if app.wide {
        header_cells.push(Cell::from("E-MAIL"));
    }
    header_cells.push(Cell::from(""));
    let header = Row::new(header_cells).style(
        Style::default().fg(app.theme.muted).add_modifier(Modifier::BOLD),
    );

    let edit_label = if app.wide { "✎ Edit" } else { "✎" };
    let rows = users.iter().map(|u| {
        let mut cells = vec![
            Cell::from(checkbox(view.selected.contains(&u.id))),
            Cell::from(Span::styled(
                u.name.clone(),
                Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
            )),
        ];
        if app.wide {
            cells.push(Cell::from(u.email.clone()));
        }
        cells.push(Cell::from(Span::styled(edit_label, Style::default().fg(app.theme.accent))));
        Row::new(cells).style(Style::default().fg(app.theme.text))
    });

    let widths: Vec<Constraint> = if app.wide {
        vec![Constraint::Length(3), Constraint::Percentage(40), Constraint::Percentage(45), Constraint::Length(7)]
    } else {
        vec![Constraint::Length(3), Constraint::Min(8), Constraint::Length(2)]
    };

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .column_spacing(2);

    if users.is_empty() {
        f.render_widget(table, area);
        let hint = centered_rect(36, 1, area);
        f.render_widget(
            Paragraph::new("No users yet. Press n to register.").style(Style::default().fg(app.theme.muted)),
            hint,
        );
        return;
    }

    let mut state = TableState::default().with_selected(Some(view.cursor));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_actions(f: &mut Frame, area: Rect, app: &AppState) {
    let remove = Paragraph::new(Span::styled(
        "[ Remove Selected Users ]",
        Style::default().fg(app.theme.error),
    ));
    let register = Paragraph::new(Span::styled(
        "[ Register ]",
        Style::default().fg(app.theme.title),
    ))
    .alignment(ratatui::layout::Alignment::Right);
    f.render_widget(remove, area);
    f.render_widget(register, area);
}
