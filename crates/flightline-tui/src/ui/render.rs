use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, DeleteTarget, FormField, MemberForm, PromptKind, Tab};

use super::styles;
use super::tabs::{chart, fields, roster};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_confirm_overlay(
            frame,
            "Are you sure you want to quit?",
            "[Y]",
            " to quit, ",
        ),
        AppState::ConfirmingOffline => render_confirm_overlay(
            frame,
            "Work offline from the local cache?",
            "[Y]",
            " to go offline, ",
        ),
        AppState::ConfirmingOnline => render_confirm_overlay(
            frame,
            "Reconnect to the roster database?",
            "[Y]",
            " to go online, ",
        ),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::Prompting => render_prompt_overlay(frame, app),
        AppState::EditingMember => {
            if let Some(ref form) = app.form {
                render_form_overlay(frame, app, form);
            }
        }
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  {}", app.unit_title());
    let mode = if app.offline_mode { "OFFLINE  " } else { "" };
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.chars().count() + mode.len() + help_hint.len() + 2),
        )),
        Span::styled(mode, styles::error_style()),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [Tab::Roster, Tab::Chart, Tab::Fields];

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Roster => roster::render(frame, app, area),
        Tab::Chart => chart::render(frame, app, area),
        Tab::Fields => fields::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.current_tab {
        Tab::Roster => "[p]romote [s]elect [n]ot selected [r]un sweep [u]pdate [q]uit",
        Tab::Chart => "[Enter] pick/drop [x] detach [e]dit [u]pdate [q]uit",
        Tab::Fields => "[a]dd [d]elete [c]ard toggle [u]pdate [q]uit",
    };

    let left_text = if matches!(app.state, AppState::Searching) {
        format!(" /{}▌ ", app.search_query)
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if !app.search_query.is_empty() {
        format!(" Filter: {} ", app.search_query)
    } else {
        format!(" Updated {} ", app.cache_age)
    };
    let left_style = if matches!(app.state, AppState::Searching) || !app.search_query.is_empty() {
        styles::search_style()
    } else if left_text.starts_with(" Error") {
        styles::error_style()
    } else {
        styles::muted_style()
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 32, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  flightline", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-3", "Switch tabs"),
        help_line("←/→", "Prev/next tab"),
        help_line("Tab", "Switch focus (list ↔ detail)"),
        help_line("↑/↓ j/k", "Navigate list"),
        help_line("PgUp/PgDn", "Scroll a page"),
        help_line("/", "Search"),
        help_line("Esc", "Clear search / cancel"),
        Line::from(""),
        Line::from(Span::styled(" Roster", styles::highlight_style())),
        help_line("p", "Promote (eligible members)"),
        help_line("s / n", "Board or BTZ: selected / not"),
        help_line("m", "Move to next team"),
        help_line("a / e", "Add / edit member"),
        help_line("d", "Delete member"),
        help_line("r", "Run promotion sweep"),
        Line::from(""),
        Line::from(Span::styled(" Chart", styles::highlight_style())),
        help_line("Enter", "Pick member, then drop on supervisor"),
        help_line("x", "Detach from supervisor"),
        Line::from(""),
        Line::from(Span::styled(" General", styles::highlight_style())),
        help_line("u", "Update and apply due promotions"),
        help_line("o", "Toggle offline mode"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, key: &str, action: &str) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled(key.to_string(), styles::help_key_style()),
            Span::styled(action.to_string(), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let question = match app.pending_delete {
        Some(DeleteTarget::Member { ref name, .. }) => format!("Delete {}?", name),
        Some(DeleteTarget::Field { ref name, .. }) => format!("Delete field {}?", name),
        None => return,
    };
    render_confirm_overlay(frame, &question, "[Y]", " to delete, ");
}

fn render_prompt_overlay(frame: &mut Frame, app: &App) {
    let Some(ref prompt) = app.prompt else {
        return;
    };
    let height = if prompt.error.is_some() { 9 } else { 7 };
    let area = centered_rect_fixed(52, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" > ", styles::muted_style()),
            Span::styled(format!("{}▌", prompt.input), styles::selected_style()),
        ]),
    ];

    if prompt.kind == PromptKind::NewField {
        lines.push(Line::from(vec![
            Span::styled(" Type: ", styles::muted_style()),
            Span::styled(prompt.field_type.as_str(), styles::highlight_style()),
            Span::styled("  [Tab] to change", styles::muted_style()),
        ]));
    } else {
        lines.push(Line::from(""));
    }

    if let Some(ref error) = prompt.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [Enter]", styles::help_key_style()),
        Span::styled(" confirm  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(format!(" {} ", prompt.kind.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_form_overlay(frame: &mut Frame, app: &App, form: &MemberForm) {
    let extra = if form.error.is_some() { 2 } else { 0 };
    let height = form.fields.len() as u16 + 5 + extra;
    let area = centered_rect_fixed(60, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    for (i, field) in form.fields.iter().enumerate() {
        let selected = i == form.selection;
        let value = form_value(app, form, field);
        let cursor = if selected && !field.is_choice() { "▌" } else { "" };
        let value_style = if selected {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let hint = if selected && field.is_choice() { "  ◀ ▶" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(format!(" {:<12}", field.label(&app.fields)), styles::muted_style()),
            Span::styled(format!("{}{}", value, cursor), value_style),
            Span::styled(hint, styles::muted_style()),
        ]));
    }

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [↑/↓]", styles::help_key_style()),
        Span::styled(" field  ", styles::muted_style()),
        Span::styled("[Enter]", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let title = if form.draft.is_new() { " Add member " } else { " Edit member " };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn form_value(app: &App, form: &MemberForm, field: &FormField) -> String {
    match field {
        FormField::Team => form.draft.team.unwrap_or_default().display_name().to_string(),
        FormField::Supervisor => {
            if form.draft.supervisor.is_empty() {
                return "(none)".to_string();
            }
            app.members
                .iter()
                .find(|m| m.id == form.draft.supervisor)
                .map(|m| m.short_name())
                .unwrap_or_else(|| form.draft.supervisor.clone())
        }
        other => form.text(other).unwrap_or_default().to_string(),
    }
}
