use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use chrono::NaiveDate;

use flightline_core::promotion::{evaluate, Action, Verdict};
use flightline_core::Member;

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::utils::{format_date, truncate_string};

/// Render the Roster tab - member table with a detail panel
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    // Every row is judged against the same day.
    let today = app.today();
    render_table(frame, app, today, chunks[0]);
    render_detail(frame, app, today, chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, today: NaiveDate, area: Rect) {
    let members = app.visible_members();
    let focused = matches!(app.focus, Focus::List);

    let header = Row::new(vec![
        Cell::from("   Rank"),
        Cell::from("Name"),
        Cell::from("Team"),
        Cell::from("Duty title"),
        Cell::from("Eligibility"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let verdict = evaluate(member, today);
            let (marker, marker_style) = styles::alert_marker(verdict.classification.alert());
            let style = if i == app.roster_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(Line::from(vec![
                    Span::styled(marker, marker_style),
                    Span::raw(member.rank.abbreviation().to_string()),
                ])),
                Cell::from(member.display_name()),
                Cell::from(member.team.display_name()),
                Cell::from(truncate_string(member.duty_title_display(), 20)),
                Cell::from(Span::styled(
                    verdict.status.clone(),
                    styles::verdict_style(verdict.classification),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(9),  // Marker + rank
        Constraint::Fill(3),    // Name
        Constraint::Length(12), // Team
        Constraint::Fill(2),    // Duty title
        Constraint::Fill(3),    // Eligibility
    ];

    let title = format!(" Roster ({}) ", members.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.roster_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn field_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), styles::muted_style()),
        Span::raw(value),
    ])
}

fn render_detail(frame: &mut Frame, app: &App, today: NaiveDate, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let content = match app.selected_member() {
        Some(member) => detail_lines(app, member, &evaluate(member, today)),
        None => vec![Line::from(Span::styled("No members", styles::muted_style()))],
    };

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn detail_lines(app: &App, member: &Member, verdict: &Verdict) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(member.rank_display_name(), styles::title_style())),
        Line::from(""),
        Line::from(Span::styled("Assignment", styles::highlight_style())),
        field_line("Team:", member.team.display_name().to_string()),
        field_line("Duty title:", member.duty_title_display().to_string()),
        field_line("Status:", member.status_display().to_string()),
    ];

    let supervisor = member
        .supervisor
        .as_deref()
        .map(|id| {
            app.members
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.short_name())
                .unwrap_or_else(|| format!("{} (not on roster)", id))
        })
        .unwrap_or_else(|| "-".to_string());
    lines.push(field_line("Supervisor:", supervisor));
    lines.push(field_line("Since:", format_date(member.sup_start_date)));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Service", styles::highlight_style())));
    lines.push(field_line("TIS:", format_date(member.tis_date)));
    lines.push(field_line("DOR:", format_date(member.dor_date)));
    if member.original_dor.is_some() {
        lines.push(field_line("Orig. DOR:", format_date(member.original_dor)));
    }
    if let Some(ref hometown) = member.hometown {
        lines.push(field_line("Hometown:", hometown.clone()));
    }
    if let Some(ref profile) = member.medical_profile {
        let style = if member.has_permanent_profile() {
            styles::error_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", "Medical:"), styles::muted_style()),
            Span::styled(profile.clone(), style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Promotion", styles::highlight_style())));
    lines.push(Line::from(Span::styled(
        verdict.status.clone(),
        styles::verdict_style(verdict.classification),
    )));
    if !verdict.note.is_empty() {
        lines.push(Line::from(Span::raw(verdict.note.clone())));
    }
    if let Some(date) = verdict.board_promotion_date {
        lines.push(field_line("BTZ date:", format_date(Some(date))));
    }
    let hint = match verdict.action() {
        Action::Promote => Some("[p] promote"),
        Action::BtzDecision => Some("[s] BTZ selected  [n] not selected"),
        Action::BoardDecision => Some("[s] board selected  [n] not selected"),
        Action::None => None,
    };
    if let Some(hint) = hint {
        lines.push(Line::from(Span::styled(hint, styles::help_key_style())));
    }

    let custom: Vec<Line<'static>> = app
        .fields
        .iter()
        .filter(|f| f.show_on_card)
        .filter_map(|f| {
            member
                .custom_data
                .get(&f.id)
                .filter(|v| !v.is_empty())
                .map(|v| field_line(&format!("{}:", truncate_string(&f.name, 10)), v.clone()))
        })
        .collect();
    if !custom.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Additional", styles::highlight_style())));
        lines.extend(custom);
    }

    lines
}
