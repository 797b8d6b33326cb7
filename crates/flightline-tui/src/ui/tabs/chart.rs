use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use flightline_core::roster::{build_chart, supervisees};

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::utils::format_date;

/// Render the Chart tab - indented supervision tree
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    render_tree(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_tree(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);
    let chart = build_chart(&app.members);
    let rows = chart.rows();

    let mut items: Vec<ListItem> = rows
        .iter()
        .map(|(depth, member)| {
            let picked = app.chart_pick.as_deref() == Some(member.id.as_str());
            let branch = if *depth == 0 { "" } else { "└ " };
            let name_style = if picked {
                styles::highlight_style()
            } else {
                styles::list_item_style()
            };
            let mut spans = vec![
                Span::raw("  ".repeat(*depth)),
                Span::styled(branch, styles::muted_style()),
                Span::styled(member.short_name(), name_style),
                Span::styled(format!("  {}", member.duty_title_display()), styles::muted_style()),
            ];
            if picked {
                spans.push(Span::styled("  (moving)", styles::highlight_style()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    if !chart.cycles.is_empty() {
        items.push(ListItem::new(Line::from("")));
        items.push(ListItem::new(Line::from(Span::styled(
            "Supervision loop, fix in the edit form:",
            styles::error_style(),
        ))));
        for member in &chart.cycles {
            items.push(ListItem::new(Line::from(Span::styled(
                format!("  {}", member.short_name()),
                styles::error_style(),
            ))));
        }
    }

    let title = match app.chart_pick {
        Some(_) => " Chart - pick a supervisor, Esc to cancel ".to_string(),
        None => format!(" Chart ({}) ", rows.len()),
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(app.chart_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let lines = match app.selected_chart_member() {
        Some(member) => {
            let reports = supervisees(&app.members, &member.id);
            let mut lines = vec![
                Line::from(Span::styled(member.rank_display_name(), styles::title_style())),
                Line::from(vec![
                    Span::styled("Supervising since ", styles::muted_style()),
                    Span::raw(format_date(member.sup_start_date)),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    format!("Direct reports ({})", reports.len()),
                    styles::highlight_style(),
                )),
            ];
            for report in reports {
                lines.push(Line::from(format!("  {}", report.short_name())));
            }
            if !member.rank.can_supervise() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Rank cannot supervise",
                    styles::muted_style(),
                )));
            }
            lines
        }
        None => vec![Line::from(Span::styled("No members", styles::muted_style()))],
    };

    let block = Block::default()
        .title(" Supervisor ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
