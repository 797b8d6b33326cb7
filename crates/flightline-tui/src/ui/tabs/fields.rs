use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Focus};
use crate::ui::styles;

/// Render the Fields tab - custom field definitions
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Type"),
        Cell::from("On card"),
        Cell::from("Filled"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let filled = app
                .members
                .iter()
                .filter(|m| m.custom_data.get(&field.id).is_some_and(|v| !v.is_empty()))
                .count();
            let style = if i == app.field_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let on_card = if field.show_on_card { "yes" } else { "no" };

            Row::new(vec![
                Cell::from(field.name.clone()),
                Cell::from(field.field_type.as_str()),
                Cell::from(on_card),
                Cell::from(format!("{}/{}", filled, app.members.len())),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(10),
    ];

    let title = format!(" Custom fields ({}) - [a]dd [d]elete [c]ard ", app.fields.len());
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
    if !app.fields.is_empty() {
        state.select(Some(app.field_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
