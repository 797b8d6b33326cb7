use ratatui::style::{Color, Modifier, Style};

use flightline_core::promotion::{Alert, Classification};

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Color for the eligibility column.
pub fn verdict_style(classification: Classification) -> Style {
    match classification {
        Classification::Eligible
        | Classification::PromoEligible
        | Classification::PromoSelected
        | Classification::BtzSelect
        | Classification::BtzThisQ => success_style(),
        Classification::BtzNextQ | Classification::BtzTwoQ | Classification::BoardConcluded => {
            highlight_style()
        }
        Classification::InfoNeeded | Classification::ManualReview => error_style(),
        Classification::NotEligible
        | Classification::BtzNotSelected
        | Classification::PromoNotSelected => muted_style(),
    }
}

/// Marker shown ahead of a name when a BTZ board is coming up.
pub fn alert_marker(alert: Option<Alert>) -> (&'static str, Style) {
    match alert {
        Some(Alert::Urgent) => ("!! ", error_style().add_modifier(Modifier::BOLD)),
        Some(Alert::Warning) => ("!  ", highlight_style()),
        None => ("   ", list_item_style()),
    }
}
