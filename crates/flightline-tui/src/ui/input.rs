//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, Focus, PromptKind, Tab, MAX_INPUT_LENGTH, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    if app.busy {
                        app.status_message = Some("Waiting for a save to finish...".to_string());
                        app.state = AppState::Normal;
                        return Ok(false);
                    }
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingOffline => {
            if confirm(app, key) {
                app.go_offline();
            }
            return Ok(false);
        }
        AppState::ConfirmingOnline => {
            if confirm(app, key) {
                app.go_online();
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::Prompting => return handle_prompt_input(app, key),
        AppState::EditingMember => return handle_form_input(app, key),
        AppState::Searching => return handle_search_input(app, key),
        AppState::Normal | AppState::Quitting => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('1') => switch_tab(app, Tab::Roster),
        KeyCode::Char('2') => switch_tab(app, Tab::Chart),
        KeyCode::Char('3') => switch_tab(app, Tab::Fields),
        KeyCode::Left => switch_tab(app, app.current_tab.prev()),
        KeyCode::Right => switch_tab(app, app.current_tab.next()),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        KeyCode::Char('u') => app.refresh_all_background(),
        KeyCode::Char('o') => {
            app.state = if app.offline_mode {
                AppState::ConfirmingOnline
            } else {
                AppState::ConfirmingOffline
            };
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
            app.roster_selection = 0;
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
        }
        KeyCode::Esc => {
            if app.chart_pick.take().is_some() {
                app.status_message = None;
            } else {
                app.search_query.clear();
                app.status_message = None;
                app.focus = Focus::List;
                app.clamp_selections();
            }
        }
        _ => match app.current_tab {
            Tab::Roster => handle_roster_input(app, key),
            Tab::Chart => handle_chart_input(app, key),
            Tab::Fields => handle_fields_input(app, key),
        },
    }

    Ok(false)
}

fn switch_tab(app: &mut App, tab: Tab) {
    app.current_tab = tab;
    app.focus = Focus::List;
}

/// Y/Enter accepts, anything else declines. Both leave the dialog.
fn confirm(app: &mut App, key: KeyEvent) -> bool {
    app.state = AppState::Normal;
    matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter)
}

fn handle_roster_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('p') => app.begin_promote(),
        KeyCode::Char('s') => app.begin_decision(true),
        KeyCode::Char('n') => app.begin_decision(false),
        KeyCode::Char('m') => app.move_to_next_team(),
        KeyCode::Char('a') => app.begin_add_member(),
        KeyCode::Char('e') | KeyCode::Enter => app.begin_edit_member(),
        KeyCode::Char('d') => app.request_delete_member(),
        KeyCode::Char('r') => app.run_sweep(),
        _ => {}
    }
}

fn handle_chart_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => app.chart_pick_or_drop(),
        KeyCode::Char('x') => app.chart_clear_supervisor(),
        KeyCode::Char('e') => app.begin_edit_member(),
        KeyCode::Char('a') => app.begin_add_member(),
        KeyCode::Char('d') => app.request_delete_member(),
        _ => {}
    }
}

fn handle_fields_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('a') => app.begin_add_field(),
        KeyCode::Char('d') => app.request_delete_field(),
        KeyCode::Char('c') | KeyCode::Char(' ') => app.toggle_field_on_card(),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            // Keep search query active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            if app.search_query.chars().count() < MAX_INPUT_LENGTH {
                app.search_query.push(c);
            }
            app.roster_selection = 0;
        }
        _ => {}
    }
    app.clamp_selections();
    Ok(false)
}

fn handle_prompt_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Tab => {
            if let Some(prompt) = app.prompt.as_mut() {
                if prompt.kind == PromptKind::NewField {
                    prompt.field_type = prompt.field_type.next();
                }
            }
        }
        KeyCode::Backspace => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.input.pop();
                prompt.error = None;
            }
        }
        KeyCode::Char(c) => {
            if let Some(prompt) = app.prompt.as_mut() {
                if prompt.input.chars().count() < MAX_INPUT_LENGTH {
                    prompt.input.push(c);
                }
                prompt.error = None;
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if matches!(key.code, KeyCode::Esc) {
        app.cancel_form();
        return Ok(false);
    }
    if matches!(key.code, KeyCode::Enter) {
        app.submit_form();
        return Ok(false);
    }

    let members = &app.members;
    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return Ok(false);
    };

    match key.code {
        KeyCode::Down | KeyCode::Tab => form.next_field(),
        KeyCode::Up | KeyCode::BackTab => form.prev_field(),
        KeyCode::Left => form.cycle_choice(members, false),
        KeyCode::Right => form.cycle_choice(members, true),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    form.error = None;
    Ok(false)
}
