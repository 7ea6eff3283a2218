//! Terminal UI rendering.

pub mod dialog;
pub mod filter_bar;
pub mod status_bar;
pub mod task_list;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::{App, Mode};

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    // Filter bar on top, status bar at the bottom
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    filter_bar::render(frame, chunks[0], app);
    task_list::render(frame, chunks[1], app);
    status_bar::render(frame, chunks[2], app);

    // Dialogs draw over everything else
    match &app.mode {
        Mode::Browse => {}
        Mode::Form(form) => dialog::render_form(frame, frame.area(), form),
        Mode::ConfirmDelete { title, .. } => {
            dialog::render_confirm_delete(frame, frame.area(), title);
        }
    }
}
