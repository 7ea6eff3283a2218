//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};

use taskdesk_proto::task::Priority;

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success/online indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning/loading indicator color.
pub const WARNING: Color = Color::Yellow;

/// Error/offline indicator color.
pub const ERROR: Color = Color::Red;

/// Indicator color before the first probe completes.
pub const UNKNOWN: Color = Color::DarkGray;

/// Panel title color for the task list.
pub const TASKS_TITLE: Color = Color::Green;

/// Panel title color for dialogs.
pub const DIALOG_TITLE: Color = Color::Cyan;

/// Chip color for a priority: low green, medium yellow, high red.
#[must_use]
pub const fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => SUCCESS,
        Priority::Medium => WARNING,
        Priority::High => ERROR,
    }
}

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (descriptions, metadata).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (focused borders and inputs).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Selected item style (in lists).
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Title of a completed task.
#[must_use]
pub fn completed() -> Style {
    dimmed().add_modifier(Modifier::CROSSED_OUT)
}

/// Priority chip (black on the priority color).
#[must_use]
pub fn priority_chip(priority: Priority) -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(priority_color(priority))
        .add_modifier(Modifier::BOLD)
}

/// Inline field error.
#[must_use]
pub fn field_error() -> Style {
    Style::default().fg(ERROR).add_modifier(Modifier::ITALIC)
}

/// Style for the status bar background (dark background with white foreground).
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Style for panel titles with a given color (bold).
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Active filter value in the filter bar.
#[must_use]
pub fn active_filter() -> Style {
    Style::default()
        .fg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}
