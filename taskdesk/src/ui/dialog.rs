//! Modal dialogs: the task form and the delete confirmation.

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::theme;
use crate::app::{FormField, TaskForm};

/// Rectangle of `width` x `height` centered in `area`, clamped to fit.
#[must_use]
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

/// Render the create/edit dialog with inline field errors.
pub fn render_form(frame: &mut Frame, area: Rect, form: &TaskForm) {
    let mut lines = Vec::new();
    for field in FormField::ALL {
        let focused = form.focus == field;
        let label_style = if focused {
            theme::highlighted()
        } else {
            theme::bold()
        };
        let value = if field == FormField::Priority {
            format!("< {} >", form.priority)
        } else if focused {
            format!("{}_", form.text(field))
        } else {
            form.text(field).to_string()
        };
        let value_style = if field == FormField::Priority {
            theme::priority_chip(form.priority)
        } else {
            theme::normal()
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", field.label()), label_style),
            Span::styled(value, value_style),
        ]));
        match form.error_for(field) {
            Some(message) => lines.push(Line::from(Span::styled(
                format!("{:<12}{message}", ""),
                theme::field_error(),
            ))),
            None => lines.push(Line::default()),
        }
    }
    if form.submitting {
        lines.push(Line::from(Span::styled("Saving...", theme::dimmed())));
    } else {
        lines.push(Line::from(Span::styled(
            "Due date format: YYYY-MM-DD",
            theme::dimmed(),
        )));
    }

    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let rect = centered(area, 64, height);
    let block = Block::default()
        .title(Span::styled(
            form.heading(),
            theme::panel_title(theme::DIALOG_TITLE),
        ))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        rect,
    );
}

/// Render the y/n prompt for deleting `title`.
pub fn render_confirm_delete(frame: &mut Frame, area: Rect, title: &str) {
    let rect = centered(area, 50, 5);
    let block = Block::default()
        .title(Span::styled(
            "Delete Task",
            theme::panel_title(theme::ERROR),
        ))
        .borders(Borders::ALL)
        .border_style(theme::normal().fg(theme::ERROR));
    let lines = vec![
        Line::from(format!("Delete \"{title}\"?")),
        Line::default(),
        Line::from(Span::styled("y: delete   n: keep", theme::dimmed())),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        rect,
    );
}
