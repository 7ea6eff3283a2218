//! Task list rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use taskdesk_proto::task::{Task, TaskStatus};

use super::theme;
use crate::app::{App, Mode};

/// Render the tasks for the active filter, one two-line row per task.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.mode == Mode::Browse;
    let block = Block::default()
        .title(Span::styled(
            format!("Tasks ({})", app.tasks.len()),
            theme::panel_title(theme::TASKS_TITLE),
        ))
        .borders(Borders::ALL)
        .border_style(if focused {
            theme::highlighted()
        } else {
            theme::normal()
        });

    if app.tasks.is_empty() {
        let text = if app.loading {
            "Loading tasks..."
        } else if app.connectivity.is_online() {
            "No tasks found. Press n to create one."
        } else {
            "Not connected."
        };
        frame.render_widget(Paragraph::new(text).style(theme::dimmed()).block(block), area);
        return;
    }

    let items: Vec<ListItem> = app.tasks.iter().map(|task| row(app, task)).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected())
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn row<'a>(app: &App, task: &'a Task) -> ListItem<'a> {
    let done = task.status == TaskStatus::Completed;
    let checkbox = if done { "[✓]" } else { "[ ]" };
    let title_style = if done {
        theme::completed()
    } else {
        theme::normal()
    };

    let headline = Line::from(vec![
        Span::styled(checkbox, title_style),
        Span::raw(" "),
        Span::styled(task.title.as_str(), title_style),
        Span::raw("  "),
        Span::styled(format!(" {} ", task.priority), theme::priority_chip(task.priority)),
        Span::raw("  "),
        Span::styled(format!("due {}", app.format_due(task)), theme::dimmed()),
    ]);
    let detail = Line::from(Span::styled(
        format!("    {}", task.description.as_deref().unwrap_or("")),
        theme::dimmed(),
    ));

    ListItem::new(vec![headline, detail])
}
