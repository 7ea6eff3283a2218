//! Filter bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use taskdesk_proto::task::{Priority, TaskStatus};

use super::theme;
use crate::app::App;

/// Render the status and priority filters, highlighting the active values.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled("Status ", theme::bold()),
        Span::styled("[s] ", theme::dimmed()),
    ];
    push_options(
        &mut spans,
        TaskStatus::ALL.iter().map(|s| Some(*s)),
        app.filter.status,
        |s| match s {
            None => "All",
            Some(TaskStatus::Pending) => "Pending",
            Some(TaskStatus::Completed) => "Completed",
        },
    );

    spans.push(Span::raw("   "));
    spans.push(Span::styled("Priority ", theme::bold()));
    spans.push(Span::styled("[p] ", theme::dimmed()));
    push_options(
        &mut spans,
        Priority::ALL.iter().map(|p| Some(*p)),
        app.filter.priority,
        |p| match p {
            None => "All",
            Some(Priority::Low) => "Low",
            Some(Priority::Medium) => "Medium",
            Some(Priority::High) => "High",
        },
    );

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn push_options<T: Copy + PartialEq>(
    spans: &mut Vec<Span<'static>>,
    values: impl Iterator<Item = Option<T>>,
    active: Option<T>,
    label: impl Fn(Option<T>) -> &'static str,
) {
    for value in std::iter::once(None).chain(values) {
        let style = if value == active {
            theme::active_filter()
        } else {
            theme::dimmed()
        };
        spans.push(Span::styled(label(value), style));
        spans.push(Span::raw(" "));
    }
}
