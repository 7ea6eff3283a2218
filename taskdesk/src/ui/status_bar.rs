//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, Mode, NoticeKind};
use crate::data::Connectivity;

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.mode {
        Mode::Browse => {
            "n: new | e: edit | space: toggle | d: delete | s/p: filter | r: refresh | q: quit"
        }
        Mode::Form(_) => "Tab: next field | ←→: priority | Enter: save | Esc: cancel",
        Mode::ConfirmDelete { .. } => "y: delete | n: keep",
    };

    let (dot_color, status_text) = match &app.connectivity {
        Connectivity::Online if app.loading => (theme::WARNING, "Loading...".to_string()),
        Connectivity::Online => (theme::SUCCESS, "Online".to_string()),
        Connectivity::Unknown => (theme::UNKNOWN, "Connecting...".to_string()),
        Connectivity::Offline(_) => (theme::ERROR, "Offline".to_string()),
    };

    let mut spans = vec![
        Span::styled(concat!("Taskdesk v", env!("CARGO_PKG_VERSION")), theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {status_text}")),
        Span::raw(" | "),
    ];
    match &app.notice {
        Some(notice) => {
            let color = match notice.kind {
                NoticeKind::Info => theme::SUCCESS,
                NoticeKind::Error => theme::ERROR,
            };
            spans.push(Span::styled(notice.text.as_str(), theme::normal().fg(color)));
        }
        None => spans.push(Span::styled(help_text, theme::dimmed())),
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
