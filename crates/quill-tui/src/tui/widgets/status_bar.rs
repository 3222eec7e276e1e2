// Status bar widget: section tabs, split state, last save time.

use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::LayoutSnapshot;
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [section tabs] | [view/editor, split sections only] | [saved at]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let layout = &state.layout;
    let mut spans = section_spans(&layout.sections, layout.active_section.as_deref());

    if layout.has_split {
        spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            split_label(layout),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
    spans.push(Span::styled(
        saved_label(layout.saved_at),
        Style::default().fg(Color::Gray),
    ));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// "[1:Writing] [2:Characters] ..." with the active section highlighted.
pub fn section_spans(sections: &[(String, String)], active: Option<&str>) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, (id, title)) in sections.iter().enumerate() {
        let style = if Some(id.as_str()) == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}:{}]", i + 1, title), style));
        spans.push(Span::raw(" "));
    }
    spans
}

pub fn split_label(layout: &LayoutSnapshot) -> String {
    let editor = if layout.editor_visible { "on" } else { "off" };
    format!("view: {} editor: {}", layout.view_mode.label(), editor)
}

pub fn saved_label(saved_at: Option<DateTime<Utc>>) -> String {
    match saved_at {
        Some(t) => format!("saved {}", t.with_timezone(&Local).format("%H:%M:%S")),
        None => "not saved".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::layout::ViewMode;

    fn sections() -> Vec<(String, String)> {
        vec![
            ("writing".into(), "Writing".into()),
            ("characters".into(), "Characters".into()),
        ]
    }

    #[test]
    fn section_spans_highlight_active() {
        let spans = section_spans(&sections(), Some("characters"));
        assert_eq!(spans[0].content, "[1:Writing]");
        assert_eq!(spans[2].content, "[2:Characters]");
        assert!(spans[2].style.add_modifier.contains(Modifier::BOLD));
        assert!(!spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn split_label_reports_mode_and_editor() {
        let layout = LayoutSnapshot {
            editor_visible: true,
            view_mode: ViewMode::Importance,
            ..LayoutSnapshot::default()
        };
        assert_eq!(split_label(&layout), "view: importance editor: on");
    }

    #[test]
    fn saved_label_without_save() {
        assert_eq!(saved_label(None), "not saved");
        assert!(saved_label(Some(Utc::now())).starts_with("saved "));
    }

    #[test]
    fn render_does_not_panic_with_defaults() {
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
