// A single floating panel: bordered block with its title and geometry.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::protocol::PanelView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Normal,
    /// Chosen with `[`/`]` for show/hide.
    Selected,
    Dragging,
}

pub fn border_color(focus: PanelFocus) -> Color {
    match focus {
        PanelFocus::Normal => Color::Gray,
        PanelFocus::Selected => Color::Cyan,
        PanelFocus::Dragging => Color::Yellow,
    }
}

/// Render `panel` into `area`, drawing over whatever is underneath.
pub fn render(frame: &mut Frame, area: Rect, panel: &PanelView, focus: PanelFocus) {
    frame.render_widget(Clear, area);

    let color = border_color(focus);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", panel.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));

    let r = panel.rect;
    let body = Line::from(Span::styled(
        format!("{}x{} at ({}, {})", r.width, r.height, r.x, r.y),
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(body).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::geometry::Rect as PanelRect;

    #[test]
    fn render_draws_title_on_top_border() {
        let backend = ratatui::backend::TestBackend::new(30, 6);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let panel = PanelView {
            id: "manuscript".into(),
            title: "Manuscript".into(),
            rect: PanelRect::new(0, 0, 30, 6),
            z: 1,
            hidden: false,
        };
        terminal
            .draw(|frame| render(frame, frame.area(), &panel, PanelFocus::Dragging))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let top: String = (0..30u16).map(|x| buffer[(x, 0u16)].symbol()).collect();
        assert!(top.contains("Manuscript"), "top border was {top:?}");
    }

    #[test]
    fn dragging_is_yellow() {
        assert_eq!(border_color(PanelFocus::Dragging), Color::Yellow);
        assert_ne!(border_color(PanelFocus::Normal), border_color(PanelFocus::Selected));
    }
}
