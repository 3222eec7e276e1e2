// Setup overlay: pick which panels a section starts with.
//
// Shown on a section's first visit. The section stays empty until the
// user confirms.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::SetupModal;

const DIALOG_WIDTH: u16 = 44;

pub fn render(frame: &mut Frame, area: Rect, modal: &SetupModal) {
    let height = modal.prompt.choices.len() as u16 + 6;
    let dialog_area = centered_rect(DIALOG_WIDTH, height, area);

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            format!(" Set up {} ", modal.prompt.section_title),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(lines(modal))
        .block(block)
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog_area);
}

fn lines(modal: &SetupModal) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(" Choose the panels to start with:"), Line::from("")];
    for (i, choice) in modal.prompt.choices.iter().enumerate() {
        let mark = if choice.selected { "[x]" } else { "[ ]" };
        let style = if i == modal.cursor {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(
            format!(" {} {}", mark, choice.title),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Space: toggle  Enter: confirm",
        Style::default().fg(Color::Gray),
    )));
    lines
}

/// A centered rectangle of the given size, clamped to `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}
