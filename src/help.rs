use crate::theme::LABEL_STYLE;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};

/// Key bindings and what they do, in display order
static BINDINGS: &[(&str, &str)] = &[
    ("l, RIGHT, n", "Next week"),
    ("h, LEFT, p", "Previous week"),
    ("j, DOWN", "Scroll down one hour"),
    ("k, UP", "Scroll up one hour"),
    ("0, HOME", "Jump to this week"),
    ("?", "Show this help"),
    ("q, ESC", "Quit"),
];

const KEY_COLUMN_WIDTH: usize = 14;

/// Overlay listing the key bindings along with where the schedule came from
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help<'a> {
    style: Style,
    source: &'a str,
}

impl<'a> Help<'a> {
    pub(crate) fn new(style: Style, source: &'a str) -> Help<'a> {
        Help { style, source }
    }

    fn text(&self) -> Text<'a> {
        let mut lines = BINDINGS
            .iter()
            .map(|&(keys, action)| {
                Line::from_iter([
                    Span::styled(format!("{keys:<KEY_COLUMN_WIDTH$}"), LABEL_STYLE),
                    Span::raw(action),
                ])
            })
            .collect::<Vec<_>>();
        lines.push(Line::raw(""));
        lines.push(Line::raw(format!("Schedule: {}", self.source)));
        lines.push(Line::raw(""));
        lines.push(Line::raw("Press the Any Key to dismiss."));
        Text::from(lines)
    }
}

impl Widget for Help<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = self.text();
        let height = u16::try_from(text.height())
            .unwrap_or(u16::MAX)
            .min(area.height)
            .saturating_add(2);
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .min(area.width)
            .saturating_add(2);
        let [popup] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [popup] = Layout::vertical([height]).flex(Flex::Center).areas(popup);
        Clear.render(popup, buf);
        Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(" Keys ")
                    .title_alignment(Alignment::Center),
            )
            .style(self.style)
            .render(popup, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::BASE_STYLE;

    #[test]
    fn test_text() {
        let text = Help::new(BASE_STYLE, "schedule.json (alice)").text();
        let lines = text
            .lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(lines[0], "l, RIGHT, n   Next week");
        assert_eq!(lines[6], "q, ESC        Quit");
        assert_eq!(lines[8], "Schedule: schedule.json (alice)");
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_render_centered() {
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        Help::new(BASE_STYLE, "s.json (bob)").render(area, &mut buf);
        let top = (0..area.height)
            .find(|&y| buf[(13, y)].symbol() == "─")
            .unwrap();
        assert!(top > 0);
        let row = (0..area.width)
            .map(|x| buf[(x, top)].symbol())
            .collect::<String>();
        assert!(row.contains(" Keys "), "{row:?}");
    }
}
