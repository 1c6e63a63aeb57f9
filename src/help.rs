use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};

/// A centered popup listing a screen's key bindings
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help {
    text: &'static [&'static str],
    style: Style,
}

impl Help {
    pub(crate) fn new(text: &'static [&'static str], style: Style) -> Help {
        Help { text, style }
    }
}

impl Widget for Help {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self
            .text
            .iter()
            .copied()
            .map(Line::raw)
            .chain([Line::raw(""), Line::raw("Press the Any Key to dismiss.")])
            .collect::<Vec<_>>();
        let text = Text::from(lines);
        let height = u16::try_from(text.height())
            .unwrap_or(u16::MAX)
            .min(area.height)
            .saturating_add(2);
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .min(area.width)
            .saturating_add(2);
        let para = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(" Commands ")
                    .title_alignment(Alignment::Center),
            )
            .style(self.style);
        let [help_area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [help_area] = Layout::vertical([height])
            .flex(Flex::Center)
            .areas(help_area);
        let outer_area = Rect {
            x: help_area.x.saturating_sub(1),
            y: help_area.y,
            width: help_area.width.saturating_add(2),
            height: help_area.height,
        }
        .intersection(area);
        Clear.render(outer_area, buf);
        Block::new().style(self.style).render(outer_area, buf);
        para.render(help_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEXT: &[&str] = &["q, ESC          Quit"];

    #[test]
    fn test_render() {
        let area = Rect::new(0, 0, 40, 7);
        let mut buffer = Buffer::empty(area);
        Help::new(TEXT, Style::new()).render(area, &mut buffer);
        let rows = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>();
        assert!(rows[0].trim().is_empty());
        assert!(rows[1].contains(" Commands "));
        assert!(rows[2].contains("│q, ESC          Quit"));
        assert!(rows[4].contains("│Press the Any Key to dismiss.│"));
        assert!(rows[5].contains('└'));
    }
}
