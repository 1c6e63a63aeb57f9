use crate::datekey::YearMonth;
use crate::theme::Palette;
use crossterm::event::KeyCode;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Margin, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Widget},
};
use time::Month;

const OUTER_WIDTH: u16 = 17;
const OUTER_HEIGHT: u16 = 8;
const ENTER_POS: usize = 6;

/// Popup for typing a month to jump the calendar to
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct JumpTo<'a> {
    state: &'a JumpToState,
    palette: Palette,
}

impl<'a> JumpTo<'a> {
    pub(crate) fn new(state: &'a JumpToState, palette: Palette) -> Self {
        JumpTo { state, palette }
    }
}

impl Widget for JumpTo<'_> {
    /*
     * .................
     * .┌─ Jump To… ──┐.
     * .│             │.
     * .│   YYYY-MM   │.
     * .│             │.
     * .│   [ENTER]   │.
     * .└─────────────┘.
     * .................
     */

    fn render(self, area: Rect, buf: &mut Buffer) {
        let [outer_area] = Layout::horizontal([OUTER_WIDTH])
            .flex(Flex::Center)
            .areas(area);
        let [outer_area] = Layout::vertical([OUTER_HEIGHT])
            .flex(Flex::Center)
            .areas(outer_area);
        Clear.render(outer_area, buf);
        Block::new().style(self.palette.base).render(outer_area, buf);
        let block_area = outer_area.inner(Margin::new(1, 1));
        Block::bordered()
            .title(" Jump To… ")
            .title_alignment(Alignment::Center)
            .render(block_area, buf);
        let text_area = block_area.inner(Margin::new(1, 1));
        self.state.to_text(self.palette).render(text_area, buf);
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct JumpToState {
    year: [Option<u8>; 4],
    month: [Option<u8>; 2],
    pos: usize,
}

impl JumpToState {
    pub(crate) fn new() -> JumpToState {
        JumpToState::default()
    }

    fn to_text(self, palette: Palette) -> Text<'static> {
        Text::from_iter([
            Line::styled("", palette.base),
            self.to_line(palette),
            Line::styled("", palette.base),
            // Style a span and convert it to a line rather than creating a
            // styled line directly so that only the "[ENTER]" text and not any
            // of its centering padding will be underlined:
            Line::from(Span::styled(
                "[ENTER]",
                if self.pos == ENTER_POS {
                    palette.ready()
                } else {
                    palette.base
                },
            )),
        ])
        .centered()
    }

    fn to_line(self, palette: Palette) -> Line<'static> {
        let mut spans = Vec::new();
        let mut first = true;
        for (fallback, digits) in [("Y", self.year.as_slice()), ("M", self.month.as_slice())] {
            if !std::mem::replace(&mut first, false) {
                spans.push(Span::styled("-", palette.base));
            }
            for dg in digits {
                spans.push(match dg {
                    Some(d) => Span::styled(format!("{d}"), palette.base),
                    None => Span::styled(fallback, palette.unfilled()),
                });
            }
        }
        Line::from_iter(spans)
    }

    pub(crate) fn handle_input(&mut self, input: JumpToInput) -> JumpToOutput {
        match (input, self.pos) {
            (JumpToInput::Digit(d), 0..ENTER_POS) => {
                match self.pos {
                    0..4 => self.year[self.pos] = Some(d),
                    _ => self.month[self.pos - 4] = Some(d),
                }
                self.pos += 1;
                JumpToOutput::Ok
            }
            (JumpToInput::Backspace, 1..) => {
                self.pos -= 1;
                match self.pos {
                    0..4 => self.year[self.pos] = None,
                    _ => self.month[self.pos - 4] = None,
                }
                JumpToOutput::Ok
            }
            (JumpToInput::Enter, ENTER_POS) => {
                let year = self
                    .year
                    .iter()
                    .flatten()
                    .fold(0i32, |acc, &d| acc * 10 + i32::from(d));
                let month = self
                    .month
                    .iter()
                    .flatten()
                    .fold(0u8, |acc, &d| acc * 10 + d);
                let Ok(month) = Month::try_from(month) else {
                    return JumpToOutput::Invalid;
                };
                match YearMonth::new(year, month) {
                    Ok(ym) => JumpToOutput::Jump(ym),
                    Err(_) => JumpToOutput::Invalid,
                }
            }
            _ => JumpToOutput::Invalid,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JumpToInput {
    Digit(u8),
    Backspace,
    Enter,
}

impl JumpToInput {
    /// Maps a key press onto popup input, if it means anything there
    pub(crate) fn from_key(code: KeyCode) -> Option<JumpToInput> {
        match code {
            KeyCode::Char(c) => c
                .to_digit(10)
                .and_then(|d| u8::try_from(d).ok())
                .map(JumpToInput::Digit),
            KeyCode::Backspace | KeyCode::Delete => Some(JumpToInput::Backspace),
            KeyCode::Enter => Some(JumpToInput::Enter),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum JumpToOutput {
    Ok,
    Invalid,
    Jump(YearMonth),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_digits(state: &mut JumpToState, digits: &str) {
        for c in digits.chars() {
            let d = u8::try_from(c.to_digit(10).unwrap()).unwrap();
            assert_eq!(state.handle_input(JumpToInput::Digit(d)), JumpToOutput::Ok);
        }
    }

    #[test]
    fn test_jump() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "202602");
        assert_eq!(
            state.handle_input(JumpToInput::Enter),
            JumpToOutput::Jump(YearMonth::new(2026, Month::February).unwrap())
        );
    }

    #[test]
    fn test_enter_before_complete() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "2026");
        assert_eq!(state.handle_input(JumpToInput::Enter), JumpToOutput::Invalid);
    }

    #[test]
    fn test_too_many_digits() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "202612");
        assert_eq!(
            state.handle_input(JumpToInput::Digit(1)),
            JumpToOutput::Invalid
        );
    }

    #[test]
    fn test_bad_month() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "202613");
        assert_eq!(state.handle_input(JumpToInput::Enter), JumpToOutput::Invalid);
        assert_eq!(state.handle_input(JumpToInput::Backspace), JumpToOutput::Ok);
        assert_eq!(state.handle_input(JumpToInput::Backspace), JumpToOutput::Ok);
        type_digits(&mut state, "01");
        assert_eq!(
            state.handle_input(JumpToInput::Enter),
            JumpToOutput::Jump(YearMonth::new(2026, Month::January).unwrap())
        );
    }

    #[test]
    fn test_year_zero() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "000005");
        assert_eq!(state.handle_input(JumpToInput::Enter), JumpToOutput::Invalid);
    }

    #[test]
    fn test_backspace_at_start() {
        let mut state = JumpToState::new();
        assert_eq!(
            state.handle_input(JumpToInput::Backspace),
            JumpToOutput::Invalid
        );
    }

    #[test]
    fn test_line() {
        let mut state = JumpToState::new();
        type_digits(&mut state, "20");
        let line = state.to_line(crate::theme::DARK);
        let s = line
            .spans
            .iter()
            .map(|sp| sp.content.as_ref())
            .collect::<String>();
        assert_eq!(s, "20YY-MM");
    }
}
