use super::grid::{CalendarCell, MonthGrid};
use crate::theme::Palette;
use ratatui::{
    buffer::Buffer,
    layout::{Flex, Layout, Rect},
    style::{Modifier, Style},
    text::Text,
    widgets::{Paragraph, Widget},
};

static HEADER: &str = " Su   Mo   Tu   We   Th   Fr   Sa  ";

/// Number of columns per day of week
const DAY_WIDTH: u16 = 5;

pub(crate) const CALENDAR_WIDTH: u16 = DAY_WIDTH * 7;

/// Number of lines taken up by the month title, the weekday header, and its
/// rule
const HEADER_LINES: u16 = 3;

pub(crate) const CALENDAR_HEIGHT: u16 = HEADER_LINES + 6;

const ACS_HLINE: char = '─';

const RECORD_MARK: char = '•';

/// Draws a [`MonthGrid`] as a fixed 7×6 block centered horizontally in its
/// area
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct MonthCalendar<'a> {
    grid: &'a MonthGrid,
    palette: Palette,
}

impl<'a> MonthCalendar<'a> {
    pub(crate) fn new(grid: &'a MonthGrid, palette: Palette) -> Self {
        MonthCalendar { grid, palette }
    }

    fn cell_style(&self, cell: &CalendarCell) -> Style {
        let mut style = if cell.is_today {
            self.palette.today
        } else if cell.has_record {
            self.palette.record
        } else {
            self.palette.base
        };
        if cell.is_selected {
            style = style.add_modifier(Modifier::REVERSED);
        }
        style
    }
}

fn cell_text(day: u8, cell: &CalendarCell) -> String {
    let (open, close) = if cell.is_today {
        ('[', ']')
    } else {
        (' ', ' ')
    };
    let mark = if cell.has_record { RECORD_MARK } else { ' ' };
    format!("{open}{day:2}{close}{mark}")
}

impl Widget for MonthCalendar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [area] = Layout::horizontal([CALENDAR_WIDTH.min(area.width)])
            .flex(Flex::Center)
            .areas(area);
        let mut canvas = BufferCanvas::new(area, buf);
        let title = self.grid.month().to_string();
        let title_width = u16::try_from(title.len()).unwrap_or(u16::MAX);
        canvas.mvprint(
            0,
            CALENDAR_WIDTH.saturating_sub(title_width) / 2,
            title,
            Some(self.palette.heading),
        );
        canvas.mvprint(1, 0, HEADER, Some(self.palette.heading));
        canvas.hline(2, 0, ACS_HLINE, CALENDAR_WIDTH, self.palette.muted);
        for (y, row) in std::iter::zip(HEADER_LINES.., self.grid.rows()) {
            for (col, cell) in std::iter::zip(0u16.., row) {
                if let Some(day) = cell.day {
                    canvas.mvprint(
                        y,
                        col * DAY_WIDTH,
                        cell_text(day, cell),
                        Some(self.cell_style(cell)),
                    );
                }
            }
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style.unwrap_or_default());
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // Using a Paragraph lets us truncate text that extends beyond the
            // calendar's area, though we need to be sure that the Rect passed
            // to the Paragraph is entirely within the frame lest a panic
            // result.
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }

    fn hline(&mut self, y: u16, x: u16, ch: char, length: u16, style: Style) {
        self.mvprint(y, x, String::from(ch).repeat(length.into()), Some(style));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datekey::{DateKey, YearMonth};
    use crate::records::DateRecords;
    use crate::theme::DARK;
    use time::Month;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn lines(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_render_january_2026() {
        let month = YearMonth::new(2026, Month::January).unwrap();
        let marks = DateRecords::from_iter([(key("2026-01-01"), true), (key("2026-01-29"), true)]);
        let grid = MonthGrid::build(month, &marks, key("2026-01-19"), None);
        let area = Rect::new(0, 0, CALENDAR_WIDTH, CALENDAR_HEIGHT);
        let mut buffer = Buffer::empty(area);
        MonthCalendar::new(&grid, DARK).render(area, &mut buffer);
        assert_eq!(
            lines(&buffer),
            [
                "           January 2026            ",
                " Su   Mo   Tu   We   Th   Fr   Sa  ",
                "───────────────────────────────────",
                "                      1 •  2    3  ",
                "  4    5    6    7    8    9   10  ",
                " 11   12   13   14   15   16   17  ",
                " 18  [19]  20   21   22   23   24  ",
                " 25   26   27   28   29 • 30   31  ",
                "                                   ",
            ]
        );
        assert_eq!(buffer[(21, 3)].style().fg, DARK.record.fg);
        assert_eq!(buffer[(5, 6)].style().fg, DARK.today.fg);
    }

    #[test]
    fn test_selected_is_reversed() {
        let month = YearMonth::new(2026, Month::February).unwrap();
        let marks = DateRecords::<bool>::new();
        let grid = MonthGrid::build(month, &marks, key("2026-10-19"), Some(key("2026-02-03")));
        let area = Rect::new(0, 0, CALENDAR_WIDTH, CALENDAR_HEIGHT);
        let mut buffer = Buffer::empty(area);
        MonthCalendar::new(&grid, DARK).render(area, &mut buffer);
        // February 2026 starts on a Sunday, so the 3rd is in the third column
        assert_eq!(&lines(&buffer)[3], "  1    2    3    4    5    6    7  ");
        assert!(buffer[(11, 3)]
            .style()
            .add_modifier
            .contains(Modifier::REVERSED));
        assert!(!buffer[(6, 3)]
            .style()
            .add_modifier
            .contains(Modifier::REVERSED));
    }

    #[test]
    fn test_centered_in_wider_area() {
        let month = YearMonth::new(2026, Month::February).unwrap();
        let marks = DateRecords::<bool>::new();
        let grid = MonthGrid::build(month, &marks, key("2026-10-19"), None);
        let area = Rect::new(0, 0, CALENDAR_WIDTH + 10, CALENDAR_HEIGHT);
        let mut buffer = Buffer::empty(area);
        MonthCalendar::new(&grid, DARK).render(area, &mut buffer);
        assert_eq!(
            &lines(&buffer)[1],
            "      Su   Mo   Tu   We   Th   Fr   Sa       "
        );
    }
}
