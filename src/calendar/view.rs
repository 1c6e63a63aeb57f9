use crate::datekey::{DateKey, YearMonth};
use thiserror::Error;

/// Which month a calendar is showing, plus a day cursor that the month
/// follows when it moves past either end
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct CalendarView {
    month: YearMonth,
    cursor: DateKey,
}

impl CalendarView {
    pub(crate) fn new(today: DateKey) -> Self {
        CalendarView {
            month: YearMonth::of(today),
            cursor: today,
        }
    }

    pub(crate) fn month(&self) -> YearMonth {
        self.month
    }

    pub(crate) fn cursor(&self) -> DateKey {
        self.cursor
    }

    pub(crate) fn show_day(&mut self, day: DateKey) {
        self.cursor = day;
        if !self.month.contains(day) {
            self.month = YearMonth::of(day);
        }
    }

    pub(crate) fn show_month(&mut self, month: YearMonth) {
        self.month = month;
        self.cursor = month.first_day();
    }

    pub(crate) fn move_cursor(&mut self, days: i64) -> Result<(), OutOfTimeError> {
        let day = self.cursor.offset_days(days).ok_or(OutOfTimeError)?;
        self.show_day(day);
        Ok(())
    }

    pub(crate) fn next_month(&mut self) -> Result<(), OutOfTimeError> {
        let month = self.month.succ().ok_or(OutOfTimeError)?;
        self.show_month(month);
        Ok(())
    }

    pub(crate) fn prev_month(&mut self) -> Result<(), OutOfTimeError> {
        let month = self.month.pred().ok_or(OutOfTimeError)?;
        self.show_month(month);
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;
