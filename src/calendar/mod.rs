mod grid;
mod view;
mod widget;
pub(crate) use self::grid::MonthGrid;
pub(crate) use self::view::CalendarView;
pub(crate) use self::widget::{MonthCalendar, CALENDAR_HEIGHT, CALENDAR_WIDTH};
use crate::datekey::DateKey;

/// Anything that can say whether a given day carries a record
pub(crate) trait DateMarks {
    fn has_record(&self, day: DateKey) -> bool;
}
