use super::DateMarks;
use crate::datekey::{DateKey, YearMonth};
use std::slice::ChunksExact;

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// A month is always laid out over six weeks, whether or not it needs them
pub(crate) const GRID_CELLS: usize = 6 * DAYS_IN_WEEK;

/// One position in a month grid.  Padding cells have no `day`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct CalendarCell {
    pub(crate) day: Option<u8>,
    pub(crate) is_today: bool,
    pub(crate) has_record: bool,
    pub(crate) is_selected: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MonthGrid {
    month: YearMonth,
    cells: [CalendarCell; GRID_CELLS],
}

impl MonthGrid {
    pub(crate) fn build<M: DateMarks + ?Sized>(
        month: YearMonth,
        marks: &M,
        today: DateKey,
        selected: Option<DateKey>,
    ) -> MonthGrid {
        let mut cells = [CalendarCell::default(); GRID_CELLS];
        let leading = usize::from(month.first_weekday());
        let days = usize::from(month.days_in_month());
        // At most 6 leading blanks plus 31 days, so nothing is cut off
        for (cell, key) in cells
            .iter_mut()
            .skip(leading)
            .take(days)
            .zip(month.day_keys())
        {
            *cell = CalendarCell {
                day: Some(key.day()),
                is_today: key == today,
                has_record: marks.has_record(key),
                is_selected: selected == Some(key),
            };
        }
        MonthGrid { month, cells }
    }

    pub(crate) fn month(&self) -> YearMonth {
        self.month
    }

    pub(crate) fn cells(&self) -> &[CalendarCell] {
        &self.cells
    }

    /// The grid as six rows of seven cells, Sunday first
    pub(crate) fn rows(&self) -> ChunksExact<'_, CalendarCell> {
        self.cells().chunks_exact(DAYS_IN_WEEK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DateRecords;
    use time::Month;

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_january_2026() {
        let month = YearMonth::new(2026, Month::January).unwrap();
        let marks = DateRecords::<bool>::new();
        let grid = MonthGrid::build(month, &marks, key("2026-10-19"), None);
        let cells = grid.cells();
        assert_eq!(cells.len(), 42);
        assert!(cells[..4].iter().all(|c| c.day.is_none()));
        assert_eq!(cells[4].day, Some(1));
        assert_eq!(cells[34].day, Some(31));
        assert!(cells[35..].iter().all(|c| c.day.is_none()));
        assert_eq!(cells.iter().filter(|c| c.day.is_some()).count(), 31);
        assert_eq!(grid.rows().count(), 6);
    }

    #[test]
    fn test_always_42_cells() {
        let marks = DateRecords::<bool>::new();
        let today = key("2026-10-19");
        let mut month = YearMonth::new(2023, Month::January).unwrap();
        for _ in 0..48 {
            let grid = MonthGrid::build(month, &marks, today, None);
            assert_eq!(grid.cells().len(), GRID_CELLS);
            let days = grid.cells().iter().filter(|c| c.day.is_some()).count();
            assert_eq!(days, usize::from(month.days_in_month()));
            let leading = grid.cells().iter().take_while(|c| c.day.is_none()).count();
            assert_eq!(leading, usize::from(month.first_weekday()));
            month = month.succ().unwrap();
        }
    }

    #[test]
    fn test_flags() {
        let month = YearMonth::new(2026, Month::January).unwrap();
        let marks = DateRecords::from_iter([(key("2026-01-29"), true), (key("2026-02-01"), true)]);
        let grid = MonthGrid::build(
            month,
            &marks,
            key("2026-01-19"),
            Some(key("2026-01-05")),
        );
        let cell = |day: u8| {
            *grid
                .cells()
                .iter()
                .find(|c| c.day == Some(day))
                .unwrap()
        };
        assert!(cell(29).has_record);
        assert!(!cell(28).has_record);
        assert!(cell(19).is_today);
        assert_eq!(grid.cells().iter().filter(|c| c.is_today).count(), 1);
        assert!(cell(5).is_selected);
        assert_eq!(grid.cells().iter().filter(|c| c.is_selected).count(), 1);
        assert_eq!(grid.cells().iter().filter(|c| c.has_record).count(), 1);
    }

    #[test]
    fn test_today_outside_month() {
        let month = YearMonth::new(2026, Month::March).unwrap();
        let marks = DateRecords::<bool>::new();
        let grid = MonthGrid::build(month, &marks, key("2026-10-19"), Some(key("2026-04-01")));
        assert!(grid.cells().iter().all(|c| !c.is_today && !c.is_selected));
    }

    #[test]
    fn test_deterministic() {
        let month = YearMonth::new(2024, Month::February).unwrap();
        let marks = DateRecords::from_iter([(key("2024-02-29"), true)]);
        let a = MonthGrid::build(month, &marks, key("2024-02-10"), None);
        let b = MonthGrid::build(month, &marks, key("2024-02-10"), None);
        assert_eq!(a, b);
        assert_eq!(a.month(), month);
    }
}
