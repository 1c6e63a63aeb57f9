use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::successors;
use std::str::FromStr;
use thiserror::Error;
use time::{macros::format_description, Date, Duration, Month, OffsetDateTime};

/// Earliest year a [`DateKey`] can carry.  Together with [`MAX_YEAR`] this
/// keeps every rendered key exactly ten characters long.
pub(crate) const MIN_YEAR: i32 = 1;

pub(crate) const MAX_YEAR: i32 = 9999;

/// A single calendar day, rendered and stored as `YYYY-MM-DD`.
///
/// Ordering is chronological, which coincides with the lexicographic order of
/// the rendered keys.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct DateKey(Date);

impl DateKey {
    pub(crate) fn new(date: Date) -> Result<DateKey, DateKeyError> {
        if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
            Ok(DateKey(date))
        } else {
            Err(DateKeyError::YearOutOfRange(date.year()))
        }
    }

    /// The current local date.  If the local UTC offset cannot be determined
    /// (e.g., in a multithreaded process on some Unixes), the UTC date is used
    /// instead.
    pub(crate) fn today() -> Result<DateKey, DateKeyError> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|e| {
            log::warn!("{e}; using the UTC date instead");
            OffsetDateTime::now_utc()
        });
        DateKey::new(now.date())
    }

    pub(crate) fn day(self) -> u8 {
        self.0.day()
    }

    /// Returns the day `days` days after (or, if negative, before) this one,
    /// or `None` if that would leave the supported range
    pub(crate) fn offset_days(self, days: i64) -> Option<DateKey> {
        self.0
            .checked_add(Duration::days(days))
            .and_then(|d| DateKey::new(d).ok())
    }

    /// The retention cutoff for this day: the same month and day one year
    /// earlier.  A leap day rolls over to March 1 of the previous year.
    pub(crate) fn one_year_before(self) -> Option<DateKey> {
        let year = self.0.year() - 1;
        let date = Date::from_calendar_date(year, self.0.month(), self.0.day())
            .or_else(|_| Date::from_calendar_date(year, Month::March, 1))
            .ok()?;
        DateKey::new(date).ok()
    }

    /// "Monday, October 19, 2026"
    pub(crate) fn long_form(self) -> String {
        format!(
            "{}, {} {}, {}",
            self.0.weekday(),
            self.0.month(),
            self.0.day(),
            self.0.year()
        )
    }

    /// "Mon, Oct 19"
    pub(crate) fn short_form(self) -> String {
        format!(
            "{}, {} {}",
            abbreviate(self.0.weekday().to_string()),
            abbreviate(self.0.month().to_string()),
            self.0.day()
        )
    }
}

fn abbreviate(name: String) -> String {
    name.chars().take(3).collect()
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<DateKey, DateKeyError> {
        if s.len() != 10 {
            return Err(DateKeyError::Malformed(s.to_owned()));
        }
        let date = Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map_err(|_| DateKeyError::Malformed(s.to_owned()))?;
        DateKey::new(date)
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateKeyError;

    fn try_from(s: String) -> Result<DateKey, DateKeyError> {
        s.parse()
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> String {
        key.to_string()
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum DateKeyError {
    #[error("{0:?} is not a YYYY-MM-DD date")]
    Malformed(String),
    #[error("year {0} is outside the supported range 1-9999")]
    YearOutOfRange(i32),
}

/// The month shown by a calendar view
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
// Invariant: the wrapped date is the first of its month and lies within
// MIN_YEAR..=MAX_YEAR
pub(crate) struct YearMonth(Date);

impl YearMonth {
    pub(crate) fn new(year: i32, month: Month) -> Result<YearMonth, DateKeyError> {
        let first = Date::from_calendar_date(year, month, 1)
            .map_err(|_| DateKeyError::YearOutOfRange(year))?;
        DateKey::new(first).map(|_| YearMonth(first))
    }

    pub(crate) fn of(day: DateKey) -> YearMonth {
        YearMonth(day.0.replace_day(1).unwrap_or(day.0))
    }

    pub(crate) fn year(self) -> i32 {
        self.0.year()
    }

    pub(crate) fn month(self) -> Month {
        self.0.month()
    }

    pub(crate) fn first_day(self) -> DateKey {
        DateKey(self.0)
    }

    /// The following month, carrying into the next year after December
    pub(crate) fn succ(self) -> Option<YearMonth> {
        let month = self.month().next();
        let year = if month == Month::January {
            self.year() + 1
        } else {
            self.year()
        };
        YearMonth::new(year, month).ok()
    }

    /// The preceding month, borrowing from the previous year before January
    pub(crate) fn pred(self) -> Option<YearMonth> {
        let month = self.month().previous();
        let year = if month == Month::December {
            self.year() - 1
        } else {
            self.year()
        };
        YearMonth::new(year, month).ok()
    }

    /// Day of the week of the 1st, counting from Sunday = 0
    pub(crate) fn first_weekday(self) -> u8 {
        self.0.weekday().number_days_from_sunday()
    }

    pub(crate) fn days_in_month(self) -> u8 {
        self.days().last().map_or(0, Date::day)
    }

    pub(crate) fn contains(self, day: DateKey) -> bool {
        YearMonth::of(day) == self
    }

    pub(crate) fn day_keys(self) -> impl Iterator<Item = DateKey> {
        self.days().map(DateKey)
    }

    fn days(self) -> impl Iterator<Item = Date> {
        let month = self.month();
        successors(Some(self.0), |d| d.next_day()).take_while(move |d| d.month() == month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month(), self.year())
    }
}
