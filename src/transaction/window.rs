//! Resolving a user-facing time selection into a store query.

use std::num::NonZeroU32;

use time::{Date, Duration, Month};

use crate::ValidationError;

/// The month part of a calendar selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthChoice {
    /// A single calendar month.
    Month(Month),
    /// The entire year.
    FullYear,
}

/// A time selection as made in the date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    /// Every transaction, regardless of date.
    All,
    /// A calendar month or an entire year.
    Calendar {
        /// The month, or the whole year.
        month: MonthChoice,
        /// The calendar year.
        year: i32,
    },
    /// The trailing `n` days up to and including today.
    LastDays(NonZeroU32),
}

impl DateSelection {
    /// Parse the month/year controls of the date filter.
    ///
    /// `month` is either a month number from "1" to "12", or "full" for the
    /// entire year.
    ///
    /// # Errors
    /// Returns [ValidationError::InvalidMonth] if `month` is anything else.
    pub fn from_parts(month: &str, year: i32) -> Result<Self, ValidationError> {
        let month = month.trim();

        let month = if month.eq_ignore_ascii_case("full") {
            MonthChoice::FullYear
        } else {
            let number: u8 = month
                .parse()
                .map_err(|_| ValidationError::InvalidMonth(month.to_owned()))?;
            let month = Month::try_from(number)
                .map_err(|_| ValidationError::InvalidMonth(month.to_owned()))?;

            MonthChoice::Month(month)
        };

        Ok(Self::Calendar { month, year })
    }

    /// Select the trailing `days` days.
    ///
    /// # Errors
    /// Returns [ValidationError::ZeroDays] if `days` is zero.
    pub fn last_days(days: u32) -> Result<Self, ValidationError> {
        NonZeroU32::new(days)
            .map(Self::LastDays)
            .ok_or(ValidationError::ZeroDays)
    }

    /// The month that `today` falls in.
    pub fn current_month(today: Date) -> Self {
        Self::Calendar {
            month: MonthChoice::Month(today.month()),
            year: today.year(),
        }
    }

    /// The year that `today` falls in.
    pub fn current_year(today: Date) -> Self {
        Self::Calendar {
            month: MonthChoice::FullYear,
            year: today.year(),
        }
    }
}

/// The resolved time scope that decides which store query is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Every transaction.
    All,
    /// A single calendar month.
    Month {
        /// The calendar year.
        year: i32,
        /// The calendar month.
        month: Month,
    },
    /// A single calendar year.
    Year(i32),
    /// The trailing `n` days up to and including today.
    LastDays(NonZeroU32),
}

/// Translate a date filter selection into a [DateWindow].
pub fn resolve(selection: DateSelection) -> DateWindow {
    match selection {
        DateSelection::All => DateWindow::All,
        DateSelection::Calendar {
            month: MonthChoice::FullYear,
            year,
        } => DateWindow::Year(year),
        DateSelection::Calendar {
            month: MonthChoice::Month(month),
            year,
        } => DateWindow::Month { year, month },
        DateSelection::LastDays(days) => DateWindow::LastDays(days),
    }
}

/// The query a [DateWindow] translates to.
///
/// The store's range query works on whole months, so a "last N days" window
/// fetches every month it touches and is narrowed down afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeQuery {
    /// Fetch all transactions.
    All,
    /// Fetch a single month.
    Month {
        /// The calendar year.
        year: i32,
        /// The calendar month.
        month: Month,
    },
    /// Fetch a single year.
    Year(i32),
    /// Fetch every month from the start month to the end month (inclusive).
    Range {
        /// The year of the first month.
        start_year: i32,
        /// The first month.
        start_month: Month,
        /// The year of the last month.
        end_year: i32,
        /// The last month.
        end_month: Month,
    },
}

impl DateWindow {
    /// The earliest date that a "last N days" window keeps.
    ///
    /// This is a calendar subtraction, so it does not depend on daylight
    /// saving transitions. Other windows have no cutoff.
    pub fn cutoff(&self, today: Date) -> Option<Date> {
        match self {
            DateWindow::LastDays(days) => Some(
                today
                    .checked_sub(Duration::days(i64::from(days.get())))
                    .unwrap_or(Date::MIN),
            ),
            _ => None,
        }
    }

    /// The day-precision bounds to apply after fetching, if the query is coarser than the window.
    pub fn post_fetch_bounds(&self, today: Date) -> Option<DateRange> {
        self.cutoff(today).map(|start| DateRange { start, end: today })
    }

    /// The store query to issue for this window.
    pub fn query(&self, today: Date) -> RangeQuery {
        match *self {
            DateWindow::All => RangeQuery::All,
            DateWindow::Month { year, month } => RangeQuery::Month { year, month },
            DateWindow::Year(year) => RangeQuery::Year(year),
            DateWindow::LastDays(_) => {
                let start = self.cutoff(today).unwrap_or(today);

                RangeQuery::Range {
                    start_year: start.year(),
                    start_month: start.month(),
                    end_year: today.year(),
                    end_month: today.month(),
                }
            }
        }
    }

    /// A short description of the window, e.g. "March 2024" or "Last 30 days".
    pub fn label(&self) -> String {
        match self {
            DateWindow::All => "All time".to_owned(),
            DateWindow::Month { year, month } => format!("{month} {year}"),
            DateWindow::Year(year) => format!("Year {year}"),
            DateWindow::LastDays(days) => format!("Last {days} days"),
        }
    }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first date in the range.
    pub start: Date,
    /// The last date in the range.
    pub end: Date,
}

impl DateRange {
    /// Whether `date` lies within the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The first and last day of a calendar month.
///
/// # Errors
/// Returns [ValidationError::InvalidDate] if `year` is outside the supported range.
pub fn month_bounds(year: i32, month: Month) -> Result<DateRange, ValidationError> {
    month_range(year, month, year, month)
}

/// The first and last day of a calendar year.
///
/// # Errors
/// Returns [ValidationError::InvalidDate] if `year` is outside the supported range.
pub fn year_bounds(year: i32) -> Result<DateRange, ValidationError> {
    month_range(year, Month::January, year, Month::December)
}

/// The first day of the start month to the last day of the end month.
///
/// # Errors
/// Returns [ValidationError::InvalidDate] if either year is outside the supported range.
pub fn month_range(
    start_year: i32,
    start_month: Month,
    end_year: i32,
    end_month: Month,
) -> Result<DateRange, ValidationError> {
    let start = Date::from_calendar_date(start_year, start_month, 1)
        .map_err(|error| ValidationError::InvalidDate(error.to_string()))?;
    let end = Date::from_calendar_date(end_year, end_month, last_day_of_month(end_year, end_month))
        .map_err(|error| ValidationError::InvalidDate(error.to_string()))?;

    Ok(DateRange { start, end })
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
