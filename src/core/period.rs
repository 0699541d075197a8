//! Report periods and date ranges.
//!
//! All boundaries are UTC and cover whole days: a range starts at `00:00:00.000` of its first
//! day and ends at `23:59:59.999` of its last day, both inclusive. Period keys are the
//! strings stored in `tax_reports.report_date`: `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.

use crate::errors::{Error, Result};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use std::{fmt, str::FromStr};

/// Granularity of a stored report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportType {
    /// One calendar day
    Daily,
    /// One calendar month
    Monthly,
    /// One calendar year
    Yearly,
}

impl ReportType {
    /// All report types, finest first
    pub const ALL: [Self; 3] = [Self::Daily, Self::Monthly, Self::Yearly];

    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(Error::Config {
                message: format!("Unknown report type '{other}'"),
            }),
        }
    }
}

/// Inclusive UTC time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

fn invalid_date(date: &str) -> Error {
    Error::InvalidRange {
        start: date.to_string(),
        end: date.to_string(),
    }
}

fn start_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_milli_opt(0, 0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| invalid_date(&date.to_string()))
}

fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| invalid_date(&date.to_string()))
}

impl DateRange {
    /// Creates a range from explicit instants.
    ///
    /// # Errors
    /// Returns `InvalidRange` if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Covers whole UTC days from `first` to `last`, both inclusive.
    ///
    /// # Errors
    /// Returns `InvalidRange` if `first` is after `last`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        if first > last {
            return Err(Error::InvalidRange {
                start: first.to_string(),
                end: last.to_string(),
            });
        }
        Self::new(start_of_day(first)?, end_of_day(last)?)
    }

    /// First instant of the range
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Last instant of the range
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Number of calendar days touched by the range
    #[must_use]
    pub fn day_count(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days() + 1
    }

    /// Rejects ranges longer than `max_days`, bounding how many orders one request loads.
    ///
    /// # Errors
    /// Returns `RangeTooLarge` when the range spans more than `max_days` days.
    pub fn ensure_at_most(&self, max_days: i64) -> Result<()> {
        let days = self.day_count();
        if days > max_days {
            return Err(Error::RangeTooLarge { days, max_days });
        }
        Ok(())
    }
}

/// A calendar period a report is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// A single day
    Day(NaiveDate),
    /// A calendar month
    Month {
        /// Year
        year: i32,
        /// Month, 1-12
        month: u32,
    },
    /// A calendar year
    Year(i32),
}

impl ReportPeriod {
    /// A monthly period.
    ///
    /// # Errors
    /// Returns `InvalidRange` for a month outside 1-12 or an unrepresentable year.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| invalid_date(&format!("{year:04}-{month:02}")))?;
        Ok(Self::Month { year, month })
    }

    /// A yearly period.
    ///
    /// # Errors
    /// Returns `InvalidRange` for an unrepresentable year.
    pub fn year(year: i32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| invalid_date(&format!("{year:04}")))?;
        Ok(Self::Year(year))
    }

    /// The period of the given type that contains `date`.
    #[must_use]
    pub fn containing(report_type: ReportType, date: NaiveDate) -> Self {
        match report_type {
            ReportType::Daily => Self::Day(date),
            ReportType::Monthly => Self::Month {
                year: date.year(),
                month: date.month(),
            },
            ReportType::Yearly => Self::Year(date.year()),
        }
    }

    /// Parses a stored period key.
    ///
    /// # Errors
    /// Returns `InvalidRange` if the key does not match the type's format.
    pub fn parse(report_type: ReportType, key: &str) -> Result<Self> {
        match report_type {
            ReportType::Daily => NaiveDate::parse_from_str(key, "%Y-%m-%d")
                .map(Self::Day)
                .map_err(|_| invalid_date(key)),
            ReportType::Monthly => {
                let (year, month) = key.split_once('-').ok_or_else(|| invalid_date(key))?;
                let year = year.parse().map_err(|_| invalid_date(key))?;
                let month = month.parse().map_err(|_| invalid_date(key))?;
                Self::month(year, month)
            }
            ReportType::Yearly => Self::year(key.parse().map_err(|_| invalid_date(key))?),
        }
    }

    /// Report granularity of this period
    #[must_use]
    pub const fn report_type(&self) -> ReportType {
        match self {
            Self::Day(_) => ReportType::Daily,
            Self::Month { .. } => ReportType::Monthly,
            Self::Year(_) => ReportType::Yearly,
        }
    }

    /// Stored period key
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Day(date) => date.format("%Y-%m-%d").to_string(),
            Self::Month { year, month } => format!("{year:04}-{month:02}"),
            Self::Year(year) => format!("{year:04}"),
        }
    }

    /// Calendar year of the period
    #[must_use]
    pub fn calendar_year(&self) -> i32 {
        match self {
            Self::Day(date) => date.year(),
            Self::Month { year, .. } | Self::Year(year) => *year,
        }
    }

    /// Month of the period, for daily and monthly periods
    #[must_use]
    pub fn calendar_month(&self) -> Option<u32> {
        match self {
            Self::Day(date) => Some(date.month()),
            Self::Month { month, .. } => Some(*month),
            Self::Year(_) => None,
        }
    }

    /// Day of the period, for daily periods
    #[must_use]
    pub fn calendar_day(&self) -> Option<u32> {
        match self {
            Self::Day(date) => Some(date.day()),
            _ => None,
        }
    }

    /// First day of the period.
    ///
    /// # Errors
    /// Returns `InvalidRange` for an unrepresentable date.
    pub fn first_day(&self) -> Result<NaiveDate> {
        match *self {
            Self::Day(date) => Ok(date),
            Self::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| invalid_date(&self.key())),
            Self::Year(year) => {
                NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| invalid_date(&self.key()))
            }
        }
    }

    /// Last day of the period.
    ///
    /// # Errors
    /// Returns `InvalidRange` for an unrepresentable date.
    pub fn last_day(&self) -> Result<NaiveDate> {
        let months = match self {
            Self::Day(date) => return Ok(*date),
            Self::Month { .. } => Months::new(1),
            Self::Year(_) => Months::new(12),
        };
        self.first_day()?
            .checked_add_months(months)
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| invalid_date(&self.key()))
    }

    /// UTC range covering the whole period.
    ///
    /// # Errors
    /// Returns `InvalidRange` for an unrepresentable date.
    pub fn range(&self) -> Result<DateRange> {
        DateRange::days(self.first_day()?, self.last_day()?)
    }

    /// The period of the same type immediately before this one.
    ///
    /// # Errors
    /// Returns `InvalidRange` when stepping back leaves the representable calendar.
    pub fn previous(&self) -> Result<Self> {
        let first = self.first_day()?;
        let day_before = first.pred_opt().ok_or_else(|| invalid_date(&self.key()))?;
        Ok(Self::containing(self.report_type(), day_before))
    }

    /// The period of the same type immediately after this one.
    ///
    /// # Errors
    /// Returns `InvalidRange` when stepping forward leaves the representable calendar.
    pub fn next(&self) -> Result<Self> {
        let last = self.last_day()?;
        let day_after = last.succ_opt().ok_or_else(|| invalid_date(&self.key()))?;
        Ok(Self::containing(self.report_type(), day_after))
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.report_type(), self.key())
    }
}
