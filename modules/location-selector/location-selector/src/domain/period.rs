//! Month/year report period with dashboard availability windows.

use std::fmt;

use chrono::{Datelike, Month, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which dashboard a period filter serves. Each has its own first month
/// with data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    #[default]
    Standard,
    ServiceDelivery,
}

impl DashboardKind {
    /// First month reports exist for.
    #[must_use]
    pub fn first_month(self) -> ReportMonth {
        match self {
            Self::Standard => ReportMonth {
                year: 2017,
                month: 3,
            },
            Self::ServiceDelivery => ReportMonth {
                year: 2019,
                month: 2,
            },
        }
    }
}

/// A calendar month reports are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportMonth {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl ReportMonth {
    /// Returns `None` unless `month` is in `1..=12`.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month in progress, in UTC.
    #[must_use]
    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Month from `month`/`year` query parameters; each missing or
    /// unparsable part falls back to `today`'s.
    #[must_use]
    pub fn from_query(month: Option<&str>, year: Option<&str>, today: NaiveDate) -> Self {
        let month = month
            .and_then(|m| m.trim().parse::<u32>().ok())
            .filter(|m| (1..=12).contains(m))
            .unwrap_or_else(|| today.month());
        let year = year
            .and_then(|y| y.trim().parse::<i32>().ok())
            .unwrap_or_else(|| today.year());
        Self { year, month }
    }

    /// Full English month name followed by the year, e.g. `March 2017`.
    #[must_use]
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map_or("Unknown", |m| m.name());
        write!(f, "{name} {}", self.year)
    }
}

/// Result of validating a month against the availability window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodResolution {
    pub month: ReportMonth,
    /// The requested month was outside the window and replaced by the
    /// current month; the UI explains why.
    pub was_reset: bool,
}

/// Month/year filter bounded by a dashboard's first month and today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodFilter {
    kind: DashboardKind,
}

impl PeriodFilter {
    #[must_use]
    pub fn new(kind: DashboardKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub fn kind(self) -> DashboardKind {
        self.kind
    }

    #[must_use]
    pub fn window_start(self) -> ReportMonth {
        self.kind.first_month()
    }

    #[must_use]
    pub fn available_years(self, today: NaiveDate) -> Vec<i32> {
        (self.window_start().year..=today.year()).collect()
    }

    /// Months of `year` between the window start and the current month.
    #[must_use]
    pub fn available_months(self, year: i32, today: NaiveDate) -> Vec<ReportMonth> {
        let start = self.window_start();
        let end = ReportMonth::containing(today);
        (1..=12)
            .map(|month| ReportMonth { year, month })
            .filter(|m| *m >= start && *m <= end)
            .collect()
    }

    /// Switches `selection` to `year`, clamping the month into the months
    /// available that year. A year outside the window yields the current
    /// month.
    #[must_use]
    pub fn select_year(self, selection: ReportMonth, year: i32, today: NaiveDate) -> ReportMonth {
        let months = self.available_months(year, today);
        match (months.first(), months.last()) {
            (Some(first), Some(last)) => ReportMonth {
                year,
                month: selection.month.clamp(first.month, last.month),
            },
            _ => ReportMonth::containing(today),
        }
    }

    /// Replaces a month outside the window with the current month.
    #[must_use]
    pub fn normalize(self, selection: ReportMonth, today: NaiveDate) -> PeriodResolution {
        let current = ReportMonth::containing(today);
        if selection < self.window_start() || selection > current {
            PeriodResolution {
                month: current,
                was_reset: true,
            }
        } else {
            PeriodResolution {
                month: selection,
                was_reset: false,
            }
        }
    }
}
