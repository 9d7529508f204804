use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

/// Size of the reporting bucket used on the x-axis of trend views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    Week,
    #[default]
    Month,
    Quarter,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            other => Err(format!("Unknown granularity '{}'", other)),
        }
    }
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
        }
    }

    /// Sortable label of the bucket containing `date`: `2024-W03`, `2024-01`
    /// or `2024-Q1`. Weeks use the ISO week-numbering year.
    pub fn period_label(&self, date: NaiveDate) -> String {
        match self {
            Self::Week => week_label(date),
            Self::Month => month_label(date),
            Self::Quarter => quarter_label(date),
        }
    }
}

pub fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

pub fn month_label(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

pub fn quarter_label(date: NaiveDate) -> String {
    format!("{}-Q{}", date.year(), (date.month() - 1) / 3 + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    ThisMonth,
    ThisQuarter,
    ThisYear,
    LastMonth,
    LastQuarter,
    LastYear,
    All,
}

impl FromStr for DatePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "this_month" => Ok(Self::ThisMonth),
            "this_quarter" => Ok(Self::ThisQuarter),
            "this_year" => Ok(Self::ThisYear),
            "last_month" => Ok(Self::LastMonth),
            "last_quarter" => Ok(Self::LastQuarter),
            "last_year" => Ok(Self::LastYear),
            "all" => Ok(Self::All),
            other => Err(format!("Unknown date preset '{}'", other)),
        }
    }
}

impl DatePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThisMonth => "this_month",
            Self::ThisQuarter => "this_quarter",
            Self::ThisYear => "this_year",
            Self::LastMonth => "last_month",
            Self::LastQuarter => "last_quarter",
            Self::LastYear => "last_year",
            Self::All => "all",
        }
    }
}

/// Inclusive reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Default for DateRange {
    fn default() -> Self {
        Self::all()
    }
}

impl DateRange {
    pub fn all() -> Self {
        Self {
            from: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
            to: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or_default(),
        }
    }

    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// Resolve a preset relative to `today`. Taking the reference date as an
    /// argument keeps the window deterministic under test.
    pub fn from_preset(preset: DatePreset, today: NaiveDate) -> Self {
        let (from, to) = match preset {
            DatePreset::ThisMonth => (month_start(today), month_end(today)),
            DatePreset::LastMonth => {
                let last_month = month_start(today).pred_opt().unwrap_or(today);
                (month_start(last_month), month_end(last_month))
            }
            DatePreset::ThisQuarter => (quarter_start(today), quarter_end(today)),
            DatePreset::LastQuarter => {
                let last_quarter = quarter_start(today).pred_opt().unwrap_or(today);
                (quarter_start(last_quarter), quarter_end(last_quarter))
            }
            DatePreset::ThisYear => (year_start(today.year()), year_end(today.year())),
            DatePreset::LastYear => (year_start(today.year() - 1), year_end(today.year() - 1)),
            DatePreset::All => return Self::all(),
        };
        Self { from, to }
    }

    pub fn from_str(&self) -> String {
        self.from.format("%Y-%m-%d").to_string()
    }

    pub fn to_str(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

fn quarter_start(date: NaiveDate) -> NaiveDate {
    let month = (date.month() - 1) / 3 * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

fn quarter_end(date: NaiveDate) -> NaiveDate {
    let last_month = quarter_start(date).month() + 2;
    NaiveDate::from_ymd_opt(date.year(), last_month, 1)
        .map(month_end)
        .unwrap_or(date)
}

fn year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default()
}

fn year_end(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or_default()
}
