use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting window selector used by dashboard-style aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportRange {
    Monthly,
    Quarterly,
    Annual,
}

impl fmt::Display for ReportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportRange::Monthly => write!(f, "monthly"),
            ReportRange::Quarterly => write!(f, "quarterly"),
            ReportRange::Annual => write!(f, "annual"),
        }
    }
}

impl std::str::FromStr for ReportRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(ReportRange::Monthly),
            "quarterly" => Ok(ReportRange::Quarterly),
            "annual" => Ok(ReportRange::Annual),
            other => Err(format!("Unknown report range: '{other}'")),
        }
    }
}

impl ReportRange {
    /// The calendar window containing `today`: current month, current
    /// quarter, or current year.
    pub fn date_range(self, today: NaiveDate) -> DateRange {
        let year = today.year();
        match self {
            ReportRange::Monthly => {
                let start = first_of(year, today.month());
                DateRange::new(start, month_end(year, today.month()))
            }
            ReportRange::Quarterly => {
                let quarter_start = (today.month0() / 3) * 3 + 1;
                let start = first_of(year, quarter_start);
                DateRange::new(start, month_end(year, quarter_start + 2))
            }
            ReportRange::Annual => {
                DateRange::new(first_of(year, 1), month_end(year, 12))
            }
        }
    }
}

fn first_of(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

fn month_end(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    first_of(next_year, next_month).pred_opt().unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
