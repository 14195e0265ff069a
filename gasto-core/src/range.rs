//! Date ranges used for statistics queries.

use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive `[from, to]` range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            bail!("invalid range: {from} is after {to}");
        }
        Ok(Self { from, to })
    }

    /// First to last day of the month containing `today`
    pub fn current_month(today: NaiveDate) -> Self {
        let from = today.with_day(1).unwrap_or(today);
        let (y, m) = if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        };
        let to = NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(today);
        Self { from, to }
    }

    /// Parse "YYYY-MM-DD" bounds as typed on the command line
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let from = NaiveDate::parse_from_str(from.trim(), "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid date '{from}': {e}"))?;
        let to = NaiveDate::parse_from_str(to.trim(), "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid date '{to}': {e}"))?;
        Self::new(from, to)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// ISO-8601 bounds for query strings
    pub fn iso_bounds(&self) -> (String, String) {
        (
            self.from.format("%Y-%m-%d").to_string(),
            self.to.format("%Y-%m-%d").to_string(),
        )
    }
}
