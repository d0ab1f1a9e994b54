//! Calendar month labels for monthly series.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month, ordered chronologically.
///
/// Deserialization applies the same month check as [`YearMonth::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "MonthParts")]
pub struct YearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month of the year, 1 through 12.
    pub month: u32,
}

/// Unchecked wire form of [`YearMonth`]
#[derive(Deserialize)]
struct MonthParts {
    year: i32,
    month: u32,
}

impl TryFrom<MonthParts> for YearMonth {
    type Error = String;

    fn try_from(parts: MonthParts) -> Result<Self, Self::Error> {
        YearMonth::new(parts.year, parts.month)
            .ok_or_else(|| format!("month {} is outside 1..=12", parts.month))
    }
}

impl YearMonth {
    /// Create a month label, returning `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Month containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Months since year 0, January.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + self.month as i64 - 1
    }

    /// Inverse of [`YearMonth::ordinal`].
    pub fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: (ordinal.rem_euclid(12) + 1) as u32,
        }
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        self.offset(1)
    }

    /// Shift by a signed number of months.
    pub fn offset(&self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: &YearMonth) -> i64 {
        other.ordinal() - self.ordinal()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .rsplit_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in '{}'", s))?;
        YearMonth::new(year, month).ok_or_else(|| format!("month out of range in '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range_month() {
        assert!(YearMonth::new(2020, 0).is_none());
        assert!(YearMonth::new(2020, 13).is_none());
        assert_eq!(YearMonth::new(2020, 12), Some(YearMonth { year: 2020, month: 12 }));
    }

    #[test]
    fn test_succ_wraps_year() {
        let dec = YearMonth::new(2014, 12).unwrap();
        assert_eq!(dec.succ(), YearMonth::new(2015, 1).unwrap());
    }

    #[test]
    fn test_offset_negative() {
        let jan = YearMonth::new(2015, 1).unwrap();
        assert_eq!(jan.offset(-1), YearMonth::new(2014, 12).unwrap());
        assert_eq!(jan.offset(-13), YearMonth::new(2013, 12).unwrap());
    }

    #[test]
    fn test_months_until() {
        let a = YearMonth::new(2014, 1).unwrap();
        let b = YearMonth::new(2019, 12).unwrap();
        assert_eq!(a.months_until(&b), 71);
        assert_eq!(b.months_until(&a), -71);
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = YearMonth::new(2014, 12).unwrap();
        let b = YearMonth::new(2015, 1).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_display_and_parse() {
        let ym = YearMonth::new(2014, 3).unwrap();
        assert_eq!(ym.to_string(), "2014-03");
        assert_eq!("2014-03".parse::<YearMonth>().unwrap(), ym);
        assert!("2014-13".parse::<YearMonth>().is_err());
        assert!("201403".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_json_form_and_month_check() {
        let ym = YearMonth::new(2021, 11).unwrap();
        let json = serde_json::to_string(&ym).unwrap();
        assert_eq!(json, r#"{"year":2021,"month":11}"#);
        assert_eq!(serde_json::from_str::<YearMonth>(&json).unwrap(), ym);
        assert!(serde_json::from_str::<YearMonth>(r#"{"year":2021,"month":13}"#).is_err());
        assert!(serde_json::from_str::<YearMonth>(r#"{"year":2021,"month":0}"#).is_err());
    }

    #[test]
    fn test_from_date_and_first_day() {
        let date = NaiveDate::from_ymd_opt(2016, 7, 19).unwrap();
        let ym = YearMonth::from_date(date);
        assert_eq!(ym, YearMonth::new(2016, 7).unwrap());
        assert_eq!(ym.first_day(), NaiveDate::from_ymd_opt(2016, 7, 1));
    }
}
