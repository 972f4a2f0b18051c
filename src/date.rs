use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// "YYYY-MM" month of a dump file, ordered chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: u16,
    pub month: u8, // 1..=12
}

impl YearMonth {
    pub fn new(year: u16, month: u8) -> Self {
        assert!((1..=12).contains(&month), "Month must be 1..=12");
        Self { year, month }
    }
    pub fn next(self) -> Option<Self> {
        if self.month < 12 {
            Some(Self { year: self.year, month: self.month + 1 })
        } else if self.year < u16::MAX {
            Some(Self { year: self.year + 1, month: 1 })
        } else {
            None
        }
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
        let (y, m) = s.split_once('-').ok_or("expected YYYY-MM")?;
        let year: u16 = y.parse().map_err(|_| "invalid year")?;
        let month: u8 = m.parse().map_err(|_| "invalid month")?;
        if !(1..=12).contains(&month) {
            return Err("month must be 01..12".into());
        }
        Ok(Self { year, month })
    }
}

/// Inclusive iteration from `start` to `end` (if `start` <= `end`), else empty.
pub fn iter_year_months(start: YearMonth, end: YearMonth) -> impl Iterator<Item = YearMonth> {
    let mut curr = if start <= end { Some(start) } else { None };
    std::iter::from_fn(move || {
        let ret = curr?;
        curr = ret.next().filter(|n| *n <= end);
        Some(ret)
    })
}

/// RFC 3339 rendering of a unix timestamp; falls back to the raw number.
pub fn rfc3339_from_epoch(ts: i64) -> String {
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| ts.to_string())
}

/// Current UTC time in RFC 3339, for log headers.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}
