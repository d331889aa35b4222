// Selection windows for range deletion, and resolution of user-facing datetimes

use crate::error::{Result, StoreError};
use crate::record::format_timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const ALL_WITH_RANGE: &str = "cannot combine --all with --from or --to";

/// Which end of a window a datetime is resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// Resolve a textual datetime to an instant.
///
/// Full timestamps (RFC 3339, or naive and read as UTC) are taken as-is. A bare
/// `YYYY-MM-DD` expands to the first nanosecond of that day for a lower bound and
/// the last nanosecond for an upper bound, so `--from D --to D` covers all of D.
pub fn resolve_datetime(input: &str, bound: Bound) -> Result<DateTime<Utc>> {
    let text = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let time = match bound {
            Bound::Lower => NaiveTime::from_hms_opt(0, 0, 0),
            Bound::Upper => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999),
        }
        .ok_or_else(|| StoreError::invalid(format!("cannot expand date: {}", input)))?;
        return Ok(date.and_time(time).and_utc());
    }

    Err(StoreError::invalid(format!(
        "invalid datetime format: {} (use RFC3339 or YYYY-MM-DD)",
        input
    )))
}

/// The set of records a range deletion applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    /// Inclusive on both ends
    Between(DateTime<Utc>, DateTime<Utc>),
    Since(DateTime<Utc>),
    Until(DateTime<Utc>),
}

impl Selection {
    /// Exactly one mode must be chosen: `all`, or at least one bound.
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>, all: bool) -> Result<Self> {
        match (all, from, to) {
            (true, None, None) => Ok(Selection::All),
            (true, _, _) => Err(StoreError::invalid(ALL_WITH_RANGE)),
            (false, Some(from), Some(to)) => Ok(Selection::Between(from, to)),
            (false, Some(from), None) => Ok(Selection::Since(from)),
            (false, None, Some(to)) => Ok(Selection::Until(to)),
            (false, None, None) => Err(StoreError::invalid(
                "no selection criteria: give --from, --to, or --all",
            )),
        }
    }

    /// Resolve textual bounds and validate the combination. Empty strings count as unset.
    ///
    /// The `all` conflict is checked before any datetime is parsed.
    pub fn parse(from: Option<&str>, to: Option<&str>, all: bool) -> Result<Self> {
        let from = from.filter(|s| !s.trim().is_empty());
        let to = to.filter(|s| !s.trim().is_empty());

        if all && (from.is_some() || to.is_some()) {
            return Err(StoreError::invalid(ALL_WITH_RANGE));
        }

        let from = from.map(|s| resolve_datetime(s, Bound::Lower)).transpose()?;
        let to = to.map(|s| resolve_datetime(s, Bound::Upper)).transpose()?;
        Self::new(from, to, all)
    }

    /// WHERE fragment and bound parameters, shared by counting and deleting
    pub(crate) fn to_sql(&self) -> (&'static str, Vec<String>) {
        match self {
            Selection::All => ("1 = 1", vec![]),
            Selection::Between(from, to) => (
                "timestamp >= ?1 AND timestamp <= ?2",
                vec![format_timestamp(from), format_timestamp(to)],
            ),
            Selection::Since(from) => ("timestamp >= ?1", vec![format_timestamp(from)]),
            Selection::Until(to) => ("timestamp <= ?1", vec![format_timestamp(to)]),
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::All => write!(f, "all"),
            Selection::Between(from, to) => write!(f, "{} ..= {}", format_timestamp(from), format_timestamp(to)),
            Selection::Since(from) => write!(f, ">= {}", format_timestamp(from)),
            Selection::Until(to) => write!(f, "<= {}", format_timestamp(to)),
        }
    }
}
