//! Datetime window slicing
//!
//! Splits `[start, end]` into consecutive windows of `step`. Windows are
//! inclusive on both ends; with a cursor granularity the end of each window
//! stops one granule short of the next window's start.

use super::types::{PartitionRouter, Slices, StreamSlice};
use crate::error::{Error, Result};
use crate::http::{RequestConfig, RequestOption};
use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};

/// Slice key holding a window's start
pub const PARTITION_START: &str = "start_time";

/// Slice key holding a window's end
pub const PARTITION_END: &str = "end_time";

/// A step between windows, as an ISO 8601 duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    months: u32,
    rest: TimeDelta,
}

impl Step {
    /// Parse durations like `P1D`, `PT12H`, `P1M` or `P1Y2M3DT4H5M6S`
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::config(format!("Invalid ISO 8601 duration: {s}"));
        let body = s.trim().strip_prefix('P').ok_or_else(invalid)?;
        if body.is_empty() {
            return Err(invalid());
        }

        let (date_part, time_part) = match body.split_once('T') {
            Some((d, t)) if !t.is_empty() => (d, Some(t)),
            Some(_) => return Err(invalid()),
            None => (body, None),
        };

        let mut months = 0u32;
        let mut rest = TimeDelta::zero();

        for (amount, unit) in components(date_part).ok_or_else(invalid)? {
            match unit {
                'Y' => months = add_months(months, amount, 12).ok_or_else(invalid)?,
                'M' => months = add_months(months, amount, 1).ok_or_else(invalid)?,
                'W' => rest = add_delta(rest, TimeDelta::try_weeks(amount)).ok_or_else(invalid)?,
                'D' => rest = add_delta(rest, TimeDelta::try_days(amount)).ok_or_else(invalid)?,
                _ => return Err(invalid()),
            }
        }
        if let Some(time_part) = time_part {
            for (amount, unit) in components(time_part).ok_or_else(invalid)? {
                let delta = match unit {
                    'H' => TimeDelta::try_hours(amount),
                    'M' => TimeDelta::try_minutes(amount),
                    'S' => TimeDelta::try_seconds(amount),
                    _ => return Err(invalid()),
                };
                rest = add_delta(rest, delta).ok_or_else(invalid)?;
            }
        }

        if months == 0 && rest <= TimeDelta::zero() {
            return Err(invalid());
        }
        Ok(Self { months, rest })
    }

    fn after(&self, dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
        dt.checked_add_months(Months::new(self.months))?
            .checked_add_signed(self.rest)
    }
}

fn add_months(total: u32, amount: i64, per_unit: u32) -> Option<u32> {
    let months = u32::try_from(amount).ok()?.checked_mul(per_unit)?;
    total.checked_add(months)
}

fn add_delta(total: TimeDelta, delta: Option<TimeDelta>) -> Option<TimeDelta> {
    total.checked_add(&delta?)
}

/// Split `5D3H`-style text into `(amount, unit)` pairs
fn components(s: &str) -> Option<Vec<(i64, char)>> {
    let mut out = Vec::new();
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            out.push((digits.parse().ok()?, c));
            digits.clear();
        }
    }
    digits.is_empty().then_some(out)
}

/// One slice per datetime window
#[derive(Debug, Clone)]
pub struct DatetimePartitionRouter {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Option<Step>,
    granularity: Option<TimeDelta>,
    format: String,
    start_option: Option<RequestOption>,
    end_option: Option<RequestOption>,
}

impl DatetimePartitionRouter {
    /// Create a router over `[start, end]`, formatting bounds with `format`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, format: impl Into<String>) -> Self {
        Self {
            start,
            end,
            step: None,
            granularity: None,
            format: format.into(),
            start_option: None,
            end_option: None,
        }
    }

    /// Set the window size
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.step = Some(step);
        self
    }

    /// Set the cursor granularity
    #[must_use]
    pub fn with_granularity(mut self, granularity: TimeDelta) -> Self {
        self.granularity = Some(granularity);
        self
    }

    /// Send window bounds on requests
    #[must_use]
    pub fn with_request_options(
        mut self,
        start_option: Option<RequestOption>,
        end_option: Option<RequestOption>,
    ) -> Self {
        self.start_option = start_option;
        self.end_option = end_option;
        self
    }

    fn slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StreamSlice {
        StreamSlice::new()
            .with_value(PARTITION_START, start.format(&self.format).to_string())
            .with_value(PARTITION_END, end.format(&self.format).to_string())
    }
}

impl PartitionRouter for DatetimePartitionRouter {
    fn stream_slices(&self) -> Slices<'_> {
        match self.step {
            Some(step) => Box::new(Windows {
                router: self,
                step,
                next_start: Some(self.start),
            }),
            None => Box::new(std::iter::once(Ok(self.slice(self.start, self.end)))),
        }
    }

    fn request_options(&self, slice: &StreamSlice, request: &mut RequestConfig) -> Result<()> {
        if let (Some(option), Some(value)) = (&self.start_option, slice.get(PARTITION_START)) {
            request.inject(option, value)?;
        }
        if let (Some(option), Some(value)) = (&self.end_option, slice.get(PARTITION_END)) {
            request.inject(option, value)?;
        }
        Ok(())
    }
}

/// Windows of a [`DatetimePartitionRouter`], produced one at a time
struct Windows<'a> {
    router: &'a DatetimePartitionRouter,
    step: Step,
    next_start: Option<DateTime<Utc>>,
}

impl Iterator for Windows<'_> {
    type Item = Result<StreamSlice>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start.take().filter(|start| *start <= self.router.end)?;

        let next = self.step.after(start);
        let window_end = match (next, self.router.granularity) {
            (Some(next), Some(granularity)) => next.checked_sub_signed(granularity),
            (next, None) => next,
            (None, Some(_)) => None,
        };
        let (Some(next), Some(window_end)) = (next, window_end) else {
            return Some(Err(Error::config("datetime window overflows")));
        };

        let window_end = window_end.min(self.router.end);
        if window_end < self.router.end {
            self.next_start = Some(next);
        }
        Some(Ok(self.router.slice(start, window_end)))
    }
}

/// Parse a datetime bound, trying `format` first.
///
/// `now`, `now_utc()` and `today_utc()` expressions evaluate to the current
/// time or date.
pub fn parse_datetime(s: &str, format: Option<&str>) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if s == "now" || s.contains("now_utc()") {
        return Ok(Utc::now());
    }
    if s.contains("today_utc()") {
        let today = Utc::now().date_naive();
        return Ok(midnight(today));
    }

    if let Some(format) = format {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ndt.and_utc());
        }
        if let Ok(nd) = NaiveDate::parse_from_str(s, format) {
            return Ok(midnight(nd));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d", "%Y/%m/%d"];
    for fmt in formats {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ndt.and_utc());
        }
        if let Ok(nd) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(midnight(nd));
        }
    }

    Err(Error::config(format!("Invalid datetime: {s}")))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Parse a cursor granularity such as `PT1S`; month units are rejected
pub fn parse_granularity(s: &str) -> Result<TimeDelta> {
    let step = Step::parse(s)?;
    if step.months != 0 {
        return Err(Error::config(format!(
            "cursor granularity cannot use months or years: {s}"
        )));
    }
    Ok(step.rest)
}
