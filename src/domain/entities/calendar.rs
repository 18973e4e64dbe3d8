//! Calendar & shift entity module
//!
//! A Calendar maps wall-clock instants to working minutes: a weekday
//! template of shift windows, breaks subtracted from those shifts, and a
//! holiday set that overrides any weekday. `Calendar::advance` is the one
//! contract the rest of the scheduler relies on — it walks forward from an
//! instant and returns the interval that covers exactly the requested
//! number of working minutes.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::value_objects::Minutes;
use crate::errors::SchedulerError;

/// How far forward `advance` is willing to scan looking for working time
/// before concluding the calendar can never satisfy the request.
const HORIZON_DAYS: i64 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Working-day template: which weekdays are worked, the shift windows on
/// those days, breaks subtracted from the shifts, and a holiday override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub weekdays: BTreeSet<chrono::Weekday>,
    pub shifts: Vec<ShiftWindow>,
    pub breaks: Vec<BreakWindow>,
    pub holidays: BTreeSet<NaiveDate>,
}

impl Calendar {
    pub fn new(
        weekdays: BTreeSet<Weekday>,
        shifts: Vec<ShiftWindow>,
        breaks: Vec<BreakWindow>,
        holidays: BTreeSet<NaiveDate>,
    ) -> Result<Self, SchedulerError> {
        let calendar = Self {
            weekdays,
            shifts,
            breaks,
            holidays,
        };
        calendar.validate()?;
        Ok(calendar)
    }

    /// A calendar with Mon-Fri shifts and no breaks or holidays — handy for
    /// tests and for a quick CLI run without a calendar file.
    pub fn weekdays_9_to_5(start: NaiveTime, end: NaiveTime) -> Self {
        let weekdays = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .collect();
        Self {
            weekdays,
            shifts: vec![ShiftWindow { start, end }],
            breaks: Vec::new(),
            holidays: BTreeSet::new(),
        }
    }

    /// Rejects overlapping shifts and breaks that escape their shift.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        let mut shifts = self.shifts.clone();
        shifts.sort_by_key(|s| s.start);
        for pair in shifts.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(SchedulerError::CalendarMisconfigured(format!(
                    "shift {}-{} overlaps shift {}-{}",
                    pair[0].start, pair[0].end, pair[1].start, pair[1].end
                )));
            }
        }
        for s in &shifts {
            if s.end <= s.start {
                return Err(SchedulerError::CalendarMisconfigured(format!(
                    "shift {}-{} has non-positive duration",
                    s.start, s.end
                )));
            }
        }
        for b in &self.breaks {
            if b.end <= b.start {
                return Err(SchedulerError::CalendarMisconfigured(format!(
                    "break {}-{} has non-positive duration",
                    b.start, b.end
                )));
            }
            let contained = shifts.iter().any(|s| b.start >= s.start && b.end <= s.end);
            if !contained {
                return Err(SchedulerError::CalendarMisconfigured(format!(
                    "break {}-{} is not contained in any shift",
                    b.start, b.end
                )));
            }
        }
        Ok(())
    }

    /// Working sub-intervals for a calendar date, after subtracting breaks.
    /// Empty on holidays and non-working weekdays.
    fn spans_for_day(&self, date: NaiveDate) -> Vec<(NaiveTime, NaiveTime)> {
        if self.holidays.contains(&date) {
            return Vec::new();
        }
        if !self.weekdays.contains(&date.weekday()) {
            return Vec::new();
        }
        let mut spans: Vec<(NaiveTime, NaiveTime)> = self.shifts.iter().map(|s| (s.start, s.end)).collect();
        spans.sort_by_key(|s| s.0);
        for b in &self.breaks {
            spans = Self::subtract_break(spans, b.start, b.end);
        }
        spans.retain(|(s, e)| e > s);
        spans
    }

    fn subtract_break(
        spans: Vec<(NaiveTime, NaiveTime)>,
        break_start: NaiveTime,
        break_end: NaiveTime,
    ) -> Vec<(NaiveTime, NaiveTime)> {
        let mut out = Vec::with_capacity(spans.len());
        for (s, e) in spans {
            if break_end <= s || break_start >= e {
                out.push((s, e));
                continue;
            }
            if break_start > s {
                out.push((s, break_start));
            }
            if break_end < e {
                out.push((break_end, e));
            }
        }
        out
    }

    /// Returns the smallest interval `[start, end]` with `start >= from`
    /// whose span covers exactly `duration` working minutes, skipping
    /// breaks, weekends and holidays.
    pub fn advance(
        &self,
        from: NaiveDateTime,
        duration: Minutes,
    ) -> Result<(NaiveDateTime, NaiveDateTime), SchedulerError> {
        self.validate()?;

        let mut remaining: i64 = duration.value() as i64;
        let mut date = from.date();
        let mut time = from.time();
        let mut first_start: Option<NaiveDateTime> = None;
        let mut last_end: Option<NaiveDateTime> = None;
        let mut days_scanned: i64 = 0;

        loop {
            if days_scanned > HORIZON_DAYS {
                return Err(SchedulerError::HorizonExceeded {
                    last_event_at: last_end.unwrap_or(from),
                });
            }

            for (span_start_raw, span_end) in self.spans_for_day(date) {
                if span_end <= time {
                    continue;
                }
                let span_start = if span_start_raw > time { span_start_raw } else { time };
                if first_start.is_none() {
                    first_start = Some(NaiveDateTime::new(date, span_start));
                }
                let span_minutes = (span_end - span_start).num_minutes();
                if span_minutes <= 0 {
                    continue;
                }
                if remaining <= span_minutes {
                    let end_time = span_start + ChronoDuration::minutes(remaining);
                    last_end = Some(NaiveDateTime::new(date, end_time));
                    remaining = 0;
                    break;
                }
                remaining -= span_minutes;
                last_end = Some(NaiveDateTime::new(date, span_end));
                time = span_end;
            }

            if remaining == 0 {
                break;
            }

            date = date.succ_opt().ok_or_else(|| SchedulerError::HorizonExceeded {
                last_event_at: last_end.unwrap_or(from),
            })?;
            time = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
            days_scanned += 1;
        }

        Ok((first_start.unwrap_or(from), last_end.unwrap_or(from)))
    }

    /// The earliest working-minute instant at or after `t`; equivalent to
    /// `advance(t, Minutes(0)).0`.
    pub fn next_working_minute(&self, t: NaiveDateTime) -> Result<NaiveDateTime, SchedulerError> {
        self.advance(t, Minutes::ZERO).map(|(start, _)| start)
    }

    /// Whether `instant` falls inside a working span (used to check that a
    /// task instance's `[start, end]` lies entirely inside working time).
    pub fn is_working_instant(&self, instant: NaiveDateTime) -> bool {
        self.spans_for_day(instant.date())
            .iter()
            .any(|(s, e)| instant.time() >= *s && instant.time() <= *e)
    }
}
