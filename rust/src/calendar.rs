//! Working-time calendars.
//!
//! A working day has one contiguous block of `hours_per_day` starting at
//! `day_start`. Holidays and time-off ranges remove whole days. All
//! arithmetic is done in integer working minutes so long dependency chains
//! accumulate no rounding drift.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rustc_hash::FxHashSet;

use crate::error::EngineError;
use crate::models::Calendar;

/// Working time in minutes. The single unit used by all scheduling passes.
pub type WorkMinutes = i64;

const MINUTES_PER_CALENDAR_DAY: i64 = 24 * 60;

/// A validated calendar ready for date arithmetic.
#[derive(Clone, Debug)]
pub struct WorkingCalendar {
    id: String,
    /// Indexed by `Weekday::num_days_from_monday()`.
    weekdays: [bool; 7],
    minutes_per_day: WorkMinutes,
    day_start: NaiveTime,
    holidays: FxHashSet<NaiveDate>,
    /// Sorted, non-overlapping inclusive ranges.
    time_off: Vec<(NaiveDate, NaiveDate)>,
    max_scan_days: u32,
}

impl WorkingCalendar {
    /// Validate a calendar definition.
    ///
    /// `max_scan_days` bounds how many consecutive non-working days a scan may
    /// cross before the calendar is reported as having no working time.
    pub fn new(calendar: &Calendar, max_scan_days: u32) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::InvalidCalendar {
            calendar_id: calendar.id.clone(),
            reason,
        };

        if !calendar.hours_per_day.is_finite() {
            return Err(invalid(format!(
                "hours_per_day is not a number: {}",
                calendar.hours_per_day
            )));
        }

        let mut weekdays = [false; 7];
        for &day in &calendar.working_weekdays {
            if !(1..=7).contains(&day) {
                return Err(invalid(format!("weekday {} is outside 1..=7", day)));
            }
            weekdays[(day - 1) as usize] = true;
        }

        let minutes_per_day = (calendar.hours_per_day * 60.0).round() as WorkMinutes;
        if minutes_per_day <= 0 || !weekdays.iter().any(|&w| w) {
            return Err(EngineError::NoWorkingTime {
                calendar_id: calendar.id.clone(),
            });
        }

        let start_minute = i64::from(calendar.day_start.num_seconds_from_midnight()) / 60;
        if start_minute + minutes_per_day > MINUTES_PER_CALENDAR_DAY {
            return Err(invalid(format!(
                "working block of {} hours starting at {} crosses midnight",
                calendar.hours_per_day, calendar.day_start
            )));
        }

        if let Some((start, end)) = calendar.time_off.iter().find(|(s, e)| e < s) {
            return Err(invalid(format!("time-off range {} .. {} is reversed", start, end)));
        }

        Ok(Self {
            id: calendar.id.clone(),
            weekdays,
            minutes_per_day,
            day_start: calendar.day_start,
            holidays: calendar.holidays.iter().copied().collect(),
            time_off: merge_periods(calendar.time_off.clone()),
            max_scan_days,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn minutes_per_day(&self) -> WorkMinutes {
        self.minutes_per_day
    }

    /// Convert working days to working minutes (rounded to the minute).
    pub fn days_to_minutes(&self, days: f64) -> WorkMinutes {
        (days * self.minutes_per_day as f64).round() as WorkMinutes
    }

    pub fn minutes_to_days(&self, minutes: WorkMinutes) -> f64 {
        minutes as f64 / self.minutes_per_day as f64
    }

    /// Whether any working time falls on `date`.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.weekdays[date.weekday().num_days_from_monday() as usize]
            && !self.holidays.contains(&date)
            && !self.in_time_off(date)
    }

    fn in_time_off(&self, date: NaiveDate) -> bool {
        // Binary search: leftmost range whose end is not before date
        let idx = self.time_off.partition_point(|(_, end)| *end < date);
        idx < self.time_off.len() && self.time_off[idx].0 <= date
    }

    /// Working block `[start, end)` of a date, whether or not the date is workable.
    fn block(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.day_start);
        (start, start + Duration::minutes(self.minutes_per_day))
    }

    pub fn is_working_instant(&self, instant: NaiveDateTime) -> bool {
        let (block_start, block_end) = self.block(instant.date());
        self.is_working_day(instant.date()) && instant >= block_start && instant < block_end
    }

    fn no_working_time(&self) -> EngineError {
        EngineError::NoWorkingTime {
            calendar_id: self.id.clone(),
        }
    }

    /// First working day on or after `from`.
    pub fn next_working_day(&self, from: NaiveDate) -> Result<NaiveDate, EngineError> {
        let mut date = from;
        for _ in 0..=self.max_scan_days {
            if self.is_working_day(date) {
                return Ok(date);
            }
            date = date.succ_opt().ok_or_else(|| self.no_working_time())?;
        }
        Err(self.no_working_time())
    }

    /// Last working day on or before `from`.
    pub fn previous_working_day(&self, from: NaiveDate) -> Result<NaiveDate, EngineError> {
        let mut date = from;
        for _ in 0..=self.max_scan_days {
            if self.is_working_day(date) {
                return Ok(date);
            }
            date = date.pred_opt().ok_or_else(|| self.no_working_time())?;
        }
        Err(self.no_working_time())
    }

    /// Earliest working instant at or after `instant`.
    pub fn next_working_instant(
        &self,
        instant: NaiveDateTime,
    ) -> Result<NaiveDateTime, EngineError> {
        let date = instant.date();
        if self.is_working_day(date) {
            let (block_start, block_end) = self.block(date);
            if instant < block_start {
                return Ok(block_start);
            }
            if instant < block_end {
                return Ok(instant);
            }
        }
        let next = date.succ_opt().ok_or_else(|| self.no_working_time())?;
        Ok(self.block(self.next_working_day(next)?).0)
    }

    /// Latest instant at or before `instant` that ends a stretch of working time.
    ///
    /// Block ends count as inclusive here, so this is the finish-side mirror of
    /// `next_working_instant`.
    pub fn previous_working_instant(
        &self,
        instant: NaiveDateTime,
    ) -> Result<NaiveDateTime, EngineError> {
        let date = instant.date();
        if self.is_working_day(date) {
            let (block_start, block_end) = self.block(date);
            if instant > block_end {
                return Ok(block_end);
            }
            if instant > block_start {
                return Ok(instant);
            }
        }
        let prev = date.pred_opt().ok_or_else(|| self.no_working_time())?;
        Ok(self.block(self.previous_working_day(prev)?).1)
    }

    /// Move forward from `start` by `minutes` of working time.
    ///
    /// When the work ends exactly at the close of a working block, the block
    /// end is returned (finish semantics).
    pub fn add_working_duration(
        &self,
        start: NaiveDateTime,
        minutes: WorkMinutes,
    ) -> Result<NaiveDateTime, EngineError> {
        if minutes < 0 {
            return Err(EngineError::NegativeDuration(minutes));
        }
        if minutes == 0 {
            return Ok(start);
        }

        let mut current = self.next_working_instant(start)?;
        let mut remaining = minutes;
        loop {
            let (_, block_end) = self.block(current.date());
            let available = (block_end - current).num_minutes();
            if remaining <= available {
                return Ok(current + Duration::minutes(remaining));
            }
            remaining -= available;
            let next = current.date().succ_opt().ok_or_else(|| self.no_working_time())?;
            current = self.block(self.next_working_day(next)?).0;
        }
    }

    /// Move backward from `end` by `minutes` of working time.
    pub fn subtract_working_duration(
        &self,
        end: NaiveDateTime,
        minutes: WorkMinutes,
    ) -> Result<NaiveDateTime, EngineError> {
        if minutes < 0 {
            return Err(EngineError::NegativeDuration(minutes));
        }
        if minutes == 0 {
            return Ok(end);
        }

        let mut current = self.previous_working_instant(end)?;
        let mut remaining = minutes;
        loop {
            let (block_start, _) = self.block(current.date());
            let available = (current - block_start).num_minutes();
            if remaining <= available {
                return Ok(current - Duration::minutes(remaining));
            }
            remaining -= available;
            let prev = current.date().pred_opt().ok_or_else(|| self.no_working_time())?;
            current = self.block(self.previous_working_day(prev)?).1;
        }
    }

    /// Working time in `[a, b)`; zero when `b <= a`.
    pub fn working_duration_between(&self, a: NaiveDateTime, b: NaiveDateTime) -> WorkMinutes {
        if b <= a {
            return 0;
        }
        let mut total = 0;
        let mut date = a.date();
        while date <= b.date() {
            if self.is_working_day(date) {
                let (block_start, block_end) = self.block(date);
                let from = block_start.max(a);
                let to = block_end.min(b);
                if to > from {
                    total += (to - from).num_minutes();
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        total
    }

    /// Signed working time from `origin` to `instant`.
    pub fn offset_of(&self, origin: NaiveDateTime, instant: NaiveDateTime) -> WorkMinutes {
        if instant >= origin {
            self.working_duration_between(origin, instant)
        } else {
            -self.working_duration_between(instant, origin)
        }
    }
}

/// Merge overlapping or adjacent periods into a sorted, non-overlapping list.
fn merge_periods(mut periods: Vec<(NaiveDate, NaiveDate)>) -> Vec<(NaiveDate, NaiveDate)> {
    periods.sort_by_key(|(start, _)| *start);
    let mut merged: Vec<(NaiveDate, NaiveDate)> = Vec::with_capacity(periods.len());

    for (start, end) in periods {
        match merged.last_mut() {
            // Merge if overlapping or adjacent (within 1 day)
            Some((_, last_end)) if start <= last_end.succ_opt().unwrap_or(*last_end) => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }

    merged
}

/// The project's working-time axis.
///
/// Offset 0 is the first working instant on or after the project start date.
/// Every scheduling pass works in offsets on this axis; instants are only
/// produced when results are reported.
#[derive(Clone, Debug)]
pub struct WorkAxis {
    calendar: WorkingCalendar,
    origin: NaiveDateTime,
}

impl WorkAxis {
    pub fn new(calendar: WorkingCalendar, project_start: NaiveDate) -> Result<Self, EngineError> {
        let first_day = calendar.next_working_day(project_start)?;
        let origin = calendar.block(first_day).0;
        Ok(Self { calendar, origin })
    }

    pub fn calendar(&self) -> &WorkingCalendar {
        &self.calendar
    }

    pub fn origin(&self) -> NaiveDateTime {
        self.origin
    }

    pub fn minutes_per_day(&self) -> WorkMinutes {
        self.calendar.minutes_per_day
    }

    pub fn to_days(&self, minutes: WorkMinutes) -> f64 {
        self.calendar.minutes_to_days(minutes)
    }

    pub fn to_minutes(&self, days: f64) -> WorkMinutes {
        self.calendar.days_to_minutes(days)
    }

    /// Instant at which work placed at `offset` begins.
    pub fn start_instant(&self, offset: WorkMinutes) -> Result<NaiveDateTime, EngineError> {
        let raw = if offset >= 0 {
            self.calendar.add_working_duration(self.origin, offset)?
        } else {
            self.calendar.subtract_working_duration(self.origin, -offset)?
        };
        self.calendar.next_working_instant(raw)
    }

    /// Instant at which work ending at `offset` is complete.
    pub fn finish_instant(&self, offset: WorkMinutes) -> Result<NaiveDateTime, EngineError> {
        if offset > 0 {
            self.calendar.add_working_duration(self.origin, offset)
        } else if offset == 0 {
            Ok(self.origin)
        } else {
            let raw = self.calendar.subtract_working_duration(self.origin, -offset)?;
            self.calendar.previous_working_instant(raw)
        }
    }

    /// Offset of the beginning of the working day `date` (or the next one).
    pub fn offset_of_start_date(&self, date: NaiveDate) -> WorkMinutes {
        let (block_start, _) = self.calendar.block(date);
        self.calendar.offset_of(self.origin, block_start)
    }

    /// Offset of the end of the working day `date` (or the previous one).
    pub fn offset_of_finish_date(&self, date: NaiveDate) -> WorkMinutes {
        let (_, block_end) = self.calendar.block(date);
        self.calendar.offset_of(self.origin, block_end)
    }

    /// Index of the axis day containing `offset`.
    pub fn day_index(&self, offset: WorkMinutes) -> i64 {
        offset.div_euclid(self.calendar.minutes_per_day)
    }

    /// Calendar date of axis day `index`.
    pub fn day_date(&self, index: i64) -> Result<NaiveDate, EngineError> {
        Ok(self
            .start_instant(index * self.calendar.minutes_per_day)?
            .date())
    }
}
