//! Lightweight cron expression parser.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds)
//! Items: *, */N, N, A-B, A-B/N, comma-separated lists
//! Example: "* * * * *" = every minute, "0 8 * * 1-5" = weekdays at 8:00
//!
//! When both DOM and DOW are restricted a day matches if either does, as in
//! classic cron. A day field beginning with `*` is never restricted.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};

use windturbine_core::error::{Result, WindTurbineError};

/// How many days ahead `next_after` searches before giving up
/// (covers leap-day schedules).
const SEARCH_DAYS: i64 = 366 * 5;

/// A parsed 5-field cron schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: Vec<bool>,
    hours: Vec<bool>,
    days_of_month: Vec<bool>,
    months: Vec<bool>,
    days_of_week: Vec<bool>,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(WindTurbineError::Config(format!(
                "Invalid cron expression: '{expression}' (need 5 fields: MIN HOUR DOM MON DOW)"
            )));
        }

        let mut days_of_week = parse_field(parts[4], 0, 7)?;
        // 7 is an alias for Sunday.
        if days_of_week[7] {
            days_of_week[0] = true;
        }
        days_of_week.truncate(7);

        Ok(Self {
            expression: expression.to_string(),
            minutes: parse_field(parts[0], 0, 59)?,
            hours: parse_field(parts[1], 0, 23)?,
            days_of_month: parse_field(parts[2], 1, 31)?,
            months: parse_field(parts[3], 1, 12)?,
            days_of_week,
            // A field starting with '*' (including "*/N") counts as unrestricted.
            dom_restricted: !parts[2].starts_with('*'),
            dow_restricted: !parts[4].starts_with('*'),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First matching minute strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after.with_second(0)?.with_nanosecond(0)? + Duration::minutes(1);
        let mut date = start.date_naive();
        let mut from_hour = start.hour();
        let mut from_minute = start.minute();

        for _ in 0..SEARCH_DAYS {
            if self.day_matches(date) {
                for hour in from_hour..24 {
                    if !self.hours[hour as usize] {
                        continue;
                    }
                    let first = if hour == from_hour { from_minute } else { 0 };
                    if let Some(minute) = (first..60).find(|m| self.minutes[*m as usize]) {
                        return date.and_hms_opt(hour, minute, 0).map(|t| t.and_utc());
                    }
                }
            }
            date = date.succ_opt()?;
            from_hour = 0;
            from_minute = 0;
        }
        None
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        if !self.months[date.month() as usize] {
            return false;
        }
        let dom = self.days_of_month[date.day() as usize];
        let dow = self.days_of_week[date.weekday().num_days_from_sunday() as usize];
        if self.dom_restricted && self.dow_restricted {
            dom || dow
        } else {
            dom && dow
        }
    }
}

/// Parse a simple cron expression and compute the next run time.
pub fn next_run_from_cron(expression: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match CronSchedule::parse(expression) {
        Ok(schedule) => schedule.next_after(after),
        Err(e) => {
            tracing::warn!("{e}");
            None
        }
    }
}

/// Parse a cron field into a lookup table indexed by value (`0..=max`).
fn parse_field(field: &str, min: u32, max: u32) -> Result<Vec<bool>> {
    let invalid = || WindTurbineError::Config(format!("Invalid cron field '{field}'"));
    let mut table = vec![false; max as usize + 1];

    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid())?;
                if step == 0 {
                    return Err(invalid());
                }
                (range, step)
            }
            None => (item, 1),
        };

        let (lo, hi) = if range == "*" {
            (min, max)
        } else if let Some((a, b)) = range.split_once('-') {
            let a: u32 = a.parse().map_err(|_| invalid())?;
            let b: u32 = b.parse().map_err(|_| invalid())?;
            (a, b)
        } else {
            let n: u32 = range.parse().map_err(|_| invalid())?;
            // "N/S" means "from N to max every S".
            if item.contains('/') { (n, max) } else { (n, n) }
        };

        if lo < min || hi > max || lo > hi {
            return Err(invalid());
        }
        for v in (lo..=hi).step_by(step as usize) {
            table[v as usize] = true;
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_every_minute() {
        let after = Utc.with_ymd_and_hms(2025, 8, 10, 10, 30, 42).unwrap();
        let next = next_run_from_cron("* * * * *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 8, 10, 10, 31, 0).unwrap());
    }

    #[test]
    fn test_every_hour() {
        let after = Utc.with_ymd_and_hms(2026, 2, 22, 10, 30, 0).unwrap();
        let next = next_run_from_cron("0 * * * *", after).unwrap();
        assert_eq!(next.hour(), 11);
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn test_specific_time_rolls_to_next_day() {
        let after = Utc.with_ymd_and_hms(2026, 2, 22, 9, 0, 0).unwrap();
        let next = next_run_from_cron("0 8 * * *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 23, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_every_15_minutes() {
        let after = Utc.with_ymd_and_hms(2026, 2, 22, 10, 2, 0).unwrap();
        let next = next_run_from_cron("*/15 * * * *", after).unwrap();
        assert_eq!(next.minute(), 15);
    }

    #[test]
    fn test_weekday_range() {
        // 2026-02-21 is a Saturday.
        let after = Utc.with_ymd_and_hms(2026, 2, 21, 12, 0, 0).unwrap();
        let next = next_run_from_cron("30 6 * * 1-5", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 23, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_leap_day() {
        let after = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let next = next_run_from_cron("0 0 29 2 *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2028, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_minute_list() {
        let schedule = CronSchedule::parse("0,30 * * * *").unwrap();
        let after = Utc.with_ymd_and_hms(2026, 2, 22, 10, 2, 0).unwrap();
        let first = schedule.next_after(after).unwrap();
        assert_eq!(first, Utc.with_ymd_and_hms(2026, 2, 22, 10, 30, 0).unwrap());
        assert_eq!(
            schedule.next_after(first).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 22, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_restricted_day_fields_match_either() {
        // Fridays or the 13th: Friday 2026-02-27 comes before Friday 2026-03-13.
        let after = Utc.with_ymd_and_hms(2026, 2, 21, 12, 0, 0).unwrap();
        let next = next_run_from_cron("0 0 13 * 5", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 27, 0, 0, 0).unwrap());

        let after = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let next = next_run_from_cron("0 0 12 * 5", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 12, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_starred_day_of_month_step_is_unrestricted() {
        // "*/1" matches every day, so only the Monday restriction applies.
        let after = Utc.with_ymd_and_hms(2026, 2, 21, 12, 0, 0).unwrap();
        let next = next_run_from_cron("0 0 */1 * 1", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 23, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_seven_is_sunday() {
        let after = Utc.with_ymd_and_hms(2026, 2, 21, 12, 0, 0).unwrap();
        let next = next_run_from_cron("0 0 * * 7", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 22, 0, 0, 0).unwrap());
        assert_eq!(
            CronSchedule::parse("0 0 * * 7").unwrap().next_after(after),
            CronSchedule::parse("0 0 * * 0").unwrap().next_after(after)
        );
    }

    #[test]
    fn test_invalid_expression() {
        let after = Utc::now();
        assert!(next_run_from_cron("bad", after).is_none());
        assert!(CronSchedule::parse("61 * * * *").is_err());
        assert!(CronSchedule::parse("*/0 * * * *").is_err());
        assert!(CronSchedule::parse("5-1 * * * *").is_err());
    }
}
