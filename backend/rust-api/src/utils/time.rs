use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use std::sync::{Arc, RwLock};

/// Source of "now" for everything that depends on the calendar day.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read().map(|guard| *guard).unwrap_or_else(|_| Utc::now())
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Monday 00:00 UTC of the week containing `now`
pub fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let offset = date.weekday().num_days_from_monday() as i64;
    start_of_day(date - Duration::days(offset))
}

/// First day of the month at 00:00 UTC
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    start_of_day(date - Duration::days(date.day0() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_start_of_week_is_monday() {
        // 2026-10-17 is a Saturday
        assert_eq!(start_of_week(at(2026, 10, 17, 15)), at(2026, 10, 12, 0));
        assert_eq!(start_of_week(at(2026, 10, 12, 0)), at(2026, 10, 12, 0));
    }

    #[test]
    fn test_start_of_month() {
        assert_eq!(start_of_month(at(2026, 10, 17, 15)), at(2026, 10, 1, 0));
        assert_eq!(start_of_month(at(2026, 3, 1, 23)), at(2026, 3, 1, 0));
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(at(2026, 10, 17, 23));
        clock.advance(Duration::hours(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    }
}
