//! Daily production window.
//!
//! One firing per day at `start + random whole minutes in [0, span)`, local
//! time. Once today's window has opened the next opportunity is tomorrow.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rand::Rng;

use deskdrop_core::config::ScheduleConfig;
use deskdrop_core::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionWindow {
    start: NaiveTime,
    span_minutes: u32,
}

impl ProductionWindow {
    pub fn new(start: NaiveTime, span_minutes: u32) -> Self {
        Self { start, span_minutes }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Ok(Self::new(config.window_start_time()?, config.window_minutes))
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn span_minutes(&self) -> u32 {
        self.span_minutes
    }

    /// Window opening strictly after `now`: today if not yet reached, else tomorrow.
    pub fn next_opportunity<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let local = now.naive_local();
        let today = local.date();
        let day = if local < today.and_time(self.start) {
            today
        } else {
            today.succ_opt().unwrap_or(today)
        };
        self.resolve(&now.timezone(), day)
            .unwrap_or_else(|| now.clone() + Duration::days(1))
    }

    pub fn random_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.span_minutes == 0 {
            return Duration::zero();
        }
        Duration::minutes(i64::from(rng.gen_range(0..self.span_minutes)))
    }

    /// Next firing instant: the next opening plus a random delay.
    pub fn next_firing<Tz: TimeZone, R: Rng>(&self, now: &DateTime<Tz>, rng: &mut R) -> DateTime<Tz> {
        self.next_opportunity(now) + self.random_delay(rng)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.span_minutes == 0 {
            return time == self.start;
        }
        let end = self.start + Duration::minutes(i64::from(self.span_minutes));
        if end > self.start {
            time >= self.start && time < end
        } else {
            // Window wraps past midnight.
            time >= self.start || time < end
        }
    }

    /// Window start on `day`; a DST gap pushes it forward to the first valid hour.
    fn resolve<Tz: TimeZone>(&self, tz: &Tz, day: NaiveDate) -> Option<DateTime<Tz>> {
        let naive: NaiveDateTime = day.and_time(self.start);
        (0..3).find_map(|h| tz.from_local_datetime(&(naive + Duration::hours(h))).earliest())
    }
}

/// Time left until `target`, zero when already past.
pub fn until<Tz: TimeZone>(now: &DateTime<Tz>, target: &DateTime<Tz>) -> std::time::Duration {
    (target.clone() - now.clone()).to_std().unwrap_or_default()
}
