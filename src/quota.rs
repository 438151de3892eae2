//! Per-user daily request quota.
//!
//! Each authenticated user gets `limit` admissions per calendar day. Counters
//! reset lazily: the first request seen on a new day replaces the stale entry.
//! The check and the increment happen under the same map-entry lock, so
//! concurrent requests from one user can never push the count past the limit.

use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use std::sync::Arc;

/// Default number of admitted requests per user per day.
pub const DEFAULT_DAILY_LIMIT: u32 = 10;

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Process-local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Counter state for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaEntry {
    pub day: NaiveDate,
    pub count: u32,
}

/// Daily admission counter keyed by user identity.
pub struct DailyQuota {
    limit: u32,
    clock: Arc<dyn Clock>,
    entries: DashMap<String, QuotaEntry>,
}

impl DailyQuota {
    pub fn new(limit: u32) -> Self {
        Self::with_clock(limit, Arc::new(LocalClock))
    }

    pub fn with_clock(limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            clock,
            entries: DashMap::new(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Admit one request for `user`, or refuse it once today's quota is spent.
    ///
    /// A refused request does not touch the counter.
    pub fn try_admit(&self, user: &str) -> bool {
        let today = self.clock.today();

        let mut entry = self
            .entries
            .entry(user.to_string())
            .or_insert(QuotaEntry { day: today, count: 0 });

        if entry.day != today {
            *entry = QuotaEntry { day: today, count: 0 };
        }

        if entry.count >= self.limit {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Requests admitted for `user` today.
    pub fn usage(&self, user: &str) -> u32 {
        let today = self.clock.today();
        self.entries
            .get(user)
            .filter(|entry| entry.day == today)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// Admissions left for `user` today.
    pub fn remaining(&self, user: &str) -> u32 {
        self.limit.saturating_sub(self.usage(user))
    }

    /// Number of users ever seen. Entries live for the process lifetime.
    pub fn tracked_users(&self) -> usize {
        self.entries.len()
    }
}

impl Default for DailyQuota {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_LIMIT)
    }
}

impl std::fmt::Debug for DailyQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyQuota")
            .field("limit", &self.limit)
            .field("tracked_users", &self.entries.len())
            .finish()
    }
}

/// Clock that only moves when told to. Useful for exercising day rollover.
#[derive(Debug)]
pub struct ManualClock {
    today: std::sync::Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: std::sync::Mutex::new(today),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.today.lock().unwrap_or_else(|e| e.into_inner()) = day;
    }

    pub fn advance_days(&self, days: u64) {
        let mut today = self.today.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = today.checked_add_days(chrono::Days::new(days)) {
            *today = next;
        }
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn admits_up_to_limit() {
        let quota = DailyQuota::new(3);
        assert!(quota.try_admit("alice"));
        assert!(quota.try_admit("alice"));
        assert!(quota.try_admit("alice"));
        assert!(!quota.try_admit("alice"));
        assert_eq!(quota.usage("alice"), 3);
        assert_eq!(quota.remaining("alice"), 0);
    }

    #[test]
    fn rejection_does_not_increment() {
        let quota = DailyQuota::new(1);
        assert!(quota.try_admit("alice"));
        for _ in 0..5 {
            assert!(!quota.try_admit("alice"));
        }
        assert_eq!(quota.usage("alice"), 1);
    }

    #[test]
    fn users_are_counted_independently() {
        let quota = DailyQuota::new(1);
        assert!(quota.try_admit("alice"));
        assert!(quota.try_admit("bob"));
        assert!(!quota.try_admit("alice"));
        assert_eq!(quota.tracked_users(), 2);
    }

    #[test]
    fn resets_on_new_day() {
        let clock = Arc::new(ManualClock::new(day(2024, 3, 9)));
        let quota = DailyQuota::with_clock(2, clock.clone());

        assert!(quota.try_admit("alice"));
        assert!(quota.try_admit("alice"));
        assert!(!quota.try_admit("alice"));

        clock.advance_days(1);
        assert_eq!(quota.usage("alice"), 0);
        assert!(quota.try_admit("alice"));
        assert_eq!(quota.usage("alice"), 1);
    }

    #[test]
    fn date_change_backwards_also_resets() {
        let clock = Arc::new(ManualClock::new(day(2024, 3, 10)));
        let quota = DailyQuota::with_clock(1, clock.clone());
        assert!(quota.try_admit("alice"));

        clock.set(day(2024, 3, 9));
        assert!(quota.try_admit("alice"));
    }

    #[test]
    fn zero_limit_admits_nothing() {
        let quota = DailyQuota::new(0);
        assert!(!quota.try_admit("alice"));
        assert_eq!(quota.usage("alice"), 0);
    }

    #[test]
    fn unknown_user_has_full_quota() {
        let quota = DailyQuota::default();
        assert_eq!(quota.usage("ghost"), 0);
        assert_eq!(quota.remaining("ghost"), DEFAULT_DAILY_LIMIT);
        assert_eq!(quota.tracked_users(), 0);
    }
}
