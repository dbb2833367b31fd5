//! Publication clock.
//!
//! Decides which date the remote is expected to have published by now.
//! NAVs appear once a day after a cutoff time in the vendor's timezone.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday};
use fundwatch_core::error::FundwatchError;
use std::sync::Arc;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Daily publication schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationPolicy {
    /// Local time after which today's value is expected
    pub cutoff: NaiveTime,
    pub utc_offset: FixedOffset,
    /// Roll Saturday and Sunday back to Friday
    pub skip_weekends: bool,
}

impl PublicationPolicy {
    /// Build a policy from config values such as `"21:00"` and `8`.
    pub fn new(cutoff: &str, utc_offset_hours: i32, skip_weekends: bool) -> Result<Self, FundwatchError> {
        Ok(Self {
            cutoff: parse_cutoff(cutoff)?,
            utc_offset: FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
                FundwatchError::Config(format!("invalid UTC offset: {utc_offset_hours} hours"))
            })?,
            skip_weekends,
        })
    }

    /// Expected latest available date at instant `now`.
    pub fn expected_date(&self, now: DateTime<Utc>) -> NaiveDate {
        let local = now.with_timezone(&self.utc_offset);
        let mut date = local.date_naive();
        if local.time() < self.cutoff {
            date = date.pred_opt().unwrap_or(date);
        }
        if self.skip_weekends {
            while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                date = date.pred_opt().unwrap_or(date);
            }
        }
        date
    }
}

impl Default for PublicationPolicy {
    fn default() -> Self {
        Self {
            cutoff: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN),
            utc_offset: FixedOffset::east_opt(8 * 3600).unwrap_or(Utc.fix()),
            skip_weekends: true,
        }
    }
}

/// Parse a `HH:MM` cutoff.
pub fn parse_cutoff(raw: &str) -> Result<NaiveTime, FundwatchError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| FundwatchError::Config(format!("invalid cutoff {raw:?}: {e}")))
}

/// A clock paired with a publication policy.
#[derive(Clone)]
pub struct PolicyClock {
    clock: Arc<dyn Clock>,
    policy: PublicationPolicy,
}

impl PolicyClock {
    pub fn new(clock: Arc<dyn Clock>, policy: PublicationPolicy) -> Self {
        Self { clock, policy }
    }

    /// Wall-clock variant.
    pub fn system(policy: PublicationPolicy) -> Self {
        Self::new(Arc::new(SystemClock), policy)
    }

    pub fn policy(&self) -> &PublicationPolicy {
        &self.policy
    }

    /// The most recent date the remote should already have published.
    pub fn expected_latest_available_date(&self) -> NaiveDate {
        self.policy.expected_date(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_before_cutoff_expects_yesterday() {
        let policy = PublicationPolicy::default();
        // Wed 2024-03-13 20:59 at +08:00
        assert_eq!(policy.expected_date(at(2024, 3, 13, 12, 59)), date(2024, 3, 12));
    }

    #[test]
    fn test_after_cutoff_expects_today() {
        let policy = PublicationPolicy::default();
        // Wed 2024-03-13 21:00 at +08:00
        assert_eq!(policy.expected_date(at(2024, 3, 13, 13, 0)), date(2024, 3, 13));
    }

    #[test]
    fn test_offset_crosses_utc_midnight() {
        let policy = PublicationPolicy::default();
        // Tue 2024-03-12 17:00 UTC is Wed 01:00 at +08:00, before cutoff
        assert_eq!(policy.expected_date(at(2024, 3, 12, 17, 0)), date(2024, 3, 12));
    }

    #[test]
    fn test_weekend_rolls_back_to_friday() {
        let policy = PublicationPolicy::default();
        // Sat 2024-03-16 22:00 local
        assert_eq!(policy.expected_date(at(2024, 3, 16, 14, 0)), date(2024, 3, 15));
        // Mon 2024-03-18 09:00 local, before cutoff: Sunday rolls to Friday
        assert_eq!(policy.expected_date(at(2024, 3, 18, 1, 0)), date(2024, 3, 15));

        let no_skip = PublicationPolicy {
            skip_weekends: false,
            ..Default::default()
        };
        assert_eq!(no_skip.expected_date(at(2024, 3, 16, 14, 0)), date(2024, 3, 16));
    }

    #[test]
    fn test_policy_from_config_values() {
        let policy = PublicationPolicy::new("15:30", 0, false).unwrap();
        assert_eq!(policy.cutoff, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
        assert!(PublicationPolicy::new("25:00", 8, true).is_err());
        assert!(PublicationPolicy::new("21:00", 30, true).is_err());
    }

    #[test]
    fn test_policy_clock_uses_injected_clock() {
        let clock = PolicyClock::new(
            Arc::new(FixedClock(at(2024, 3, 13, 13, 0))),
            PublicationPolicy::default(),
        );
        assert_eq!(clock.expected_latest_available_date(), date(2024, 3, 13));
    }
}
