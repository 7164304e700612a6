//! Weekly expiry resolution.
//!
//! Exchange wall-clock is IST (UTC+05:30, no DST). The resolver is a pure
//! function of the supplied moment so callers pick the clock.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::config::ExpirySchedule;

/// IST offset from UTC in seconds.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The exchange's fixed UTC offset.
pub fn exchange_offset() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current moment on the exchange clock.
pub fn exchange_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&exchange_offset())
}

/// A resolved weekly expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub date: NaiveDate,
    /// `true` when date arithmetic failed and `date` is just today.
    pub degraded: bool,
}

impl Expiry {
    /// Dashboard label, `{day}-{month}-{year}` without zero padding.
    pub fn label(&self) -> String {
        format!("{}-{}-{}", self.date.day(), self.date.month(), self.date.year())
    }
}

/// Resolve the active weekly expiry for the wall-clock moment `now`.
///
/// Returns today when today is expiry day and the cutoff has not been reached,
/// otherwise the next occurrence of the expiry weekday. Never fails: if the
/// calendar arithmetic overflows, today's date is returned flagged as degraded.
pub fn resolve_expiry(now: NaiveDateTime, schedule: &ExpirySchedule) -> Expiry {
    let today = now.date();
    let current = today.weekday().num_days_from_monday();
    let target = schedule.weekday.num_days_from_monday();
    let mut days_ahead = (7 + target - current) % 7;

    if days_ahead == 0 && now.time() >= schedule.cutoff {
        days_ahead = 7;
    }

    match today.checked_add_days(Days::new(u64::from(days_ahead))) {
        Some(date) => Expiry {
            date,
            degraded: false,
        },
        None => {
            tracing::warn!("expiry arithmetic overflowed at {now}, falling back to today");
            Expiry {
                date: today,
                degraded: true,
            }
        }
    }
}
