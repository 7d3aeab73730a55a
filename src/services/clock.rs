use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

/// Civil zone that decides which business day a moment belongs to, whatever
/// zone the server or a client runs in.
pub const BOARD_TZ: Tz = chrono_tz::Europe::Amsterdam;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `YYYY-MM-DD` of the Amsterdam civil day containing `now`.
pub fn business_day_key(now: DateTime<Utc>) -> String {
    now.with_timezone(&BOARD_TZ).format("%Y-%m-%d").to_string()
}

/// Long Dutch rendering of the same day, e.g. "dinsdag 5 maart 2024".
pub fn formatted_date(now: DateTime<Utc>) -> String {
    now.with_timezone(&BOARD_TZ)
        .format_localized("%A %-d %B %Y", Locale::nl_NL)
        .to_string()
}

/// Everything about "when" that a record freezes at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStamp {
    pub date_str: String,
    pub formatted_date: String,
    pub timestamp: i64,
}

impl RecordStamp {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            date_str: business_day_key(now),
            formatted_date: formatted_date(now),
            timestamp: now.timestamp_millis(),
        }
    }
}

#[cfg(test)]
pub use testing::FixedClock;

#[cfg(test)]
mod testing {
    use std::sync::Mutex;

    use chrono::{DateTime, Duration, Utc};

    use super::Clock;

    /// Clock pinned to a moment, movable from tests.
    pub struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        pub fn at(rfc3339: &str) -> Self {
            let now = DateTime::parse_from_rfc3339(rfc3339)
                .expect("valid RFC 3339 timestamp")
                .with_timezone(&Utc);
            Self(Mutex::new(now))
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }
}
