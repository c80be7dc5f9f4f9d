#[cfg(test)]
use std::sync::{
	atomic::{AtomicI64, Ordering},
	Arc,
};

use chrono::{DateTime, Utc};

/// Source of "now" for anything that timestamps entries.
pub trait Clock {
	fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Default, Debug)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A clock that only moves when told to. Clones share the same time.
///
/// Resolution is one second, which is all the database stores anyway.
#[cfg(test)]
#[derive(Clone, Debug)]
pub struct ManualClock {
	seconds: Arc<AtomicI64>,
}

#[cfg(test)]
impl ManualClock {
	pub fn at_timestamp(seconds: i64) -> Self {
		Self {
			seconds: Arc::new(AtomicI64::new(seconds)),
		}
	}
	pub fn set_timestamp(&self, seconds: i64) {
		self.seconds.store(seconds, Ordering::SeqCst);
	}
	pub fn advance(&self, by: chrono::Duration) {
		self.seconds.fetch_add(by.num_seconds(), Ordering::SeqCst);
	}
}

#[cfg(test)]
impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		timestamp_to_datetime(self.seconds.load(Ordering::SeqCst))
	}
}

/// Out of range timestamps clamp to the Unix epoch.
pub fn timestamp_to_datetime(seconds: i64) -> DateTime<Utc> {
	DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}
