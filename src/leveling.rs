//! The XP curve: reaching level `L` takes `step * L * (L + 1) / 2` XP in total,
//! so going from `L` to `L + 1` costs `step * (L + 1)`.

use std::num::NonZeroU64;

use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_STEP: NonZeroU64 = match NonZeroU64::new(5) {
	Some(step) => step,
	None => unreachable!(),
};
pub const DEFAULT_COOLDOWN_SECONDS: i64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelCurve {
	step: NonZeroU64,
}

impl Default for LevelCurve {
	fn default() -> Self {
		Self::new(DEFAULT_STEP)
	}
}

impl LevelCurve {
	pub fn new(step: NonZeroU64) -> Self {
		Self { step }
	}

	pub fn step(&self) -> u64 {
		self.step.get()
	}

	/// The total XP needed to reach `level`. Saturates at `u64::MAX` for absurd levels.
	pub fn level_to_xp(&self, level: u64) -> u64 {
		let level = u128::from(level);
		let xp = u128::from(self.step.get()) * level * (level + 1) / 2;
		u64::try_from(xp).unwrap_or(u64::MAX)
	}

	/// The highest level whose threshold is at most `xp`.
	pub fn xp_to_level(&self, xp: u64) -> u64 {
		// L(L + 1) <= 2xp / step  <=>  2L + 1 <= sqrt(4 * floor(2xp / step) + 1)
		let doubled = 2 * u128::from(xp) / u128::from(self.step.get());
		let level = (integer_sqrt(4 * doubled + 1) - 1) / 2;
		level as u64
	}

	/// XP still missing until the next level.
	pub fn xp_for_next_level(&self, xp: u64) -> u64 {
		let next = self.xp_to_level(xp).saturating_add(1);
		self.level_to_xp(next).saturating_sub(xp)
	}

	/// Callers clamp negative deltas so the total stays at or above zero; past that, the total saturates at zero.
	pub fn add_xp(&self, current_xp: u64, delta: i64) -> (u64, bool) {
		let new_xp = current_xp.saturating_add_signed(delta);
		let leveled_up = self.xp_to_level(new_xp) > self.xp_to_level(current_xp);
		(new_xp, leveled_up)
	}
}

pub fn can_award_xp(last_award_at: DateTime<Utc>, now: DateTime<Utc>, cooldown: Duration) -> bool {
	now - last_award_at >= cooldown
}

fn integer_sqrt(n: u128) -> u128 {
	let mut root = (n as f64).sqrt() as u128;
	while root * root > n {
		root -= 1;
	}
	while (root + 1) * (root + 1) <= n {
		root += 1;
	}
	root
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::timestamp_to_datetime;

	#[test]
	fn known_thresholds() {
		let curve = LevelCurve::default();
		assert_eq!(curve.xp_to_level(0), 0);
		assert_eq!(curve.xp_to_level(4), 0);
		assert_eq!(curve.xp_to_level(5), 1);
		assert_eq!(curve.xp_to_level(14), 1);
		assert_eq!(curve.xp_to_level(15), 2);
		assert_eq!(curve.level_to_xp(2), 15);
		assert_eq!(curve.level_to_xp(10), 275);
	}

	#[test]
	fn level_brackets_its_xp() {
		let curve = LevelCurve::default();
		let samples = (0..20_000)
			.chain((0..2_000).map(|n| n * 499_979))
			.chain([999_999_999, 1_000_000_000, 1_000_000_001, u32::MAX as u64]);
		for xp in samples {
			let level = curve.xp_to_level(xp);
			assert!(curve.level_to_xp(level) <= xp, "xp {xp}, level {level}");
			assert!(xp < curve.level_to_xp(level + 1), "xp {xp}, level {level}");
		}
	}

	#[test]
	fn thresholds_map_back_to_their_level() {
		for step in [1, 5, 7, 100] {
			let curve = LevelCurve::new(NonZeroU64::new(step).unwrap());
			for level in (0..5_000).chain([65_535, 1_000_000, 1 << 28]) {
				assert_eq!(curve.xp_to_level(curve.level_to_xp(level)), level);
			}
		}
	}

	#[test]
	fn exact_for_huge_xp() {
		// Past 2^53, where an f64 square root stops being exact.
		let curve = LevelCurve::new(NonZeroU64::new(1).unwrap());
		let level = 3_037_000_000;
		let threshold = curve.level_to_xp(level);
		assert_eq!(curve.xp_to_level(threshold), level);
		assert_eq!(curve.xp_to_level(threshold - 1), level - 1);
	}

	#[test]
	fn add_xp_reports_level_ups() {
		let curve = LevelCurve::default();
		assert_eq!(curve.add_xp(0, 4), (4, false));
		assert_eq!(curve.add_xp(4, 1), (5, true));
		assert_eq!(curve.add_xp(5, 9), (14, false));
		assert_eq!(curve.add_xp(14, 100), (114, true));
		assert_eq!(curve.add_xp(20, -10), (10, false));
		assert_eq!(curve.add_xp(3, -10), (0, false));
	}

	#[test]
	fn xp_for_next_level() {
		let curve = LevelCurve::default();
		assert_eq!(curve.xp_for_next_level(0), 5);
		assert_eq!(curve.xp_for_next_level(5), 10);
		assert_eq!(curve.xp_for_next_level(14), 1);
	}

	#[test]
	fn cooldown_is_inclusive() {
		let cooldown = Duration::seconds(DEFAULT_COOLDOWN_SECONDS);
		let t = 1_700_000_000;
		let last = timestamp_to_datetime(t);
		assert!(!can_award_xp(last, timestamp_to_datetime(t + 59), cooldown));
		assert!(can_award_xp(last, timestamp_to_datetime(t + 60), cooldown));
		assert!(can_award_xp(last, timestamp_to_datetime(t + 3600), cooldown));
		assert!(!can_award_xp(last, timestamp_to_datetime(t - 1), cooldown));
	}
}
