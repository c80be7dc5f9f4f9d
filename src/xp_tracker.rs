//! Awards XP for chatting, at most once per cooldown per chatter.
//!
//! The database holds the authoritative XP and award time. A [`RecencyCache`] of recent award
//! times sits in front of it so that chatty members within their cooldown don't cost a query.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serenity::all::{GuildId, UserId};
use sqlx::{Pool, Sqlite};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
	chatter::Chatter,
	clock::{Clock, SystemClock},
	config::Config,
	leveling::{can_award_xp, LevelCurve},
	queries::{self, XpChange},
	recency_cache::{CacheStats, Capacity, RecencyCache},
};

pub struct XpTracker<C = SystemClock> {
	recent_awards: Mutex<RecencyCache<Chatter, C>>,
	clock: C,
	curve: LevelCurve,
	cooldown: Duration,
	min_xp: u64,
	max_xp: u64,
}

impl XpTracker<SystemClock> {
	pub fn from_config(config: &Config) -> Self {
		Self::new(
			LevelCurve::new(config.xp_step),
			config.xp_cooldown,
			(*config.xp_per_message.start(), *config.xp_per_message.end()),
			config.chatter_cache_size,
			SystemClock,
		)
	}
}

impl<C: Clock + Clone> XpTracker<C> {
	/// `xp_per_message` is an inclusive (min, max) range; a reversed range is flipped.
	pub fn new(
		curve: LevelCurve,
		cooldown: Duration,
		xp_per_message: (u64, u64),
		capacity: Capacity,
		clock: C,
	) -> Self {
		let (min_xp, max_xp) = xp_per_message;
		Self {
			recent_awards: Mutex::new(RecencyCache::with_clock(capacity, clock.clone())),
			clock,
			curve,
			cooldown,
			min_xp: min_xp.min(max_xp),
			max_xp: min_xp.max(max_xp),
		}
	}

	pub fn curve(&self) -> &LevelCurve {
		&self.curve
	}

	pub fn cooldown(&self) -> Duration {
		self.cooldown
	}

	/// Seeds the cache with everyone still in their cooldown, so a restart doesn't send them all to the database.
	pub async fn warm_up(&self, database: &Pool<Sqlite>) -> Result<usize, sqlx::Error> {
		let since = self.clock.now() - self.cooldown;
		let recent = queries::awarded_since(database, since).await?;
		if recent.is_empty() {
			return Ok(0);
		}
		let mut recent_awards = self.recent_awards.lock().await;
		let capacity = recent_awards.capacity();
		*recent_awards = RecencyCache::with_entries(capacity, self.clock.clone(), recent);
		let count = recent_awards.len();
		info!("Warmed up the recent chatter cache with {count} chatters");
		Ok(count)
	}

	/// Handles one XP-eligible message. Returns the change if XP was awarded.
	pub async fn on_message(
		&self,
		database: &Pool<Sqlite>,
		chatter: Chatter,
	) -> Result<Option<XpChange>, sqlx::Error> {
		let now = self.clock.now();
		let cache_hit = {
			let mut recent_awards = self.recent_awards.lock().await;
			match recent_awards.get(&chatter) {
				Ok(last_award_at) if !can_award_xp(last_award_at, now, self.cooldown) => {
					// The lookup refreshed the entry to now; it has to keep holding the award time.
					recent_awards.set_at(chatter, last_award_at);
					return Ok(None);
				}
				Ok(_) => true,
				Err(_) => false,
			}
		};
		if !cache_hit {
			if let Some(last_award_at) = queries::last_award_at(database, chatter).await? {
				if !can_award_xp(last_award_at, now, self.cooldown) {
					self.remember(chatter, last_award_at).await;
					return Ok(None);
				}
			}
		}

		let amount = rand::thread_rng().gen_range(self.min_xp..=self.max_xp);
		let awarded =
			queries::try_award_xp(database, chatter, amount, now, self.cooldown).await?;
		let Some(new_xp) = awarded else {
			// Another message got its award in between the cache read and the write.
			debug!("Award for {chatter} lost a race, reloading its award time");
			if let Some(last_award_at) = queries::last_award_at(database, chatter).await? {
				self.remember(chatter, last_award_at).await;
			}
			return Ok(None);
		};
		self.remember(chatter, now).await;

		let old_xp = new_xp.saturating_sub(amount);
		let (_, leveled_up) = self.curve.add_xp(old_xp, amount as i64);
		debug!("Awarded {amount} XP to {chatter}, now at {new_xp}");
		Ok(Some(XpChange {
			old_xp,
			new_xp,
			leveled_up,
		}))
	}

	/// Whether this member got XP recently enough to still be cached.
	pub async fn is_recently_active(&self, guild: GuildId, user: UserId) -> bool {
		self.recent_awards
			.lock()
			.await
			.find_by_equivalent_hash(&(guild, user))
			.is_some()
	}

	pub async fn cache_stats(&self) -> CacheStats {
		self.recent_awards.lock().await.stats()
	}

	async fn remember(&self, chatter: Chatter, last_award_at: DateTime<Utc>) {
		self.recent_awards
			.lock()
			.await
			.set_at(chatter, last_award_at);
	}
}
