use chrono::{DateTime, Duration, Utc};
use serenity::all::{GuildId, UserId};
use sqlx::{query, query_as, query_scalar, Pool, Sqlite};

use crate::{chatter::Chatter, clock::timestamp_to_datetime, leveling::LevelCurve};

/// XP before and after a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XpChange {
	pub old_xp: u64,
	pub new_xp: u64,
	pub leveled_up: bool,
}

pub async fn last_award_at(
	executor: &Pool<Sqlite>,
	chatter: Chatter,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
	let (guild_id, user_id) = chatter.database_key();
	let last_award_at = query_scalar::<_, Option<i64>>(
		"
		SELECT last_award_at
		FROM chatter_progress
		WHERE guild = ? AND user = ?
		",
	)
	.bind(guild_id)
	.bind(user_id)
	.fetch_optional(executor)
	.await?;
	Ok(last_award_at.flatten().map(timestamp_to_datetime))
}

/// Adds `amount` XP unless the chatter was already awarded within `cooldown` of `now`.
///
/// Returns the new total, or `None` if the cooldown had not passed yet.
pub async fn try_award_xp(
	executor: &Pool<Sqlite>,
	chatter: Chatter,
	amount: u64,
	now: DateTime<Utc>,
	cooldown: Duration,
) -> Result<Option<u64>, sqlx::Error> {
	let (guild_id, user_id) = chatter.database_key();
	let amount = i64::try_from(amount).unwrap_or(i64::MAX);
	let now_timestamp = now.timestamp();
	let threshold = (now - cooldown).timestamp();
	let xp = query_scalar::<_, i64>(
		"
		INSERT INTO chatter_progress (guild, user, xp, last_award_at)
		VALUES (?, ?, ?, ?)
		ON CONFLICT (guild, user) DO UPDATE SET
			xp = xp + excluded.xp,
			last_award_at = excluded.last_award_at
		WHERE last_award_at IS NULL OR last_award_at <= ?
		RETURNING xp
		",
	)
	.bind(guild_id)
	.bind(user_id)
	.bind(amount)
	.bind(now_timestamp)
	.bind(threshold)
	.fetch_optional(executor)
	.await?;
	Ok(xp.map(|xp| xp as u64))
}

pub async fn get_xp(executor: &Pool<Sqlite>, chatter: Chatter) -> Result<Option<u64>, sqlx::Error> {
	let (guild_id, user_id) = chatter.database_key();
	let xp = query_scalar::<_, i64>(
		"
		SELECT xp
		FROM chatter_progress
		WHERE guild = ? AND user = ?
		",
	)
	.bind(guild_id)
	.bind(user_id)
	.fetch_optional(executor)
	.await?;
	Ok(xp.map(|xp| xp as u64))
}

/// Adds `delta` (possibly negative) to a chatter's XP, never going below zero.
pub async fn adjust_xp(
	executor: &Pool<Sqlite>,
	curve: &LevelCurve,
	chatter: Chatter,
	delta: i64,
) -> Result<XpChange, sqlx::Error> {
	let mut transaction = executor.begin().await?;
	let (guild_id, user_id) = chatter.database_key();
	let old_xp = query_scalar::<_, i64>(
		"
		SELECT xp
		FROM chatter_progress
		WHERE guild = ? AND user = ?
		",
	)
	.bind(guild_id)
	.bind(user_id)
	.fetch_optional(&mut *transaction)
	.await?
	.unwrap_or(0) as u64;

	let delta = delta.max(-i64::try_from(old_xp).unwrap_or(i64::MAX));
	let (new_xp, leveled_up) = curve.add_xp(old_xp, delta);
	store_xp(&mut transaction, chatter, new_xp).await?;
	transaction.commit().await?;

	Ok(XpChange {
		old_xp,
		new_xp,
		leveled_up,
	})
}

/// Overwrites a chatter's XP.
pub async fn set_xp(
	executor: &Pool<Sqlite>,
	curve: &LevelCurve,
	chatter: Chatter,
	xp: u64,
) -> Result<XpChange, sqlx::Error> {
	let mut transaction = executor.begin().await?;
	let (guild_id, user_id) = chatter.database_key();
	let old_xp = query_scalar::<_, i64>(
		"
		SELECT xp
		FROM chatter_progress
		WHERE guild = ? AND user = ?
		",
	)
	.bind(guild_id)
	.bind(user_id)
	.fetch_optional(&mut *transaction)
	.await?
	.unwrap_or(0) as u64;

	store_xp(&mut transaction, chatter, xp).await?;
	transaction.commit().await?;

	Ok(XpChange {
		old_xp,
		new_xp: xp,
		leveled_up: curve.xp_to_level(xp) > curve.xp_to_level(old_xp),
	})
}

async fn store_xp(
	transaction: &mut sqlx::Transaction<'_, Sqlite>,
	chatter: Chatter,
	xp: u64,
) -> Result<(), sqlx::Error> {
	let (guild_id, user_id) = chatter.database_key();
	let xp = i64::try_from(xp).unwrap_or(i64::MAX);
	query(
		"
		INSERT INTO chatter_progress (guild, user, xp)
		VALUES (?, ?, ?)
		ON CONFLICT (guild, user) DO UPDATE SET
			xp = excluded.xp
		",
	)
	.bind(guild_id)
	.bind(user_id)
	.bind(xp)
	.execute(&mut **transaction)
	.await?;
	Ok(())
}

/// Everyone awarded XP at or after `since`, oldest first.
pub async fn awarded_since(
	executor: &Pool<Sqlite>,
	since: DateTime<Utc>,
) -> Result<Vec<(Chatter, DateTime<Utc>)>, sqlx::Error> {
	let rows = query_as::<_, (i64, i64, i64)>(
		"
		SELECT guild, user, last_award_at
		FROM chatter_progress
		WHERE last_award_at >= ?
		ORDER BY last_award_at ASC
		",
	)
	.bind(since.timestamp())
	.fetch_all(executor)
	.await?;
	Ok(rows
		.into_iter()
		.map(|(guild, user, last_award_at)| {
			let chatter = Chatter::new(GuildId::new(guild as u64), UserId::new(user as u64));
			(chatter, timestamp_to_datetime(last_award_at))
		})
		.collect())
}

/// 1-based position in the guild, counting only chatters with strictly more XP.
pub async fn rank_position(executor: &Pool<Sqlite>, chatter: Chatter) -> Result<u64, sqlx::Error> {
	let (guild_id, user_id) = chatter.database_key();
	let position = query_scalar::<_, i64>(
		"
		SELECT COUNT(*) + 1
		FROM chatter_progress
		WHERE guild = ? AND xp > IFNULL((
			SELECT xp
			FROM chatter_progress
			WHERE guild = ? AND user = ?
		), 0)
		",
	)
	.bind(guild_id)
	.bind(guild_id)
	.bind(user_id)
	.fetch_one(executor)
	.await?;
	Ok(position as u64)
}

/// The chatters with the most XP in a guild, skipping private users.
pub async fn top_chatters(
	executor: &Pool<Sqlite>,
	guild: GuildId,
	limit: u32,
) -> Result<Vec<(UserId, u64)>, sqlx::Error> {
	let guild_id = guild.get() as i64;
	let rows = query_as::<_, (i64, i64)>(
		"
		SELECT chatter_progress.user, xp
		FROM chatter_progress
			LEFT JOIN user_settings
			ON chatter_progress.user = user_settings.user
		WHERE guild = ? AND IFNULL(private, 0) = 0 AND xp > 0
		ORDER BY xp DESC, chatter_progress.user ASC
		LIMIT ?
		",
	)
	.bind(guild_id)
	.bind(limit)
	.fetch_all(executor)
	.await?;
	Ok(rows
		.into_iter()
		.map(|(user, xp)| (UserId::new(user as u64), xp as u64))
		.collect())
}

#[cfg(test)]
pub(crate) mod tests {
	use sqlx::sqlite::SqlitePoolOptions;

	use super::*;
	use crate::user_settings::private::toggle_private;

	/// A fresh in-memory database with migrations applied.
	pub(crate) async fn test_database() -> Pool<Sqlite> {
		let database = SqlitePoolOptions::new()
			.max_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		sqlx::migrate!().run(&database).await.unwrap();
		database
	}

	fn chatter(guild: u64, user: u64) -> Chatter {
		Chatter::new(GuildId::new(guild), UserId::new(user))
	}

	#[tokio::test]
	async fn award_respects_cooldown() {
		let database = test_database().await;
		let alice = chatter(1, 10);
		let cooldown = Duration::seconds(60);
		let t = timestamp_to_datetime(1_000_000);

		assert_eq!(last_award_at(&database, alice).await.unwrap(), None);
		assert_eq!(
			try_award_xp(&database, alice, 3, t, cooldown).await.unwrap(),
			Some(3)
		);
		assert_eq!(last_award_at(&database, alice).await.unwrap(), Some(t));
		assert_eq!(
			try_award_xp(&database, alice, 3, t + Duration::seconds(59), cooldown)
				.await
				.unwrap(),
			None
		);
		assert_eq!(
			try_award_xp(&database, alice, 2, t + Duration::seconds(60), cooldown)
				.await
				.unwrap(),
			Some(5)
		);
		assert_eq!(get_xp(&database, alice).await.unwrap(), Some(5));
	}

	#[tokio::test]
	async fn xp_is_tracked_per_guild() {
		let database = test_database().await;
		let t = timestamp_to_datetime(1_000_000);
		let cooldown = Duration::seconds(60);
		try_award_xp(&database, chatter(1, 10), 4, t, cooldown)
			.await
			.unwrap();
		assert_eq!(
			try_award_xp(&database, chatter(2, 10), 1, t, cooldown)
				.await
				.unwrap(),
			Some(1)
		);
		assert_eq!(get_xp(&database, chatter(1, 10)).await.unwrap(), Some(4));
	}

	#[tokio::test]
	async fn taking_xp_stops_at_zero() {
		let database = test_database().await;
		let curve = LevelCurve::default();
		let bob = chatter(1, 20);

		let change = adjust_xp(&database, &curve, bob, 16).await.unwrap();
		assert_eq!(change, XpChange {
			old_xp: 0,
			new_xp: 16,
			leveled_up: true,
		});
		let change = adjust_xp(&database, &curve, bob, -100).await.unwrap();
		assert_eq!(change.new_xp, 0);
		assert!(!change.leveled_up);
		assert_eq!(get_xp(&database, bob).await.unwrap(), Some(0));
	}

	#[tokio::test]
	async fn setting_xp_keeps_the_award_time() {
		let database = test_database().await;
		let curve = LevelCurve::default();
		let bob = chatter(1, 20);
		let t = timestamp_to_datetime(1_000_000);
		try_award_xp(&database, bob, 1, t, Duration::seconds(60))
			.await
			.unwrap();

		let change = set_xp(&database, &curve, bob, 30).await.unwrap();
		assert_eq!(change.old_xp, 1);
		assert!(change.leveled_up);
		assert_eq!(last_award_at(&database, bob).await.unwrap(), Some(t));
	}

	#[tokio::test]
	async fn leaderboard_and_rank() {
		let database = test_database().await;
		let curve = LevelCurve::default();
		for (user, xp) in [(1, 50), (2, 80), (3, 10), (4, 80), (5, 0)] {
			set_xp(&database, &curve, chatter(7, user), xp).await.unwrap();
		}
		set_xp(&database, &curve, chatter(8, 6), 1000).await.unwrap();
		toggle_private(&database, UserId::new(4)).await.unwrap();

		let top = top_chatters(&database, GuildId::new(7), 10).await.unwrap();
		let top: Vec<_> = top.into_iter().map(|(user, xp)| (user.get(), xp)).collect();
		assert_eq!(top, [(2, 80), (1, 50), (3, 10)]);

		assert_eq!(rank_position(&database, chatter(7, 2)).await.unwrap(), 1);
		assert_eq!(rank_position(&database, chatter(7, 4)).await.unwrap(), 1);
		assert_eq!(rank_position(&database, chatter(7, 1)).await.unwrap(), 3);
	}
}
