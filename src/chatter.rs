use std::fmt::Display;

use serenity::all::{GuildId, UserId};

/// A user as seen in one guild. XP is tracked per guild.
///
/// Hashes exactly like the `(GuildId, UserId)` tuple, so the tuple can be used as a probe for
/// [`RecencyCache::find_by_equivalent_hash`](crate::recency_cache::RecencyCache::find_by_equivalent_hash).
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct Chatter {
	pub guild: GuildId,
	pub user: UserId,
}

impl Chatter {
	pub fn new(guild: GuildId, user: UserId) -> Self {
		Self { guild, user }
	}
	/// The (guild, user) pair as the database stores it.
	pub fn database_key(self) -> (i64, i64) {
		(self.guild.get() as i64, self.user.get() as i64)
	}
}

impl Display for Chatter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.guild, self.user)
	}
}
