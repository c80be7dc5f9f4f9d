use std::sync::Arc;

use serenity::{
	client::Cache,
	http::Http,
	model::prelude::{GuildId, UserId},
};
use sqlx::{Pool, Sqlite};

use crate::xp_tracker::XpTracker;

#[derive(Copy, Clone)]
pub struct Context<'l> {
	pub database: &'l Pool<Sqlite>,
	pub tracker: &'l XpTracker,
	pub http: &'l Arc<Http>,
	pub cache: &'l Arc<Cache>,
}

impl<'l> Context<'l> {
	pub fn new(
		database: &'l Pool<Sqlite>,
		tracker: &'l XpTracker,
		http: &'l Arc<Http>,
		cache: &'l Arc<Cache>,
	) -> Self {
		Self {
			database,
			tracker,
			http,
			cache,
		}
	}

	/// Gives nickname if possible, otherwise display name, otherwise ID as a string.
	pub async fn get_user_name(&self, guild: GuildId, user: UserId) -> String {
		let cached = self
			.cache
			.member(guild, user)
			.map(|member| member.display_name().to_string());
		if let Some(name) = cached {
			return name;
		}
		match self.http.get_member(guild, user).await {
			Ok(member) => member.display_name().to_string(),
			Err(_) => user.to_string(),
		}
	}
}
