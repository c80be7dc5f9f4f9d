use std::str::FromStr;

use config::Config;
use discord_events::DiscordEventHandler;
use serenity::prelude::GatewayIntents;
use sqlx::{
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
	Pool, Sqlite,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xp_tracker::XpTracker;

mod cache_stats;
mod chat_xp;
mod chatter;
mod clock;
mod config;
mod context;
mod discord_events;
mod error;
mod leaderboard;
mod leveling;
mod queries;
mod rank;
mod recency_cache;
mod user_settings;
mod util;
mod xp_admin;
mod xp_tracker;

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,serenity=warn")),
		)
		.init();

	if let Err(error) = run().await {
		error!("{error}");
		std::process::exit(1);
	}
}

async fn run() -> error::Result<()> {
	let config = Config::from_env()?;
	let register_commands = std::env::args().nth(1).is_some_and(|arg| arg == "register");

	let db_pool = connect(&config.database_url).await?;

	let tracker = XpTracker::from_config(&config);
	tracker.warm_up(&db_pool).await?;
	info!(
		"Awarding {:?} XP per message every {}s, level step {}, recent chatter cache {}",
		config.xp_per_message,
		tracker.cooldown().num_seconds(),
		tracker.curve().step(),
		match config.chatter_cache_size.max_size() {
			0 => String::from("unbounded"),
			max_size => format!("of {max_size}"),
		}
	);

	let handler = DiscordEventHandler::new(db_pool, tracker, register_commands);
	let mut client = serenity::Client::builder(
		&config.discord_token,
		GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES,
	)
	.event_handler(handler)
	.await?;

	client.start().await?;
	Ok(())
}

async fn connect(database_url: &str) -> error::Result<Pool<Sqlite>> {
	let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
	let db_pool = SqlitePoolOptions::new()
		.max_connections(4)
		.connect_with(options)
		.await?;
	sqlx::migrate!().run(&db_pool).await?;
	info!("Connected to {database_url}");
	Ok(db_pool)
}
