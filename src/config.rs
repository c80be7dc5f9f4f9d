//! Startup configuration, read from the environment (and `.env`, if present).

use std::{num::NonZeroU64, ops::RangeInclusive, str::FromStr};

use chrono::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
	leveling::{DEFAULT_COOLDOWN_SECONDS, DEFAULT_STEP},
	recency_cache::{CacheError, Capacity},
};

const TOKEN_FILE: &str = "./discord_token.txt";
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/db.db";
const DEFAULT_CACHE_SIZE: i64 = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("no Discord token: set DISCORD_TOKEN or put one in ./discord_token.txt")]
	MissingToken,
	#[error("{name} has invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
	#[error("XP_PER_MESSAGE_MIN ({min}) is greater than XP_PER_MESSAGE_MAX ({max})")]
	EmptyXpRange { min: u64, max: u64 },
	#[error("CHATTER_CACHE_SIZE: {0}")]
	CacheSize(#[from] CacheError),
}

#[derive(Debug, Clone)]
pub struct Config {
	pub discord_token: String,
	pub database_url: String,
	pub xp_step: NonZeroU64,
	pub xp_cooldown: Duration,
	pub xp_per_message: RangeInclusive<u64>,
	pub chatter_cache_size: Capacity,
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		match dotenvy::dotenv() {
			Ok(path) => debug!("Loaded environment from {}", path.display()),
			Err(error) if error.not_found() => {}
			Err(error) => warn!("Could not load .env file: {error}"),
		}
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let discord_token = match lookup("DISCORD_TOKEN") {
			Some(token) => token,
			None => std::fs::read_to_string(TOKEN_FILE)
				.map_err(|_| ConfigError::MissingToken)?,
		}
		.trim()
		.to_string();
		if discord_token.is_empty() {
			return Err(ConfigError::MissingToken);
		}

		let database_url =
			lookup("DATABASE_URL").unwrap_or_else(|| String::from(DEFAULT_DATABASE_URL));
		let xp_step = parse_or(&lookup, "XP_STEP", DEFAULT_STEP)?;
		let cooldown_seconds: u32 = parse_or(
			&lookup,
			"XP_COOLDOWN_SECONDS",
			DEFAULT_COOLDOWN_SECONDS as u32,
		)?;
		let min = u64::from(parse_or::<u32>(&lookup, "XP_PER_MESSAGE_MIN", 1)?);
		let max = u64::from(parse_or::<u32>(&lookup, "XP_PER_MESSAGE_MAX", 3)?);
		if min > max {
			return Err(ConfigError::EmptyXpRange { min, max });
		}
		let cache_size: i64 = parse_or(&lookup, "CHATTER_CACHE_SIZE", DEFAULT_CACHE_SIZE)?;

		Ok(Self {
			discord_token,
			database_url,
			xp_step,
			xp_cooldown: Duration::seconds(i64::from(cooldown_seconds)),
			xp_per_message: min..=max,
			chatter_cache_size: Capacity::try_from(cache_size)?,
		})
	}
}

fn parse_or<T: FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
	default: T,
) -> Result<T, ConfigError> {
	let Some(value) = lookup(name) else {
		return Ok(default);
	};
	let parsed = value.trim().parse();
	parsed.map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
		let env: HashMap<String, String> = pairs
			.iter()
			.map(|(name, value)| (name.to_string(), value.to_string()))
			.collect();
		Config::from_lookup(|name| env.get(name).cloned())
	}

	#[test]
	fn defaults() {
		let config = config_from(&[("DISCORD_TOKEN", " token\n")]).unwrap();
		assert_eq!(config.discord_token, "token");
		assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
		assert_eq!(config.xp_step.get(), 5);
		assert_eq!(config.xp_cooldown, Duration::seconds(60));
		assert_eq!(config.xp_per_message, 1..=3);
		assert_eq!(config.chatter_cache_size.max_size(), 1000);
	}

	#[test]
	fn zero_cache_size_is_unbounded() {
		let config =
			config_from(&[("DISCORD_TOKEN", "token"), ("CHATTER_CACHE_SIZE", "0")]).unwrap();
		assert_eq!(config.chatter_cache_size, Capacity::Unbounded);
	}

	#[test]
	fn rejects_bad_values() {
		assert!(matches!(
			config_from(&[("DISCORD_TOKEN", "token"), ("CHATTER_CACHE_SIZE", "-3")]),
			Err(ConfigError::CacheSize(CacheError::InvalidCapacity(-3)))
		));
		assert!(matches!(
			config_from(&[("DISCORD_TOKEN", "token"), ("XP_STEP", "0")]),
			Err(ConfigError::Invalid { name: "XP_STEP", .. })
		));
		assert!(matches!(
			config_from(&[
				("DISCORD_TOKEN", "token"),
				("XP_PER_MESSAGE_MIN", "5"),
				("XP_PER_MESSAGE_MAX", "2"),
			]),
			Err(ConfigError::EmptyXpRange { min: 5, max: 2 })
		));
		assert!(matches!(
			config_from(&[
				("DISCORD_TOKEN", "token"),
				("XP_PER_MESSAGE_MAX", "9223372036854775808"),
			]),
			Err(ConfigError::Invalid {
				name: "XP_PER_MESSAGE_MAX",
				..
			})
		));
		assert!(matches!(
			config_from(&[("DISCORD_TOKEN", "  ")]),
			Err(ConfigError::MissingToken)
		));
	}
}
