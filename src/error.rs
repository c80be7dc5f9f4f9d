use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("could not run migrations: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	/// Boxed because serenity's error is large.
	#[error("discord error: {0}")]
	Discord(#[from] Box<serenity::Error>),
}

impl From<serenity::Error> for Error {
	fn from(error: serenity::Error) -> Self {
		Self::Discord(Box::new(error))
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
