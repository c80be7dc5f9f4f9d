use serenity::{
	all::{CommandInteraction, UserId},
	builder::CreateCommand,
};
use sqlx::{query_scalar, Pool, Sqlite};

use crate::{context::Context, error::Result, util::ReplyShortcuts};

pub async fn is_private(executor: &Pool<Sqlite>, user: UserId) -> Result<bool, sqlx::Error> {
	let user_id = user.get() as i64;
	let private = query_scalar::<_, i64>(
		"
		SELECT private
		FROM user_settings
		WHERE user = ?
		",
	)
	.bind(user_id)
	.fetch_optional(executor)
	.await?;
	Ok(private.is_some_and(|private| private != 0))
}

/// Toggles a user's private setting, and returns whether it is now private or not.
pub(crate) async fn toggle_private(
	executor: &Pool<Sqlite>,
	user: UserId,
) -> Result<bool, sqlx::Error> {
	let user_id = user.get() as i64;
	let private = query_scalar::<_, i64>(
		"
		INSERT INTO user_settings (user, private)
		VALUES (?, 1)
		ON CONFLICT (user)
			DO UPDATE SET private = 1 - private
		RETURNING private
		",
	)
	.bind(user_id)
	.fetch_one(executor)
	.await?;
	Ok(private != 0)
}

pub async fn execute(context: Context<'_>, interaction: CommandInteraction) -> Result<()> {
	let is_private = toggle_private(context.database, interaction.user.id).await?;
	let content = if is_private {
		"Your rank was set to private. Others can no longer view your rank, you won't show up on the leaderboard, and your level-ups won't be announced."
	} else {
		"Your rank was set to public. Others can now view your rank, you will show up on the leaderboard, and your level-ups will be announced."
	};
	interaction.ephemeral_reply(context.http, content).await?;
	Ok(())
}

pub fn register() -> CreateCommand {
	CreateCommand::new("private").description("Toggle whether your rank should be private.")
}
