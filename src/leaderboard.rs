use std::fmt::Write;

use serenity::{
	all::{CommandInteraction, CommandOptionType, UserId},
	builder::{CreateCommand, CreateCommandOption},
};

use crate::{
	context::Context,
	error::Result,
	leveling::LevelCurve,
	queries::top_chatters,
	util::{format_xp, is_shown, ReplyShortcuts},
};

const LEADERBOARD_SIZE: u32 = 10;

pub async fn execute(context: Context<'_>, interaction: CommandInteraction) -> Result<()> {
	let Some(guild) = interaction.guild_id else {
		interaction
			.ephemeral_reply(context.http, "Leaderboards only exist in servers.")
			.await?;
		return Ok(());
	};
	let is_public = is_shown(&interaction.data.options);

	let top = top_chatters(context.database, guild, LEADERBOARD_SIZE).await?;
	if top.is_empty() {
		interaction
			.reply(
				context.http,
				"Nobody with a public rank has earned any XP here yet.",
				!is_public,
			)
			.await?;
		return Ok(());
	}

	let output = describe_leaderboard(context.tracker.curve(), &top, interaction.user.id);
	interaction.reply(context.http, output, !is_public).await?;
	Ok(())
}

/// Users are mentioned, not named.
fn describe_leaderboard(curve: &LevelCurve, top: &[(UserId, u64)], viewer: UserId) -> String {
	let mut output = String::from("Top chatters in this server:\n");
	for (index, (user, xp)) in top.iter().enumerate() {
		write!(
			output,
			"{}. <@{}>: level {}, {}",
			index + 1,
			user,
			curve.xp_to_level(*xp),
			format_xp(*xp)
		)
		.unwrap();
		if *user == viewer {
			output.push_str(" (you)");
		}
		output.push('\n');
	}
	output
}

pub fn register() -> CreateCommand {
	CreateCommand::new("leaderboard")
		.description("See who has the most XP in this server.")
		.dm_permission(false)
		.add_option(
			CreateCommandOption::new(
				CommandOptionType::String,
				"show",
				"Whether to post the leaderboard publicly.",
			)
			.add_string_choice("show", "show")
			.required(false),
		)
}
