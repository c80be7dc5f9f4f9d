use std::fmt::Write;

use serenity::{
	all::{CommandInteraction, CommandOptionType},
	builder::{CreateCommand, CreateCommandOption},
};

use crate::{
	chatter::Chatter,
	context::Context,
	error::Result,
	leveling::LevelCurve,
	queries::{get_xp, rank_position},
	user_settings::private::is_private,
	util::{format_xp, is_shown, user_option, ReplyShortcuts},
};

pub async fn execute(context: Context<'_>, interaction: CommandInteraction) -> Result<()> {
	let Some(guild) = interaction.guild_id else {
		interaction
			.ephemeral_reply(context.http, "Ranks only exist in servers.")
			.await?;
		return Ok(());
	};
	let options = &interaction.data.options;
	let target = user_option(options, "user").unwrap_or(interaction.user.id);
	let targets_own = target == interaction.user.id;
	let is_public = is_shown(options);

	let name = if !targets_own || is_public {
		Some(context.get_user_name(guild, target).await)
	} else {
		None
	};

	if !targets_own && is_private(context.database, target).await? {
		let name = name.unwrap_or_default();
		interaction
			.reply(
				context.http,
				format!("{name}'s rank is set to private."),
				!is_public,
			)
			.await?;
		return Ok(());
	}

	let chatter = Chatter::new(guild, target);
	let Some(xp) = get_xp(context.database, chatter).await? else {
		let message = match name {
			Some(name) => format!("{name} has not earned any XP yet. 🤔"),
			None => String::from("You have not earned any XP yet. 🤔"),
		};
		interaction.reply(context.http, message, !is_public).await?;
		return Ok(());
	};
	let position = rank_position(context.database, chatter).await?;
	let recently_active = context.tracker.is_recently_active(guild, target).await;

	let output = describe_rank(
		context.tracker.curve(),
		name.as_deref(),
		xp,
		position,
		recently_active,
	);
	interaction.reply(context.http, output, !is_public).await?;
	Ok(())
}

fn describe_rank(
	curve: &LevelCurve,
	name: Option<&str>,
	xp: u64,
	position: u64,
	recently_active: bool,
) -> String {
	let level = curve.xp_to_level(xp);
	let mut output = match name {
		Some(name) => format!("{name} is level {level} with {}", format_xp(xp)),
		None => format!("You are level {level} with {}", format_xp(xp)),
	};
	write!(
		output,
		", #{position} in this server. {} to level {}.",
		format_xp(curve.xp_for_next_level(xp)),
		level + 1
	)
	.unwrap();
	if recently_active {
		output.push_str(" Recently active. 💬");
	}
	output
}

pub fn register() -> CreateCommand {
	CreateCommand::new("rank")
		.description("Check your level and XP, or someone else's.")
		.dm_permission(false)
		.add_option(
			CreateCommandOption::new(CommandOptionType::User, "user", "Whose rank to look at.")
				.required(false),
		)
		.add_option(
			CreateCommandOption::new(
				CommandOptionType::String,
				"show",
				"Whether to post the rank publicly.",
			)
			.add_string_choice("show", "show")
			.required(false),
		)
}
