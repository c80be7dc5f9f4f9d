//! Moderator command for adjusting someone's XP by hand.

use std::fmt::Write;

use serenity::{
	all::{CommandInteraction, CommandOptionType},
	builder::{CreateCommand, CreateCommandOption},
	model::Permissions,
};
use tracing::info;

use crate::{
	chatter::Chatter,
	context::Context,
	error::Result,
	leveling::LevelCurve,
	queries::{adjust_xp, set_xp, XpChange},
	util::{format_xp, integer_option, subcommand, user_option, ReplyShortcuts},
};

pub async fn execute(context: Context<'_>, interaction: CommandInteraction) -> Result<()> {
	let Some(guild) = interaction.guild_id else {
		interaction
			.ephemeral_reply(context.http, "XP only exists in servers.")
			.await?;
		return Ok(());
	};
	let Some((name, options)) = subcommand(&interaction) else {
		interaction
			.ephemeral_reply(context.http, "Unknown subcommand.")
			.await?;
		return Ok(());
	};
	let (Some(target), Some(amount)) = (
		user_option(options, "user"),
		integer_option(options, "amount"),
	) else {
		interaction
			.ephemeral_reply(context.http, "Both a user and an amount are required.")
			.await?;
		return Ok(());
	};
	if amount < 0 {
		interaction
			.ephemeral_reply(context.http, "The amount can't be negative.")
			.await?;
		return Ok(());
	}

	let chatter = Chatter::new(guild, target);
	let curve = context.tracker.curve();
	let change = match name {
		"give" => adjust_xp(context.database, curve, chatter, amount).await?,
		"take" => adjust_xp(context.database, curve, chatter, -amount).await?,
		"set" => set_xp(context.database, curve, chatter, amount as u64).await?,
		_ => {
			interaction
				.ephemeral_reply(context.http, "Unknown subcommand.")
				.await?;
			return Ok(());
		}
	};
	info!(
		"{} changed XP of {chatter} from {} to {}",
		interaction.user.id, change.old_xp, change.new_xp
	);

	let target_name = context.get_user_name(guild, target).await;
	let output = describe_change(curve, &target_name, change);
	interaction.ephemeral_reply(context.http, output).await?;
	Ok(())
}

fn describe_change(curve: &LevelCurve, name: &str, change: XpChange) -> String {
	let old_level = curve.xp_to_level(change.old_xp);
	let new_level = curve.xp_to_level(change.new_xp);
	let mut output = format!(
		"{name} went from {} to {}",
		format_xp(change.old_xp),
		format_xp(change.new_xp)
	);
	if new_level == old_level {
		write!(output, ", staying at level {new_level}.").unwrap();
	} else {
		write!(output, ", level {old_level} → {new_level}.").unwrap();
	}
	output
}

pub fn register() -> CreateCommand {
	let adjustment = |name: &str, description: &str| {
		CreateCommandOption::new(CommandOptionType::SubCommand, name, description)
			.add_sub_option(
				CreateCommandOption::new(CommandOptionType::User, "user", "Whose XP to change.")
					.required(true),
			)
			.add_sub_option(
				CreateCommandOption::new(CommandOptionType::Integer, "amount", "How much XP.")
					.min_int_value(0)
					.required(true),
			)
	};
	CreateCommand::new("xp")
		.description("Adjust someone's XP.")
		.default_member_permissions(Permissions::MANAGE_GUILD)
		.dm_permission(false)
		.add_option(adjustment("give", "Give someone XP."))
		.add_option(adjustment(
			"take",
			"Take XP away from someone. XP won't go below zero.",
		))
		.add_option(adjustment("set", "Set someone's XP to an exact amount."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn describes_level_changes() {
		let curve = LevelCurve::default();
		let change = XpChange {
			old_xp: 16,
			new_xp: 0,
			leveled_up: false,
		};
		assert_eq!(
			describe_change(&curve, "Ferris", change),
			"Ferris went from 16 XP to 0 XP, level 2 → 0."
		);
		let change = XpChange {
			old_xp: 5,
			new_xp: 9,
			leveled_up: false,
		};
		assert_eq!(
			describe_change(&curve, "Ferris", change),
			"Ferris went from 5 XP to 9 XP, staying at level 1."
		);
	}
}
