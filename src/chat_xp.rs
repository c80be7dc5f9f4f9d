use serenity::all::Message;
use tracing::info;

use crate::{
	chatter::Chatter, context::Context, error::Result, user_settings::private::is_private,
};

/// Awards XP for a guild message and announces a level-up in the same channel.
pub async fn maybe_award_xp(context: Context<'_>, message: &Message) -> Result<()> {
	let Some(guild) = message.guild_id else {
		return Ok(());
	};
	let chatter = Chatter::new(guild, message.author.id);
	let Some(change) = context
		.tracker
		.on_message(context.database, chatter)
		.await?
	else {
		return Ok(());
	};
	if !change.leveled_up {
		return Ok(());
	}

	let level = context.tracker.curve().xp_to_level(change.new_xp);
	info!("{chatter} reached level {level}");
	if is_private(context.database, message.author.id).await? {
		return Ok(());
	}
	message
		.channel_id
		.say(
			context.http,
			format!("🎉 <@{}> reached level {level}!", message.author.id),
		)
		.await?;
	Ok(())
}
