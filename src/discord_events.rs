use itertools::Itertools;
use serenity::{async_trait, model::prelude::*, prelude::*};
use sqlx::{Pool, Sqlite};
use tracing::{error, info, warn};

use crate::{
	cache_stats, chat_xp::maybe_award_xp, context::Context as BotContext, leaderboard, rank,
	user_settings, xp_admin, xp_tracker::XpTracker,
};

pub struct DiscordEventHandler {
	database: Pool<Sqlite>,
	tracker: XpTracker,
	register_commands: bool,
}

impl DiscordEventHandler {
	pub fn new(database: Pool<Sqlite>, tracker: XpTracker, register_commands: bool) -> Self {
		Self {
			database,
			tracker,
			register_commands,
		}
	}

	fn context<'l>(&'l self, context: &'l Context) -> BotContext<'l> {
		BotContext::new(&self.database, &self.tracker, &context.http, &context.cache)
	}
}

#[async_trait]
impl EventHandler for DiscordEventHandler {
	async fn message(&self, context: Context, message: Message) {
		if message.is_own(&context.cache) || message.author.bot {
			return;
		}
		if let Err(error) = maybe_award_xp(self.context(&context), &message).await {
			error!("Could not award XP for message {}: {error}", message.id);
		}
	}

	async fn interaction_create(&self, context: Context, interaction: Interaction) {
		let Interaction::Command(interaction) = interaction else {
			return;
		};
		let bot_context = self.context(&context);
		let name = interaction.data.name.clone();
		let result = match name.as_str() {
			"rank" => rank::execute(bot_context, interaction).await,
			"leaderboard" => leaderboard::execute(bot_context, interaction).await,
			"xp" => xp_admin::execute(bot_context, interaction).await,
			"private" => user_settings::private::execute(bot_context, interaction).await,
			"cachestats" => cache_stats::execute(bot_context, interaction).await,
			_ => {
				warn!("Received unknown command /{name}");
				Ok(())
			}
		};
		if let Err(error) = result {
			error!("Command /{name} failed: {error}");
		}
	}

	async fn ready(&self, context: Context, ready: Ready) {
		info!("Connected as {}", ready.user.name);
		if !self.register_commands {
			return;
		}
		for guild in context.cache.guilds() {
			let commands = vec![
				rank::register(),
				leaderboard::register(),
				xp_admin::register(),
				user_settings::private::register(),
				cache_stats::register(),
			];
			match guild.set_commands(&context.http, commands).await {
				Ok(commands) => {
					let command_names = commands.into_iter().map(|command| command.name).join(", ");
					info!("I now have the following guild slash commands in guild {guild}: {command_names}");
				}
				Err(error) => error!("Could not register commands in guild {guild}: {error}"),
			}
		}
	}
}
