use std::sync::Arc;

use serenity::{
	all::{CommandDataOption, CommandDataOptionValue, CommandInteraction, UserId},
	async_trait,
	builder::{CreateInteractionResponse, CreateInteractionResponseMessage},
	http::Http,
	Result as SerenityResult,
};

#[async_trait]
pub trait ReplyShortcuts {
	async fn reply<S>(&self, http: &Arc<Http>, content: S, ephemeral: bool) -> SerenityResult<()>
	where
		S: Into<String> + Send;
	async fn ephemeral_reply<S>(&self, http: &Arc<Http>, content: S) -> SerenityResult<()>
	where
		S: Into<String> + Send;
}

#[async_trait]
impl ReplyShortcuts for CommandInteraction {
	async fn reply<S>(&self, http: &Arc<Http>, content: S, ephemeral: bool) -> SerenityResult<()>
	where
		S: Into<String> + Send,
	{
		let message = CreateInteractionResponseMessage::new()
			.content(content)
			.ephemeral(ephemeral);
		self.create_response(http, CreateInteractionResponse::Message(message))
			.await
	}
	async fn ephemeral_reply<S>(&self, http: &Arc<Http>, content: S) -> SerenityResult<()>
	where
		S: Into<String> + Send,
	{
		self.reply(http, content, true).await
	}
}

/// The options of the subcommand that was invoked, along with its name.
pub fn subcommand(interaction: &CommandInteraction) -> Option<(&str, &[CommandDataOption])> {
	let option = interaction.data.options.first()?;
	match &option.value {
		CommandDataOptionValue::SubCommand(options) => Some((option.name.as_str(), options)),
		_ => None,
	}
}

pub fn find_option<'l>(
	options: &'l [CommandDataOption],
	name: &str,
) -> Option<&'l CommandDataOptionValue> {
	options
		.iter()
		.find(|option| option.name == name)
		.map(|option| &option.value)
}

pub fn user_option(options: &[CommandDataOption], name: &str) -> Option<UserId> {
	find_option(options, name).and_then(|value| value.as_user_id())
}

pub fn integer_option(options: &[CommandDataOption], name: &str) -> Option<i64> {
	find_option(options, name).and_then(|value| value.as_i64())
}

/// Whether the optional "show" choice was picked, meaning the reply should be public.
pub fn is_shown(options: &[CommandDataOption]) -> bool {
	find_option(options, "show").is_some()
}

/// "1 XP", "12 XP" but with thousands separators: "12,345 XP".
pub fn format_xp(xp: u64) -> String {
	let digits = xp.to_string();
	let mut output = String::with_capacity(digits.len() + digits.len() / 3 + 3);
	for (index, digit) in digits.chars().enumerate() {
		if index > 0 && (digits.len() - index) % 3 == 0 {
			output.push(',');
		}
		output.push(digit);
	}
	output.push_str(" XP");
	output
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn xp_formatting() {
		assert_eq!(format_xp(0), "0 XP");
		assert_eq!(format_xp(999), "999 XP");
		assert_eq!(format_xp(1000), "1,000 XP");
		assert_eq!(format_xp(1234567), "1,234,567 XP");
		assert_eq!(format_xp(u64::MAX), "18,446,744,073,709,551,615 XP");
	}
}
