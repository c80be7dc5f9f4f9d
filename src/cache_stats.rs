use serenity::{all::CommandInteraction, builder::CreateCommand, model::Permissions};

use crate::{context::Context, error::Result, recency_cache::CacheStats, util::ReplyShortcuts};

pub async fn execute(context: Context<'_>, interaction: CommandInteraction) -> Result<()> {
	let stats = context.tracker.cache_stats().await;
	interaction
		.ephemeral_reply(context.http, describe_stats(&stats))
		.await?;
	Ok(())
}

fn describe_stats(stats: &CacheStats) -> String {
	let capacity = match stats.max_size {
		0 => String::from("unbounded"),
		max_size => format!("at most {max_size}"),
	};
	let lookups = stats.hits + stats.misses;
	let hit_rate = if lookups == 0 {
		String::from("n/a")
	} else {
		format!("{:.1}%", stats.hits as f64 * 100.0 / lookups as f64)
	};
	format!(
		"Recent chatter cache: {} entries ({capacity}).\nHits: {}, misses: {} (hit rate {hit_rate}).\nInserts: {}, evictions: {}.",
		stats.current_size, stats.hits, stats.misses, stats.inserts, stats.evictions
	)
}

pub fn register() -> CreateCommand {
	CreateCommand::new("cachestats")
		.description("Show how well the recent chatter cache is doing.")
		.default_member_permissions(Permissions::MANAGE_GUILD)
}
