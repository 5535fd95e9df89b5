use anyhow::Result;
use clap::Subcommand;

use mejour_core::Friend;

use crate::{
	context::Context,
	util::{output::table, prelude::*},
};

#[derive(Subcommand, Debug)]
pub enum FollowCmd {
	/// Follow a user
	Add { user_id: i64 },
	/// Stop following a user
	Remove { user_id: i64 },
	/// List followed users
	List,
	/// Resolve missing or outdated display names again
	RefreshNames,
}

pub async fn run(ctx: &Context, cmd: FollowCmd) -> Result<()> {
	let engine = &ctx.engine;

	match cmd {
		FollowCmd::Add { user_id } => {
			let friend = engine.follow_user(user_id).await?;
			let name = engine.display_name_for(user_id).await;

			print_output!(ctx, &friend, |f: &Friend| {
				println!("Following {} (#{})", name, f.user_id);
			});
		}
		FollowCmd::Remove { user_id } => {
			if engine.unfollow_user(user_id).await? {
				println!("Unfollowed #{user_id}");
			} else {
				println!("#{user_id} was not followed");
			}
		}
		FollowCmd::List => {
			let friends = engine.followed_users().await;

			let mut names = Vec::with_capacity(friends.len());
			for friend in &friends {
				names.push(engine.display_name_for(friend.user_id).await);
			}

			print_output!(ctx, &friends, |f: &Vec<Friend>| {
				if f.is_empty() {
					println!("Not following anyone");
					return;
				}

				let mut table = table(&["ID", "Name", "Avatar", "Name resolved"]);
				for (friend, name) in f.iter().zip(&names) {
					table.add_row(vec![
						friend.user_id.to_string(),
						name.clone(),
						friend
							.avatar_id
							.map_or_else(|| "-".to_string(), |id| id.to_string()),
						friend
							.name_resolved_at
							.map_or_else(|| "never".to_string(), |at| at.to_rfc3339()),
					]);
				}
				println!("{table}");
			});
		}
		FollowCmd::RefreshNames => {
			let updated = engine.refresh_display_names().await?;
			println!("Updated {updated} display name(s)");
		}
	}

	Ok(())
}
