mod args;

use anyhow::{anyhow, Result};
use clap::Subcommand;

use mejour_core::{NewPost, Post, PostEdit};

use crate::{context::Context, util::prelude::*};

use self::args::*;

#[derive(Subcommand, Debug)]
pub enum PostCmd {
	/// Posts attached to a place
	Place(PostListArgs),
	/// Posts written by a user
	User(PostListArgs),
	/// Show one post
	Show { post_id: i64 },
	/// Publish a post on a stored or external place
	Create(PostCreateArgs),
	/// Change an existing post
	Edit(PostEditArgs),
	/// Like or dislike a post
	React(PostReactArgs),
}

pub async fn run(ctx: &Context, cmd: PostCmd) -> Result<()> {
	let engine = &ctx.engine;

	match cmd {
		PostCmd::Place(args) => {
			let posts = engine.load_posts(args.id, args.force).await?;
			print_output!(ctx, &posts, |p: &Vec<Post>| print_posts(p));
		}
		PostCmd::User(args) => {
			let posts = engine.load_posts_by_author(args.id, args.force).await?;
			print_output!(ctx, posts.as_slice(), |p: &[Post]| print_posts(p));
		}
		PostCmd::Show { post_id } => {
			let post = engine.fetch_post(post_id).await?;
			print_output!(ctx, &post, |p: &Post| print_post(p));
		}
		PostCmd::Create(args) => {
			let place = match (args.place, args.external_place()?) {
				(Some(place_id), _) => engine.fetch_place(place_id).await?,
				(None, Some(candidate)) => {
					// Lets a rediscovered point of interest resolve to the stored place
					engine.refresh_places().await?;
					candidate
				}
				(None, None) => return Err(anyhow!("Pass --place or --external")),
			};

			let mut input = NewPost::new(place, &args.title, &args.text);
			input.visibility = args.content.visibility();
			input.capture_time = args.content.taken;
			input.tags.clone_from(&args.content.tags);
			input.photo = args.content.read_photo().await?;

			let post = engine.create_post(input).await?;
			print_output!(ctx, &post, |p: &Post| {
				println!("Published post #{} at place {}", p.remote_id, p.place_remote_id);
			});
		}
		PostCmd::Edit(args) => {
			let current = engine.fetch_post(args.post_id).await?;

			let mut edit = PostEdit::from_post(&current);
			args.apply(&mut edit).await?;

			let post = engine.edit_post(args.post_id, edit).await?;
			print_output!(ctx, &post, |p: &Post| print_post(p));
		}
		PostCmd::React(args) => {
			let post = engine.react(args.post_id, args.reaction.into()).await?;
			print_output!(ctx, &post, |p: &Post| {
				println!(
					"Post #{}: +{} / -{}",
					p.remote_id, p.like_count, p.dislike_count
				);
			});
		}
	}

	Ok(())
}
