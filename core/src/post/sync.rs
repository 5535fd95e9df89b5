use std::sync::Arc;

use mejour_post_content::encode;
use mejour_remote_api::PostForm;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::{
	place::{ensure_remote_id, NewPlace, Place},
	Error, SyncEngine,
};

use super::{map_post_with_place, map_posts, NewPost, Post, PostCache, PostEdit, Reaction};

impl SyncEngine {
	/// Posts at one place. A non-empty cached entry is served unless `force`; otherwise the
	/// entry is replaced whole by the fetched list.
	#[instrument(skip(self))]
	pub async fn load_posts(&self, place_id: i64, force: bool) -> Result<Vec<Post>, Error> {
		ensure_remote_id(place_id)?;

		if !force {
			if let Some(posts) = self
				.state
				.read()
				.await
				.posts
				.place_posts(place_id)
				.filter(|posts| !posts.is_empty())
			{
				debug!(count = posts.len(), "Serving cached place posts");
				return Ok(posts.to_vec());
			}
		}

		let token = self.token().await?;
		let dtos = self
			.remote(self.gateway.posts_by_place(&token, place_id).await)
			.await?;
		let posts = map_posts(dtos)?;

		self.state
			.write()
			.await
			.posts
			.replace_place_posts(place_id, posts.clone());

		Ok(posts)
	}

	/// Posts by one author, served from cache for the configured TTL. Within that window every
	/// call hands back the same shared list.
	#[instrument(skip(self))]
	pub async fn load_posts_by_author(
		&self,
		author_id: i64,
		force: bool,
	) -> Result<Arc<Vec<Post>>, Error> {
		ensure_remote_id(author_id)?;

		if !force {
			if let Some(posts) = self.state.read().await.posts.fresh_author_posts(
				author_id,
				self.config.author_posts_ttl(),
				Instant::now(),
			) {
				debug!(count = posts.len(), "Serving cached author posts");
				return Ok(posts);
			}
		}

		let token = self.token().await?;
		let dtos = self
			.remote(self.gateway.posts_by_user(&token, author_id).await)
			.await?;
		let posts = map_posts(dtos)?;

		Ok(self
			.state
			.write()
			.await
			.posts
			.store_author_posts(author_id, posts, Instant::now()))
	}

	/// Publishes a post. A place that is not persisted yet goes through get-or-create first.
	/// Caches only change once the server has confirmed the post.
	#[instrument(skip(self, input), fields(place = %input.place.name), err)]
	pub async fn create_post(&self, input: NewPost) -> Result<Post, Error> {
		if input.title.trim().is_empty() {
			return Err(Error::InvalidInput("post title is blank".to_string()));
		}

		let place = if input.place.is_persisted() {
			input.place
		} else {
			let mut new_place = NewPlace::from_candidate(&input.place);
			new_place.visibility = input.visibility;

			self.get_or_create_place(new_place, self.config.dedup_radius_meters)
				.await?
		};

		let token = self.token().await?;
		let form = PostForm {
			place_id: place.remote_id,
			title: input.title.trim().to_string(),
			body: encode(input.capture_time, &input.tags, &input.text),
			visibility: input.visibility,
			photo: input.photo,
		};

		let dto = self
			.remote(self.gateway.create_post(&token, form).await)
			.await?;
		let (post, attached) = map_post_with_place(dto)?;
		info!(post_id = post.remote_id, place_id = post.place_remote_id, "Created post");

		self.splice(&post, attached, |posts| posts.insert_created(&post))
			.await;

		Ok(post)
	}

	#[instrument(skip(self, edit), err)]
	pub async fn edit_post(&self, post_id: i64, edit: PostEdit) -> Result<Post, Error> {
		ensure_remote_id(post_id)?;
		ensure_remote_id(edit.place_remote_id)?;

		let token = self.token().await?;
		let form = PostForm {
			place_id: edit.place_remote_id,
			title: edit.title.trim().to_string(),
			body: encode(edit.capture_time, &edit.tags, &edit.text),
			visibility: edit.visibility,
			photo: edit.photo,
		};

		let dto = self
			.remote(self.gateway.edit_post(&token, post_id, form).await)
			.await?;
		let (post, attached) = map_post_with_place(dto)?;
		info!(post_id, "Edited post");

		self.splice(&post, attached, |posts| posts.apply_edit(&post))
			.await;

		Ok(post)
	}

	/// Sends a reaction and applies the counters the server answers with.
	#[instrument(skip(self), err)]
	pub async fn react(&self, post_id: i64, reaction: Reaction) -> Result<Post, Error> {
		ensure_remote_id(post_id)?;

		let token = self.token().await?;
		let dto = self
			.remote(self.gateway.react(&token, post_id, reaction).await)
			.await?;
		let post = Post::try_from(dto)?;
		info!(post_id, likes = post.like_count, dislikes = post.dislike_count, "Reacted");

		self.state.write().await.posts.apply_update(&post);

		Ok(post)
	}

	/// Re-reads one post and reconciles every cached copy with it.
	#[instrument(skip(self))]
	pub async fn fetch_post(&self, post_id: i64) -> Result<Post, Error> {
		ensure_remote_id(post_id)?;

		let token = self.token().await?;
		let dto = self
			.remote(self.gateway.get_post(&token, post_id).await)
			.await?;
		let post = Post::try_from(dto)?;

		self.state.write().await.posts.apply_update(&post);

		Ok(post)
	}

	/// Applies a confirmed post and the place it came back with in one write.
	async fn splice(
		&self,
		post: &Post,
		attached: Option<Place>,
		apply: impl FnOnce(&mut PostCache),
	) {
		let mut state = self.state.write().await;

		apply(&mut state.posts);
		if let Some(place) = attached {
			state.places.upsert(place);
		}

		debug!(post_id = post.remote_id, "Spliced post into caches");
	}
}
