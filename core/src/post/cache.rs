//! Posts keyed by place and by author.
//!
//! Both tiers hold server-confirmed posts only. Fetches replace an entry whole; mutations splice
//! the server's answer into entries that are already loaded and never create new ones, so a
//! later load still fetches the complete list.

use std::{
	collections::{BTreeSet, HashMap},
	sync::Arc,
	time::Duration,
};

use tokio::time::Instant;

use super::Post;

#[derive(Debug, Clone)]
struct AuthorEntry {
	posts: Arc<Vec<Post>>,
	fetched_at: Instant,
}

#[derive(Debug, Default)]
pub struct PostCache {
	by_place: HashMap<i64, Vec<Post>>,
	by_author: HashMap<i64, AuthorEntry>,
}

impl PostCache {
	#[must_use]
	pub fn place_posts(&self, place_id: i64) -> Option<&[Post]> {
		self.by_place.get(&place_id).map(Vec::as_slice)
	}

	pub fn replace_place_posts(&mut self, place_id: i64, posts: Vec<Post>) {
		self.by_place.insert(place_id, posts);
	}

	/// The author's posts if they were fetched less than `ttl` before `now`.
	#[must_use]
	pub fn fresh_author_posts(
		&self,
		author_id: i64,
		ttl: Duration,
		now: Instant,
	) -> Option<Arc<Vec<Post>>> {
		self.by_author
			.get(&author_id)
			.filter(|entry| now.saturating_duration_since(entry.fetched_at) < ttl)
			.map(|entry| Arc::clone(&entry.posts))
	}

	/// Whatever is cached for the author, however old.
	#[must_use]
	pub fn author_posts(&self, author_id: i64) -> Option<Arc<Vec<Post>>> {
		self.by_author
			.get(&author_id)
			.map(|entry| Arc::clone(&entry.posts))
	}

	pub fn store_author_posts(
		&mut self,
		author_id: i64,
		posts: Vec<Post>,
		now: Instant,
	) -> Arc<Vec<Post>> {
		let posts = Arc::new(posts);

		self.by_author.insert(
			author_id,
			AuthorEntry {
				posts: Arc::clone(&posts),
				fetched_at: now,
			},
		);

		posts
	}

	/// Prepends a freshly created post to the loaded entries of its place and author.
	pub fn insert_created(&mut self, post: &Post) {
		if let Some(posts) = self.by_place.get_mut(&post.place_remote_id) {
			posts.retain(|known| known.remote_id != post.remote_id);
			posts.insert(0, post.clone());
		}

		if let Some(entry) = self.by_author.get_mut(&post.author_id) {
			let posts = Arc::make_mut(&mut entry.posts);
			posts.retain(|known| known.remote_id != post.remote_id);
			posts.insert(0, post.clone());
		}
	}

	/// Replaces every cached copy of the post with the server's version. Entries that did not
	/// hold the post are left alone, apart from dropping it from places it no longer belongs to.
	pub fn apply_update(&mut self, post: &Post) {
		self.reconcile(post, false);
	}

	/// Like [`Self::apply_update`], but an edited post that moved is also prepended to the
	/// loaded entry of its new place.
	pub fn apply_edit(&mut self, post: &Post) {
		self.reconcile(post, true);
	}

	fn reconcile(&mut self, post: &Post, insert_missing: bool) {
		for (place_id, posts) in &mut self.by_place {
			if *place_id == post.place_remote_id {
				match posts.iter_mut().find(|known| known.remote_id == post.remote_id) {
					Some(known) => *known = post.clone(),
					None if insert_missing => posts.insert(0, post.clone()),
					None => {}
				}
			} else {
				posts.retain(|known| known.remote_id != post.remote_id);
			}
		}

		for entry in self.by_author.values_mut() {
			if !entry.posts.iter().any(|known| known.remote_id == post.remote_id) {
				continue;
			}

			for known in Arc::make_mut(&mut entry.posts) {
				if known.remote_id == post.remote_id {
					*known = post.clone();
				}
			}
		}
	}

	/// Distinct places the author has posted to, from the author tier.
	#[must_use]
	pub fn explored_place_ids(&self, author_id: i64) -> BTreeSet<i64> {
		self.by_author
			.get(&author_id)
			.map(|entry| entry.posts.iter().map(|post| post.place_remote_id).collect())
			.unwrap_or_default()
	}

	/// Every cached post of the author at one place.
	#[must_use]
	pub fn author_posts_at(&self, author_id: i64, place_id: i64) -> Vec<Post> {
		self.by_author
			.get(&author_id)
			.map(|entry| {
				entry
					.posts
					.iter()
					.filter(|post| post.place_remote_id == place_id)
					.cloned()
					.collect()
			})
			.unwrap_or_default()
	}

	pub fn clear(&mut self) {
		self.by_place.clear();
		self.by_author.clear();
	}
}
