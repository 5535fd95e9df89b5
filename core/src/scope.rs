//! Read-only mine / friends / community views, derived on every read from the place index, the
//! author-keyed post tier and the followed set.

use std::collections::BTreeSet;

use futures_concurrency::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
	place::{Place, PlaceSource},
	post::Post,
	Error, SyncEngine,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
	Mine,
	Friends,
	Community,
}

impl SyncEngine {
	pub async fn places_in_scope(&self, scope: Scope) -> Vec<Place> {
		match scope {
			Scope::Mine => self.places(PlaceSource::Mine).await,
			Scope::Community => self.places(PlaceSource::Community).await,
			Scope::Friends => self.friend_places().await,
		}
	}

	/// Public places where at least one followed user has a cached post.
	pub async fn friend_places(&self) -> Vec<Place> {
		let followed = self.follows.read().await.ids();
		let owner = self.owner().await;
		let state = self.state.read().await;

		let place_ids = followed
			.into_iter()
			.flat_map(|user_id| state.posts.explored_place_ids(user_id))
			.collect::<BTreeSet<_>>();

		state
			.places
			.with_remote_ids(&place_ids, PlaceSource::Community, owner)
	}

	/// Distinct places `user_id` has posted to, according to their cached posts.
	pub async fn explored_place_ids(&self, user_id: i64) -> BTreeSet<i64> {
		self.state.read().await.posts.explored_place_ids(user_id)
	}

	pub async fn explored_places(&self, user_id: i64) -> Vec<Place> {
		let owner = self.owner().await;
		let state = self.state.read().await;
		state.places.with_remote_ids(
			&state.posts.explored_place_ids(user_id),
			PlaceSource::All,
			owner,
		)
	}

	pub async fn my_explored_places(&self) -> Vec<Place> {
		match self.session.current_user().await {
			Some(me) => self.explored_places(me.id).await,
			None => Vec::new(),
		}
	}

	pub async fn posts_of_user_at_place(&self, user_id: i64, place_id: i64) -> Vec<Post> {
		self.state
			.read()
			.await
			.posts
			.author_posts_at(user_id, place_id)
	}

	pub async fn my_posts_at(&self, place_id: i64) -> Vec<Post> {
		match self.session.current_user().await {
			Some(me) => self.posts_of_user_at_place(me.id, place_id).await,
			None => Vec::new(),
		}
	}

	/// Cached posts of every followed user at one place, newest first.
	pub async fn friend_posts_at(&self, place_id: i64) -> Vec<Post> {
		let followed = self.follows.read().await.ids();
		let state = self.state.read().await;

		let mut posts = followed
			.into_iter()
			.flat_map(|user_id| state.posts.author_posts_at(user_id, place_id))
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		posts
	}

	/// Loads every followed user's posts concurrently. Each successful load is kept; the first
	/// failure, if any, is returned once all of them have finished.
	#[instrument(skip(self), err)]
	pub async fn load_followed_users_posts(&self, force: bool) -> Result<(), Error> {
		let followed = self.follows.read().await.ids();

		let results = followed
			.iter()
			.map(|user_id| self.load_posts_by_author(*user_id, force))
			.collect::<Vec<_>>()
			.join()
			.await;

		debug!(users = results.len(), "Loaded followed users' posts");

		results
			.into_iter()
			.find_map(Result::err)
			.map_or(Ok(()), Err)
	}
}
