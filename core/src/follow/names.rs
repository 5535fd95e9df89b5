//! Display names of followed users, resolved lazily through an ordered chain of sources.

use chrono::Utc;
use tracing::{debug, instrument};

use crate::{place::ensure_remote_id, Error, SyncEngine};

use super::Friend;

/// Seed names written by early releases, before names were resolved from the server.
const LEGACY_SEED_PREFIX: &str = "好友";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
	/// `GET users/{id}/`.
	RemoteProfile,
	/// Author name on the user's cached or freshly loaded posts.
	PostAuthor,
}

impl NameSource {
	/// Tried in order; the first source that yields a name wins.
	pub const RESOLUTION_ORDER: [Self; 2] = [Self::RemoteProfile, Self::PostAuthor];
}

#[must_use]
pub fn placeholder_name(user_id: i64) -> String {
	format!("User #{user_id}")
}

/// Blank, `User #<id>` and the legacy `好友<id>` seed all mean "not resolved yet".
#[must_use]
pub fn is_placeholder_name(user_id: i64, name: &str) -> bool {
	let name = name.trim();

	name.is_empty()
		|| name == placeholder_name(user_id)
		|| name == format!("{LEGACY_SEED_PREFIX}{user_id}")
}

fn usable(user_id: i64, name: &str) -> Option<String> {
	(!is_placeholder_name(user_id, name)).then(|| name.trim().to_string())
}

impl SyncEngine {
	async fn resolve_from(&self, source: NameSource, user_id: i64) -> Option<String> {
		match source {
			NameSource::RemoteProfile => {
				let token = self.token().await.ok()?;
				let user = self
					.remote(self.gateway.get_user(&token, user_id).await)
					.await
					.map_err(|e| debug!(?e, user_id, "Profile lookup failed"))
					.ok()?;

				usable(user_id, &user.display_name).or_else(|| usable(user_id, &user.username))
			}
			NameSource::PostAuthor => self
				.load_posts_by_author(user_id, false)
				.await
				.map_err(|e| debug!(?e, user_id, "Post lookup failed"))
				.ok()?
				.iter()
				.find_map(|post| usable(user_id, &post.author_name)),
		}
	}

	/// Walks [`NameSource::RESOLUTION_ORDER`] and stops at the first name found.
	pub async fn resolve_display_name(&self, user_id: i64) -> Option<String> {
		for source in NameSource::RESOLUTION_ORDER {
			if let Some(name) = self.resolve_from(source, user_id).await {
				debug!(user_id, ?source, "Resolved display name");
				return Some(name);
			}
		}

		None
	}

	/// The cached name of a followed user, or the `User #<id>` placeholder.
	pub async fn display_name_for(&self, user_id: i64) -> String {
		self.follows
			.read()
			.await
			.get(user_id)
			.and_then(|friend| friend.display_name.as_deref())
			.and_then(|name| usable(user_id, name))
			.unwrap_or_else(|| placeholder_name(user_id))
	}

	/// Follows a user, resolving their display name first. Following someone twice returns the
	/// existing entry.
	#[instrument(skip(self), err)]
	pub async fn follow_user(&self, user_id: i64) -> Result<Friend, Error> {
		ensure_remote_id(user_id)?;

		if let Some(friend) = self.follows.read().await.get(user_id) {
			return Ok(friend.clone());
		}

		let display_name = self.resolve_display_name(user_id).await;

		let mut follows = self.follows.write().await;
		follows.add(user_id, display_name)?;

		follows
			.get(user_id)
			.cloned()
			.ok_or_else(|| Error::InvalidInput(format!("user {user_id} cannot be followed")))
	}

	#[instrument(skip(self), err)]
	pub async fn unfollow_user(&self, user_id: i64) -> Result<bool, Error> {
		Ok(self.follows.write().await.remove(user_id)?)
	}

	pub async fn followed_users(&self) -> Vec<Friend> {
		self.follows.read().await.list().to_vec()
	}

	pub async fn is_following(&self, user_id: i64) -> bool {
		self.follows.read().await.contains(user_id)
	}

	/// Re-resolves names that are missing, placeholder-shaped or older than the configured TTL.
	/// A name that cannot be resolved keeps its previous value. Returns how many were updated.
	#[instrument(skip(self), err)]
	pub async fn refresh_display_names(&self) -> Result<usize, Error> {
		self.token().await?;

		let now = Utc::now();
		let ttl = self.config.display_name_ttl();

		let stale = self
			.follows
			.read()
			.await
			.list()
			.iter()
			.filter(|friend| {
				let unresolved = friend
					.display_name
					.as_deref()
					.map_or(true, |name| is_placeholder_name(friend.user_id, name));

				let expired = friend.name_resolved_at.map_or(true, |at| {
					now.signed_duration_since(at)
						.to_std()
						.map_or(false, |age| age >= ttl)
				});

				unresolved || expired
			})
			.map(|friend| friend.user_id)
			.collect::<Vec<_>>();

		let mut updated = 0;
		for user_id in stale {
			let Some(name) = self.resolve_display_name(user_id).await else {
				continue;
			};

			if self
				.follows
				.write()
				.await
				.set_display_name(user_id, name, Utc::now())?
			{
				updated += 1;
			}
		}

		debug!(updated, "Refreshed display names");

		Ok(updated)
	}
}
