//! The set of users the viewer follows, persisted as JSON next to the app config.

use std::{
	fs, io,
	path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

mod names;

pub use names::{is_placeholder_name, placeholder_name, NameSource};

/// Decorative avatars are numbered `1..=AVATAR_COUNT`.
pub const AVATAR_COUNT: u8 = 12;

#[derive(Error, Debug)]
pub enum PersistError {
	#[error("failed to access follow list at {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("follow list at {} is unreadable: {source}", .path.display())]
	Corrupt {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
	pub user_id: i64,
	#[serde(default)]
	pub avatar_id: Option<u8>,
	#[serde(default)]
	pub display_name: Option<String>,
	/// When `display_name` was last resolved from the server.
	#[serde(default)]
	pub name_resolved_at: Option<DateTime<Utc>>,
}

#[must_use]
pub fn random_avatar_id() -> u8 {
	rand::thread_rng().gen_range(1..=AVATAR_COUNT)
}

/// Followed users in the order they were followed. Every mutation is written to disk before it
/// returns.
#[derive(Debug, Default)]
pub struct FollowStore {
	path: Option<PathBuf>,
	friends: Vec<Friend>,
}

impl FollowStore {
	/// A store that is never written anywhere.
	#[must_use]
	pub fn in_memory() -> Self {
		Self::default()
	}

	/// Loads the list at `path`; a missing file is an empty list.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
		let path = path.into();

		let friends = match fs::read(&path) {
			Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| PersistError::Corrupt {
				path: path.clone(),
				source,
			})?,
			Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
			Err(source) => return Err(PersistError::Io { path, source }),
		};

		debug!(path = %path.display(), count = friends.len(), "Loaded follow list");

		Ok(Self {
			path: Some(path),
			friends,
		})
	}

	#[must_use]
	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Follows `user_id` with a fresh random avatar. Non-positive ids and users already followed
	/// are ignored and reported as `false`.
	pub fn add(&mut self, user_id: i64, display_name: Option<String>) -> Result<bool, PersistError> {
		if user_id <= 0 || self.contains(user_id) {
			return Ok(false);
		}

		let display_name = display_name
			.map(|name| name.trim().to_string())
			.filter(|name| !name.is_empty());

		self.friends.push(Friend {
			user_id,
			avatar_id: Some(random_avatar_id()),
			name_resolved_at: display_name.as_ref().map(|_| Utc::now()),
			display_name,
		});
		self.persist()?;

		info!(user_id, "Followed user");

		Ok(true)
	}

	pub fn remove(&mut self, user_id: i64) -> Result<bool, PersistError> {
		let before = self.friends.len();
		self.friends.retain(|friend| friend.user_id != user_id);

		if self.friends.len() == before {
			return Ok(false);
		}

		self.persist()?;
		info!(user_id, "Unfollowed user");

		Ok(true)
	}

	/// Records a freshly resolved display name.
	pub fn set_display_name(
		&mut self,
		user_id: i64,
		name: String,
		resolved_at: DateTime<Utc>,
	) -> Result<bool, PersistError> {
		let Some(friend) = self.friends.iter_mut().find(|friend| friend.user_id == user_id) else {
			return Ok(false);
		};

		friend.display_name = Some(name);
		friend.name_resolved_at = Some(resolved_at);
		self.persist()?;

		Ok(true)
	}

	#[must_use]
	pub fn contains(&self, user_id: i64) -> bool {
		self.friends.iter().any(|friend| friend.user_id == user_id)
	}

	#[must_use]
	pub fn get(&self, user_id: i64) -> Option<&Friend> {
		self.friends.iter().find(|friend| friend.user_id == user_id)
	}

	#[must_use]
	pub fn ids(&self) -> Vec<i64> {
		self.friends.iter().map(|friend| friend.user_id).collect()
	}

	#[must_use]
	pub fn list(&self) -> &[Friend] {
		&self.friends
	}

	fn persist(&self) -> Result<(), PersistError> {
		let Some(path) = &self.path else {
			return Ok(());
		};

		let io_error = |source| PersistError::Io {
			path: path.clone(),
			source,
		};

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).map_err(io_error)?;
		}

		let json = serde_json::to_vec_pretty(&self.friends).map_err(|source| PersistError::Corrupt {
			path: path.clone(),
			source,
		})?;

		fs::write(path, json).map_err(io_error)
	}
}
