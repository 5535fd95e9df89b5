#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::dbg_macro,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Client-side synchronization engine for mejour.
//!
//! The server owns every place and post; [`SyncEngine`] keeps the working set a client needs in
//! memory: a deduplicated place index with nearest-neighbour queries, posts keyed by place and
//! by author, and the mine / friends / community views derived from them. All cache state sits
//! behind one lock and only changes after the server has confirmed a fetch or a mutation.

use std::sync::Arc;

use mejour_remote_api::{AccessToken, Error as RemoteError, Gateway};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

mod error;
pub mod follow;
pub mod place;
pub mod post;
pub mod scope;
pub mod session;

pub use error::{Error, ErrorKind};
pub use follow::{FollowStore, Friend, NameSource, PersistError};
pub use mejour_config::SyncConfig;
pub use mejour_remote_api::{Photo, PlaceType, Visibility};
pub use mejour_utils::Coordinate;
pub use place::{NearbyQuery, NewPlace, Place, PlaceOrigin, PlaceSource, UNPERSISTED_REMOTE_ID};
pub use post::{NewPost, Post, PostEdit, Reaction};
pub use scope::Scope;
pub use session::{CurrentUser, LoginCredentials, Session};

use place::PlaceIndex;
use post::PostCache;

#[derive(Debug)]
struct CacheState {
	places: PlaceIndex,
	posts: PostCache,
}

pub struct SyncEngine {
	gateway: Arc<dyn Gateway>,
	session: Session,
	config: SyncConfig,
	state: RwLock<CacheState>,
	follows: RwLock<FollowStore>,
	/// Serializes get-or-create so its local lookup sees places created by concurrent calls.
	place_creation: Mutex<()>,
}

impl SyncEngine {
	#[must_use]
	pub fn new(
		gateway: Arc<dyn Gateway>,
		session: Session,
		follows: FollowStore,
		config: SyncConfig,
	) -> Self {
		Self {
			gateway,
			session,
			state: RwLock::new(CacheState {
				places: PlaceIndex::new(config.index_merge_radius_meters),
				posts: PostCache::default(),
			}),
			follows: RwLock::new(follows),
			place_creation: Mutex::new(()),
			config,
		}
	}

	#[must_use]
	pub const fn session(&self) -> &Session {
		&self.session
	}

	#[must_use]
	pub const fn config(&self) -> &SyncConfig {
		&self.config
	}

	pub async fn current_user(&self) -> Option<CurrentUser> {
		self.session.current_user().await
	}

	pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<CurrentUser, Error> {
		self.session.sign_in(self.gateway.as_ref(), credentials).await
	}

	/// Forgets the credential and every cached place and post. The followed set is kept.
	#[instrument(skip(self))]
	pub async fn sign_out(&self) {
		self.session.sign_out().await;
		self.reset().await;
		info!("Signed out");
	}

	/// Drops all cached places and posts.
	pub async fn reset(&self) {
		let mut state = self.state.write().await;
		state.places.clear();
		state.posts.clear();
	}

	/// Replaces the place catalog, then reloads the signed-in user's own posts.
	#[instrument(skip(self), err)]
	pub async fn refresh(&self) -> Result<usize, Error> {
		let count = self.refresh_places().await?;

		if let Some(me) = self.session.current_user().await {
			self.load_posts_by_author(me.id, true).await?;
		}

		Ok(count)
	}

	async fn token(&self) -> Result<AccessToken, Error> {
		self.session.ensure_credential(self.gateway.as_ref()).await
	}

	async fn owner(&self) -> Option<Uuid> {
		self.session.current_user().await.map(|user| user.uuid)
	}

	/// Converts a gateway result. A rejected token is dropped so the next call re-authenticates.
	async fn remote<T>(&self, res: Result<T, RemoteError>) -> Result<T, Error> {
		let res = res.map_err(Error::from);

		if let Err(e) = &res {
			if e.is_unauthorized() {
				self.session.invalidate().await;
			}
		}

		res
	}
}
