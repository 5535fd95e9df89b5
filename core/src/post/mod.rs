use chrono::{DateTime, Utc};
use mejour_post_content::PostContent;
use mejour_remote_api::{Photo, PostDto, Visibility};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{place::Place, Error};

pub mod cache;
mod sync;

pub use cache::PostCache;
pub use mejour_remote_api::Reaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
	pub remote_id: i64,
	pub uuid: Option<Uuid>,
	pub place_remote_id: i64,
	pub author_id: i64,
	pub author_name: String,
	pub title: String,
	/// Raw remote body, markers included. See [`Post::content`].
	pub body: String,
	pub visibility: Visibility,
	pub created_at: DateTime<Utc>,
	pub like_count: i64,
	pub dislike_count: i64,
	pub photo_url: Option<String>,
}

impl Post {
	/// Capture time, tags and display text, parsed out of the body on every call.
	#[must_use]
	pub fn content(&self) -> PostContent {
		PostContent::decode(&self.body)
	}

	#[must_use]
	pub fn capture_time(&self) -> Option<DateTime<Utc>> {
		self.content().capture_time
	}

	#[must_use]
	pub fn tags(&self) -> Vec<String> {
		self.content().tags
	}

	#[must_use]
	pub fn text(&self) -> String {
		self.content().text
	}
}

impl TryFrom<PostDto> for Post {
	type Error = Error;

	fn try_from(dto: PostDto) -> Result<Self, Self::Error> {
		if dto.id <= 0 {
			return Err(Error::MappingFailure(format!("post id {} is not positive", dto.id)));
		}
		if dto.place.id <= 0 {
			return Err(Error::MappingFailure(format!(
				"post {} is attached to place {}",
				dto.id, dto.place.id
			)));
		}

		let created_at = DateTime::parse_from_rfc3339(dto.created_at.trim())
			.map_err(|e| {
				Error::MappingFailure(format!(
					"post {} has creation time {:?}: {e}",
					dto.id, dto.created_at
				))
			})?
			.with_timezone(&Utc);

		let author_name = if dto.author.display_name.trim().is_empty() {
			dto.author.username
		} else {
			dto.author.display_name
		};

		Ok(Self {
			remote_id: dto.id,
			uuid: dto.uuid.and_then(|uuid| Uuid::parse_str(&uuid).ok()),
			place_remote_id: dto.place.id,
			author_id: dto.author.id,
			author_name,
			title: dto.title,
			body: dto.body,
			visibility: dto.visibility,
			created_at,
			like_count: dto.like_count,
			dislike_count: dto.dislike_count,
			photo_url: dto.photo.filter(|url| !url.trim().is_empty()),
		})
	}
}

/// Maps a listing, failing on the first record that does not map.
pub(crate) fn map_posts(dtos: Vec<PostDto>) -> Result<Vec<Post>, Error> {
	dtos.into_iter().map(Post::try_from).collect()
}

/// Maps a post together with the place it is attached to. A broken nested place is logged and
/// dropped; it does not make the post unreadable.
pub(crate) fn map_post_with_place(dto: PostDto) -> Result<(Post, Option<Place>), Error> {
	let place = Place::try_from(dto.place.clone())
		.map_err(|e| warn!(?e, post_id = dto.id, "Ignoring unreadable place of post"))
		.ok();

	Ok((Post::try_from(dto)?, place))
}

/// A post to publish. `text` is the display text; capture time and tags are folded into the
/// remote body.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
	pub place: Place,
	pub title: String,
	pub text: String,
	pub visibility: Visibility,
	pub capture_time: Option<DateTime<Utc>>,
	pub tags: Vec<String>,
	pub photo: Option<Photo>,
}

impl NewPost {
	#[must_use]
	pub fn new(place: Place, title: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			place,
			title: title.into(),
			text: text.into(),
			visibility: Visibility::Public,
			capture_time: None,
			tags: Vec::new(),
			photo: None,
		}
	}
}

/// Replacement fields for an existing post. Leaving `photo` empty keeps the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
	pub place_remote_id: i64,
	pub title: String,
	pub text: String,
	pub visibility: Visibility,
	pub capture_time: Option<DateTime<Utc>>,
	pub tags: Vec<String>,
	pub photo: Option<Photo>,
}

impl PostEdit {
	/// Starts from the post as it currently is.
	#[must_use]
	pub fn from_post(post: &Post) -> Self {
		let content = post.content();

		Self {
			place_remote_id: post.place_remote_id,
			title: post.title.clone(),
			text: content.text,
			visibility: post.visibility,
			capture_time: content.capture_time,
			tags: content.tags,
			photo: None,
		}
	}
}
