use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};

use mejour_core::{Coordinate, Photo, Place, PostEdit, Reaction, Visibility};

use crate::domains::places::PlaceTypeArg;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ReactionArg {
	Like,
	Dislike,
}

impl From<ReactionArg> for Reaction {
	fn from(arg: ReactionArg) -> Self {
		match arg {
			ReactionArg::Like => Self::Like,
			ReactionArg::Dislike => Self::Dislike,
		}
	}
}

#[derive(Args, Debug)]
pub struct PostListArgs {
	pub id: i64,

	/// Skip the cache and ask the server
	#[arg(long, default_value_t = false)]
	pub force: bool,
}

/// Fields shared by `posts create` and `posts edit`.
#[derive(Args, Debug)]
pub struct PostContentArgs {
	/// Photo capture time (RFC 3339)
	#[arg(long, value_parser = parse_time)]
	pub taken: Option<DateTime<Utc>>,

	/// Tag to attach; repeat for several
	#[arg(long = "tag")]
	pub tags: Vec<String>,

	/// JPEG file to attach
	#[arg(long)]
	pub photo: Option<PathBuf>,

	#[arg(long, default_value_t = false)]
	pub private: bool,
}

impl PostContentArgs {
	pub async fn read_photo(&self) -> Result<Option<Photo>> {
		let Some(path) = &self.photo else {
			return Ok(None);
		};

		let bytes = tokio::fs::read(path)
			.await
			.with_context(|| format!("Failed to read photo {}", path.display()))?;

		let mut photo = Photo::jpeg(bytes);
		if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
			photo.file_name = name.to_string();
		}

		Ok(Some(photo))
	}

	pub fn visibility(&self) -> Visibility {
		Visibility::from_public(!self.private)
	}
}

#[derive(Args, Debug)]
pub struct PostCreateArgs {
	pub title: String,
	pub text: String,

	/// Attach to a stored place
	#[arg(long, conflicts_with = "external")]
	pub place: Option<i64>,

	/// Attach to a point of interest that may not be stored yet
	#[arg(long, requires_all = ["latitude", "longitude"])]
	pub external: Option<String>,

	#[arg(long, allow_negative_numbers = true)]
	pub latitude: Option<f64>,

	#[arg(long, allow_negative_numbers = true)]
	pub longitude: Option<f64>,

	/// Type of the external place
	#[arg(long, value_enum, default_value = "other")]
	pub kind: PlaceTypeArg,

	#[command(flatten)]
	pub content: PostContentArgs,
}

impl PostCreateArgs {
	/// The external candidate, when the post is not attached to a stored place.
	pub fn external_place(&self) -> Result<Option<Place>> {
		let Some(name) = &self.external else {
			return Ok(None);
		};

		let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
			bail!("--external needs --latitude and --longitude");
		};

		Ok(Some(Place::external(
			name,
			self.kind.into(),
			Coordinate::new(latitude, longitude)?,
		)))
	}
}

#[derive(Args, Debug)]
pub struct PostEditArgs {
	pub post_id: i64,

	#[arg(long)]
	pub title: Option<String>,

	#[arg(long)]
	pub text: Option<String>,

	/// Move the post to another stored place
	#[arg(long)]
	pub place: Option<i64>,

	/// Drop all tags before adding the given ones
	#[arg(long, default_value_t = false)]
	pub clear_tags: bool,

	#[arg(long, default_value_t = false)]
	pub public: bool,

	#[command(flatten)]
	pub content: PostContentArgs,
}

impl PostEditArgs {
	pub async fn apply(&self, edit: &mut PostEdit) -> Result<()> {
		if let Some(title) = &self.title {
			edit.title.clone_from(title);
		}
		if let Some(text) = &self.text {
			edit.text.clone_from(text);
		}
		if let Some(place) = self.place {
			edit.place_remote_id = place;
		}
		if self.clear_tags {
			edit.tags.clear();
		}
		edit.tags.extend(self.content.tags.iter().cloned());
		if self.content.taken.is_some() {
			edit.capture_time = self.content.taken;
		}
		if self.content.private {
			edit.visibility = Visibility::Private;
		} else if self.public {
			edit.visibility = Visibility::Public;
		}
		edit.photo = self.content.read_photo().await?;

		Ok(())
	}
}

#[derive(Args, Debug)]
pub struct PostReactArgs {
	pub post_id: i64,
	#[arg(value_enum)]
	pub reaction: ReactionArg,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
	DateTime::parse_from_rfc3339(raw)
		.map(|time| time.with_timezone(&Utc))
		.map_err(|e| format!("'{raw}' is not an RFC 3339 time: {e}"))
}
