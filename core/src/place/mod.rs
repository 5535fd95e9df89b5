use std::collections::HashSet;

use mejour_remote_api::{PlaceDto, PlaceMetadata, PlaceType, Visibility};
use mejour_utils::Coordinate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

mod catalog;
mod get_or_create;
pub mod index;

pub(crate) use catalog::ensure_remote_id;
pub use get_or_create::NewPlace;
pub use index::{canonicalize, dedup_key, nearest_places, NearbyQuery, PlaceIndex};

/// Remote id of a place that only exists locally so far.
pub const UNPERSISTED_REMOTE_ID: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceOrigin {
	/// Created by a user, locally or on the server.
	User,
	/// Found through a point of interest search.
	External,
}

/// Which part of the catalog a query runs over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceSource {
	Mine,
	Community,
	#[default]
	All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
	/// Identity for the UI. Stable across refetches for persisted places.
	pub local_id: Uuid,
	/// `UNPERSISTED_REMOTE_ID` until the server knows about the place.
	pub remote_id: i64,
	pub name: String,
	pub description: String,
	pub kind: PlaceType,
	pub tags: Vec<String>,
	pub coordinate: Coordinate,
	pub visibility: Visibility,
	pub owner_id: Option<Uuid>,
	pub origin: PlaceOrigin,
}

impl Place {
	/// An ephemeral point of interest candidate. Has to go through get-or-create before a post
	/// can be attached to it.
	#[must_use]
	pub fn external(name: impl Into<String>, kind: PlaceType, coordinate: Coordinate) -> Self {
		Self {
			local_id: Uuid::new_v4(),
			remote_id: UNPERSISTED_REMOTE_ID,
			name: name.into(),
			description: String::new(),
			kind,
			tags: Vec::new(),
			coordinate,
			visibility: Visibility::Public,
			owner_id: None,
			origin: PlaceOrigin::External,
		}
	}

	#[must_use]
	pub const fn is_persisted(&self) -> bool {
		self.remote_id > 0
	}

	#[must_use]
	pub const fn is_public(&self) -> bool {
		self.visibility.is_public()
	}

	#[must_use]
	pub fn is_owned_by(&self, user: Uuid) -> bool {
		self.owner_id == Some(user)
	}

	#[must_use]
	pub fn distance_to(&self, coordinate: &Coordinate) -> f64 {
		self.coordinate.distance_to(coordinate)
	}

	/// Case-insensitive substring match against any tag. A blank term matches everything.
	#[must_use]
	pub fn has_tag_matching(&self, term: &str) -> bool {
		let term = term.trim().to_lowercase();

		term.is_empty() || self.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
	}

	/// Trimmed, case-insensitive name comparison used by every deduplication step.
	#[must_use]
	pub fn has_same_name(&self, name: &str) -> bool {
		fold_name(&self.name) == fold_name(name)
	}
}

pub(crate) fn fold_name(name: &str) -> String {
	name.trim().to_lowercase()
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping the first spelling.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();

	tags.into_iter()
		.map(|tag| tag.as_ref().trim().to_string())
		.filter(|tag| !tag.is_empty())
		.filter(|tag| seen.insert(tag.to_lowercase()))
		.collect()
}

impl TryFrom<PlaceDto> for Place {
	type Error = Error;

	fn try_from(dto: PlaceDto) -> Result<Self, Self::Error> {
		if dto.id <= 0 {
			return Err(Error::MappingFailure(format!("place id {} is not positive", dto.id)));
		}

		let local_id = Uuid::parse_str(&dto.uuid).map_err(|e| {
			Error::MappingFailure(format!("place {} has uuid {:?}: {e}", dto.id, dto.uuid))
		})?;

		let coordinate = parse_coordinate(&dto.latitude, &dto.longitude).ok_or_else(|| {
			Error::MappingFailure(format!(
				"place {} has coordinate ({:?}, {:?})",
				dto.id, dto.latitude, dto.longitude
			))
		})?;

		let metadata = PlaceMetadata::decode(dto.metadata.as_deref()).unwrap_or_default();

		Ok(Self {
			local_id,
			remote_id: dto.id,
			name: dto.name,
			description: dto.description.unwrap_or_default(),
			kind: metadata.kind.unwrap_or_default(),
			tags: normalize_tags(metadata.tags.unwrap_or_default()),
			coordinate,
			visibility: dto.visibility,
			owner_id: Uuid::parse_str(&dto.created_by.uuid).ok(),
			origin: PlaceOrigin::User,
		})
	}
}

fn parse_coordinate(latitude: &str, longitude: &str) -> Option<Coordinate> {
	let latitude = latitude.trim().parse().ok()?;
	let longitude = longitude.trim().parse().ok()?;

	Coordinate::new(latitude, longitude).ok()
}

/// Maps a whole listing, failing on the first record that does not map.
pub(crate) fn map_places(dtos: Vec<PlaceDto>) -> Result<Vec<Place>, Error> {
	dtos.into_iter().map(Place::try_from).collect()
}
