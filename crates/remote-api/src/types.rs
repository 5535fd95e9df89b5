use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Visibility {
	Public,
	Private,
}

impl Visibility {
	#[must_use]
	pub const fn from_public(is_public: bool) -> Self {
		if is_public {
			Self::Public
		} else {
			Self::Private
		}
	}

	#[must_use]
	pub const fn is_public(self) -> bool {
		matches!(self, Self::Public)
	}
}

#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlaceType {
	Restaurant,
	Cafe,
	Scenic,
	Shop,
	#[default]
	#[serde(other)]
	Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Reaction {
	Like,
	Dislike,
}

/// Bearer credential. Never printed in full.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
	#[must_use]
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	#[must_use]
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Debug for AccessToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("AccessToken(<redacted>)")
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBrief {
	pub id: i64,
	#[serde(default)]
	pub uuid: String,
	#[serde(default)]
	pub username: String,
	#[serde(default, alias = "displayName")]
	pub display_name: String,
	#[serde(default, alias = "profileVisibility")]
	pub profile_visibility: Option<String>,
	#[serde(default)]
	pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDto {
	pub id: i64,
	pub uuid: String,
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(deserialize_with = "decimal_string")]
	pub latitude: String,
	#[serde(deserialize_with = "decimal_string")]
	pub longitude: String,
	pub visibility: Visibility,
	#[serde(alias = "createdBy")]
	pub created_by: UserBrief,
	#[serde(default)]
	pub metadata: Option<String>,
	#[serde(default, alias = "createdAt")]
	pub created_at: String,
	#[serde(default, alias = "updatedAt")]
	pub updated_at: String,
}

/// Django REST style page.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
	#[serde(default)]
	pub count: Option<u64>,
	pub next: Option<String>,
	#[serde(default)]
	pub previous: Option<String>,
	pub results: Vec<T>,
}

/// `GET places/` answers with a page, a bare array or a single object depending on the
/// deployment. Variants are attempted in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PlaceListResponse {
	Paginated(Paginated<PlaceDto>),
	List(Vec<PlaceDto>),
	Single(Box<PlaceDto>),
}

/// Some endpoints answer with either an array or one bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
	Many(Vec<T>),
	One(Box<T>),
}

impl<T> OneOrMany<T> {
	pub fn into_vec(self) -> Vec<T> {
		match self {
			Self::Many(items) => items,
			Self::One(item) => vec![*item],
		}
	}
}

/// Auxiliary place fields, stored server side as JSON text inside the `metadata` string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceMetadata {
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub kind: Option<PlaceType>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tags: Option<Vec<String>>,
}

impl PlaceMetadata {
	/// Values the backend's API explorer leaves behind when nobody filled the field in.
	const PLACEHOLDERS: [&'static str; 2] = ["", "string"];

	#[must_use]
	pub fn new(kind: PlaceType, tags: Vec<String>) -> Self {
		Self {
			kind: Some(kind),
			tags: Some(tags),
		}
	}

	#[must_use]
	pub fn encode(&self) -> String {
		serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
	}

	/// Absent, placeholder and unreadable values all mean "no metadata".
	#[must_use]
	pub fn decode(raw: Option<&str>) -> Option<Self> {
		let raw = raw?.trim();

		if Self::PLACEHOLDERS.contains(&raw) {
			return None;
		}

		serde_json::from_str(raw)
			.map_err(|e| warn!(%raw, ?e, "Ignoring unreadable place metadata"))
			.ok()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePlaceRequest {
	pub name: String,
	pub description: String,
	pub latitude: String,
	pub longitude: String,
	pub visibility: Visibility,
	pub metadata: String,
}

impl CreatePlaceRequest {
	#[must_use]
	pub fn new(
		name: impl Into<String>,
		description: impl Into<String>,
		latitude: f64,
		longitude: f64,
		visibility: Visibility,
		metadata: &PlaceMetadata,
	) -> Self {
		Self {
			name: name.into(),
			description: description.into(),
			latitude: format!("{latitude:.6}"),
			longitude: format!("{longitude:.6}"),
			visibility,
			metadata: metadata.encode(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDto {
	pub id: i64,
	#[serde(default)]
	pub uuid: Option<String>,
	pub place: PlaceDto,
	pub author: UserBrief,
	pub title: String,
	#[serde(default)]
	pub body: String,
	pub visibility: Visibility,
	#[serde(alias = "createdAt")]
	pub created_at: String,
	#[serde(default, alias = "updatedAt")]
	pub updated_at: Option<String>,
	#[serde(default)]
	pub photo: Option<String>,
	#[serde(default, alias = "likeCount")]
	pub like_count: i64,
	#[serde(default, alias = "dislikeCount")]
	pub dislike_count: i64,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
	pub bytes: Vec<u8>,
	pub file_name: String,
	pub mime_type: String,
}

impl Photo {
	#[must_use]
	pub fn jpeg(bytes: Vec<u8>) -> Self {
		Self {
			bytes,
			file_name: "photo.jpg".to_string(),
			mime_type: "image/jpeg".to_string(),
		}
	}
}

impl fmt::Debug for Photo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Photo")
			.field("file_name", &self.file_name)
			.field("mime_type", &self.mime_type)
			.field("len", &self.bytes.len())
			.finish()
	}
}

/// Multipart fields for creating or editing a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
	pub place_id: i64,
	pub title: String,
	pub body: String,
	pub visibility: Visibility,
	pub photo: Option<Photo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
	pub access: AccessToken,
	#[serde(default)]
	pub refresh: Option<AccessToken>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeUser {
	pub id: i64,
	pub uuid: String,
	#[serde(default)]
	pub username: String,
	#[serde(default, alias = "displayName")]
	pub display_name: String,
}

/// Coordinates come back as strings ("25.033000") but a few deployments send numbers.
fn decimal_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Decimal {
		Text(String),
		Number(serde_json::Number),
	}

	Ok(match Decimal::deserialize(deserializer)? {
		Decimal::Text(text) => text,
		Decimal::Number(number) => number.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	use pretty_assertions::assert_eq;

	#[test]
	fn metadata_is_double_encoded() {
		let metadata = PlaceMetadata::new(PlaceType::Cafe, vec!["quiet".to_string()]);
		let request =
			CreatePlaceRequest::new("Daily Drip", "", 25.033, 121.5654, Visibility::Public, &metadata);

		let json = serde_json::to_value(&request).unwrap();
		assert_eq!(json["latitude"], "25.033000");
		assert_eq!(json["longitude"], "121.565400");
		assert_eq!(json["metadata"], r#"{"type":"cafe","tags":["quiet"]}"#);
		assert_eq!(PlaceMetadata::decode(Some(&request.metadata)), Some(metadata));
	}

	#[test]
	fn placeholder_metadata_is_absent() {
		assert_eq!(PlaceMetadata::decode(None), None);
		assert_eq!(PlaceMetadata::decode(Some("")), None);
		assert_eq!(PlaceMetadata::decode(Some("string")), None);
		assert_eq!(PlaceMetadata::decode(Some("{not json")), None);
	}

	#[test]
	fn unknown_place_type_is_other() {
		let metadata = PlaceMetadata::decode(Some(r#"{"type":"museum"}"#)).unwrap();
		assert_eq!(metadata.kind, Some(PlaceType::Other));
		assert_eq!(metadata.tags, None);
	}

	#[test]
	fn list_response_shapes() {
		let place = r#"{"id":1,"uuid":"7f0b0a52-5d5e-4a4e-9b8e-2f1a4c9d1e11","name":"A",
			"latitude":"25.0","longitude":121.5,"visibility":"public",
			"created_by":{"id":3,"uuid":"u","display_name":"Ann"}}"#;

		let paginated = format!(r#"{{"count":1,"next":null,"previous":null,"results":[{place}]}}"#);
		assert!(matches!(
			serde_json::from_str::<PlaceListResponse>(&paginated).unwrap(),
			PlaceListResponse::Paginated(_)
		));

		let list = format!("[{place}]");
		assert!(matches!(
			serde_json::from_str::<PlaceListResponse>(&list).unwrap(),
			PlaceListResponse::List(_)
		));

		match serde_json::from_str::<PlaceListResponse>(place).unwrap() {
			PlaceListResponse::Single(dto) => assert_eq!(dto.longitude, "121.5"),
			other => panic!("expected a single place, got {other:?}"),
		}
	}

	#[test]
	fn token_debug_is_redacted() {
		assert_eq!(
			format!("{:?}", AccessToken::new("secret")),
			"AccessToken(<redacted>)"
		);
	}
}
