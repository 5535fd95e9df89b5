use mejour_remote_api::{
	CreatePlaceRequest, Error as RemoteError, PlaceMetadata, PlaceType, Visibility,
};
use mejour_utils::Coordinate;
use tracing::{debug, info, instrument};

use crate::{Error, SyncEngine};

use super::{normalize_tags, Place};

/// What the caller wants to exist at a spot.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
	pub name: String,
	pub description: String,
	pub coordinate: Coordinate,
	pub visibility: Visibility,
	pub kind: PlaceType,
	pub tags: Vec<String>,
}

impl NewPlace {
	#[must_use]
	pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
		Self {
			name: name.into(),
			description: String::new(),
			coordinate,
			visibility: Visibility::Public,
			kind: PlaceType::Other,
			tags: Vec::new(),
		}
	}

	/// Promotes a local or external candidate.
	#[must_use]
	pub fn from_candidate(place: &Place) -> Self {
		Self {
			name: place.name.clone(),
			description: place.description.clone(),
			coordinate: place.coordinate,
			visibility: place.visibility,
			kind: place.kind,
			tags: place.tags.clone(),
		}
	}
}

impl SyncEngine {
	/// Returns the nearest known place with the same name within `dedup_radius_meters`, or
	/// creates one remotely. The lookup only consults the local index.
	///
	/// Calls are serialized, so a second request for the same spot sees the place the first one
	/// created.
	#[instrument(skip(self, input), fields(name = %input.name, coordinate = %input.coordinate), err)]
	pub async fn get_or_create_place(
		&self,
		input: NewPlace,
		dedup_radius_meters: f64,
	) -> Result<Place, Error> {
		let name = input.name.trim();
		if name.is_empty() {
			return Err(Error::InvalidInput("place name is blank".to_string()));
		}
		if !dedup_radius_meters.is_finite() || dedup_radius_meters < 0.0 {
			return Err(Error::InvalidInput(format!(
				"dedup radius {dedup_radius_meters} is not a distance"
			)));
		}
		let coordinate = input.coordinate.validate()?;

		let token = self.token().await?;
		let owner = self.owner().await;

		let _creating = self.place_creation.lock().await;

		if let Some(existing) = self
			.state
			.read()
			.await
			.places
			.find_existing_near(name, &coordinate, dedup_radius_meters, owner)
		{
			debug!(remote_id = existing.remote_id, "Reusing existing place");
			return Ok(existing.clone());
		}

		let request = CreatePlaceRequest::new(
			name,
			input.description.trim(),
			coordinate.latitude,
			coordinate.longitude,
			input.visibility,
			&PlaceMetadata::new(input.kind, normalize_tags(&input.tags)),
		);

		let dto = match self.gateway.create_place(&token, &request).await {
			Ok(dto) => dto,
			Err(RemoteError::MissingCredential) => return Err(Error::MissingCredential),
			Err(e) => {
				if matches!(e, RemoteError::HttpStatus { status: 401, .. }) {
					self.session.invalidate().await;
				}
				return Err(Error::PlaceCreationFailed(e.to_string()));
			}
		};

		let place = Place::try_from(dto)?;
		info!(remote_id = place.remote_id, "Created place");

		self.state.write().await.places.upsert(place.clone());

		Ok(place)
	}
}
