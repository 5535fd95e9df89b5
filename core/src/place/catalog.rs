use mejour_utils::{error::report_error, Coordinate};
use tracing::{debug, instrument};

use crate::{Error, SyncEngine};

use super::{index::NearbyQuery, map_places, Place, PlaceSource};

impl SyncEngine {
	/// Walks every page of the remote catalog and replaces the index with it. Any failing page or
	/// record leaves the previous catalog in place.
	#[instrument(skip(self))]
	pub async fn refresh_places(&self) -> Result<usize, Error> {
		let res = async {
			let token = self.token().await?;
			let dtos = self.remote(self.gateway.list_places(&token).await).await?;
			map_places(dtos)
		}
		.await;

		report_error("refresh places", &res);
		let places = res?;
		let count = places.len();

		self.state.write().await.places.replace(places);
		debug!(count, "Replaced place catalog");

		Ok(count)
	}

	/// Fetches one place and upserts it into the index.
	#[instrument(skip(self))]
	pub async fn fetch_place(&self, remote_id: i64) -> Result<Place, Error> {
		ensure_remote_id(remote_id)?;

		let token = self.token().await?;
		let dto = self.remote(self.gateway.get_place(&token, remote_id).await).await?;
		let place = Place::try_from(dto)?;

		self.state.write().await.places.upsert(place.clone());

		Ok(place)
	}

	pub async fn place(&self, remote_id: i64) -> Option<Place> {
		self.state.read().await.places.by_remote_id(remote_id).cloned()
	}

	/// Deduplicated snapshot of one part of the catalog.
	pub async fn places(&self, source: PlaceSource) -> Vec<Place> {
		let owner = self.owner().await;
		self.state.read().await.places.source(source, owner)
	}

	pub async fn nearest_places(&self, query: &NearbyQuery) -> Vec<Place> {
		let owner = self.owner().await;
		self.state.read().await.places.nearest(query, owner)
	}

	/// Catalog places and external point of interest results around `coordinate`, merged and
	/// ordered by distance, using the configured nearby radius and limit.
	pub async fn candidates_near(
		&self,
		coordinate: &Coordinate,
		external: Vec<Place>,
	) -> Vec<Place> {
		let owner = self.owner().await;

		self.state.read().await.places.candidates_near(
			coordinate,
			external,
			self.config.nearby_radius_meters,
			self.config.nearby_limit,
			owner,
		)
	}
}

pub(crate) fn ensure_remote_id(remote_id: i64) -> Result<(), Error> {
	if remote_id > 0 {
		Ok(())
	} else {
		Err(Error::InvalidInput(format!("{remote_id} is not a remote id")))
	}
}
