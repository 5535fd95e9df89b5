//! Canonical, queryable set of places.
//!
//! Places reach the client from the remote catalog and from point of interest searches, and both
//! can surface the same physical spot. [`canonicalize`] collapses them with a cheap name plus
//! rounded coordinate key, then folds same-named places that are only a few meters apart.

use std::collections::{BTreeSet, HashMap, HashSet};

use mejour_utils::Coordinate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{fold_name, Place, PlaceSource};

/// Coordinates are rounded to 1e-4 degrees (about 11 m) for the key.
const KEY_SCALE: f64 = 10_000.0;

/// `lowercase(name)-round(lat*1e4)/round(lon*1e4)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn dedup_key(place: &Place) -> String {
	format!(
		"{}-{}/{}",
		place.name.to_lowercase(),
		(place.coordinate.latitude * KEY_SCALE).round() as i64,
		(place.coordinate.longitude * KEY_SCALE).round() as i64,
	)
}

/// First seen wins, both for identical keys and for a same-named place within
/// `merge_radius_meters` of one already kept.
pub fn canonicalize(places: impl IntoIterator<Item = Place>, merge_radius_meters: f64) -> Vec<Place> {
	let mut keys = HashSet::new();
	let mut kept_by_name = HashMap::<String, Vec<Coordinate>>::new();
	let mut canonical = Vec::new();

	for place in places {
		if !keys.insert(dedup_key(&place)) {
			continue;
		}

		let kept = kept_by_name.entry(fold_name(&place.name)).or_default();
		if kept
			.iter()
			.any(|coordinate| place.distance_to(coordinate) <= merge_radius_meters)
		{
			continue;
		}

		kept.push(place.coordinate);
		canonical.push(place);
	}

	canonical
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyQuery {
	pub from: Coordinate,
	pub source: PlaceSource,
	pub limit: usize,
	pub tag_filter: Option<String>,
	pub radius_meters: f64,
}

impl NearbyQuery {
	#[must_use]
	pub const fn new(from: Coordinate, radius_meters: f64, limit: usize) -> Self {
		Self {
			from,
			source: PlaceSource::All,
			limit,
			tag_filter: None,
			radius_meters,
		}
	}

	#[must_use]
	pub const fn source(mut self, source: PlaceSource) -> Self {
		self.source = source;
		self
	}

	#[must_use]
	pub fn tag_filter(mut self, term: impl Into<String>) -> Self {
		self.tag_filter = Some(term.into());
		self
	}
}

/// Places within `radius_meters` of `from` (great-circle distance), optionally restricted to a
/// tag, closest first. Equal distances keep their input order.
pub fn nearest_places<'a>(
	places: impl IntoIterator<Item = &'a Place>,
	from: &Coordinate,
	radius_meters: f64,
	tag_filter: Option<&str>,
	limit: usize,
) -> Vec<Place> {
	let mut hits = places
		.into_iter()
		.filter(|place| tag_filter.map_or(true, |term| place.has_tag_matching(term)))
		.map(|place| (place.distance_to(from), place))
		.filter(|(distance, _)| *distance <= radius_meters)
		.collect::<Vec<_>>();

	hits.sort_by(|(a, _), (b, _)| a.total_cmp(b));

	hits.into_iter()
		.take(limit)
		.map(|(_, place)| place.clone())
		.collect()
}

#[derive(Debug, Clone, Default)]
pub struct PlaceIndex {
	/// Raw catalog in fetch order; views are canonicalized on read.
	catalog: Vec<Place>,
	merge_radius_meters: f64,
}

impl PlaceIndex {
	#[must_use]
	pub const fn new(merge_radius_meters: f64) -> Self {
		Self {
			catalog: Vec::new(),
			merge_radius_meters,
		}
	}

	/// Full replace with a freshly fetched catalog.
	pub fn replace(&mut self, places: Vec<Place>) {
		self.catalog = places;
	}

	/// Replaces the entry with the same local or remote identity in place, otherwise prepends.
	pub fn upsert(&mut self, place: Place) {
		let existing = self.catalog.iter_mut().find(|known| {
			known.local_id == place.local_id
				|| (place.is_persisted() && known.remote_id == place.remote_id)
		});

		match existing {
			Some(known) => *known = place,
			None => self.catalog.insert(0, place),
		}
	}

	pub fn clear(&mut self) {
		self.catalog.clear();
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.catalog.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.catalog.is_empty()
	}

	#[must_use]
	pub fn by_remote_id(&self, remote_id: i64) -> Option<&Place> {
		self.catalog.iter().find(|place| place.remote_id == remote_id)
	}

	#[must_use]
	pub fn by_local_id(&self, local_id: Uuid) -> Option<&Place> {
		self.catalog.iter().find(|place| place.local_id == local_id)
	}

	fn in_source<'a>(
		&'a self,
		source: PlaceSource,
		owner: Option<Uuid>,
	) -> impl Iterator<Item = &'a Place> + 'a {
		self.catalog.iter().filter(move |place| {
			let mine = owner.is_some_and(|owner| place.is_owned_by(owner));

			match source {
				PlaceSource::Mine => mine,
				PlaceSource::Community => place.is_public(),
				PlaceSource::All => mine || place.is_public(),
			}
		})
	}

	/// Deduplicated view of one part of the catalog, as seen by `owner`.
	#[must_use]
	pub fn source(&self, source: PlaceSource, owner: Option<Uuid>) -> Vec<Place> {
		canonicalize(
			self.in_source(source, owner).cloned(),
			self.merge_radius_meters,
		)
	}

	#[must_use]
	pub fn nearest(&self, query: &NearbyQuery, owner: Option<Uuid>) -> Vec<Place> {
		nearest_places(
			&self.source(query.source, owner),
			&query.from,
			query.radius_meters,
			query.tag_filter.as_deref(),
			query.limit,
		)
	}

	/// Closest persisted place visible to `owner` with the same trimmed, case-insensitive name
	/// within `radius_meters`.
	#[must_use]
	pub fn find_existing_near(
		&self,
		name: &str,
		coordinate: &Coordinate,
		radius_meters: f64,
		owner: Option<Uuid>,
	) -> Option<&Place> {
		self.in_source(PlaceSource::All, owner)
			.filter(|place| place.is_persisted() && place.has_same_name(name))
			.map(|place| (place.distance_to(coordinate), place))
			.filter(|(distance, _)| *distance <= radius_meters)
			.min_by(|(a, _), (b, _)| a.total_cmp(b))
			.map(|(_, place)| place)
	}

	/// First entry of `source` for each of `remote_ids`, in catalog order.
	#[must_use]
	pub fn with_remote_ids(
		&self,
		remote_ids: &BTreeSet<i64>,
		source: PlaceSource,
		owner: Option<Uuid>,
	) -> Vec<Place> {
		let mut seen = HashSet::new();

		self.in_source(source, owner)
			.filter(|place| remote_ids.contains(&place.remote_id) && seen.insert(place.remote_id))
			.cloned()
			.collect()
	}

	/// Merges external candidates behind the catalog so a rediscovered point of interest
	/// collapses onto the stored place, then keeps those within `radius_meters`, closest first.
	#[must_use]
	pub fn candidates_near(
		&self,
		coordinate: &Coordinate,
		external: Vec<Place>,
		radius_meters: f64,
		limit: usize,
		owner: Option<Uuid>,
	) -> Vec<Place> {
		let pool = self
			.in_source(PlaceSource::All, owner)
			.cloned()
			.chain(external);

		nearest_places(
			&canonicalize(pool, self.merge_radius_meters),
			coordinate,
			radius_meters,
			None,
			limit,
		)
	}
}
