//! Great-circle geometry over WGS84 decimal degrees.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean earth radius (IUGG), in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InvalidCoordinate {
	#[error("coordinate components must be finite numbers")]
	NotFinite,
	#[error("latitude out of range: {0}")]
	LatitudeOutOfRange(f64),
	#[error("longitude out of range: {0}")]
	LongitudeOutOfRange(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
	pub latitude: f64,
	pub longitude: f64,
}

impl Coordinate {
	pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
		if !latitude.is_finite() || !longitude.is_finite() {
			return Err(InvalidCoordinate::NotFinite);
		}

		if !(-90.0..=90.0).contains(&latitude) {
			return Err(InvalidCoordinate::LatitudeOutOfRange(latitude));
		}

		if !(-180.0..=180.0).contains(&longitude) {
			return Err(InvalidCoordinate::LongitudeOutOfRange(longitude));
		}

		Ok(Self {
			latitude,
			longitude,
		})
	}

	/// Re-runs the range checks, for values that came in through `Deserialize` or struct literals.
	pub fn validate(self) -> Result<Self, InvalidCoordinate> {
		Self::new(self.latitude, self.longitude)
	}

	#[must_use]
	pub fn distance_to(&self, other: &Self) -> f64 {
		haversine_meters(self, other)
	}
}

impl fmt::Display for Coordinate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
	}
}

/// Great-circle distance in meters.
#[must_use]
pub fn haversine_meters(from: &Coordinate, to: &Coordinate) -> f64 {
	let (lat1, lat2) = (from.latitude.to_radians(), to.latitude.to_radians());
	let d_lat = lat2 - lat1;
	let d_lon = (to.longitude - from.longitude).to_radians();

	let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

	2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
}
