use anyhow::Result;
use clap::{Args, ValueEnum};

use mejour_core::{
	Coordinate, NearbyQuery, NewPlace, PlaceSource, PlaceType, Scope, SyncConfig, Visibility,
};

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum ScopeArg {
	Mine,
	Friends,
	#[default]
	Community,
	/// Every place visible to the signed-in user
	All,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum SourceArg {
	Mine,
	Community,
	#[default]
	All,
}

impl From<SourceArg> for PlaceSource {
	fn from(arg: SourceArg) -> Self {
		match arg {
			SourceArg::Mine => Self::Mine,
			SourceArg::Community => Self::Community,
			SourceArg::All => Self::All,
		}
	}
}

impl ScopeArg {
	pub const fn scope(self) -> Option<Scope> {
		match self {
			Self::Mine => Some(Scope::Mine),
			Self::Friends => Some(Scope::Friends),
			Self::Community => Some(Scope::Community),
			Self::All => None,
		}
	}
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PlaceTypeArg {
	Restaurant,
	Cafe,
	Scenic,
	Shop,
	Other,
}

impl From<PlaceTypeArg> for PlaceType {
	fn from(arg: PlaceTypeArg) -> Self {
		match arg {
			PlaceTypeArg::Restaurant => Self::Restaurant,
			PlaceTypeArg::Cafe => Self::Cafe,
			PlaceTypeArg::Scenic => Self::Scenic,
			PlaceTypeArg::Shop => Self::Shop,
			PlaceTypeArg::Other => Self::Other,
		}
	}
}

#[derive(Args, Debug)]
pub struct PlaceListArgs {
	#[arg(long, value_enum, default_value_t)]
	pub scope: ScopeArg,
}

#[derive(Args, Debug)]
pub struct PlaceNearbyArgs {
	#[arg(allow_negative_numbers = true)]
	pub latitude: f64,
	#[arg(allow_negative_numbers = true)]
	pub longitude: f64,

	/// Search radius in meters (defaults to the configured nearby radius)
	#[arg(long)]
	pub radius: Option<f64>,

	/// Maximum number of places to show
	#[arg(long)]
	pub limit: Option<usize>,

	/// Only places with a tag containing this text
	#[arg(long)]
	pub tag: Option<String>,

	#[arg(long, value_enum, default_value_t)]
	pub source: SourceArg,
}

impl PlaceNearbyArgs {
	pub fn query(&self, config: &SyncConfig) -> Result<NearbyQuery> {
		let from = Coordinate::new(self.latitude, self.longitude)?;

		let mut query = NearbyQuery::new(
			from,
			self.radius.unwrap_or(config.nearby_radius_meters),
			self.limit.unwrap_or(config.nearby_limit),
		)
		.source(self.source.into());

		if let Some(tag) = &self.tag {
			query = query.tag_filter(tag);
		}

		Ok(query)
	}
}

#[derive(Args, Debug)]
pub struct PlaceCreateArgs {
	pub name: String,
	#[arg(allow_negative_numbers = true)]
	pub latitude: f64,
	#[arg(allow_negative_numbers = true)]
	pub longitude: f64,

	#[arg(long, value_enum, default_value = "other")]
	pub kind: PlaceTypeArg,

	/// Tag to attach; repeat for several
	#[arg(long = "tag")]
	pub tags: Vec<String>,

	#[arg(long, default_value = "")]
	pub description: String,

	#[arg(long, default_value_t = false)]
	pub private: bool,

	/// Reuse a same-named place within this many meters (defaults to the configured radius)
	#[arg(long)]
	pub dedup_radius: Option<f64>,
}

impl PlaceCreateArgs {
	pub fn new_place(&self) -> Result<NewPlace> {
		let coordinate = Coordinate::new(self.latitude, self.longitude)?;

		let mut place = NewPlace::new(&self.name, coordinate);
		place.description.clone_from(&self.description);
		place.kind = self.kind.into();
		place.tags.clone_from(&self.tags);
		place.visibility = Visibility::from_public(!self.private);

		Ok(place)
	}
}
