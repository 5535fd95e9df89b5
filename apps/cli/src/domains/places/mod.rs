mod args;

use anyhow::Result;
use clap::Subcommand;

use mejour_core::{Place, PlaceSource, Scope};

use crate::{context::Context, util::prelude::*};

use self::args::*;

pub use self::args::PlaceTypeArg;

#[derive(Subcommand, Debug)]
pub enum PlaceCmd {
	/// List places in a scope
	List(PlaceListArgs),
	/// Places closest to a coordinate
	Nearby(PlaceNearbyArgs),
	/// Create a place, reusing a same-named one nearby
	Create(PlaceCreateArgs),
	/// Show one place
	Show { place_id: i64 },
}

pub async fn run(ctx: &Context, cmd: PlaceCmd) -> Result<()> {
	match cmd {
		PlaceCmd::List(args) => {
			let engine = &ctx.engine;
			engine.refresh().await?;

			let places = match args.scope.scope() {
				Some(Scope::Friends) => {
					engine.load_followed_users_posts(false).await?;
					engine.places_in_scope(Scope::Friends).await
				}
				Some(scope) => engine.places_in_scope(scope).await,
				None => engine.places(PlaceSource::All).await,
			};

			print_output!(ctx, &places, |p: &Vec<Place>| print_places(p));
		}
		PlaceCmd::Nearby(args) => {
			let query = args.query(ctx.engine.config())?;
			ctx.engine.refresh_places().await?;

			let places = ctx.engine.nearest_places(&query).await;
			print_output!(ctx, &places, |p: &Vec<Place>| {
				print_places(p);
				if !p.is_empty() {
					println!("Within {} m of {}", query.radius_meters, query.from);
				}
			});
		}
		PlaceCmd::Create(args) => {
			let input = args.new_place()?;
			let radius = args
				.dedup_radius
				.unwrap_or(ctx.engine.config().dedup_radius_meters);

			// Reuse only works against a loaded catalog
			ctx.engine.refresh_places().await?;

			let place = ctx.engine.get_or_create_place(input, radius).await?;
			print_output!(ctx, &place, |p: &Place| {
				println!("Place #{} {} at {}", p.remote_id, p.name, p.coordinate);
			});
		}
		PlaceCmd::Show { place_id } => {
			let place = ctx.engine.fetch_place(place_id).await?;
			let posts = ctx.engine.load_posts(place_id, false).await?;

			print_output!(ctx, &place, |p: &Place| {
				print_place_details(p);
				println!();
				print_posts(&posts);
			});
		}
	}

	Ok(())
}
