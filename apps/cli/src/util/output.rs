use anyhow::Result;
use comfy_table::{presets::UTF8_BORDERS_ONLY, Table};
use mejour_core::{Place, Post};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

pub fn table(header: &[&str]) -> Table {
	let mut table = Table::new();
	table.load_preset(UTF8_BORDERS_ONLY);
	table.set_header(header.to_vec());
	table
}

pub fn print_places(places: &[Place]) {
	if places.is_empty() {
		println!("No places found");
		return;
	}

	let mut table = table(&["ID", "Name", "Type", "Tags", "Coordinate", "Visibility"]);
	for place in places {
		table.add_row(vec![
			place.remote_id.to_string(),
			place.name.clone(),
			place.kind.to_string(),
			place.tags.join(", "),
			place.coordinate.to_string(),
			place.visibility.to_string(),
		]);
	}

	println!("{table}");
}

pub fn print_place_details(place: &Place) {
	println!("#{} {} ({})", place.remote_id, place.name, place.kind);
	println!("{} {}", place.coordinate, place.visibility);
	if !place.tags.is_empty() {
		println!("Tags: {}", place.tags.join(", "));
	}
	if !place.description.is_empty() {
		println!();
		println!("{}", place.description);
	}
}

pub fn print_posts(posts: &[Post]) {
	if posts.is_empty() {
		println!("No posts found");
		return;
	}

	let mut table = table(&["ID", "Place", "Author", "Title", "Tags", "Likes", "Created"]);
	for post in posts {
		table.add_row(vec![
			post.remote_id.to_string(),
			post.place_remote_id.to_string(),
			post.author_name.clone(),
			post.title.clone(),
			post.tags().join(", "),
			format!("+{} / -{}", post.like_count, post.dislike_count),
			post.created_at.format("%Y-%m-%d %H:%M").to_string(),
		]);
	}

	println!("{table}");
}

pub fn print_post(post: &Post) {
	let content = post.content();

	println!("#{} {}", post.remote_id, post.title);
	println!(
		"by {} at place {}, {} ({})",
		post.author_name,
		post.place_remote_id,
		post.created_at.to_rfc3339(),
		post.visibility
	);
	if let Some(taken) = content.capture_time {
		println!("Photo taken {}", taken.to_rfc3339());
	}
	if !content.tags.is_empty() {
		println!("Tags: {}", content.tags.join(", "));
	}
	if let Some(url) = &post.photo_url {
		println!("Photo: {url}");
	}
	println!("+{} / -{}", post.like_count, post.dislike_count);
	println!();
	println!("{}", content.text);
}
