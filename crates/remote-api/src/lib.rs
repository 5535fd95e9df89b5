#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::dbg_macro,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Client for the mejour backend: places, posts, users and token auth.
//!
//! Every endpoint lives in its own module exposing an `exec` function that takes a
//! [`RequestConfig`]. [`Client`] bundles them behind the [`Gateway`] trait, which is what the
//! engine in `mejour-core` talks to.

pub mod auth;
mod gateway;
mod types;

use std::{collections::HashSet, time::Duration};

use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};

pub use gateway::{Client, Gateway};
pub use types::*;

pub const DEFAULT_API_URL: &str = "https://meejing-backend.vercel.app/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RequestConfig {
	pub client: reqwest::Client,
	pub api_url: String,
	pub auth_token: Option<AccessToken>,
}

impl RequestConfig {
	fn url(&self, path: &str) -> String {
		format!(
			"{}/{}",
			self.api_url.trim_end_matches('/'),
			path.trim_start_matches('/')
		)
	}

	fn require_token(&self) -> Result<AccessToken, Error> {
		self.auth_token
			.clone()
			.filter(|token| !token.is_blank())
			.ok_or(Error::MissingCredential)
	}
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("authentication required")]
	MissingCredential,
	#[error("HTTP {status}: {body}")]
	HttpStatus { status: u16, body: String },
	#[error("failed to decode server response: {0}")]
	Decode(String),
	#[error("request failed: {0}")]
	Transport(String),
	#[error("invalid request: {0}")]
	InvalidRequest(String),
}

impl From<reqwest::Error> for Error {
	fn from(e: reqwest::Error) -> Self {
		if e.is_decode() {
			Self::Decode(e.to_string())
		} else if e.is_builder() {
			Self::InvalidRequest(e.to_string())
		} else {
			Self::Transport(e.to_string())
		}
	}
}

trait WithAuth {
	fn with_auth(self, token: &AccessToken) -> Self;
}

impl WithAuth for RequestBuilder {
	fn with_auth(self, token: &AccessToken) -> Self {
		self.bearer_auth(token.as_str())
	}
}

/// Sends the request and turns any non-2xx answer into [`Error::HttpStatus`] carrying the raw
/// body for diagnostics.
async fn send(req: RequestBuilder) -> Result<Response, Error> {
	let res = req.send().await?;
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}

	let body = res.text().await.unwrap_or_default();
	debug!(%status, %body, "Remote call failed");

	Err(Error::HttpStatus {
		status: status.as_u16(),
		body,
	})
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, Error> {
	let bytes = res.bytes().await?;
	serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
}

fn post_form(form: PostForm) -> Result<reqwest::multipart::Form, Error> {
	let mut multipart = reqwest::multipart::Form::new()
		.text("place_id", form.place_id.to_string())
		.text("title", form.title)
		.text("body", form.body)
		.text("visibility", form.visibility.to_string());

	if let Some(photo) = form.photo {
		let part = reqwest::multipart::Part::bytes(photo.bytes)
			.file_name(photo.file_name)
			.mime_str(&photo.mime_type)?;
		multipart = multipart.part("photo", part);
	}

	Ok(multipart)
}

pub mod places {
	use super::*;

	pub use list::exec as list;
	pub mod list {
		use super::*;

		/// Walks every page until `next` is null. Any page failing aborts the whole listing.
		pub async fn exec(config: RequestConfig) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let base = Url::parse(&config.url("/"))
				.map_err(|e| Error::InvalidRequest(e.to_string()))?;
			let mut next_url = Some(
				Url::parse(&config.url("map/places/"))
					.map_err(|e| Error::InvalidRequest(e.to_string()))?,
			);

			let mut visited = HashSet::new();
			let mut places = Vec::new();

			while let Some(url) = next_url.take() {
				if !visited.insert(url.clone()) {
					return Err(Error::Decode(format!("pagination loops back to {url}")));
				}

				trace!(%url, "Fetching places page");
				let res = send(config.client.get(url).with_auth(&auth_token)).await?;

				match decode::<PlaceListResponse>(res).await? {
					PlaceListResponse::Paginated(page) => {
						places.extend(page.results);
						next_url = page
							.next
							.map(|next| {
								base.join(&next)
									.map_err(|e| Error::InvalidRequest(e.to_string()))
							})
							.transpose()?;
					}
					PlaceListResponse::List(list) => places.extend(list),
					PlaceListResponse::Single(place) => places.push(*place),
				}
			}

			debug!(count = places.len(), "Fetched place catalog");

			Ok(places)
		}

		pub type Response = Vec<PlaceDto>;
	}

	pub use get::exec as get;
	pub mod get {
		use super::*;

		pub async fn exec(config: RequestConfig, place_id: i64) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.get(config.url(&format!("map/places/{place_id}/")))
					.with_auth(&auth_token),
			)
			.await?;

			decode(res).await
		}

		pub type Response = PlaceDto;
	}

	pub use create::exec as create;
	pub mod create {
		use super::*;

		pub async fn exec(config: RequestConfig, input: &CreatePlaceRequest) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.post(config.url("map/places/"))
					.json(input)
					.with_auth(&auth_token),
			)
			.await?;

			decode(res).await
		}

		pub type Response = PlaceDto;
	}
}

pub mod posts {
	use super::*;

	pub use create::exec as create;
	pub mod create {
		use super::*;

		pub async fn exec(config: RequestConfig, form: PostForm) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.post(config.url("map/posts/"))
					.multipart(post_form(form)?)
					.with_auth(&auth_token),
			)
			.await?;

			decode(res).await
		}

		pub type Response = PostDto;
	}

	pub use edit::exec as edit;
	pub mod edit {
		use super::*;

		/// Leaving `photo` empty keeps whatever photo the post already has.
		pub async fn exec(config: RequestConfig, post_id: i64, form: PostForm) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.patch(config.url(&format!("map/posts/{post_id}/")))
					.multipart(post_form(form)?)
					.with_auth(&auth_token),
			)
			.await?;

			decode(res).await
		}

		pub type Response = PostDto;
	}

	pub use get::exec as get;
	pub mod get {
		use super::*;

		pub async fn exec(config: RequestConfig, post_id: i64) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.get(config.url(&format!("map/posts/{post_id}/")))
					.with_auth(&auth_token),
			)
			.await?;

			decode(res).await
		}

		pub type Response = PostDto;
	}

	pub use by_place::exec as by_place;
	pub mod by_place {
		use super::*;

		/// The backend sometimes answers with a lone object here; normalized to a list.
		pub async fn exec(config: RequestConfig, place_id: i64) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.get(config.url(&format!("map/posts/by-place/{place_id}/")))
					.with_auth(&auth_token),
			)
			.await?;

			decode::<OneOrMany<PostDto>>(res)
				.await
				.map(OneOrMany::into_vec)
		}

		pub type Response = Vec<PostDto>;
	}

	pub use by_user::exec as by_user;
	pub mod by_user {
		use super::*;

		pub async fn exec(config: RequestConfig, user_id: i64) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.get(config.url(&format!("map/posts/by-user/{user_id}/")))
					.with_auth(&auth_token),
			)
			.await?;

			decode(res).await
		}

		pub type Response = Vec<PostDto>;
	}

	pub use react::exec as react;
	pub mod react {
		use super::*;

		pub async fn exec(config: RequestConfig, post_id: i64, reaction: Reaction) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.patch(config.url(&format!("map/posts/{post_id}/reaction/")))
					.json(&json!({ "reaction": reaction }))
					.with_auth(&auth_token),
			)
			.await?;

			decode(res).await
		}

		pub type Response = PostDto;
	}
}

pub mod users {
	use super::*;

	pub use get::exec as get;
	pub mod get {
		use super::*;

		pub async fn exec(config: RequestConfig, user_id: i64) -> Result<Response, Error> {
			let auth_token = config.require_token()?;

			let res = send(
				config
					.client
					.get(config.url(&format!("users/{user_id}/")))
					.with_auth(&auth_token),
			)
			.await?;

			decode(res).await
		}

		pub type Response = UserBrief;
	}
}
