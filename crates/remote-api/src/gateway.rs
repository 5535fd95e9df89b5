use crate::{
	auth, places, posts, users, AccessToken, CreatePlaceRequest, Error, LoginResponse, MeUser,
	PlaceDto, PostDto, PostForm, Reaction, RequestConfig, UserBrief, REQUEST_TIMEOUT,
};

use async_trait::async_trait;

/// Everything the synchronization engine needs from the backend.
///
/// Implemented by [`Client`] over HTTP; tests substitute in-memory fakes.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
	async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, Error>;

	async fn me(&self, token: &AccessToken) -> Result<MeUser, Error>;

	async fn list_places(&self, token: &AccessToken) -> Result<Vec<PlaceDto>, Error>;

	async fn get_place(&self, token: &AccessToken, place_id: i64) -> Result<PlaceDto, Error>;

	async fn create_place(
		&self,
		token: &AccessToken,
		input: &CreatePlaceRequest,
	) -> Result<PlaceDto, Error>;

	async fn create_post(&self, token: &AccessToken, form: PostForm) -> Result<PostDto, Error>;

	async fn edit_post(
		&self,
		token: &AccessToken,
		post_id: i64,
		form: PostForm,
	) -> Result<PostDto, Error>;

	async fn get_post(&self, token: &AccessToken, post_id: i64) -> Result<PostDto, Error>;

	async fn posts_by_place(&self, token: &AccessToken, place_id: i64)
		-> Result<Vec<PostDto>, Error>;

	async fn posts_by_user(&self, token: &AccessToken, user_id: i64) -> Result<Vec<PostDto>, Error>;

	async fn react(
		&self,
		token: &AccessToken,
		post_id: i64,
		reaction: Reaction,
	) -> Result<PostDto, Error>;

	async fn get_user(&self, token: &AccessToken, user_id: i64) -> Result<UserBrief, Error>;
}

#[derive(Debug, Clone)]
pub struct Client {
	http: reqwest::Client,
	api_url: String,
}

impl Client {
	pub fn new(api_url: impl Into<String>) -> Result<Self, Error> {
		let http = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.user_agent(concat!("mejour/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self::with_http_client(http, api_url))
	}

	#[must_use]
	pub fn with_http_client(http: reqwest::Client, api_url: impl Into<String>) -> Self {
		Self {
			http,
			api_url: api_url.into(),
		}
	}

	#[must_use]
	pub fn api_url(&self) -> &str {
		&self.api_url
	}

	fn config(&self, token: Option<&AccessToken>) -> RequestConfig {
		RequestConfig {
			client: self.http.clone(),
			api_url: self.api_url.clone(),
			auth_token: token.cloned(),
		}
	}
}

#[async_trait]
impl Gateway for Client {
	async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, Error> {
		auth::login(self.config(None), username, password).await
	}

	async fn me(&self, token: &AccessToken) -> Result<MeUser, Error> {
		auth::me(self.config(Some(token))).await
	}

	async fn list_places(&self, token: &AccessToken) -> Result<Vec<PlaceDto>, Error> {
		places::list(self.config(Some(token))).await
	}

	async fn get_place(&self, token: &AccessToken, place_id: i64) -> Result<PlaceDto, Error> {
		places::get(self.config(Some(token)), place_id).await
	}

	async fn create_place(
		&self,
		token: &AccessToken,
		input: &CreatePlaceRequest,
	) -> Result<PlaceDto, Error> {
		places::create(self.config(Some(token)), input).await
	}

	async fn create_post(&self, token: &AccessToken, form: PostForm) -> Result<PostDto, Error> {
		posts::create(self.config(Some(token)), form).await
	}

	async fn edit_post(
		&self,
		token: &AccessToken,
		post_id: i64,
		form: PostForm,
	) -> Result<PostDto, Error> {
		posts::edit(self.config(Some(token)), post_id, form).await
	}

	async fn get_post(&self, token: &AccessToken, post_id: i64) -> Result<PostDto, Error> {
		posts::get(self.config(Some(token)), post_id).await
	}

	async fn posts_by_place(
		&self,
		token: &AccessToken,
		place_id: i64,
	) -> Result<Vec<PostDto>, Error> {
		posts::by_place(self.config(Some(token)), place_id).await
	}

	async fn posts_by_user(&self, token: &AccessToken, user_id: i64) -> Result<Vec<PostDto>, Error> {
		posts::by_user(self.config(Some(token)), user_id).await
	}

	async fn react(
		&self,
		token: &AccessToken,
		post_id: i64,
		reaction: Reaction,
	) -> Result<PostDto, Error> {
		posts::react(self.config(Some(token)), post_id, reaction).await
	}

	async fn get_user(&self, token: &AccessToken, user_id: i64) -> Result<UserBrief, Error> {
		users::get(self.config(Some(token)), user_id).await
	}
}
