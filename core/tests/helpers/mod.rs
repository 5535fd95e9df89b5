//! In-memory backend shared by the engine integration tests

#![allow(dead_code)]

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::Duration,
};

use async_trait::async_trait;
use mejour_core::{
	CurrentUser, FollowStore, LoginCredentials, Session, SyncConfig, SyncEngine, Visibility,
};
use mejour_remote_api::{
	AccessToken, CreatePlaceRequest, Error, Gateway, LoginResponse, MeUser, PlaceDto, PostDto,
	PostForm, Reaction, UserBrief,
};
use uuid::Uuid;

pub const ME: i64 = 7;
pub const VALID_TOKEN: &str = "tok";

pub fn user_uuid(user_id: i64) -> Uuid {
	Uuid::from_u128(u128::try_from(user_id).unwrap())
}

pub fn user(user_id: i64, display_name: &str) -> UserBrief {
	UserBrief {
		id: user_id,
		uuid: user_uuid(user_id).to_string(),
		username: format!("user{user_id}"),
		display_name: display_name.to_string(),
		profile_visibility: Some("public".to_string()),
		avatar: None,
	}
}

pub fn place_dto(
	id: i64,
	name: &str,
	latitude: f64,
	longitude: f64,
	owner: i64,
	visibility: Visibility,
) -> PlaceDto {
	PlaceDto {
		id,
		uuid: Uuid::from_u128(10_000 + u128::try_from(id).unwrap()).to_string(),
		name: name.to_string(),
		description: None,
		latitude: format!("{latitude:.6}"),
		longitude: format!("{longitude:.6}"),
		visibility,
		created_by: user(owner, &format!("Owner {owner}")),
		metadata: Some(r#"{"type":"cafe","tags":["coffee"]}"#.to_string()),
		created_at: "2024-01-01T00:00:00Z".to_string(),
		updated_at: "2024-01-01T00:00:00Z".to_string(),
	}
}

pub fn post_dto(id: i64, place: &PlaceDto, author: UserBrief, like_count: i64) -> PostDto {
	PostDto {
		id,
		uuid: Some(Uuid::from_u128(20_000 + u128::try_from(id).unwrap()).to_string()),
		place: place.clone(),
		author,
		title: format!("Post {id}"),
		body: format!("Body of post {id}"),
		visibility: Visibility::Public,
		created_at: format!("2024-01-{:02}T10:00:00Z", 1 + id % 28),
		updated_at: None,
		photo: None,
		like_count,
		dislike_count: 0,
	}
}

#[derive(Default)]
struct Backend {
	places: Vec<PlaceDto>,
	posts: Vec<PostDto>,
	users: HashMap<i64, UserBrief>,
	next_id: i64,
}

/// Stands in for the HTTP client. Counts every call per endpoint and can be told to fail one.
pub struct FakeGateway {
	backend: Mutex<Backend>,
	calls: Mutex<HashMap<&'static str, usize>>,
	failures: Mutex<HashMap<&'static str, u16>>,
	valid_token: Mutex<String>,
	create_latency: Duration,
}

impl Default for FakeGateway {
	fn default() -> Self {
		Self::new()
	}
}

impl FakeGateway {
	pub fn new() -> Self {
		let mut users = HashMap::new();
		users.insert(ME, user(ME, "Ann"));

		Self {
			backend: Mutex::new(Backend {
				users,
				next_id: 1000,
				..Backend::default()
			}),
			calls: Mutex::new(HashMap::new()),
			failures: Mutex::new(HashMap::new()),
			valid_token: Mutex::new(VALID_TOKEN.to_string()),
			create_latency: Duration::ZERO,
		}
	}

	/// Place creation takes this long, to let concurrent calls overlap.
	pub fn with_create_latency(mut self, latency: Duration) -> Self {
		self.create_latency = latency;
		self
	}

	pub fn add_place(&self, place: PlaceDto) {
		self.backend.lock().unwrap().places.push(place);
	}

	pub fn add_post(&self, post: PostDto) {
		self.backend.lock().unwrap().posts.push(post);
	}

	pub fn add_user(&self, user: UserBrief) {
		self.backend.lock().unwrap().users.insert(user.id, user);
	}

	pub fn place(&self, id: i64) -> PlaceDto {
		self.backend
			.lock()
			.unwrap()
			.places
			.iter()
			.find(|place| place.id == id)
			.cloned()
			.unwrap()
	}

	/// Changes a post behind the client's back, like another user would.
	pub fn update_post(&self, id: i64, update: impl FnOnce(&mut PostDto)) {
		let mut backend = self.backend.lock().unwrap();
		update(backend.posts.iter_mut().find(|post| post.id == id).unwrap());
	}

	pub fn place_count(&self) -> usize {
		self.backend.lock().unwrap().places.len()
	}

	pub fn fail(&self, endpoint: &'static str, status: u16) {
		self.failures.lock().unwrap().insert(endpoint, status);
	}

	pub fn recover(&self, endpoint: &'static str) {
		self.failures.lock().unwrap().remove(endpoint);
	}

	pub fn expire_token(&self) {
		*self.valid_token.lock().unwrap() = "rotated".to_string();
	}

	pub fn calls(&self, endpoint: &'static str) -> usize {
		self.calls
			.lock()
			.unwrap()
			.get(endpoint)
			.copied()
			.unwrap_or_default()
	}

	fn enter(&self, endpoint: &'static str, token: Option<&AccessToken>) -> Result<(), Error> {
		*self.calls.lock().unwrap().entry(endpoint).or_default() += 1;

		if let Some(status) = self.failures.lock().unwrap().get(endpoint) {
			return Err(Error::HttpStatus {
				status: *status,
				body: format!("{{\"detail\":\"{endpoint} failed\"}}"),
			});
		}

		match token {
			Some(token) if token.as_str() != *self.valid_token.lock().unwrap() => {
				Err(Error::HttpStatus {
					status: 401,
					body: "{\"detail\":\"token not valid\"}".to_string(),
				})
			}
			_ => Ok(()),
		}
	}

	fn not_found(what: &str) -> Error {
		Error::HttpStatus {
			status: 404,
			body: format!("{{\"detail\":\"{what} not found\"}}"),
		}
	}
}

#[async_trait]
impl Gateway for FakeGateway {
	async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, Error> {
		self.enter("login", None)?;

		if username != "ann" || password != "pw" {
			return Err(Error::HttpStatus {
				status: 401,
				body: "{\"detail\":\"bad credentials\"}".to_string(),
			});
		}

		let fresh = "fresh".to_string();
		*self.valid_token.lock().unwrap() = fresh.clone();

		Ok(LoginResponse {
			access: AccessToken::new(fresh),
			refresh: None,
		})
	}

	async fn me(&self, token: &AccessToken) -> Result<MeUser, Error> {
		self.enter("me", Some(token))?;

		Ok(MeUser {
			id: ME,
			uuid: user_uuid(ME).to_string(),
			username: "ann".to_string(),
			display_name: "Ann".to_string(),
		})
	}

	async fn list_places(&self, token: &AccessToken) -> Result<Vec<PlaceDto>, Error> {
		self.enter("list_places", Some(token))?;
		Ok(self.backend.lock().unwrap().places.clone())
	}

	async fn get_place(&self, token: &AccessToken, place_id: i64) -> Result<PlaceDto, Error> {
		self.enter("get_place", Some(token))?;

		self.backend
			.lock()
			.unwrap()
			.places
			.iter()
			.find(|place| place.id == place_id)
			.cloned()
			.ok_or_else(|| Self::not_found("place"))
	}

	async fn create_place(
		&self,
		token: &AccessToken,
		input: &CreatePlaceRequest,
	) -> Result<PlaceDto, Error> {
		self.enter("create_place", Some(token))?;

		if !self.create_latency.is_zero() {
			tokio::time::sleep(self.create_latency).await;
		}

		let mut backend = self.backend.lock().unwrap();
		backend.next_id += 1;

		let place = PlaceDto {
			id: backend.next_id,
			uuid: Uuid::new_v4().to_string(),
			name: input.name.clone(),
			description: Some(input.description.clone()),
			latitude: input.latitude.clone(),
			longitude: input.longitude.clone(),
			visibility: input.visibility,
			created_by: user(ME, "Ann"),
			metadata: Some(input.metadata.clone()),
			created_at: "2024-02-01T00:00:00Z".to_string(),
			updated_at: "2024-02-01T00:00:00Z".to_string(),
		};
		backend.places.push(place.clone());

		Ok(place)
	}

	async fn create_post(&self, token: &AccessToken, form: PostForm) -> Result<PostDto, Error> {
		self.enter("create_post", Some(token))?;

		let mut backend = self.backend.lock().unwrap();
		let place = backend
			.places
			.iter()
			.find(|place| place.id == form.place_id)
			.cloned()
			.ok_or_else(|| Self::not_found("place"))?;

		backend.next_id += 1;
		let mut post = post_dto(backend.next_id, &place, user(ME, "Ann"), 0);
		post.title = form.title;
		post.body = form.body;
		post.visibility = form.visibility;
		post.created_at = "2024-03-01T00:00:00Z".to_string();
		post.photo = form
			.photo
			.map(|photo| format!("https://cdn.example/{}", photo.file_name));
		backend.posts.push(post.clone());

		Ok(post)
	}

	async fn edit_post(
		&self,
		token: &AccessToken,
		post_id: i64,
		form: PostForm,
	) -> Result<PostDto, Error> {
		self.enter("edit_post", Some(token))?;

		let mut backend = self.backend.lock().unwrap();
		let place = backend
			.places
			.iter()
			.find(|place| place.id == form.place_id)
			.cloned()
			.ok_or_else(|| Self::not_found("place"))?;
		let post = backend
			.posts
			.iter_mut()
			.find(|post| post.id == post_id)
			.ok_or_else(|| Self::not_found("post"))?;

		post.place = place;
		post.title = form.title;
		post.body = form.body;
		post.visibility = form.visibility;
		post.updated_at = Some("2024-03-02T00:00:00Z".to_string());

		Ok(post.clone())
	}

	async fn get_post(&self, token: &AccessToken, post_id: i64) -> Result<PostDto, Error> {
		self.enter("get_post", Some(token))?;

		self.backend
			.lock()
			.unwrap()
			.posts
			.iter()
			.find(|post| post.id == post_id)
			.cloned()
			.ok_or_else(|| Self::not_found("post"))
	}

	async fn posts_by_place(
		&self,
		token: &AccessToken,
		place_id: i64,
	) -> Result<Vec<PostDto>, Error> {
		self.enter("posts_by_place", Some(token))?;

		Ok(self
			.backend
			.lock()
			.unwrap()
			.posts
			.iter()
			.filter(|post| post.place.id == place_id)
			.cloned()
			.collect())
	}

	async fn posts_by_user(&self, token: &AccessToken, user_id: i64) -> Result<Vec<PostDto>, Error> {
		self.enter("posts_by_user", Some(token))?;

		Ok(self
			.backend
			.lock()
			.unwrap()
			.posts
			.iter()
			.filter(|post| post.author.id == user_id)
			.cloned()
			.collect())
	}

	async fn react(
		&self,
		token: &AccessToken,
		post_id: i64,
		reaction: Reaction,
	) -> Result<PostDto, Error> {
		self.enter("react", Some(token))?;

		let mut backend = self.backend.lock().unwrap();
		let post = backend
			.posts
			.iter_mut()
			.find(|post| post.id == post_id)
			.ok_or_else(|| Self::not_found("post"))?;

		match reaction {
			Reaction::Like => post.like_count += 1,
			Reaction::Dislike => post.dislike_count += 1,
		}

		Ok(post.clone())
	}

	async fn get_user(&self, token: &AccessToken, user_id: i64) -> Result<UserBrief, Error> {
		self.enter("get_user", Some(token))?;

		self.backend
			.lock()
			.unwrap()
			.users
			.get(&user_id)
			.cloned()
			.ok_or_else(|| Self::not_found("user"))
	}
}

pub fn me() -> CurrentUser {
	CurrentUser {
		id: ME,
		uuid: user_uuid(ME),
		display_name: "Ann".to_string(),
	}
}

pub fn config() -> SyncConfig {
	SyncConfig::default()
}

/// Engine signed in as [`ME`] with a valid token and an in-memory follow list.
pub fn engine(gateway: &Arc<FakeGateway>) -> SyncEngine {
	engine_with(gateway, FollowStore::in_memory())
}

pub fn engine_with(gateway: &Arc<FakeGateway>, follows: FollowStore) -> SyncEngine {
	SyncEngine::new(
		Arc::clone(gateway) as Arc<dyn Gateway>,
		Session::with_token(AccessToken::new(VALID_TOKEN), Some(me()), None),
		follows,
		config(),
	)
}

/// Engine without a token, optionally able to log in silently.
pub fn signed_out_engine(gateway: &Arc<FakeGateway>, login: Option<LoginCredentials>) -> SyncEngine {
	SyncEngine::new(
		Arc::clone(gateway) as Arc<dyn Gateway>,
		Session::new(login),
		FollowStore::in_memory(),
		config(),
	)
}
