//! Bearer credential and the signed-in user.

use std::fmt;

use mejour_remote_api::{AccessToken, Gateway, MeUser};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::Error;

/// Username and password kept in memory for silent re-authentication.
#[derive(Clone)]
pub struct LoginCredentials {
	pub username: String,
	pub password: String,
}

impl LoginCredentials {
	#[must_use]
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}
}

impl fmt::Debug for LoginCredentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LoginCredentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
	pub id: i64,
	pub uuid: Uuid,
	pub display_name: String,
}

impl TryFrom<MeUser> for CurrentUser {
	type Error = Error;

	fn try_from(me: MeUser) -> Result<Self, Self::Error> {
		let uuid = Uuid::parse_str(&me.uuid)
			.map_err(|e| Error::MappingFailure(format!("user uuid {:?}: {e}", me.uuid)))?;

		let display_name = if me.display_name.trim().is_empty() {
			me.username
		} else {
			me.display_name
		};

		Ok(Self {
			id: me.id,
			uuid,
			display_name,
		})
	}
}

#[derive(Debug, Clone)]
struct SignedIn {
	token: AccessToken,
	user: Option<CurrentUser>,
}

/// The token is shared read-only; only sign in, sign out and the single re-authentication
/// attempt replace it.
#[derive(Debug, Default)]
pub struct Session {
	signed_in: RwLock<Option<SignedIn>>,
	login: RwLock<Option<LoginCredentials>>,
	reauth: Mutex<()>,
}

impl Session {
	#[must_use]
	pub fn new(login: Option<LoginCredentials>) -> Self {
		Self {
			signed_in: RwLock::new(None),
			login: RwLock::new(login),
			reauth: Mutex::new(()),
		}
	}

	/// Starts from a token obtained elsewhere.
	#[must_use]
	pub fn with_token(
		token: AccessToken,
		user: Option<CurrentUser>,
		login: Option<LoginCredentials>,
	) -> Self {
		Self {
			signed_in: RwLock::new(Some(SignedIn { token, user })),
			login: RwLock::new(login),
			reauth: Mutex::new(()),
		}
	}

	pub async fn current_user(&self) -> Option<CurrentUser> {
		self.signed_in
			.read()
			.await
			.as_ref()
			.and_then(|signed_in| signed_in.user.clone())
	}

	pub async fn is_signed_in(&self) -> bool {
		self.valid_token().await.is_some()
	}

	async fn valid_token(&self) -> Option<AccessToken> {
		self.signed_in
			.read()
			.await
			.as_ref()
			.map(|signed_in| signed_in.token.clone())
			.filter(|token| !token.is_blank())
	}

	/// Exchanges credentials for a token and loads the profile behind it. On success the
	/// credentials are kept for later silent re-authentication.
	pub async fn sign_in(
		&self,
		gateway: &dyn Gateway,
		credentials: &LoginCredentials,
	) -> Result<CurrentUser, Error> {
		let tokens = gateway
			.login(&credentials.username, &credentials.password)
			.await?;
		let user = CurrentUser::try_from(gateway.me(&tokens.access).await?)?;

		info!(user_id = user.id, "Signed in");

		*self.signed_in.write().await = Some(SignedIn {
			token: tokens.access,
			user: Some(user.clone()),
		});
		*self.login.write().await = Some(credentials.clone());

		Ok(user)
	}

	/// Returns the current token, or makes exactly one silent login attempt with the configured
	/// credentials. Any failure of that attempt is reported as [`Error::MissingCredential`].
	pub async fn ensure_credential(&self, gateway: &dyn Gateway) -> Result<AccessToken, Error> {
		if let Some(token) = self.valid_token().await {
			return Ok(token);
		}

		let _guard = self.reauth.lock().await;

		// Someone else may have signed in while we waited
		if let Some(token) = self.valid_token().await {
			return Ok(token);
		}

		let Some(credentials) = self.login.read().await.clone() else {
			debug!("No token and no stored credentials");
			return Err(Error::MissingCredential);
		};

		match self.sign_in(gateway, &credentials).await {
			Ok(_) => self.valid_token().await.ok_or(Error::MissingCredential),
			Err(e) => {
				warn!(?e, "Silent re-authentication failed");
				Err(Error::MissingCredential)
			}
		}
	}

	/// Drops a token the server refused, so the next gated operation re-authenticates.
	pub async fn invalidate(&self) {
		if let Some(signed_in) = self.signed_in.write().await.as_mut() {
			signed_in.token = AccessToken::new("");
		}
	}

	/// Forgets the token and the stored credentials.
	pub async fn sign_out(&self) {
		self.signed_in.write().await.take();
		self.login.write().await.take();
	}
}
