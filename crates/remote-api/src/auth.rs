//! Username/password token login, used for the engine's silent re-authentication.

use super::*;

pub use login::exec as login;
pub mod login {
	use super::*;

	/// Does not need (nor send) a bearer token.
	pub async fn exec(config: RequestConfig, username: &str, password: &str) -> Result<Response, Error> {
		let res = send(
			config
				.client
				.post(config.url("auth/token/login/"))
				.json(&json!({
					"username": username,
					"password": password,
				})),
		)
		.await?;

		decode(res).await
	}

	pub type Response = LoginResponse;
}

pub use me::exec as me;
pub mod me {
	use super::*;

	pub async fn exec(config: RequestConfig) -> Result<Response, Error> {
		let auth_token = config.require_token()?;

		let res = send(
			config
				.client
				.get(config.url("auth/me/"))
				.with_auth(&auth_token),
		)
		.await?;

		decode(res).await
	}

	pub type Response = MeUser;
}
