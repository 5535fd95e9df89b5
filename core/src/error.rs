use mejour_remote_api::Error as RemoteError;
use mejour_utils::InvalidCoordinate;

use serde::Serialize;
use thiserror::Error;

use crate::follow::PersistError;

#[derive(Error, Debug)]
pub enum Error {
	#[error("not signed in and silent re-authentication failed")]
	MissingCredential,
	#[error("HTTP {code}: {body}")]
	HttpStatus { code: u16, body: String },
	#[error("failed to decode server response: {0}")]
	DecodeFailure(String),
	#[error("failed to map server record: {0}")]
	MappingFailure(String),
	#[error("invalid input: {0}")]
	InvalidInput(String),
	#[error("failed to create place: {0}")]
	PlaceCreationFailed(String),
	#[error("network failure: {0}")]
	Transport(String),
	#[error(transparent)]
	FollowStore(#[from] PersistError),
}

/// Machine-distinguishable counterpart of [`Error`], for callers that branch on the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	MissingCredential,
	HttpStatus,
	DecodeFailure,
	MappingFailure,
	InvalidInput,
	PlaceCreationFailed,
	Transport,
	FollowStore,
}

impl Error {
	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::MissingCredential => ErrorKind::MissingCredential,
			Self::HttpStatus { .. } => ErrorKind::HttpStatus,
			Self::DecodeFailure(_) => ErrorKind::DecodeFailure,
			Self::MappingFailure(_) => ErrorKind::MappingFailure,
			Self::InvalidInput(_) => ErrorKind::InvalidInput,
			Self::PlaceCreationFailed(_) => ErrorKind::PlaceCreationFailed,
			Self::Transport(_) => ErrorKind::Transport,
			Self::FollowStore(_) => ErrorKind::FollowStore,
		}
	}

	/// Short message meant to be shown next to the last known good data.
	#[must_use]
	pub fn user_message(&self) -> String {
		match self {
			Self::MissingCredential => "Please sign in again.".to_string(),
			Self::HttpStatus { code: 401 | 403, .. } => {
				"Your session is not allowed to do that. Please sign in again.".to_string()
			}
			Self::HttpStatus { code: 404, .. } => "It no longer exists on the server.".to_string(),
			Self::HttpStatus { code, .. } if *code >= 500 => {
				format!("The server is having trouble (HTTP {code}). Try again later.")
			}
			Self::HttpStatus { code, .. } => format!("The server rejected the request (HTTP {code})."),
			Self::DecodeFailure(_) | Self::MappingFailure(_) => {
				"The server sent data this version cannot read.".to_string()
			}
			Self::InvalidInput(reason) => format!("Invalid input: {reason}."),
			Self::PlaceCreationFailed(reason) => format!("Could not create the place: {reason}"),
			Self::Transport(_) => "Could not reach the server. Check your connection.".to_string(),
			Self::FollowStore(_) => "Could not save the list of people you follow.".to_string(),
		}
	}

	#[must_use]
	pub const fn is_unauthorized(&self) -> bool {
		matches!(self, Self::HttpStatus { code: 401, .. })
	}
}

impl From<RemoteError> for Error {
	fn from(e: RemoteError) -> Self {
		match e {
			RemoteError::MissingCredential => Self::MissingCredential,
			RemoteError::HttpStatus { status, body } => Self::HttpStatus { code: status, body },
			RemoteError::Decode(reason) => Self::DecodeFailure(reason),
			RemoteError::Transport(reason) => Self::Transport(reason),
			RemoteError::InvalidRequest(reason) => Self::InvalidInput(reason),
		}
	}
}

impl From<InvalidCoordinate> for Error {
	fn from(e: InvalidCoordinate) -> Self {
		Self::InvalidInput(e.to_string())
	}
}
