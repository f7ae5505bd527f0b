use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{backend::BackendError, error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

/// Sorts out the backend errors that are the client's fault.
fn backend_error(error: BackendError) -> RouteError {
	match error {
		BackendError::InvalidCredentials => Error::InvalidEmailOrPassword.into(),
		BackendError::Conflict(..) => Error::EmailTaken.into(),
		error => error.into(),
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", post_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
		.api_route("/callback", get_with(callback, callback_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword => StatusCode::UNAUTHORIZED,
			Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::EmailTaken => error::Message {
				field: Some("email".into()),
				..message
			}
			.into_vec(),
			Self::InvalidEmailOrPassword => message.into_vec(),
		}
	}
}
