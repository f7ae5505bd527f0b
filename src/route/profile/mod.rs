use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, flow::profile::ProfileError, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Profile(#[from] ProfileError),
	#[error("no image was picked")]
	MissingImage,
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

impl From<ProfileError> for RouteError {
	fn from(error: ProfileError) -> Self {
		Self::Route(error.into())
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_profile, get_profile_docs).put_with(update_profile, update_profile_docs),
		)
		.api_route(
			"/image",
			post_with(upload_profile_image, upload_profile_image_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::MissingImage | Self::Profile(ProfileError::NotAnImage) => StatusCode::BAD_REQUEST,
			Self::Profile(ProfileError::NotFound) => StatusCode::NOT_FOUND,
			Self::Profile(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::MissingImage | Self::Profile(ProfileError::NotAnImage) => error::Message {
				field: Some("image".into()),
				..message
			}
			.into_vec(),
			_ => message.into_vec(),
		}
	}

	fn redirect(&self) -> Option<&'static str> {
		match self {
			Self::Profile(ProfileError::NotFound | ProfileError::Load(..)) => Some("/"),
			_ => None,
		}
	}
}
