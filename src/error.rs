use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::{multipart::MultipartError, rejection},
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::backend::BackendError;

/// A single message presented to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	pub content: Cow<'static, str>,
	/// The input field the message is about, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'static, str>>,
}

impl Message {
	pub fn new(content: impl Into<Cow<'static, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
		}
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message>,
	/// The view the client should navigate to instead.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub redirect: Option<Cow<'static, str>>,
}

/// Describes how an error is presented to the client.
///
/// The Display trait is not sent to the client by default for server errors,
/// so it can show sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message> {
		Message::new(self.to_string()).into_vec()
	}

	/// The view to send the client to, if the current one can't be shown.
	fn redirect(&self) -> Option<&'static str> {
		None
	}
}

/// Errors shared by every route.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error")]
	Json(axum_jsonschema::JsonSchemaRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartError),
	#[error("missing form field {0}")]
	MissingField(&'static str),
	#[error("backend error: {0}")]
	Backend(#[from] BackendError),
	#[error("not signed in")]
	Unauthenticated,
	#[error("too many requests")]
	RateLimited,
	#[error("rate limiter error: {0}")]
	RateLimiter(String),
	#[error("not found")]
	NotFound,
}

impl ErrorShape for AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..)
			| Self::Json(..)
			| Self::Path(..)
			| Self::MissingField(..) => StatusCode::BAD_REQUEST,
			Self::Multipart(error) => error.status(),
			Self::Backend(BackendError::InvalidCredentials) | Self::Unauthenticated => {
				StatusCode::UNAUTHORIZED
			}
			Self::Backend(BackendError::Conflict(..)) => StatusCode::CONFLICT,
			Self::Backend(BackendError::NotFound(..)) | Self::NotFound => StatusCode::NOT_FOUND,
			Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
			Self::Backend(..) | Self::RateLimiter(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<Message> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| Message {
						content: error
							.message
							.clone()
							.unwrap_or_else(|| error.code.clone()),
						field: Some(field.to_string().into()),
					})
				})
				.collect(),
			Self::Backend(BackendError::InvalidCredentials | BackendError::Conflict(..)) => {
				Message::new(self.to_string()).into_vec()
			}
			Self::Backend(..) | Self::RateLimiter(..) => Message::new("internal server error").into_vec(),
			_ => Message::new(self.to_string()).into_vec(),
		}
	}

	fn redirect(&self) -> Option<&'static str> {
		match self {
			Self::Unauthenticated => Some("/auth"),
			_ => None,
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Json(rejection) => rejection.into_response(),
			error => respond(&error),
		}
	}
}

/// An error returned by a route: either one of the route's own errors,
/// or one shared by all routes.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<E> {
	#[error(transparent)]
	Route(E),
	#[error(transparent)]
	App(#[from] AppError),
}

impl<E> From<BackendError> for RouteError<E> {
	fn from(error: BackendError) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<validator::ValidationErrors> for RouteError<E> {
	fn from(error: validator::ValidationErrors) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<MultipartError> for RouteError<E> {
	fn from(error: MultipartError) -> Self {
		Self::App(error.into())
	}
}

impl<E> IntoResponse for RouteError<E>
where
	E: ErrorShape,
{
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Route(error) => respond(&error),
			Self::App(error) => error.into_response(),
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = Self;
}

/// Renders an error, logging it when it is the server's fault.
fn respond(error: &dyn ErrorShape) -> Response<Body> {
	let status = error.status();

	if status.is_server_error() {
		match std::error::Error::source(error) {
			Some(source) => tracing::error!(%error, %source, "request failed"),
			None => tracing::error!(%error, "request failed"),
		}
	}

	(
		status,
		Json(ErrorResponse {
			success: false,
			errors: error.errors(),
			redirect: error.redirect().map(Cow::Borrowed),
		}),
	)
		.into_response()
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_unauthenticated_redirects() {
		let error = AppError::Unauthenticated;

		assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(error.redirect(), Some("/auth"));
	}

	#[test]
	fn test_backend_errors_are_hidden() {
		let error = AppError::Backend(BackendError::Unavailable("secret".into()));

		assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(error.errors()[0].content, "internal server error");
	}

	#[test]
	fn test_conflicts_are_shown() {
		let error = AppError::Backend(BackendError::Conflict("email"));

		assert_eq!(error.status(), StatusCode::CONFLICT);
		assert_eq!(error.errors()[0].content, "email already exists");
	}
}
