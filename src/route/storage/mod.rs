use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown object {0}")]
	UnknownObject(String),
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/:bucket/*key", get_with(get_object, get_object_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownObject(..) => StatusCode::NOT_FOUND,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::{backend::Backend, model::Object, test::*};

	#[tokio::test]
	async fn test_serves_uploaded_object() {
		let backend = backend();
		let app = server(backend.clone());

		backend
			.upload(
				"images",
				"user/profile.png",
				Object {
					content_type: "image/png".into(),
					data: vec![1, 2, 3],
				},
				false,
			)
			.await
			.unwrap();

		let response = app.get("/storage/images/user/profile.png").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.header("content-type"), "image/png");
		assert_eq!(response.as_bytes().to_vec(), vec![1, 2, 3]);
	}

	#[tokio::test]
	async fn test_unknown_object() {
		let response = app().get("/storage/images/nothing.png").await;

		assert_eq!(response.status_code(), 404);
	}
}
