use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{extract::State, http::header};
use macros::route;

use crate::{backend::Backend, extract::Path, openapi::tag};

use super::{model, Error, RouteError};

/// Get object
/// Returns an uploaded file, such as a post image or profile picture.
#[route(tag = tag::STORAGE, response(status = 200, description = "The file, with its content type."))]
pub async fn get_object(
	State(backend): State<Arc<dyn Backend>>,
	Path(path): Path<model::ObjectPath>,
) -> Result<impl IntoApiResponse, RouteError> {
	let object = backend
		.download(&path.bucket, &path.key)
		.await?
		.ok_or_else(|| Error::UnknownObject(format!("{}/{}", path.bucket, path.key)))?;

	Ok(([(header::CONTENT_TYPE, object.content_type)], object.data))
}
