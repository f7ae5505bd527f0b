use std::sync::Arc;

use axum::extract::{Multipart, State};
use macros::route;

use crate::{
	backend::Backend,
	extract::{Json, Session},
	flow::profile::{self, ProfileForm},
	model::Profile,
	openapi::tag,
	route::model::{Form, Saved, UploadResponse},
};

use super::{model, Error, RouteError};

/// Get profile
/// Returns your profile.
#[route(tag = tag::PROFILE)]
pub async fn get_profile(
	State(backend): State<Arc<dyn Backend>>,
	session: Session,
) -> Result<Json<Profile>, RouteError> {
	let profile = profile::load_profile(&*backend, &session.user).await?;

	Ok(Json(profile))
}

/// Update profile
/// Replaces your name, phone number, bio and profile picture. The email can't be changed.
#[route(tag = tag::PROFILE)]
pub async fn update_profile(
	State(backend): State<Arc<dyn Backend>>,
	session: Session,
	Json(input): Json<model::UpdateProfileInput>,
) -> Result<Json<Saved<Profile>>, RouteError> {
	let profile = profile::save_profile(
		&*backend,
		&session.user,
		ProfileForm {
			name: input.name,
			phone: input.phone,
			bio: input.bio,
			profile_image: input.profile_image,
		},
	)
	.await?;

	Ok(Json(Saved::new(profile)))
}

/// Upload profile picture
/// Uploads a profile picture from the `image` part of a multipart form, replacing the previous one, and returns its URL. The profile is not changed until it is saved.
#[route(tag = tag::PROFILE)]
pub async fn upload_profile_image(
	State(backend): State<Arc<dyn Backend>>,
	session: Session,
	multipart: Multipart,
) -> Result<Json<UploadResponse>, RouteError> {
	let file = Form::read(multipart, "image")
		.await?
		.file
		.ok_or(Error::MissingImage)?;
	let url = profile::upload_picture(&*backend, &session.user, file).await?;

	Ok(Json(UploadResponse { url }))
}
