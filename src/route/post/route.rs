use std::sync::Arc;

use axum::extract::{Multipart, State};
use macros::route;
use validator::Validate;

use crate::{
	backend::Backend,
	extract::{Json, Path, Session},
	flow::editor::{self, Draft, Edit},
	model::Post,
	openapi::tag,
	route::model::{Form, IdInput, Saved, UploadResponse},
};

use super::{model, Error, RouteError};

/// Create post
/// Creates a new post from a multipart form with `title`, `content`, an optional `excerpt` and an optional `image` file.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(backend): State<Arc<dyn Backend>>,
	session: Session,
	multipart: Multipart,
) -> Result<Json<Saved<Post>>, RouteError> {
	let mut form = Form::read(multipart, "image").await?;
	let input = model::CreatePostInput {
		title: form.require("title")?,
		content: form.require("content")?,
	};

	input.validate()?;

	let post = editor::create_post(
		&*backend,
		&session.user,
		Draft {
			title: input.title,
			content: input.content,
			excerpt: form.take("excerpt"),
			image: form.file.take(),
		},
	)
	.await?;

	Ok(Json(Saved::new(post).redirect("/dashboard")))
}

/// Get post for editing
/// Returns one of your posts so it can be edited.
#[route(tag = tag::POST)]
pub async fn get_edit_post(
	State(backend): State<Arc<dyn Backend>>,
	session: Session,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<Post>, RouteError> {
	let post = editor::load_for_edit(&*backend, &session.user, id).await?;

	Ok(Json(post))
}

/// Update post
/// Replaces the title, content, excerpt and image of one of your posts.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(backend): State<Arc<dyn Backend>>,
	session: Session,
	Path(IdInput { id }): Path<IdInput>,
	Json(input): Json<model::UpdatePostInput>,
) -> Result<Json<Saved<Post>>, RouteError> {
	let post = editor::save_post(
		&*backend,
		&session.user,
		id,
		Edit {
			title: input.title,
			content: input.content,
			excerpt: input.excerpt,
			image: input.image,
		},
	)
	.await?;

	Ok(Json(Saved::new(post).redirect("/dashboard")))
}

/// Upload post image
/// Uploads a new image for one of your posts from the `image` part of a multipart form, returning its URL. The post is not changed until it is saved.
#[route(tag = tag::POST)]
pub async fn upload_post_image(
	State(backend): State<Arc<dyn Backend>>,
	session: Session,
	Path(IdInput { id }): Path<IdInput>,
	multipart: Multipart,
) -> Result<Json<UploadResponse>, RouteError> {
	editor::load_for_edit(&*backend, &session.user, id).await?;

	let file = Form::read(multipart, "image")
		.await?
		.file
		.ok_or(Error::MissingImage)?;
	let url = editor::upload_image(&*backend, &session.user, file).await?;

	Ok(Json(UploadResponse { url }))
}
