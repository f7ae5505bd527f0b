use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{backend::BackendError, error, flow::editor::EditorError, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Editor(#[from] EditorError),
	#[error("no image was picked")]
	MissingImage,
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

impl From<EditorError> for RouteError {
	fn from(error: EditorError) -> Self {
		Self::Route(error.into())
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/create-post", post_with(create_post, create_post_docs))
		.api_route(
			"/edit-post/:id",
			get_with(get_edit_post, get_edit_post_docs).put_with(update_post, update_post_docs),
		)
		.api_route(
			"/edit-post/:id/image",
			post_with(upload_post_image, upload_post_image_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::MissingImage | Self::Editor(EditorError::NotAnImage) => StatusCode::BAD_REQUEST,
			Self::Editor(EditorError::NotEditable(..)) => StatusCode::NOT_FOUND,
			Self::Editor(EditorError::Upload(BackendError::Conflict(..))) => StatusCode::CONFLICT,
			Self::Editor(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::MissingImage | Self::Editor(EditorError::NotAnImage) => error::Message {
				field: Some("image".into()),
				..message
			}
			.into_vec(),
			_ => message.into_vec(),
		}
	}

	fn redirect(&self) -> Option<&'static str> {
		match self {
			Self::Editor(EditorError::NotEditable(..)) => Some("/dashboard"),
			_ => None,
		}
	}
}

#[cfg(test)]
mod test {
	use axum_test::multipart::{MultipartForm, Part};

	use crate::{model::NewPost, test::*};

	fn cat() -> Part {
		Part::bytes(vec![1u8, 2, 3])
			.file_name("cat.png")
			.mime_type("image/png")
	}

	async fn write_post(backend: &MemoryBackend, author: uuid::Uuid) -> uuid::Uuid {
		backend
			.insert_post(NewPost {
				author_id: author,
				title: "Hello".into(),
				content: "content".into(),
				excerpt: Some("excerpt".into()),
				image: None,
			})
			.await
			.unwrap()
			.id
	}

	#[tokio::test]
	async fn test_create_requires_session() {
		let response = app().post("/create-post").await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(response.json::<serde_json::Value>()["redirect"], "/auth");
	}

	#[tokio::test]
	async fn test_edit_foreign_post_redirects_to_dashboard() {
		let backend = backend();
		let author = sign_up(&backend, "jane@doe.com").await;
		let other = sign_up(&backend, "john@smith.com").await;
		let app = server(backend.clone());
		let post = write_post(&backend, author.user.id).await;
		let (name, value) = bearer(&other.id.to_string());

		let response = app
			.get(&format!("/edit-post/{post}"))
			.add_header(name.clone(), value.clone())
			.await;
		let body = response.json::<serde_json::Value>();

		assert_eq!(response.status_code(), 404);
		assert_eq!(body["redirect"], "/dashboard");
		assert_eq!(
			body["errors"][0]["content"],
			"failed to fetch post or you don't have permission to edit it"
		);

		let response = app
			.put(&format!("/edit-post/{post}"))
			.add_header(name, value)
			.json(&json!({
				"title": "Stolen",
				"content": "content",
			}))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(backend.post(post).unwrap().title, "Hello");
	}

	#[tokio::test]
	async fn test_edit_own_post() {
		let backend = backend();
		let author = sign_up(&backend, "jane@doe.com").await;
		let app = server(backend.clone());
		let post = write_post(&backend, author.user.id).await;
		let (name, value) = bearer(&author.id.to_string());

		let response = app
			.get(&format!("/edit-post/{post}"))
			.add_header(name.clone(), value.clone())
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<serde_json::Value>()["excerpt"], "excerpt");

		let response = app
			.put(&format!("/edit-post/{post}"))
			.add_header(name, value)
			.json(&json!({
				"title": "Updated",
				"content": "New content",
				"excerpt": "",
				"image": "",
			}))
			.await;
		let body = response.json::<serde_json::Value>();

		assert_eq!(response.status_code(), 200);
		assert_eq!(body["redirect"], "/dashboard");
		assert_eq!(body["data"]["title"], "Updated");
		assert_eq!(body["data"]["excerpt"], serde_json::Value::Null);
		assert_eq!(body["data"]["image"], serde_json::Value::Null);
	}

	#[tokio::test]
	async fn test_edit_rejects_empty_title() {
		let backend = backend();
		let author = sign_up(&backend, "jane@doe.com").await;
		let app = server(backend.clone());
		let post = write_post(&backend, author.user.id).await;
		let (name, value) = bearer(&author.id.to_string());

		let response = app
			.put(&format!("/edit-post/{post}"))
			.add_header(name, value)
			.json(&json!({
				"title": "",
				"content": "content",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(backend.post(post).unwrap().title, "Hello");
	}

	#[tokio::test]
	async fn test_create_with_image() {
		let backend = backend();
		let author = sign_up(&backend, "jane@doe.com").await;
		let app = server(backend.clone());
		let (name, value) = bearer(&author.id.to_string());

		let response = app
			.post("/create-post")
			.add_header(name, value)
			.multipart(
				MultipartForm::new()
					.add_text("title", "Hello")
					.add_text("content", "content")
					.add_text("excerpt", "")
					.add_part("image", cat()),
			)
			.await;
		let body = response.json::<serde_json::Value>();

		assert_eq!(response.status_code(), 200);
		assert_eq!(body["redirect"], "/dashboard");
		assert_eq!(body["data"]["excerpt"], serde_json::Value::Null);

		let url = body["data"]["image"].as_str().unwrap();
		let path = url.strip_prefix("http://localhost:3000").unwrap();

		assert!(path.starts_with(&format!("/storage/images/{}/", author.user.id)));
		assert!(path.ends_with(".png"));

		let response = app.get(path).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.header("content-type"), "image/png");
		assert_eq!(response.as_bytes().as_ref(), &[1, 2, 3]);
	}

	#[tokio::test]
	async fn test_create_with_empty_pick_has_no_image() {
		let backend = backend();
		let author = sign_up(&backend, "jane@doe.com").await;
		let app = server(backend.clone());
		let (name, value) = bearer(&author.id.to_string());

		let response = app
			.post("/create-post")
			.add_header(name, value)
			.multipart(
				MultipartForm::new()
					.add_text("title", "Hello")
					.add_text("content", "content")
					.add_part(
						"image",
						Part::bytes(Vec::<u8>::new())
							.file_name("")
							.mime_type("application/octet-stream"),
					),
			)
			.await;
		let body = response.json::<serde_json::Value>();

		assert_eq!(response.status_code(), 200);
		assert_eq!(body["data"]["image"], serde_json::Value::Null);
	}

	#[tokio::test]
	async fn test_create_without_title() {
		let backend = backend();
		let author = sign_up(&backend, "jane@doe.com").await;
		let app = server(backend.clone());
		let (name, value) = bearer(&author.id.to_string());

		let response = app
			.post("/create-post")
			.add_header(name, value)
			.multipart(MultipartForm::new().add_text("content", "content"))
			.await;

		assert_eq!(response.status_code(), 400);
		assert!(backend.list_posts().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_upload_post_image() {
		let backend = backend();
		let author = sign_up(&backend, "jane@doe.com").await;
		let other = sign_up(&backend, "john@smith.com").await;
		let app = server(backend.clone());
		let post = write_post(&backend, author.user.id).await;

		let (name, value) = bearer(&other.id.to_string());
		let response = app
			.post(&format!("/edit-post/{post}/image"))
			.add_header(name, value)
			.multipart(MultipartForm::new().add_part("image", cat()))
			.await;

		assert_eq!(response.status_code(), 404);

		let (name, value) = bearer(&author.id.to_string());
		let response = app
			.post(&format!("/edit-post/{post}/image"))
			.add_header(name.clone(), value.clone())
			.multipart(MultipartForm::new().add_part("image", cat()))
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(response.json::<serde_json::Value>()["url"]
			.as_str()
			.unwrap()
			.ends_with(".png"));
		assert_eq!(backend.post(post).unwrap().image, None);

		let response = app
			.post(&format!("/edit-post/{post}/image"))
			.add_header(name, value)
			.multipart(MultipartForm::new().add_text("title", "Hello"))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["field"],
			"image"
		);
	}
}
