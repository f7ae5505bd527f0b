use uuid::Uuid;

use super::{
	non_empty,
	upload::{self, ImageFile, IMAGES_BUCKET},
};
use crate::{
	backend::{Backend, BackendError},
	model::{NewPost, Post, PostPatch, User},
};

/// An error in the post editor. The messages are shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
	#[error("only image files can be uploaded")]
	NotAnImage,
	#[error("failed to upload image")]
	Upload(#[source] BackendError),
	#[error("failed to create post")]
	Create(#[source] BackendError),
	#[error("failed to fetch post or you don't have permission to edit it")]
	NotEditable(Uuid),
	#[error("failed to fetch post")]
	Load(#[source] BackendError),
	#[error("failed to update post")]
	Update(#[source] BackendError),
}

/// A new post as entered in the editor.
#[derive(Debug, Clone)]
pub struct Draft {
	pub title: String,
	pub content: String,
	pub excerpt: Option<String>,
	pub image: Option<ImageFile>,
}

/// The editable fields of an existing post as entered in the editor.
///
/// Empty excerpts and image URLs are stored as absent.
#[derive(Debug, Clone)]
pub struct Edit {
	pub title: String,
	pub content: String,
	pub excerpt: Option<String>,
	pub image: Option<String>,
}

async fn upload_post_image(
	backend: &dyn Backend,
	user: &User,
	file: ImageFile,
) -> Result<(String, String), EditorError> {
	if !file.is_image() {
		return Err(EditorError::NotAnImage);
	}

	let key = upload::post_image_key(user.id, chrono::Utc::now(), file.extension());
	let url = upload::upload_image(backend, &key, file, false)
		.await
		.map_err(EditorError::Upload)?;

	Ok((key, url))
}

/// Uploads the draft's image, if any, then inserts the post.
///
/// If the insert fails, the uploaded image is removed again.
#[tracing::instrument(skip(backend, draft), fields(title = %draft.title))]
pub async fn create_post(
	backend: &dyn Backend,
	user: &User,
	draft: Draft,
) -> Result<Post, EditorError> {
	let uploaded = match draft.image {
		Some(file) => Some(upload_post_image(backend, user, file).await?),
		None => None,
	};

	let (key, image) = uploaded.unzip();
	let result = backend
		.insert_post(NewPost {
			author_id: user.id,
			title: draft.title,
			content: draft.content,
			excerpt: non_empty(draft.excerpt),
			image,
		})
		.await;

	match result {
		Ok(post) => {
			tracing::info!(post = %post.id, "created post");
			Ok(post)
		}
		Err(error) => {
			if let Some(key) = key {
				if let Err(cleanup) = backend.remove(IMAGES_BUCKET, &key).await {
					tracing::error!(error = %cleanup, %key, "failed to remove orphaned image");
				}
			}

			Err(EditorError::Create(error))
		}
	}
}

/// Loads a post for editing. Posts written by someone else are not found.
#[tracing::instrument(skip(backend))]
pub async fn load_for_edit(backend: &dyn Backend, user: &User, id: Uuid) -> Result<Post, EditorError> {
	backend
		.get_owned_post(id, user.id)
		.await
		.map_err(EditorError::Load)?
		.ok_or(EditorError::NotEditable(id))
}

/// Uploads a new image for a post being edited, returning its public URL.
///
/// The post itself is not changed until it is saved.
#[tracing::instrument(skip(backend, file))]
pub async fn upload_image(
	backend: &dyn Backend,
	user: &User,
	file: ImageFile,
) -> Result<String, EditorError> {
	let (_, url) = upload_post_image(backend, user, file).await?;

	Ok(url)
}

#[tracing::instrument(skip(backend, edit))]
pub async fn save_post(
	backend: &dyn Backend,
	user: &User,
	id: Uuid,
	edit: Edit,
) -> Result<Post, EditorError> {
	let post = backend
		.update_post(
			id,
			user.id,
			PostPatch {
				title: edit.title,
				content: edit.content,
				excerpt: non_empty(edit.excerpt),
				image: non_empty(edit.image),
			},
		)
		.await
		.map_err(EditorError::Update)?
		.ok_or(EditorError::NotEditable(id))?;

	tracing::info!(post = %post.id, "updated post");

	Ok(post)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::backend::{MemoryBackend, Op};

	async fn setup() -> (MemoryBackend, User) {
		let backend = MemoryBackend::new("http://localhost:3000");
		let user = backend
			.sign_up("jane@doe.com", "hunter2hunter", "Jane")
			.await
			.unwrap()
			.user;

		(backend, user)
	}

	fn draft(image: Option<ImageFile>) -> Draft {
		Draft {
			title: "Hello".into(),
			content: "World".into(),
			excerpt: Some(String::new()),
			image,
		}
	}

	fn png() -> ImageFile {
		ImageFile::new("cat.png", Some("image/png"), vec![0x89, 0x50, 0x4e, 0x47])
	}

	#[tokio::test]
	async fn test_create_without_image() {
		let (backend, user) = setup().await;

		let post = create_post(&backend, &user, draft(None)).await.unwrap();

		assert_eq!(post.image, None);
		assert_eq!(post.excerpt, None);
		assert_eq!(post.author_id, user.id);
		assert_eq!(backend.calls(Op::Upload), 0);
	}

	#[tokio::test]
	async fn test_create_with_image() {
		let (backend, user) = setup().await;

		let post = create_post(&backend, &user, draft(Some(png()))).await.unwrap();
		let url = post.image.unwrap();
		let prefix = format!("http://localhost:3000/storage/images/{}/", user.id);
		let key = url.strip_prefix("http://localhost:3000/storage/images/").unwrap();

		assert!(url.starts_with(&prefix));
		assert!(url.ends_with(".png"));
		assert_eq!(backend.object(IMAGES_BUCKET, key).unwrap().data, png().data);
	}

	#[tokio::test]
	async fn test_failed_insert_removes_upload() {
		let (backend, user) = setup().await;

		backend.fail(Op::InsertPost);

		let result = create_post(&backend, &user, draft(Some(png()))).await;

		assert!(matches!(result, Err(EditorError::Create(..))));
		assert_eq!(backend.calls(Op::Upload), 1);
		assert_eq!(backend.calls(Op::Remove), 1);
		assert!(backend.list_posts().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_failed_upload_skips_insert() {
		let (backend, user) = setup().await;

		backend.fail(Op::Upload);

		let result = create_post(&backend, &user, draft(Some(png()))).await;

		assert!(matches!(result, Err(EditorError::Upload(..))));
		assert_eq!(backend.calls(Op::InsertPost), 0);
	}

	#[tokio::test]
	async fn test_rejects_non_images() {
		let (backend, user) = setup().await;
		let file = ImageFile::new("notes.txt", Some("text/plain"), b"hi".to_vec());

		let result = create_post(&backend, &user, draft(Some(file))).await;

		assert!(matches!(result, Err(EditorError::NotAnImage)));
		assert_eq!(backend.calls(Op::Upload), 0);
	}

	#[tokio::test]
	async fn test_cannot_edit_foreign_post() {
		let (backend, user) = setup().await;
		let other = backend
			.sign_up("john@smith.com", "hunter2hunter", "John")
			.await
			.unwrap()
			.user;
		let post = create_post(&backend, &other, draft(None)).await.unwrap();

		assert!(matches!(
			load_for_edit(&backend, &user, post.id).await,
			Err(EditorError::NotEditable(..))
		));

		let edit = Edit {
			title: "Stolen".into(),
			content: "content".into(),
			excerpt: None,
			image: None,
		};

		assert!(matches!(
			save_post(&backend, &user, post.id, edit).await,
			Err(EditorError::NotEditable(..))
		));
		assert_eq!(backend.post(post.id).unwrap().title, "Hello");
	}

	#[tokio::test]
	async fn test_edit_own_post() {
		let (backend, user) = setup().await;
		let post = create_post(&backend, &user, draft(None)).await.unwrap();

		assert_eq!(load_for_edit(&backend, &user, post.id).await.unwrap(), post);

		let url = upload_image(&backend, &user, png()).await.unwrap();
		let saved = save_post(
			&backend,
			&user,
			post.id,
			Edit {
				title: "Updated".into(),
				content: "New content".into(),
				excerpt: Some("Short".into()),
				image: Some(url.clone()),
			},
		)
		.await
		.unwrap();

		assert_eq!(saved.title, "Updated");
		assert_eq!(saved.excerpt.as_deref(), Some("Short"));
		assert_eq!(saved.image, Some(url));

		let cleared = save_post(
			&backend,
			&user,
			post.id,
			Edit {
				title: "Updated".into(),
				content: "New content".into(),
				excerpt: Some(String::new()),
				image: Some(String::new()),
			},
		)
		.await
		.unwrap();

		assert_eq!(cleared.excerpt, None);
		assert_eq!(cleared.image, None);
	}
}
