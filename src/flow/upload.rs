use uuid::Uuid;

use crate::{
	backend::{Backend, BackendError},
	model::Object,
};

/// The bucket post and profile images are stored in.
pub const IMAGES_BUCKET: &str = "images";

const FALLBACK_EXTENSION: &str = "bin";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file picked in a form.
#[derive(Debug, Clone)]
pub struct ImageFile {
	pub file_name: String,
	pub content_type: String,
	pub data: Vec<u8>,
}

impl ImageFile {
	pub fn new(file_name: impl Into<String>, content_type: Option<&str>, data: Vec<u8>) -> Self {
		Self {
			file_name: file_name.into(),
			content_type: content_type.unwrap_or(FALLBACK_CONTENT_TYPE).to_owned(),
			data,
		}
	}

	/// The text after the last `.` of the file name.
	pub fn extension(&self) -> &str {
		match self.file_name.rsplit_once('.') {
			Some((_, extension)) if !extension.is_empty() => extension,
			_ => FALLBACK_EXTENSION,
		}
	}

	pub fn is_image(&self) -> bool {
		self.content_type.starts_with("image/")
	}
}

/// Key of a post image. Every upload gets its own key, namespaced by the user.
pub fn post_image_key(user: Uuid, at: chrono::DateTime<chrono::Utc>, extension: &str) -> String {
	format!("{user}/{}.{extension}", at.timestamp_millis())
}

/// Key of a profile picture. There is one slot per user.
pub fn profile_image_key(user: Uuid, extension: &str) -> String {
	format!("{user}/profile.{extension}")
}

/// Uploads an image and returns the public URL it is served from.
#[tracing::instrument(skip(backend, file), fields(size = file.data.len()))]
pub async fn upload_image(
	backend: &dyn Backend,
	key: &str,
	file: ImageFile,
	upsert: bool,
) -> Result<String, BackendError> {
	backend
		.upload(
			IMAGES_BUCKET,
			key,
			Object {
				content_type: file.content_type,
				data: file.data,
			},
			upsert,
		)
		.await?;

	Ok(backend.public_url(IMAGES_BUCKET, key))
}
