use std::{borrow::Cow, collections::HashMap};

use axum::extract::Multipart;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
	error::AppError,
	flow::upload::ImageFile,
	model::{Post, PostWithAuthor},
};

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

/// A post as listed in a feed.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostView {
	pub id: Uuid,
	pub title: String,
	/// The excerpt, or the start of the content if there is none.
	pub excerpt: String,
	pub image: Option<String>,
	pub author_id: Uuid,
	pub likes: i64,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Post> for PostView {
	fn from(post: &Post) -> Self {
		Self {
			id: post.id,
			title: post.title.clone(),
			excerpt: post.summary().into_owned(),
			image: post.image.clone(),
			author_id: post.author_id,
			likes: post.like_count(),
			created_at: post.created_at,
			updated_at: post.updated_at,
		}
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AuthorView {
	pub name: String,
	pub profile_image: Option<String>,
}

/// A post as listed in the public feed, with its author.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AuthoredPostView {
	#[serde(flatten)]
	pub post: PostView,
	pub author: AuthorView,
}

impl From<&PostWithAuthor> for AuthoredPostView {
	fn from(entry: &PostWithAuthor) -> Self {
		Self {
			post: PostView::from(&entry.post),
			author: AuthorView {
				name: entry.author_name().to_owned(),
				profile_image: entry
					.author
					.as_ref()
					.and_then(|author| author.profile_image.clone()),
			},
		}
	}
}

/// The result of a form submission, with the view to show next.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Saved<T> {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub redirect: Option<Cow<'static, str>>,
	pub data: T,
}

impl<T> Saved<T> {
	pub fn new(data: T) -> Self {
		Self {
			success: true,
			redirect: None,
			data,
		}
	}

	pub fn redirect(mut self, to: &'static str) -> Self {
		self.redirect = Some(Cow::Borrowed(to));
		self
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UploadResponse {
	/// The public URL the image is served from.
	pub url: String,
}

/// The fields of a multipart form. At most one of them is a file.
#[derive(Debug, Default)]
pub struct Form {
	fields: HashMap<String, String>,
	pub file: Option<ImageFile>,
}

impl Form {
	/// Reads every part of a multipart form. The part named `file_field` is
	/// read as a file; picking no file leaves [`Form::file`] empty.
	pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, AppError> {
		let mut form = Self::default();

		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};

			if name == file_field {
				let file_name = field.file_name().unwrap_or_default().to_owned();
				let content_type = field.content_type().map(str::to_owned);
				let data = field.bytes().await?;

				if !file_name.is_empty() || !data.is_empty() {
					form.file = Some(ImageFile::new(file_name, content_type.as_deref(), data.to_vec()));
				}
			} else {
				form.fields.insert(name, field.text().await?);
			}
		}

		Ok(form)
	}

	pub fn take(&mut self, name: &str) -> Option<String> {
		self.fields.remove(name)
	}

	pub fn require(&mut self, name: &'static str) -> Result<String, AppError> {
		self.take(name).ok_or(AppError::MissingField(name))
	}
}
