use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

/// The text fields of the create form, checked before anything is uploaded.
#[derive(Validate)]
pub struct CreatePostInput {
	#[validate(length(min = 1, max = 200))]
	pub title: String,
	#[validate(length(min = 1))]
	pub content: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdatePostInput {
	#[validate(length(min = 1, max = 200))]
	pub title: String,
	/// The body of the post.
	#[validate(length(min = 1))]
	pub content: String,
	/// Left empty, the start of the content is shown instead.
	pub excerpt: Option<String>,
	/// Public URL of the featured image, as returned by the image upload.
	/// Left empty, the post has no image.
	pub image: Option<String>,
}
