use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

/// The editable fields of your profile. Empty optional fields are cleared.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdateProfileInput {
	#[validate(length(min = 1, max = 64))]
	pub name: String,
	#[validate(length(max = 32))]
	pub phone: Option<String>,
	#[validate(length(max = 1024))]
	pub bio: Option<String>,
	/// Public URL of the profile picture, as returned by the image upload.
	pub profile_image: Option<String>,
}
