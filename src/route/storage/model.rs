use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ObjectPath {
	#[validate(length(min = 1, max = 63))]
	pub bucket: String,
	/// The key of the object, which may contain slashes.
	#[validate(length(min = 1, max = 1024))]
	pub key: String,
}
