use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// The name shown next to the user's posts.
	#[validate(length(min = 1, max = 64))]
	pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
	Success,
	Error,
}

#[derive(Serialize, JsonSchema)]
pub struct CallbackResponse {
	pub status: CallbackStatus,
	/// Where to go once the callback has been shown.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub redirect: Option<&'static str>,
}
