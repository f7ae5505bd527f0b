use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";
pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const FEED: &str = "Feed";
	pub const POST: &str = "Post";
	pub const PROFILE: &str = "Profile";
	pub const STORAGE: &str = "Storage";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Blogroll")
		.summary("A blogging service")
		.description(
			"Register, write and edit posts, upload images, like posts and browse the feed. \
			 Every view is a JSON document; views that can't be shown to the current user \
			 carry the path of the view to show instead in `redirect`.",
		)
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("User authentication".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::FEED.into(),
			description: Some("Post feeds and likes".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post editor".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::PROFILE.into(),
			description: Some("Profile editor".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::STORAGE.into(),
			description: Some("Uploaded images".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("session id".into()),
				description: Some("A session id".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				success: false,
				errors: vec![error::Message {
					content: "error message".into(),
					field: Some("optional field".into()),
				}],
				redirect: Some("/auth".into()),
			})
		})
}
