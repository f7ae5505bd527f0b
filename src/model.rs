use std::borrow::Cow;

use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

/// The number of characters of content shown when a post has no excerpt.
pub const SUMMARY_LENGTH: usize = 150;

/// An authenticated identity.
///
/// Owned entirely by the backend's auth subsystem, this application only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The email address the user signed up with.
	pub email: String,
}

/// A session issued by the backend after signing up or in.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AuthSession {
	/// The session id, sent back as a cookie or bearer token.
	#[serde(rename = "session_id")]
	pub id: Uuid,
	/// The user that owns the session.
	pub user: User,
	/// The creation time of the session.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A single blog post.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	pub id: Uuid,
	pub title: String,
	/// The body of the post.
	pub content: String,
	/// A short description shown in feeds.
	pub excerpt: Option<String>,
	/// Public URL of the featured image.
	pub image: Option<String>,
	/// The user that wrote the post.
	pub author_id: Uuid,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
	/// Denormalized like counter. Absent counters count as zero.
	pub likes: Option<i64>,
}

impl Post {
	pub fn like_count(&self) -> i64 {
		self.likes.unwrap_or(0)
	}

	/// The text shown for the post in a feed: the excerpt if it has one,
	/// otherwise the start of the content.
	pub fn summary(&self) -> Cow<'_, str> {
		match self.excerpt.as_deref() {
			Some(excerpt) if !excerpt.is_empty() => Cow::Borrowed(excerpt),
			_ => {
				let mut summary = self.content.chars().take(SUMMARY_LENGTH).collect::<String>();

				summary.push_str("...");
				Cow::Owned(summary)
			}
		}
	}
}

/// The public part of an author's profile, shown next to their posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Author {
	pub name: String,
	pub profile_image: Option<String>,
}

impl Author {
	pub const ANONYMOUS: &'static str = "Anonymous";
}

/// A post joined with its author's profile.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PostWithAuthor {
	#[serde(flatten)]
	pub post: Post,
	/// `None` when the author has no profile.
	pub author: Option<Author>,
}

impl PostWithAuthor {
	pub fn author_name(&self) -> &str {
		self.author
			.as_ref()
			.map_or(Author::ANONYMOUS, |author| author.name.as_str())
	}
}

/// A like, meaning the user currently likes the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Like {
	pub user_id: Uuid,
	pub post_id: Uuid,
}

/// A user's profile, one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Profile {
	/// Same as the id of the user.
	pub id: Uuid,
	pub name: String,
	/// Read-only from this application's perspective.
	pub email: String,
	pub phone: Option<String>,
	pub profile_image: Option<String>,
	pub bio: Option<String>,
}

/// The fields of a post written by the create flow.
#[derive(Debug, Clone)]
pub struct NewPost {
	pub author_id: Uuid,
	pub title: String,
	pub content: String,
	pub excerpt: Option<String>,
	pub image: Option<String>,
}

/// The editable fields of a post, all replaced on save.
#[derive(Debug, Clone)]
pub struct PostPatch {
	pub title: String,
	pub content: String,
	pub excerpt: Option<String>,
	pub image: Option<String>,
}

/// The editable fields of a profile, all replaced on save.
#[derive(Debug, Clone)]
pub struct ProfilePatch {
	pub name: String,
	pub phone: Option<String>,
	pub bio: Option<String>,
	pub profile_image: Option<String>,
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
	pub content_type: String,
	pub data: Vec<u8>,
}
