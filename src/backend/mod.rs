//! The backend the application delegates to: auth, tables and object storage.
//!
//! Every mutation returns a [`Result`] that the caller must check. Nothing is
//! retried, and uniqueness (one like per user and post, one account per
//! email) is enforced here rather than by the callers.

mod memory;
mod postgres;

pub use memory::MemoryBackend;
#[cfg(test)]
pub use memory::Op;
pub use postgres::PgBackend;

use argon2::Argon2;
use uuid::Uuid;

use crate::model::{
	AuthSession, Like, NewPost, Object, Post, PostPatch, PostWithAuthor, Profile, ProfilePatch,
	User,
};

pub const KEY_LENGTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("password hashing error: {0}")]
	Hash(#[from] argon2::Error),
	#[error("invalid email or password")]
	InvalidCredentials,
	#[error("{0} already exists")]
	Conflict(&'static str),
	#[error("{0} not found")]
	NotFound(&'static str),
	#[error("backend unavailable: {0}")]
	Unavailable(String),
}

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

#[axum::async_trait]
pub trait Backend: Send + Sync {
	/// Creates an account and signs in to it.
	async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<AuthSession>;

	async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

	async fn sign_out(&self, session: Uuid) -> Result<()>;

	/// Resolves the user behind a session, if it is still valid.
	async fn get_user(&self, session: Uuid) -> Result<Option<User>>;

	/// All posts, newest first.
	async fn list_posts(&self) -> Result<Vec<Post>>;

	/// All posts joined with their author's profile, newest first.
	async fn list_posts_with_authors(&self) -> Result<Vec<PostWithAuthor>>;

	/// Posts written by `author`, newest first.
	async fn list_posts_by_author(&self, author: Uuid) -> Result<Vec<Post>>;

	async fn get_post_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>>;

	/// Fetches a post only if it was written by `author`.
	async fn get_owned_post(&self, id: Uuid, author: Uuid) -> Result<Option<Post>>;

	async fn insert_post(&self, post: NewPost) -> Result<Post>;

	/// Replaces the editable fields of a post written by `author`.
	async fn update_post(&self, id: Uuid, author: Uuid, patch: PostPatch) -> Result<Option<Post>>;

	/// Atomically adds `delta` to the like counter of a post, returning the new
	/// value. The counter never drops below zero.
	async fn adjust_likes(&self, id: Uuid, delta: i64) -> Result<i64>;

	async fn list_likes(&self, user: Uuid) -> Result<Vec<Like>>;

	/// Fails with [`BackendError::Conflict`] if the user already likes the post.
	async fn insert_like(&self, user: Uuid, post: Uuid) -> Result<()>;

	/// Fails with [`BackendError::NotFound`] if the user doesn't like the post.
	async fn delete_like(&self, user: Uuid, post: Uuid) -> Result<()>;

	async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>>;

	async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<Option<Profile>>;

	/// Stores an object. Unless `upsert` is set, an existing object under the
	/// same key is a [`BackendError::Conflict`].
	async fn upload(&self, bucket: &str, key: &str, object: Object, upsert: bool) -> Result<()>;

	async fn download(&self, bucket: &str, key: &str) -> Result<Option<Object>>;

	async fn remove(&self, bucket: &str, key: &str) -> Result<()>;

	/// The public URL an uploaded object is served from.
	fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Hashes a password with Argon2, using the user's id as a salt.
pub(crate) fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

pub(crate) fn public_url(base: &str, bucket: &str, key: &str) -> String {
	format!("{}/storage/{bucket}/{key}", base.trim_end_matches('/'))
}
