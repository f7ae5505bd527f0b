use argon2::{Algorithm, Argon2, Params, Version};
use dashmap::{mapref::entry::Entry, DashMap, DashSet};
use uuid::Uuid;

use super::{hash_password, Backend, BackendError, Result, KEY_LENGTH};
use crate::model::{
	Author, AuthSession, Like, NewPost, Object, Post, PostPatch, PostWithAuthor, Profile,
	ProfilePatch, User,
};

/// A backend operation, used to inject failures and count calls in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
	SignUp,
	SignIn,
	GetUser,
	ListPosts,
	GetPost,
	InsertPost,
	UpdatePost,
	AdjustLikes,
	ListLikes,
	InsertLike,
	DeleteLike,
	GetProfile,
	UpdateProfile,
	Upload,
	Download,
	Remove,
}

struct Account {
	user: User,
	password: [u8; KEY_LENGTH],
}

/// A backend that keeps everything in process memory.
///
/// Used by the test-suite and when the service runs without a database.
pub struct MemoryBackend {
	hasher: Argon2<'static>,
	public_url: String,
	accounts: DashMap<Uuid, Account>,
	emails: DashMap<String, Uuid>,
	sessions: DashMap<Uuid, (Uuid, chrono::DateTime<chrono::Utc>)>,
	posts: DashMap<Uuid, Post>,
	likes: DashSet<Like>,
	profiles: DashMap<Uuid, Profile>,
	objects: DashMap<(String, String), Object>,
	failures: DashSet<Op>,
	calls: DashMap<Op, usize>,
}

impl MemoryBackend {
	pub fn new(public_url: impl Into<String>) -> Self {
		// Cheap parameters, nothing is persisted.
		let params = Params::new(Params::MIN_M_COST, 1, 1, Some(KEY_LENGTH)).unwrap_or_default();

		Self {
			hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
			public_url: public_url.into(),
			accounts: DashMap::new(),
			emails: DashMap::new(),
			sessions: DashMap::new(),
			posts: DashMap::new(),
			likes: DashSet::new(),
			profiles: DashMap::new(),
			objects: DashMap::new(),
			failures: DashSet::new(),
			calls: DashMap::new(),
		}
	}

	/// Makes every following call of `op` fail.
	#[cfg(test)]
	pub fn fail(&self, op: Op) {
		self.failures.insert(op);
	}

	/// The number of times `op` was attempted.
	#[cfg(test)]
	pub fn calls(&self, op: Op) -> usize {
		self.calls.get(&op).map_or(0, |calls| *calls)
	}

	/// Inserts a post as-is, bypassing the create flow.
	#[cfg(test)]
	pub fn put_post(&self, post: Post) {
		self.posts.insert(post.id, post);
	}

	#[cfg(test)]
	pub fn object(&self, bucket: &str, key: &str) -> Option<Object> {
		self.objects
			.get(&(bucket.to_owned(), key.to_owned()))
			.map(|object| object.clone())
	}

	#[cfg(test)]
	pub fn post(&self, id: Uuid) -> Option<Post> {
		self.posts.get(&id).map(|post| post.clone())
	}

	fn attempt(&self, op: Op) -> Result<()> {
		*self.calls.entry(op).or_insert(0) += 1;

		if self.failures.contains(&op) {
			return Err(BackendError::Unavailable(format!("{op:?} failed")));
		}

		Ok(())
	}

	fn create_session(&self, user: User) -> AuthSession {
		let session = AuthSession {
			id: Uuid::new_v4(),
			user,
			created_at: chrono::Utc::now(),
		};

		self.sessions
			.insert(session.id, (session.user.id, session.created_at));

		session
	}

	fn with_author(&self, post: Post) -> PostWithAuthor {
		let author = self.profiles.get(&post.author_id).map(|profile| Author {
			name: profile.name.clone(),
			profile_image: profile.profile_image.clone(),
		});

		PostWithAuthor { post, author }
	}

	fn newest_first(&self, filter: impl Fn(&Post) -> bool) -> Vec<Post> {
		let mut posts = self
			.posts
			.iter()
			.filter(|post| filter(post.value()))
			.map(|post| post.value().clone())
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		posts
	}
}

#[axum::async_trait]
impl Backend for MemoryBackend {
	async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<AuthSession> {
		self.attempt(Op::SignUp)?;

		let user = User {
			id: Uuid::new_v4(),
			email: email.to_owned(),
		};
		let password = hash_password(&self.hasher, password, &user.id)?;

		match self.emails.entry(email.to_owned()) {
			Entry::Occupied(..) => return Err(BackendError::Conflict("email")),
			Entry::Vacant(entry) => {
				entry.insert(user.id);
			}
		}

		self.profiles.insert(
			user.id,
			Profile {
				id: user.id,
				name: name.to_owned(),
				email: user.email.clone(),
				phone: None,
				profile_image: None,
				bio: None,
			},
		);
		self.accounts.insert(
			user.id,
			Account {
				user: user.clone(),
				password,
			},
		);

		Ok(self.create_session(user))
	}

	async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
		self.attempt(Op::SignIn)?;

		let id = self
			.emails
			.get(email)
			.map(|id| *id)
			.ok_or(BackendError::InvalidCredentials)?;
		let user = {
			let account = self
				.accounts
				.get(&id)
				.ok_or(BackendError::InvalidCredentials)?;

			if account.password != hash_password(&self.hasher, password, &id)? {
				return Err(BackendError::InvalidCredentials);
			}

			account.user.clone()
		};

		Ok(self.create_session(user))
	}

	async fn sign_out(&self, session: Uuid) -> Result<()> {
		self.sessions.remove(&session);
		Ok(())
	}

	async fn get_user(&self, session: Uuid) -> Result<Option<User>> {
		self.attempt(Op::GetUser)?;

		let Some(user_id) = self.sessions.get(&session).map(|entry| entry.0) else {
			return Ok(None);
		};

		Ok(self
			.accounts
			.get(&user_id)
			.map(|account| account.user.clone()))
	}

	async fn list_posts(&self) -> Result<Vec<Post>> {
		self.attempt(Op::ListPosts)?;

		Ok(self.newest_first(|_| true))
	}

	async fn list_posts_with_authors(&self) -> Result<Vec<PostWithAuthor>> {
		self.attempt(Op::ListPosts)?;

		Ok(self
			.newest_first(|_| true)
			.into_iter()
			.map(|post| self.with_author(post))
			.collect())
	}

	async fn list_posts_by_author(&self, author: Uuid) -> Result<Vec<Post>> {
		self.attempt(Op::ListPosts)?;

		Ok(self.newest_first(|post| post.author_id == author))
	}

	async fn get_post_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>> {
		self.attempt(Op::GetPost)?;

		let post = self.posts.get(&id).map(|post| post.clone());

		Ok(post.map(|post| self.with_author(post)))
	}

	async fn get_owned_post(&self, id: Uuid, author: Uuid) -> Result<Option<Post>> {
		self.attempt(Op::GetPost)?;

		Ok(self
			.posts
			.get(&id)
			.filter(|post| post.author_id == author)
			.map(|post| post.clone()))
	}

	async fn insert_post(&self, post: NewPost) -> Result<Post> {
		self.attempt(Op::InsertPost)?;

		let now = chrono::Utc::now();
		let post = Post {
			id: Uuid::new_v4(),
			title: post.title,
			content: post.content,
			excerpt: post.excerpt,
			image: post.image,
			author_id: post.author_id,
			created_at: now,
			updated_at: now,
			likes: Some(0),
		};

		self.posts.insert(post.id, post.clone());

		Ok(post)
	}

	async fn update_post(&self, id: Uuid, author: Uuid, patch: PostPatch) -> Result<Option<Post>> {
		self.attempt(Op::UpdatePost)?;

		let Some(mut post) = self.posts.get_mut(&id) else {
			return Ok(None);
		};

		if post.author_id != author {
			return Ok(None);
		}

		post.title = patch.title;
		post.content = patch.content;
		post.excerpt = patch.excerpt;
		post.image = patch.image;
		post.updated_at = chrono::Utc::now();

		Ok(Some(post.clone()))
	}

	async fn adjust_likes(&self, id: Uuid, delta: i64) -> Result<i64> {
		self.attempt(Op::AdjustLikes)?;

		let mut post = self.posts.get_mut(&id).ok_or(BackendError::NotFound("post"))?;
		let likes = (post.like_count() + delta).max(0);

		post.likes = Some(likes);

		Ok(likes)
	}

	async fn list_likes(&self, user: Uuid) -> Result<Vec<Like>> {
		self.attempt(Op::ListLikes)?;

		Ok(self
			.likes
			.iter()
			.filter(|like| like.user_id == user)
			.map(|like| *like)
			.collect())
	}

	async fn insert_like(&self, user: Uuid, post: Uuid) -> Result<()> {
		self.attempt(Op::InsertLike)?;

		if !self.posts.contains_key(&post) {
			return Err(BackendError::NotFound("post"));
		}

		if !self.likes.insert(Like {
			user_id: user,
			post_id: post,
		}) {
			return Err(BackendError::Conflict("like"));
		}

		Ok(())
	}

	async fn delete_like(&self, user: Uuid, post: Uuid) -> Result<()> {
		self.attempt(Op::DeleteLike)?;

		self.likes
			.remove(&Like {
				user_id: user,
				post_id: post,
			})
			.map(|_| ())
			.ok_or(BackendError::NotFound("like"))
	}

	async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
		self.attempt(Op::GetProfile)?;

		Ok(self.profiles.get(&id).map(|profile| profile.clone()))
	}

	async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<Option<Profile>> {
		self.attempt(Op::UpdateProfile)?;

		let Some(mut profile) = self.profiles.get_mut(&id) else {
			return Ok(None);
		};

		profile.name = patch.name;
		profile.phone = patch.phone;
		profile.bio = patch.bio;
		profile.profile_image = patch.profile_image;

		Ok(Some(profile.clone()))
	}

	async fn upload(&self, bucket: &str, key: &str, object: Object, upsert: bool) -> Result<()> {
		self.attempt(Op::Upload)?;

		match self.objects.entry((bucket.to_owned(), key.to_owned())) {
			Entry::Occupied(mut entry) if upsert => {
				entry.insert(object);
			}
			Entry::Occupied(..) => return Err(BackendError::Conflict("object")),
			Entry::Vacant(entry) => {
				entry.insert(object);
			}
		}

		Ok(())
	}

	async fn download(&self, bucket: &str, key: &str) -> Result<Option<Object>> {
		self.attempt(Op::Download)?;

		Ok(self
			.objects
			.get(&(bucket.to_owned(), key.to_owned()))
			.map(|object| object.clone()))
	}

	async fn remove(&self, bucket: &str, key: &str) -> Result<()> {
		self.attempt(Op::Remove)?;

		self.objects.remove(&(bucket.to_owned(), key.to_owned()));

		Ok(())
	}

	fn public_url(&self, bucket: &str, key: &str) -> String {
		super::public_url(&self.public_url, bucket, key)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[tokio::test]
	async fn test_sign_up_creates_profile() {
		let backend = MemoryBackend::new("http://localhost");
		let session = backend
			.sign_up("jane@doe.com", "hunter2hunter", "Jane")
			.await
			.unwrap();

		let profile = backend.get_profile(session.user.id).await.unwrap().unwrap();

		assert_eq!(profile.name, "Jane");
		assert_eq!(profile.email, "jane@doe.com");
	}

	#[tokio::test]
	async fn test_duplicate_email_conflicts() {
		let backend = MemoryBackend::new("http://localhost");

		backend
			.sign_up("jane@doe.com", "hunter2hunter", "Jane")
			.await
			.unwrap();

		let result = backend.sign_up("jane@doe.com", "hunter2hunter", "Jane").await;

		assert!(matches!(result, Err(BackendError::Conflict("email"))));
	}

	#[tokio::test]
	async fn test_sign_in_checks_password() {
		let backend = MemoryBackend::new("http://localhost");

		backend
			.sign_up("jane@doe.com", "hunter2hunter", "Jane")
			.await
			.unwrap();

		assert!(matches!(
			backend.sign_in("jane@doe.com", "wrong password").await,
			Err(BackendError::InvalidCredentials)
		));

		let session = backend
			.sign_in("jane@doe.com", "hunter2hunter")
			.await
			.unwrap();

		assert_eq!(
			backend.get_user(session.id).await.unwrap().unwrap().email,
			"jane@doe.com"
		);
	}

	#[tokio::test]
	async fn test_like_is_unique() {
		let backend = MemoryBackend::new("http://localhost");
		let post = backend
			.insert_post(NewPost {
				author_id: Uuid::new_v4(),
				title: "title".into(),
				content: "content".into(),
				excerpt: None,
				image: None,
			})
			.await
			.unwrap();
		let user = Uuid::new_v4();

		backend.insert_like(user, post.id).await.unwrap();

		assert!(matches!(
			backend.insert_like(user, post.id).await,
			Err(BackendError::Conflict("like"))
		));
	}

	#[tokio::test]
	async fn test_adjust_likes_floors_at_zero() {
		let backend = MemoryBackend::new("http://localhost");
		let post = backend
			.insert_post(NewPost {
				author_id: Uuid::new_v4(),
				title: "title".into(),
				content: "content".into(),
				excerpt: None,
				image: None,
			})
			.await
			.unwrap();

		assert_eq!(backend.adjust_likes(post.id, 1).await.unwrap(), 1);
		assert_eq!(backend.adjust_likes(post.id, -1).await.unwrap(), 0);
		assert_eq!(backend.adjust_likes(post.id, -1).await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_upload_without_upsert_conflicts() {
		let backend = MemoryBackend::new("http://localhost");
		let object = Object {
			content_type: "image/png".into(),
			data: vec![1, 2, 3],
		};

		backend
			.upload("images", "a/1.png", object.clone(), false)
			.await
			.unwrap();

		assert!(matches!(
			backend.upload("images", "a/1.png", object.clone(), false).await,
			Err(BackendError::Conflict("object"))
		));

		backend
			.upload("images", "a/1.png", object, true)
			.await
			.unwrap();
	}
}
