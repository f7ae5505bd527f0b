use argon2::Argon2;
use uuid::Uuid;

use super::{hash_password, Backend, BackendError, Result};
use crate::{
	model::{
		Author, AuthSession, Like, NewPost, Object, Post, PostPatch, PostWithAuthor, Profile,
		ProfilePatch, User,
	},
	Database,
};

/// A backend hosted on PostgreSQL.
///
/// Profiles are created by a trigger on the `"user"` table, and uploaded objects
/// are kept in `storage_object`.
#[derive(Clone)]
pub struct PgBackend {
	database: Database,
	hasher: Argon2<'static>,
	public_url: String,
}

#[derive(sqlx::FromRow)]
struct PostAuthorRow {
	#[sqlx(flatten)]
	post: Post,
	author_name: Option<String>,
	author_image: Option<String>,
}

impl From<PostAuthorRow> for PostWithAuthor {
	fn from(row: PostAuthorRow) -> Self {
		Self {
			post: row.post,
			author: row.author_name.map(|name| Author {
				name,
				profile_image: row.author_image,
			}),
		}
	}
}

#[derive(sqlx::FromRow)]
struct Credentials {
	id: Uuid,
	email: String,
	password: Vec<u8>,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
	id: Uuid,
	created_at: chrono::DateTime<chrono::Utc>,
}

const POST_WITH_AUTHOR: &str = r#"
	SELECT post.*, profile.name AS author_name, profile.profile_image AS author_image
	FROM post
	LEFT JOIN profile ON profile.id = post.author_id
"#;

fn constraint_conflict(error: sqlx::Error, constraint: &str, what: &'static str) -> BackendError {
	match error {
		sqlx::Error::Database(ref d) if d.constraint() == Some(constraint) => {
			BackendError::Conflict(what)
		}
		e => BackendError::Database(e),
	}
}

impl PgBackend {
	/// Connects to the database and runs pending migrations.
	pub async fn connect(url: &str, public_url: impl Into<String>) -> Result<Self> {
		let database = Database::connect(url).await?;

		sqlx::migrate!().run(&database).await?;

		Ok(Self {
			database,
			hasher: Argon2::default(),
			public_url: public_url.into(),
		})
	}

	async fn create_session(&self, user: User) -> Result<AuthSession> {
		let session = sqlx::query_as::<_, SessionRow>(
			"INSERT INTO session (user_id) VALUES ($1) RETURNING id, created_at",
		)
		.bind(user.id)
		.fetch_one(&self.database)
		.await?;

		Ok(AuthSession {
			id: session.id,
			user,
			created_at: session.created_at,
		})
	}
}

#[axum::async_trait]
impl Backend for PgBackend {
	async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<AuthSession> {
		let user_id = Uuid::new_v4();
		let hashed = hash_password(&self.hasher, password, &user_id)?;

		let mut tx = self.database.begin().await?;

		let user = sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, email, name, password) VALUES ($1, $2, $3, $4)
				RETURNING id, email
			"#,
		)
		.bind(user_id)
		.bind(email)
		.bind(name)
		.bind(&hashed[..])
		.fetch_one(&mut *tx)
		.await
		.map_err(|e| constraint_conflict(e, "user_email_key", "email"))?;

		let session = sqlx::query_as::<_, SessionRow>(
			"INSERT INTO session (user_id) VALUES ($1) RETURNING id, created_at",
		)
		.bind(user_id)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(AuthSession {
			id: session.id,
			user,
			created_at: session.created_at,
		})
	}

	async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
		let credentials = sqlx::query_as::<_, Credentials>(
			r#"SELECT id, email, password FROM "user" WHERE email = $1"#,
		)
		.bind(email)
		.fetch_optional(&self.database)
		.await?;

		let Some(credentials) = credentials else {
			return Err(BackendError::InvalidCredentials);
		};

		let hashed = hash_password(&self.hasher, password, &credentials.id)?;

		if credentials.password != hashed {
			return Err(BackendError::InvalidCredentials);
		}

		self.create_session(User {
			id: credentials.id,
			email: credentials.email,
		})
		.await
	}

	async fn sign_out(&self, session: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session)
			.execute(&self.database)
			.await?;

		Ok(())
	}

	async fn get_user(&self, session: Uuid) -> Result<Option<User>> {
		let user = sqlx::query_as::<_, User>(
			r#"
				SELECT id, email FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session)
		.fetch_optional(&self.database)
		.await?;

		Ok(user)
	}

	async fn list_posts(&self) -> Result<Vec<Post>> {
		let posts = sqlx::query_as::<_, Post>("SELECT * FROM post ORDER BY created_at DESC")
			.fetch_all(&self.database)
			.await?;

		Ok(posts)
	}

	async fn list_posts_with_authors(&self) -> Result<Vec<PostWithAuthor>> {
		let rows = sqlx::query_as::<_, PostAuthorRow>(&format!(
			"{POST_WITH_AUTHOR} ORDER BY post.created_at DESC"
		))
		.fetch_all(&self.database)
		.await?;

		Ok(rows.into_iter().map(Into::into).collect())
	}

	async fn list_posts_by_author(&self, author: Uuid) -> Result<Vec<Post>> {
		let posts = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE author_id = $1
				ORDER BY created_at DESC
			"#,
		)
		.bind(author)
		.fetch_all(&self.database)
		.await?;

		Ok(posts)
	}

	async fn get_post_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>> {
		let row = sqlx::query_as::<_, PostAuthorRow>(&format!("{POST_WITH_AUTHOR} WHERE post.id = $1"))
			.bind(id)
			.fetch_optional(&self.database)
			.await?;

		Ok(row.map(Into::into))
	}

	async fn get_owned_post(&self, id: Uuid, author: Uuid) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1 AND author_id = $2")
			.bind(id)
			.bind(author)
			.fetch_optional(&self.database)
			.await?;

		Ok(post)
	}

	async fn insert_post(&self, post: NewPost) -> Result<Post> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (title, content, excerpt, image, author_id)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(post.title)
		.bind(post.content)
		.bind(post.excerpt)
		.bind(post.image)
		.bind(post.author_id)
		.fetch_one(&self.database)
		.await?;

		Ok(post)
	}

	async fn update_post(&self, id: Uuid, author: Uuid, patch: PostPatch) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET title = $1, content = $2, excerpt = $3, image = $4, updated_at = now()
				WHERE id = $5 AND author_id = $6
				RETURNING *
			"#,
		)
		.bind(patch.title)
		.bind(patch.content)
		.bind(patch.excerpt)
		.bind(patch.image)
		.bind(id)
		.bind(author)
		.fetch_optional(&self.database)
		.await?;

		Ok(post)
	}

	async fn adjust_likes(&self, id: Uuid, delta: i64) -> Result<i64> {
		let likes = sqlx::query_scalar::<_, Option<i64>>(
			r#"
				UPDATE post
				SET likes = GREATEST(COALESCE(likes, 0) + $1, 0)
				WHERE id = $2
				RETURNING likes
			"#,
		)
		.bind(delta)
		.bind(id)
		.fetch_optional(&self.database)
		.await?;

		let likes = likes.ok_or(BackendError::NotFound("post"))?;

		Ok(likes.unwrap_or(0))
	}

	async fn list_likes(&self, user: Uuid) -> Result<Vec<Like>> {
		let likes = sqlx::query_as::<_, Like>("SELECT user_id, post_id FROM likes WHERE user_id = $1")
			.bind(user)
			.fetch_all(&self.database)
			.await?;

		Ok(likes)
	}

	async fn insert_like(&self, user: Uuid, post: Uuid) -> Result<()> {
		sqlx::query("INSERT INTO likes (user_id, post_id) VALUES ($1, $2)")
			.bind(user)
			.bind(post)
			.execute(&self.database)
			.await
			.map_err(|e| constraint_conflict(e, "likes_pkey", "like"))?;

		Ok(())
	}

	async fn delete_like(&self, user: Uuid, post: Uuid) -> Result<()> {
		let deleted = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
			.bind(user)
			.bind(post)
			.execute(&self.database)
			.await?;

		if deleted.rows_affected() == 0 {
			return Err(BackendError::NotFound("like"));
		}

		Ok(())
	}

	async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
		let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profile WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.database)
			.await?;

		Ok(profile)
	}

	async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<Option<Profile>> {
		let profile = sqlx::query_as::<_, Profile>(
			r#"
				UPDATE profile
				SET name = $1, phone = $2, bio = $3, profile_image = $4
				WHERE id = $5
				RETURNING *
			"#,
		)
		.bind(patch.name)
		.bind(patch.phone)
		.bind(patch.bio)
		.bind(patch.profile_image)
		.bind(id)
		.fetch_optional(&self.database)
		.await?;

		Ok(profile)
	}

	async fn upload(&self, bucket: &str, key: &str, object: Object, upsert: bool) -> Result<()> {
		let query = if upsert {
			r#"
				INSERT INTO storage_object (bucket, key, content_type, data)
				VALUES ($1, $2, $3, $4)
				ON CONFLICT (bucket, key) DO UPDATE
				SET content_type = EXCLUDED.content_type, data = EXCLUDED.data, updated_at = now()
			"#
		} else {
			r#"
				INSERT INTO storage_object (bucket, key, content_type, data)
				VALUES ($1, $2, $3, $4)
			"#
		};

		sqlx::query(query)
			.bind(bucket)
			.bind(key)
			.bind(object.content_type)
			.bind(object.data)
			.execute(&self.database)
			.await
			.map_err(|e| constraint_conflict(e, "storage_object_pkey", "object"))?;

		Ok(())
	}

	async fn download(&self, bucket: &str, key: &str) -> Result<Option<Object>> {
		let object = sqlx::query_as::<_, (String, Vec<u8>)>(
			"SELECT content_type, data FROM storage_object WHERE bucket = $1 AND key = $2",
		)
		.bind(bucket)
		.bind(key)
		.fetch_optional(&self.database)
		.await?;

		Ok(object.map(|(content_type, data)| Object { content_type, data }))
	}

	async fn remove(&self, bucket: &str, key: &str) -> Result<()> {
		sqlx::query("DELETE FROM storage_object WHERE bucket = $1 AND key = $2")
			.bind(bucket)
			.bind(key)
			.execute(&self.database)
			.await?;

		Ok(())
	}

	fn public_url(&self, bucket: &str, key: &str) -> String {
		super::public_url(&self.public_url, bucket, key)
	}
}
