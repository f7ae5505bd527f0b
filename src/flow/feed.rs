use uuid::Uuid;

use crate::{
	backend::{Backend, BackendError},
	cache::FeedCache,
	model::{Post, PostWithAuthor, User},
};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
	#[error("failed to fetch posts")]
	Backend(#[from] BackendError),
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
}

/// The home feed: every post, with the like state derived from it.
#[derive(Debug, Clone)]
pub struct HomeFeed {
	pub posts: Vec<Post>,
	pub cache: FeedCache,
}

/// Loads all posts and, for a signed-in user, the posts they like.
///
/// Both reads are issued together. Failing to read the likes is not fatal:
/// the feed is shown as if the user liked nothing.
#[tracing::instrument(skip(backend))]
pub async fn load_home(backend: &dyn Backend, user: Option<&User>) -> Result<HomeFeed, FeedError> {
	let likes = async {
		match user {
			Some(user) => backend.list_likes(user.id).await,
			None => Ok(Vec::new()),
		}
	};

	let (posts, likes) = tokio::join!(backend.list_posts(), likes);
	let posts = posts?;
	let likes = likes.unwrap_or_else(|error| {
		tracing::error!(%error, "failed to fetch likes");
		Vec::new()
	});

	Ok(HomeFeed {
		cache: FeedCache::seed(&posts, &likes),
		posts,
	})
}

/// Loads every post with its author, newest first.
#[tracing::instrument(skip(backend))]
pub async fn load_index(backend: &dyn Backend) -> Result<Vec<PostWithAuthor>, FeedError> {
	Ok(backend.list_posts_with_authors().await?)
}

/// Loads the posts written by `user`, newest first.
#[tracing::instrument(skip(backend))]
pub async fn load_dashboard(backend: &dyn Backend, user: &User) -> Result<Vec<Post>, FeedError> {
	Ok(backend.list_posts_by_author(user.id).await?)
}

#[tracing::instrument(skip(backend))]
pub async fn load_post(backend: &dyn Backend, id: Uuid) -> Result<PostWithAuthor, FeedError> {
	backend
		.get_post_with_author(id)
		.await?
		.ok_or(FeedError::UnknownPost(id))
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		backend::{MemoryBackend, Op},
		model::NewPost,
	};

	fn post(likes: Option<i64>, minutes_ago: i64) -> Post {
		let created_at = chrono::Utc::now() - chrono::Duration::minutes(minutes_ago);

		Post {
			id: Uuid::new_v4(),
			title: "title".into(),
			content: "content".into(),
			excerpt: None,
			image: None,
			author_id: Uuid::new_v4(),
			created_at,
			updated_at: created_at,
			likes,
		}
	}

	async fn user(backend: &MemoryBackend) -> User {
		backend
			.sign_up("jane@doe.com", "hunter2hunter", "Jane")
			.await
			.unwrap()
			.user
	}

	#[tokio::test]
	async fn test_home_feed_counts_and_likes() {
		let backend = MemoryBackend::new("http://localhost");
		let user = user(&backend).await;
		let first = post(Some(3), 1);
		let second = post(Some(0), 2);

		backend.put_post(first.clone());
		backend.put_post(second.clone());
		backend.insert_like(user.id, first.id).await.unwrap();

		let feed = load_home(&backend, Some(&user)).await.unwrap();

		assert_eq!(feed.cache.liked().len(), 1);
		assert!(feed.cache.is_liked(first.id));
		assert_eq!(feed.cache.counts().len(), 2);
		assert_eq!(feed.cache.count(first.id), 3);
		assert_eq!(feed.cache.count(second.id), 0);
	}

	#[tokio::test]
	async fn test_home_feed_is_newest_first() {
		let backend = MemoryBackend::new("http://localhost");
		let older = post(None, 10);
		let newer = post(None, 1);

		backend.put_post(older.clone());
		backend.put_post(newer.clone());

		let feed = load_home(&backend, None).await.unwrap();
		let ids = feed.posts.iter().map(|post| post.id).collect::<Vec<_>>();

		assert_eq!(ids, vec![newer.id, older.id]);
	}

	#[tokio::test]
	async fn test_missing_counter_seeds_zero() {
		let backend = MemoryBackend::new("http://localhost");
		let post = post(None, 1);

		backend.put_post(post.clone());

		let feed = load_home(&backend, None).await.unwrap();

		assert_eq!(feed.cache.count(post.id), post.like_count());
		assert_eq!(feed.cache.count(post.id), 0);
	}

	#[tokio::test]
	async fn test_anonymous_feed_skips_likes() {
		let backend = MemoryBackend::new("http://localhost");

		load_home(&backend, None).await.unwrap();

		assert_eq!(backend.calls(Op::ListLikes), 0);
	}

	#[tokio::test]
	async fn test_failed_likes_read_is_not_fatal() {
		let backend = MemoryBackend::new("http://localhost");
		let user = user(&backend).await;

		backend.put_post(post(Some(2), 1));
		backend.fail(Op::ListLikes);

		let feed = load_home(&backend, Some(&user)).await.unwrap();

		assert_eq!(feed.posts.len(), 1);
		assert!(feed.cache.liked().is_empty());
	}

	#[tokio::test]
	async fn test_failed_posts_read_fails_feed() {
		let backend = MemoryBackend::new("http://localhost");

		backend.fail(Op::ListPosts);

		assert!(matches!(
			load_home(&backend, None).await,
			Err(FeedError::Backend(..))
		));
	}

	#[tokio::test]
	async fn test_post_detail_joins_author() {
		let backend = MemoryBackend::new("http://localhost");
		let user = user(&backend).await;
		let post = backend
			.insert_post(NewPost {
				author_id: user.id,
				title: "title".into(),
				content: "content".into(),
				excerpt: None,
				image: None,
			})
			.await
			.unwrap();

		let detail = load_post(&backend, post.id).await.unwrap();

		assert_eq!(detail.author_name(), "Jane");
		assert!(matches!(
			load_post(&backend, Uuid::new_v4()).await,
			Err(FeedError::UnknownPost(..))
		));
	}

	#[tokio::test]
	async fn test_dashboard_lists_own_posts() {
		let backend = MemoryBackend::new("http://localhost");
		let user = user(&backend).await;

		backend.put_post(post(None, 1));
		backend
			.insert_post(NewPost {
				author_id: user.id,
				title: "mine".into(),
				content: "content".into(),
				excerpt: None,
				image: None,
			})
			.await
			.unwrap();

		let posts = load_dashboard(&backend, &user).await.unwrap();

		assert_eq!(posts.len(), 1);
		assert_eq!(posts[0].title, "mine");
	}
}
