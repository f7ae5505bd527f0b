use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};

use dashmap::DashMap;
use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Like, Post};

/// Per-user view caches, keyed by user id.
pub type ViewCache = Arc<DashMap<Uuid, FeedCache>>;

/// What a user sees of the likes on the home feed: the like counter of each
/// post and the set of posts they like.
///
/// Mutations consume the cache and return the new state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCache {
	counts: HashMap<Uuid, i64>,
	liked: HashSet<Uuid>,
}

/// The like state of a single post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct LikeState {
	pub post_id: Uuid,
	/// Whether the current user likes the post.
	pub liked: bool,
	pub likes: i64,
}

impl FeedCache {
	/// Seeds the counters from the stored counter of each post and the liked set
	/// from the user's likes.
	pub fn seed(posts: &[Post], likes: &[Like]) -> Self {
		Self {
			counts: posts
				.iter()
				.map(|post| (post.id, post.like_count()))
				.collect(),
			liked: likes.iter().map(|like| like.post_id).collect(),
		}
	}

	pub fn is_liked(&self, post: Uuid) -> bool {
		self.liked.contains(&post)
	}

	pub fn count(&self, post: Uuid) -> i64 {
		self.counts.get(&post).copied().unwrap_or(0)
	}

	pub fn liked(&self) -> &HashSet<Uuid> {
		&self.liked
	}

	pub fn counts(&self) -> &HashMap<Uuid, i64> {
		&self.counts
	}

	pub fn state(&self, post: Uuid) -> LikeState {
		LikeState {
			post_id: post,
			liked: self.is_liked(post),
			likes: self.count(post),
		}
	}

	#[must_use]
	pub fn with_like(mut self, post: Uuid, likes: i64) -> Self {
		self.liked.insert(post);
		self.counts.insert(post, likes);
		self
	}

	#[must_use]
	pub fn with_unlike(mut self, post: Uuid, likes: i64) -> Self {
		self.liked.remove(&post);
		self.counts.insert(post, likes.max(0));
		self
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_mutations_return_new_state() {
		let post = Uuid::new_v4();
		let cache = FeedCache::default().with_like(post, 4);

		assert!(cache.is_liked(post));
		assert_eq!(cache.count(post), 4);

		let cache = cache.with_unlike(post, -1);

		assert!(!cache.is_liked(post));
		assert_eq!(cache.count(post), 0);
	}

	#[test]
	fn test_unknown_post_is_unliked() {
		let state = FeedCache::default().state(Uuid::nil());

		assert!(!state.liked);
		assert_eq!(state.likes, 0);
	}
}
