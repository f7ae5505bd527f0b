use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

use crate::{
	backend::{Backend, BackendError},
	cache::FeedCache,
	model::User,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LikeOutcome {
	/// Nobody is signed in, so nothing was attempted.
	Skipped,
	/// The like could not be added or removed. Nothing changed.
	Failed,
	Liked,
	Unliked,
}

#[derive(Debug, Clone)]
pub struct Toggled {
	pub cache: FeedCache,
	pub outcome: LikeOutcome,
}

/// Likes the post if the cache says the user doesn't like it yet, and unlikes
/// it otherwise.
///
/// The like row is written first and the counter is only adjusted once that
/// succeeded. The cache is updated after both calls, with the counter the
/// backend returned, or with a local estimate if adjusting it failed. Failures
/// are logged and never surfaced.
///
/// Overlapping toggles for the same post are not serialized: the counter is
/// adjusted atomically by the backend, a duplicate like is rejected by its
/// uniqueness constraint, and removing a like that is already gone fails.
#[tracing::instrument(skip(backend, cache))]
pub async fn toggle_like(
	backend: &dyn Backend,
	user: Option<&User>,
	cache: FeedCache,
	post: Uuid,
) -> Toggled {
	let Some(user) = user else {
		tracing::debug!("not signed in, ignoring like toggle");

		return Toggled {
			cache,
			outcome: LikeOutcome::Skipped,
		};
	};

	if cache.is_liked(post) {
		if let Err(error) = backend.delete_like(user.id, post).await {
			tracing::error!(%error, "failed to unlike post");

			return Toggled {
				cache,
				outcome: LikeOutcome::Failed,
			};
		}

		let likes = settle(backend.adjust_likes(post, -1).await, cache.count(post) - 1);

		Toggled {
			cache: cache.with_unlike(post, likes),
			outcome: LikeOutcome::Unliked,
		}
	} else {
		if let Err(error) = backend.insert_like(user.id, post).await {
			tracing::error!(%error, "failed to like post");

			return Toggled {
				cache,
				outcome: LikeOutcome::Failed,
			};
		}

		let likes = settle(backend.adjust_likes(post, 1).await, cache.count(post) + 1);

		Toggled {
			cache: cache.with_like(post, likes),
			outcome: LikeOutcome::Liked,
		}
	}
}

/// The counter to show after adjusting it. The local estimate is used when
/// the backend could not adjust it; there is no rollback of the like row.
fn settle(adjusted: Result<i64, BackendError>, estimate: i64) -> i64 {
	adjusted.unwrap_or_else(|error| {
		tracing::error!(%error, "failed to update like counter");
		estimate.max(0)
	})
}
