use schemars::JsonSchema;
use serde::Serialize;

use crate::{
	cache::{FeedCache, LikeState},
	flow::like::LikeOutcome,
	model::{Post, PostWithAuthor},
	route::model::{AuthoredPostView, PostView},
};

/// A post on the home feed, with what the current user sees of its likes.
#[derive(Debug, Serialize, JsonSchema)]
pub struct HomePostView {
	#[serde(flatten)]
	pub post: PostView,
	/// Whether the current user likes the post.
	pub liked: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct HomeView {
	pub signed_in: bool,
	pub posts: Vec<HomePostView>,
}

impl HomeView {
	pub fn new(posts: &[Post], cache: &FeedCache, signed_in: bool) -> Self {
		Self {
			signed_in,
			posts: posts
				.iter()
				.map(|post| {
					let state = cache.state(post.id);

					HomePostView {
						post: PostView {
							likes: state.likes,
							..PostView::from(post)
						},
						liked: state.liked,
					}
				})
				.collect(),
		}
	}
}

/// A single post, in full.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetailView {
	#[serde(flatten)]
	pub post: AuthoredPostView,
	pub content: String,
}

impl From<&PostWithAuthor> for PostDetailView {
	fn from(entry: &PostWithAuthor) -> Self {
		Self {
			post: AuthoredPostView::from(entry),
			content: entry.post.content.clone(),
		}
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LikeResponse {
	pub outcome: LikeOutcome,
	#[serde(flatten)]
	pub state: LikeState,
}
