use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;

use crate::{
	backend::Backend,
	cache::{FeedCache, ViewCache},
	extract::{Json, MaybeSession, Path, Session},
	flow::{self, like::LikeOutcome},
	openapi::tag,
	route::model::{AuthoredPostView, IdInput, PostView},
};

use super::{model, RouteError};

/// Get index feed
/// Returns every post with its author, newest first.
#[route(tag = tag::FEED)]
pub async fn get_index(
	State(backend): State<Arc<dyn Backend>>,
) -> Result<Json<Vec<AuthoredPostView>>, RouteError> {
	let posts = flow::feed::load_index(&*backend).await?;

	Ok(Json(posts.iter().map(AuthoredPostView::from).collect()))
}

/// Get home feed
/// Returns every post, newest first, with its like counter and whether you like it.
#[route(tag = tag::FEED)]
pub async fn get_home(
	State(backend): State<Arc<dyn Backend>>,
	State(views): State<ViewCache>,
	session: MaybeSession,
) -> Result<Json<model::HomeView>, RouteError> {
	let feed = flow::feed::load_home(&*backend, session.user.as_ref()).await?;
	let view = model::HomeView::new(&feed.posts, &feed.cache, session.user.is_some());

	if let Some(user) = &session.user {
		views.insert(user.id, feed.cache);
	}

	Ok(Json(view))
}

/// Toggle like
/// Likes the post if you don't like it yet, and unlikes it otherwise. Failures leave the state unchanged.
#[route(
	tag = tag::FEED,
	response(status = 200, description = "The new like state.", shape = "Json<model::LikeResponse>"),
	response(status = 204, description = "Not signed in, nothing changed.")
)]
pub async fn toggle_like(
	State(backend): State<Arc<dyn Backend>>,
	State(views): State<ViewCache>,
	session: MaybeSession,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let cache = match &session.user {
		Some(user) => {
			let cached = views.get(&user.id).map(|entry| entry.value().clone());

			match cached {
				Some(cache) => cache,
				None => flow::feed::load_home(&*backend, Some(user)).await?.cache,
			}
		}
		None => FeedCache::default(),
	};

	let toggled = flow::like::toggle_like(&*backend, session.user.as_ref(), cache, id).await;

	if toggled.outcome == LikeOutcome::Skipped {
		return Ok(StatusCode::NO_CONTENT.into_response());
	}

	let state = toggled.cache.state(id);

	if let Some(user) = &session.user {
		views.insert(user.id, toggled.cache);
	}

	Ok(Json(model::LikeResponse {
		outcome: toggled.outcome,
		state,
	})
	.into_response())
}

/// Get dashboard
/// Returns your posts, newest first.
#[route(tag = tag::FEED)]
pub async fn get_dashboard(
	State(backend): State<Arc<dyn Backend>>,
	session: Session,
) -> Result<Json<Vec<PostView>>, RouteError> {
	let posts = flow::feed::load_dashboard(&*backend, &session.user).await?;

	Ok(Json(posts.iter().map(PostView::from).collect()))
}

/// Get single post
/// Returns a single post by its unique id, with its author.
#[route(tag = tag::FEED)]
pub async fn get_post(
	State(backend): State<Arc<dyn Backend>>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<model::PostDetailView>, RouteError> {
	let post = flow::feed::load_post(&*backend, id).await?;

	Ok(Json(model::PostDetailView::from(&post)))
}
