use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, flow::feed::FeedError, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<FeedError>;

impl From<FeedError> for RouteError {
	fn from(error: FeedError) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_index, get_index_docs))
		.api_route("/home", get_with(get_home, get_home_docs))
		.api_route("/home/:id/like", post_with(toggle_like, toggle_like_docs))
		.api_route("/dashboard", get_with(get_dashboard, get_dashboard_docs))
		.api_route("/post/:id", get_with(get_post, get_post_docs))
}

impl error::ErrorShape for FeedError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Backend(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn redirect(&self) -> Option<&'static str> {
		match self {
			Self::Backend(..) => None,
			Self::UnknownPost(..) => Some("/"),
		}
	}
}
