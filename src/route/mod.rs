use aide::axum::ApiRouter;
use tower_governor::GovernorLayer;

use crate::{ratelimit, AppState};

pub mod auth;
pub mod docs;
pub mod feed;
pub mod model;
pub mod post;
pub mod profile;
pub mod storage;

pub fn routes(auth_limit: Option<ratelimit::Config>) -> ApiRouter<AppState> {
	let auth = match auth_limit {
		Some(config) => auth::routes().layer(GovernorLayer { config }),
		None => auth::routes(),
	};

	ApiRouter::new()
		.merge(feed::routes())
		.merge(post::routes())
		.nest("/auth", auth)
		.nest("/profile", profile::routes())
		.nest("/storage", storage::routes())
		.nest("/docs", docs::routes())
}
