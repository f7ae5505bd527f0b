#![warn(clippy::pedantic)]

mod backend;
mod cache;
mod config;
mod error;
mod extract;
mod flow;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{
	extract::{DefaultBodyLimit, Request},
	Extension, Router, ServiceExt,
};
use tower::Layer;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	limit::RequestBodyLimitLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	backend::{Backend, BackendError, MemoryBackend, PgBackend},
	cache::ViewCache,
	config::{Config, ConfigError},
	error::AppError,
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// Handlers extract the parts they need, such as `State<Arc<dyn Backend>>`.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub backend: Arc<dyn Backend>,
	/// What each signed-in user last saw of the likes on the home feed.
	pub views: ViewCache,
}

impl State {
	pub fn new(backend: Arc<dyn Backend>) -> Self {
		Self {
			backend,
			views: ViewCache::default(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("failed to initialize tracing: {0}")]
	Trace(#[from] trace::Error),
	#[error("failed to connect to backend: {0}")]
	Backend(#[from] BackendError),
	#[error("failed to serve: {0}")]
	Io(#[from] std::io::Error),
}

/// Builds the application router. `auth_limit` rate limits the
/// authentication routes by peer address.
pub fn app(state: State, max_upload_bytes: usize, auth_limit: Option<ratelimit::Config>) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.merge(route::routes(auth_limit))
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.fallback(not_found)
		.layer(DefaultBodyLimit::disable())
		.layer(RequestBodyLimitLayer::new(max_upload_bytes))
		.layer(CompressionLayer::new())
		.layer(CorsLayer::very_permissive())
		.layer(TraceLayer::new_for_http())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

async fn not_found() -> AppError {
	AppError::NotFound
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
	let config = Config::from_env()?;
	let _guard =
		trace::init_tracing_subscriber(config.log_level, config.otlp_endpoint.as_deref())?;

	let backend: Arc<dyn Backend> = if let Some(url) = &config.database_url {
		Arc::new(PgBackend::connect(url, &config.public_url).await?)
	} else {
		tracing::warn!("DATABASE_URL is not set, keeping everything in memory");
		Arc::new(MemoryBackend::new(&config.public_url))
	};

	let (default_limit, auth_limit) = (ratelimit::default(), ratelimit::secure());

	ratelimit::cleanup_old_limits(&[&default_limit, &auth_limit]);

	let router = app(State::new(backend), config.max_upload_bytes, Some(auth_limit)).layer(
		GovernorLayer {
			config: default_limit,
		},
	);
	let app = NormalizePathLayer::trim_trailing_slash().layer(router);

	let listener = tokio::net::TcpListener::bind((config.host, config.port)).await?;

	tracing::info!(address = %listener.local_addr()?, public_url = %config.public_url, "listening");

	axum::serve(
		listener,
		ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.await?;

	Ok(())
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use axum::http::{header, HeaderName, HeaderValue};
	pub use axum_test::TestServer;
	pub use serde_json::json;

	pub use crate::backend::{Backend, MemoryBackend};
	use crate::model::AuthSession;

	pub fn backend() -> Arc<MemoryBackend> {
		Arc::new(MemoryBackend::new("http://localhost:3000"))
	}

	pub fn server(backend: Arc<MemoryBackend>) -> TestServer {
		serve(super::State::new(backend))
	}

	pub fn serve(state: super::State) -> TestServer {
		TestServer::new(super::app(state, 1024 * 1024, None)).unwrap()
	}

	pub fn app() -> TestServer {
		server(backend())
	}

	pub fn bearer(session: &str) -> (HeaderName, HeaderValue) {
		(
			header::AUTHORIZATION,
			HeaderValue::from_str(&format!("Bearer {session}")).unwrap(),
		)
	}

	/// Signs up straight through the backend. Every account is named Jane.
	pub async fn sign_up(backend: &MemoryBackend, email: &str) -> AuthSession {
		backend.sign_up(email, "hunter2hunter", "Jane").await.unwrap()
	}

	/// Registers through the API, returning the session id.
	pub async fn register(app: &TestServer, email: &str) -> String {
		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": email,
				"name": "Jane",
				"password": "hunter2hunter",
			}))
			.await;

		response.json::<serde_json::Value>()["session_id"]
			.as_str()
			.unwrap()
			.to_owned()
	}

	#[tokio::test]
	async fn test_fallback_is_not_found() {
		let response = app().get("/nowhere").await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<serde_json::Value>()["success"], false);
	}

	#[tokio::test]
	async fn test_docs_are_served() {
		let response = app().get("/docs/api.json").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<serde_json::Value>()["info"]["title"], "Blogroll");
	}

	#[tokio::test]
	async fn test_request_id_is_set() {
		let response = app().get("/").await;

		assert!(response.headers().contains_key("x-request-id"));
	}
}
