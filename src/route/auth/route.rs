use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{
	extract::State,
	http::{header, StatusCode},
};
use macros::route;

use crate::{
	backend::Backend,
	cache::ViewCache,
	extract::{Json, MaybeSession, Session},
	model::{AuthSession, User},
	openapi::tag,
	session,
};

use super::{backend_error, model, RouteError};

/// Log in
/// Logs in to an account, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<AuthSession>"))]
pub async fn login(
	State(backend): State<Arc<dyn Backend>>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let session = backend
		.sign_in(&auth.email, &auth.password)
		.await
		.map_err(backend_error)?;

	tracing::info!(user = %session.user.id, "signed in");

	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Log out
/// Logs out of the authenticated account and clears the session cookie.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(backend): State<Arc<dyn Backend>>,
	State(views): State<ViewCache>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	backend.sign_out(session.id).await?;
	views.remove(&session.user.id);

	// Clear the session cookie
	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	))
}

/// Register account
/// Registers a new account along with its profile, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Registered successfully.", shape = "Json<AuthSession>"))]
pub async fn register(
	State(backend): State<Arc<dyn Backend>>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let session = backend
		.sign_up(&auth.email, &auth.password, &auth.name)
		.await
		.map_err(backend_error)?;

	tracing::info!(user = %session.user.id, "registered");

	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<User> {
	Json(session.user)
}

/// Auth callback
/// Reports whether signing in worked, sending the client to the index feed if it did.
#[route(tag = tag::AUTH)]
pub async fn callback(session: MaybeSession) -> Json<model::CallbackResponse> {
	Json(match session.user {
		Some(..) => model::CallbackResponse {
			status: model::CallbackStatus::Success,
			redirect: Some("/"),
		},
		None => model::CallbackResponse {
			status: model::CallbackStatus::Error,
			redirect: None,
		},
	})
}
