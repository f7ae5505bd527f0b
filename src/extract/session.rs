use std::sync::Arc;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	backend::Backend,
	error::AppError,
	flow,
	model::User,
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_SESSION},
	session,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Reads the session id from the `Authorization` header, falling back to the
/// session cookie. Malformed values are treated as absent.
fn session_id(parts: &request::Parts) -> Option<Uuid> {
	if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
		return value
			.to_str()
			.ok()?
			.strip_prefix(AUTHORIZATION_PREFIX)
			.and_then(|id| Uuid::parse_str(id.trim()).ok());
	}

	let cookie = parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)?;

	Uuid::parse_str(cookie.value()).ok()
}

/// The session and related user of the request, if there is one.
///
/// ```rust,ignore
/// async fn route(MaybeSession { user, .. }: MaybeSession) {
///   println!("{:?}", user);
/// }
/// ```
#[derive(Debug, Default)]
pub struct MaybeSession {
	pub id: Option<Uuid>,
	pub user: Option<User>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
	Arc<dyn Backend>: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let id = session_id(parts);
		let backend = Arc::<dyn Backend>::from_ref(state);
		let user = flow::session::resolve(&*backend, id).await?;

		Ok(Self {
			id: user.as_ref().and(id),
			user,
		})
	}
}

/// Extracts the session and related user from the request.
///
/// If there is none, or it is no longer valid, the request is rejected with
/// [`AppError::Unauthenticated`], which redirects the client to `/auth`.
///
/// ```rust,ignore
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Arc<dyn Backend>: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let MaybeSession { id, user } = MaybeSession::from_request_parts(parts, state).await?;
		let user = flow::session::require(user).map_err(|_| AppError::Unauthenticated)?;

		Ok(Self {
			id: id.ok_or(AppError::Unauthenticated)?,
			user,
		})
	}
}

fn add_security(operation: &mut aide::openapi::Operation) {
	operation.security.extend([
		[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
			.into_iter()
			.collect(),
		[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
			.into_iter()
			.collect(),
	]);
}

impl OperationInput for Session {
	/// This adds a session requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		add_security(operation);
	}
}

impl OperationInput for MaybeSession {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		add_security(operation);
		// An empty requirement marks the session as optional.
		operation.security.push(Default::default());
	}
}

#[cfg(test)]
mod test {
	use axum::http::Request;

	use super::*;

	fn parts(name: header::HeaderName, value: &str) -> request::Parts {
		Request::builder()
			.header(name, value)
			.body(())
			.unwrap()
			.into_parts()
			.0
	}

	#[test]
	fn test_session_from_cookie() {
		let id = Uuid::new_v4();
		let parts = parts(header::COOKIE, &format!("theme=dark; session={id}"));

		assert_eq!(session_id(&parts), Some(id));
	}

	#[test]
	fn test_session_from_bearer() {
		let id = Uuid::new_v4();
		let parts = parts(header::AUTHORIZATION, &format!("Bearer {id}"));

		assert_eq!(session_id(&parts), Some(id));
	}

	#[test]
	fn test_malformed_session() {
		assert_eq!(session_id(&parts(header::COOKIE, "session=nope")), None);
		assert_eq!(session_id(&parts(header::AUTHORIZATION, "Basic abc")), None);
	}
}
