use uuid::Uuid;

use crate::{
	backend::{Backend, BackendError},
	model::User,
};

#[derive(Debug, thiserror::Error)]
#[error("not signed in")]
pub struct Unauthenticated;

/// Resolves the identity behind a session id, if any.
///
/// Unknown and expired sessions resolve to `None`.
pub async fn resolve(
	backend: &dyn Backend,
	session: Option<Uuid>,
) -> Result<Option<User>, BackendError> {
	let Some(session) = session else {
		return Ok(None);
	};

	backend.get_user(session).await
}

/// Gates a protected view behind a resolved identity.
pub fn require(user: Option<User>) -> Result<User, Unauthenticated> {
	user.ok_or(Unauthenticated)
}
