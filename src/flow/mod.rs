//! The application's flows, one async function per user action.
//!
//! Flows only talk to a [`Backend`](crate::backend::Backend) and never to the
//! HTTP layer, which maps their results onto views.

pub mod editor;
pub mod feed;
pub mod like;
pub mod profile;
pub mod session;
pub mod upload;

/// Treats an empty form field as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.trim().is_empty())
}
