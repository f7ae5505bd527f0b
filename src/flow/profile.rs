use super::{
	non_empty,
	upload::{self, ImageFile},
};
use crate::{
	backend::{Backend, BackendError},
	model::{Profile, ProfilePatch, User},
};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
	#[error("failed to fetch profile")]
	NotFound,
	#[error("failed to fetch profile")]
	Load(#[source] BackendError),
	#[error("only image files can be uploaded")]
	NotAnImage,
	#[error("failed to upload profile image")]
	Upload(#[source] BackendError),
	#[error("failed to update profile")]
	Update(#[source] BackendError),
}

/// The editable fields of a profile as entered in the form. The email is not
/// editable.
#[derive(Debug, Clone)]
pub struct ProfileForm {
	pub name: String,
	pub phone: Option<String>,
	pub bio: Option<String>,
	pub profile_image: Option<String>,
}

#[tracing::instrument(skip(backend))]
pub async fn load_profile(backend: &dyn Backend, user: &User) -> Result<Profile, ProfileError> {
	backend
		.get_profile(user.id)
		.await
		.map_err(ProfileError::Load)?
		.ok_or(ProfileError::NotFound)
}

/// Uploads a profile picture into the user's single slot, replacing any
/// previous one, and returns its public URL.
#[tracing::instrument(skip(backend, file))]
pub async fn upload_picture(
	backend: &dyn Backend,
	user: &User,
	file: ImageFile,
) -> Result<String, ProfileError> {
	if !file.is_image() {
		return Err(ProfileError::NotAnImage);
	}

	let key = upload::profile_image_key(user.id, file.extension());

	upload::upload_image(backend, &key, file, true)
		.await
		.map_err(ProfileError::Upload)
}

#[tracing::instrument(skip(backend, form))]
pub async fn save_profile(
	backend: &dyn Backend,
	user: &User,
	form: ProfileForm,
) -> Result<Profile, ProfileError> {
	let profile = backend
		.update_profile(
			user.id,
			ProfilePatch {
				name: form.name,
				phone: non_empty(form.phone),
				bio: non_empty(form.bio),
				profile_image: non_empty(form.profile_image),
			},
		)
		.await
		.map_err(ProfileError::Update)?
		.ok_or(ProfileError::NotFound)?;

	tracing::info!("updated profile");

	Ok(profile)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		backend::{MemoryBackend, Op},
		flow::upload::IMAGES_BUCKET,
	};

	async fn setup() -> (MemoryBackend, User) {
		let backend = MemoryBackend::new("http://localhost:3000");
		let user = backend
			.sign_up("jane@doe.com", "hunter2hunter", "Jane")
			.await
			.unwrap()
			.user;

		(backend, user)
	}

	#[tokio::test]
	async fn test_save_keeps_email() {
		let (backend, user) = setup().await;

		let profile = save_profile(
			&backend,
			&user,
			ProfileForm {
				name: "Jane Doe".into(),
				phone: Some("555-0100".into()),
				bio: Some(String::new()),
				profile_image: None,
			},
		)
		.await
		.unwrap();

		assert_eq!(profile.name, "Jane Doe");
		assert_eq!(profile.email, "jane@doe.com");
		assert_eq!(profile.phone.as_deref(), Some("555-0100"));
		assert_eq!(profile.bio, None);
		assert_eq!(load_profile(&backend, &user).await.unwrap(), profile);
	}

	#[tokio::test]
	async fn test_picture_overwrites_slot() {
		let (backend, user) = setup().await;
		let first = ImageFile::new("me.png", Some("image/png"), vec![1]);
		let second = ImageFile::new("me.png", Some("image/png"), vec![2]);

		let url = upload_picture(&backend, &user, first).await.unwrap();
		let again = upload_picture(&backend, &user, second).await.unwrap();
		let key = format!("{}/profile.png", user.id);

		assert_eq!(url, again);
		assert_eq!(url, format!("http://localhost:3000/storage/images/{key}"));
		assert_eq!(backend.object(IMAGES_BUCKET, &key).unwrap().data, vec![2]);
	}

	#[tokio::test]
	async fn test_missing_profile() {
		let backend = MemoryBackend::new("http://localhost:3000");
		let stranger = User {
			id: uuid::Uuid::new_v4(),
			email: "ghost@example.com".into(),
		};

		assert!(matches!(
			load_profile(&backend, &stranger).await,
			Err(ProfileError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_failed_update() {
		let (backend, user) = setup().await;

		backend.fail(Op::UpdateProfile);

		let result = save_profile(
			&backend,
			&user,
			ProfileForm {
				name: "Jane".into(),
				phone: None,
				bio: None,
				profile_image: None,
			},
		)
		.await;

		assert!(matches!(result, Err(ProfileError::Update(..))));
	}
}
