use axum::{
    extract::{Extension, Json, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::{owned_pet, SharedImages};
use crate::auth::Session;
use crate::error::{Error, Result};
use crate::images::{image_content_type, object_name, MAX_IMAGE_BYTES};
use crate::records::{NewPet, Pet, PetPatch};
use crate::store::pets;

pub async fn list_pets(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Pet>>> {
    let pets = pets::list_by_owner(&db, session.user_id).await?;
    Ok(Json(pets))
}

pub async fn create_pet(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Json(payload): Json<NewPet>,
) -> Result<impl IntoResponse> {
    let pet = pets::create(&db, session.user_id, payload).await?;

    tracing::Span::current()
        .record("table", "pets")
        .record("action", "create_pet")
        .record("pet_id", tracing::field::display(pet.id))
        .record("business_event", "Pet created successfully");
    crate::metrics::record_created("pets");

    Ok((StatusCode::CREATED, Json(pet)))
}

pub async fn get_pet(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Pet>> {
    Ok(Json(owned_pet(&db, &session, pet_id).await?))
}

pub async fn update_pet(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<Uuid>,
    Json(payload): Json<PetPatch>,
) -> Result<Json<Pet>> {
    owned_pet(&db, &session, pet_id).await?;
    let pet = pets::update(&db, pet_id, payload).await?;

    tracing::Span::current()
        .record("table", "pets")
        .record("action", "update_pet");

    Ok(Json(pet))
}

pub async fn delete_pet(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<Uuid>,
) -> Result<StatusCode> {
    owned_pet(&db, &session, pet_id).await?;
    pets::delete(&db, pet_id).await?;

    tracing::Span::current()
        .record("table", "pets")
        .record("action", "delete_pet")
        .record("business_event", "Pet deleted");
    crate::metrics::record_deleted("pets");

    Ok(StatusCode::NO_CONTENT)
}

/// Multipart upload with a single `image` field. Stores the photo and sets
/// the pet's `image_url`.
pub async fn upload_image(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Extension(images): Extension<SharedImages>,
    Path(pet_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Pet>> {
    let store = images.ok_or_else(|| Error::Storage("image storage is not configured".into()))?;
    owned_pet(&db, &session, pet_id).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation("image", e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("photo.jpg").to_string();
        let content_type = image_content_type(&file_name)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::validation("image", e.body_text()))?;

        if bytes.is_empty() {
            return Err(Error::validation("image", "file is empty"));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::validation("image", "file is larger than 10 MiB"));
        }

        let object = object_name(pet_id, &file_name);
        tracing::info!("Uploading {} bytes to {}", bytes.len(), object);
        let url = store.put(&object, &content_type, bytes.to_vec()).await?;
        let pet = pets::set_image(&db, pet_id, url).await?;

        tracing::Span::current()
            .record("table", "pets")
            .record("action", "upload_pet_image")
            .record("business_event", "Pet photo uploaded");

        return Ok(Json(pet));
    }

    Err(Error::validation("image", "multipart field 'image' is missing"))
}
