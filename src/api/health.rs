use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::owned_pet;
use crate::auth::Session;
use crate::error::Result;
use crate::records::{Draft, HealthRecord, HealthRecordPatch, NewHealthRecord};
use crate::store::health;

/// Newest first.
pub async fn list_health_records(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Vec<HealthRecord>>> {
    owned_pet(&db, &session, pet_id).await?;
    Ok(Json(health::list_by_pet(&db, pet_id).await?))
}

pub async fn create_health_record(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Json(payload): Json<NewHealthRecord>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    owned_pet(&db, &session, payload.pet_id).await?;
    let record = health::create(&db, payload).await?;

    tracing::Span::current()
        .record("table", "health_records")
        .record("action", "create_health_record")
        .record("business_event", "Health record added");
    crate::metrics::record_created("health_records");

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_health_record(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HealthRecordPatch>,
) -> Result<Json<HealthRecord>> {
    let existing = health::find(&db, id).await?;
    owned_pet(&db, &session, existing.pet_id).await?;
    let record = health::update(&db, id, payload).await?;

    tracing::Span::current()
        .record("table", "health_records")
        .record("action", "update_health_record");

    Ok(Json(record))
}

pub async fn delete_health_record(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let existing = health::find(&db, id).await?;
    owned_pet(&db, &session, existing.pet_id).await?;
    health::delete(&db, id).await?;

    tracing::Span::current()
        .record("table", "health_records")
        .record("action", "delete_health_record");
    crate::metrics::record_deleted("health_records");

    Ok(StatusCode::NO_CONTENT)
}
