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
use crate::records::{Draft, FeedingSchedule, FeedingSchedulePatch, NewFeedingSchedule};
use crate::store::feeding;

pub async fn list_feeding_schedules(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Vec<FeedingSchedule>>> {
    owned_pet(&db, &session, pet_id).await?;
    Ok(Json(feeding::list_by_pet(&db, pet_id).await?))
}

pub async fn create_feeding_schedule(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Json(payload): Json<NewFeedingSchedule>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    owned_pet(&db, &session, payload.pet_id).await?;
    let schedule = feeding::create(&db, payload).await?;

    tracing::Span::current()
        .record("table", "feeding_schedules")
        .record("action", "create_feeding_schedule")
        .record("business_event", "Feeding schedule added");
    crate::metrics::record_created("feeding_schedules");

    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn update_feeding_schedule(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FeedingSchedulePatch>,
) -> Result<Json<FeedingSchedule>> {
    let existing = feeding::find(&db, id).await?;
    owned_pet(&db, &session, existing.pet_id).await?;
    let schedule = feeding::update(&db, id, payload).await?;

    tracing::Span::current()
        .record("table", "feeding_schedules")
        .record("action", "update_feeding_schedule");

    Ok(Json(schedule))
}

pub async fn delete_feeding_schedule(
    Extension(db): Extension<DatabaseConnection>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let existing = feeding::find(&db, id).await?;
    owned_pet(&db, &session, existing.pet_id).await?;
    feeding::delete(&db, id).await?;

    tracing::Span::current()
        .record("table", "feeding_schedules")
        .record("action", "delete_feeding_schedule");
    crate::metrics::record_deleted("feeding_schedules");

    Ok(StatusCode::NO_CONTENT)
}
