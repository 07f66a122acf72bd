use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::Result;
use crate::records::{NewVetClinic, VetClinic};
use crate::store::vets;

#[derive(Deserialize)]
pub struct VetQuery {
    district: Option<String>,
}

/// Clinics of one district, or the whole directory without `district`.
pub async fn list_vets(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<VetQuery>,
) -> Result<Json<Vec<VetClinic>>> {
    let clinics = match query.district.as_deref().map(str::trim) {
        Some(district) if !district.is_empty() => vets::list_by_district(&db, district).await?,
        _ => vets::list_all(&db).await?,
    };
    Ok(Json(clinics))
}

pub async fn create_vet(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<NewVetClinic>,
) -> Result<impl IntoResponse> {
    let clinic = vets::create(&db, payload).await?;

    tracing::Span::current()
        .record("table", "vet_clinics")
        .record("action", "create_vet_clinic");
    crate::metrics::record_created("vet_clinics");

    Ok((StatusCode::CREATED, Json(clinic)))
}
