use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::now;
use crate::entities::{vet_clinic, VetClinics};
use crate::error::{Error, Result};
use crate::records::{NewVetClinic, VetClinic};

pub async fn create(db: &DatabaseConnection, draft: NewVetClinic) -> Result<VetClinic> {
    draft.validate()?;
    Ok(active_model(draft).insert(db).await?.into())
}

pub async fn list_by_district(db: &DatabaseConnection, district: &str) -> Result<Vec<VetClinic>> {
    let clinics = VetClinics::find()
        .filter(vet_clinic::Column::District.eq(district))
        .order_by_asc(vet_clinic::Column::Name)
        .all(db)
        .await?;
    Ok(clinics.into_iter().map(VetClinic::from).collect())
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<VetClinic>> {
    let clinics = VetClinics::find()
        .order_by_asc(vet_clinic::Column::District)
        .order_by_asc(vet_clinic::Column::Name)
        .all(db)
        .await?;
    Ok(clinics.into_iter().map(VetClinic::from).collect())
}

/// Loads a JSON array of clinics into an empty directory. Returns how many
/// were inserted; a populated directory is left alone.
pub async fn seed_from_file(db: &DatabaseConnection, path: &str) -> Result<usize> {
    if VetClinics::find().count(db).await? > 0 {
        tracing::info!("Vet directory already populated, skipping seed");
        return Ok(0);
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Config(format!("cannot read vet seed file {path}: {e}")))?;
    let drafts: Vec<NewVetClinic> = serde_json::from_str(&raw)
        .map_err(|e| Error::Config(format!("invalid vet seed file {path}: {e}")))?;

    for draft in &drafts {
        draft.validate()?;
    }
    let count = drafts.len();
    if count == 0 {
        return Ok(0);
    }

    VetClinics::insert_many(drafts.into_iter().map(active_model))
        .exec(db)
        .await?;

    tracing::info!("Seeded {} vet clinics from {}", count, path);
    Ok(count)
}

fn active_model(draft: NewVetClinic) -> vet_clinic::ActiveModel {
    vet_clinic::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(draft.name.trim().to_string()),
        address: Set(draft.address.trim().to_string()),
        contact: Set(draft.contact.trim().to_string()),
        district: Set(draft.district.trim().to_string()),
        emergency: Set(draft.emergency),
        rating: Set(draft.rating),
        created_at: Set(now()),
    }
}
