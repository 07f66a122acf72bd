use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::now;
use crate::entities::{pet, Pets};
use crate::error::{Error, Result};
use crate::records::{Draft, NewPet, Pet, PetPatch};

pub async fn create(db: &DatabaseConnection, owner_id: Uuid, draft: NewPet) -> Result<Pet> {
    draft.validate()?;

    let now = now();
    let model = pet::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        name: Set(draft.name.trim().to_string()),
        breed: Set(draft.breed.trim().to_string()),
        age: Set(draft.age),
        weight: Set(draft.weight),
        image_url: Set(draft.image_url),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(model.into())
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<Pet> {
    Pets::find_by_id(id)
        .one(db)
        .await?
        .map(Pet::from)
        .ok_or_else(|| Error::not_found("Pet", id))
}

pub async fn list_by_owner(db: &DatabaseConnection, owner_id: Uuid) -> Result<Vec<Pet>> {
    let pets = Pets::find()
        .filter(pet::Column::OwnerId.eq(owner_id))
        .order_by_asc(pet::Column::Name)
        .all(db)
        .await?;
    Ok(pets.into_iter().map(Pet::from).collect())
}

pub async fn update(db: &DatabaseConnection, id: Uuid, patch: PetPatch) -> Result<Pet> {
    patch.validate()?;

    let existing = Pets::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Pet", id))?;

    let mut active = existing.into_active_model();
    if let Some(name) = patch.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(breed) = patch.breed {
        active.breed = Set(breed.trim().to_string());
    }
    if let Some(age) = patch.age {
        active.age = Set(age);
    }
    if let Some(weight) = patch.weight {
        active.weight = Set(weight);
    }
    active.updated_at = Set(now());

    Ok(active.update(db).await?.into())
}

pub async fn set_image(db: &DatabaseConnection, id: Uuid, image_url: String) -> Result<Pet> {
    let existing = Pets::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Pet", id))?;

    let mut active = existing.into_active_model();
    active.image_url = Set(Some(image_url));
    active.updated_at = Set(now());

    Ok(active.update(db).await?.into())
}

/// Removes the pet only; its feeding schedules and health records stay.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let res = Pets::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(Error::not_found("Pet", id));
    }
    Ok(())
}
