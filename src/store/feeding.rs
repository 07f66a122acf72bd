use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::now;
use crate::entities::{feeding_schedule, FeedingSchedules};
use crate::error::{Error, Result};
use crate::records::{
    parse_time, Draft, FeedingSchedule, FeedingSchedulePatch, NewFeedingSchedule,
};

pub async fn create(db: &DatabaseConnection, draft: NewFeedingSchedule) -> Result<FeedingSchedule> {
    draft.check()?;

    let now = now();
    let model = feeding_schedule::ActiveModel {
        id: Set(Uuid::new_v4()),
        pet_id: Set(draft.pet_id),
        food_type: Set(draft.food_type.trim().to_string()),
        amount: Set(draft.amount.trim().to_string()),
        time: Set(draft.time),
        frequency: Set(draft.frequency.as_str().to_string()),
        notes: Set(draft.notes),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    model.try_into()
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<FeedingSchedule> {
    FeedingSchedules::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("FeedingSchedule", id))?
        .try_into()
}

/// Schedules for one pet in clock order.
pub async fn list_by_pet(db: &DatabaseConnection, pet_id: Uuid) -> Result<Vec<FeedingSchedule>> {
    let models = FeedingSchedules::find()
        .filter(feeding_schedule::Column::PetId.eq(pet_id))
        .order_by_asc(feeding_schedule::Column::CreatedAt)
        .all(db)
        .await?;

    let mut schedules = models
        .into_iter()
        .map(FeedingSchedule::try_from)
        .collect::<Result<Vec<_>>>()?;
    // Stored times are display strings ("08:00 AM"), so order after parsing.
    schedules.sort_by_key(|s| parse_time(&s.time).ok());
    Ok(schedules)
}

pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    patch: FeedingSchedulePatch,
) -> Result<FeedingSchedule> {
    patch.validate()?;

    let existing = FeedingSchedules::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("FeedingSchedule", id))?;

    let mut active = existing.into_active_model();
    if let Some(food_type) = patch.food_type {
        active.food_type = Set(food_type.trim().to_string());
    }
    if let Some(amount) = patch.amount {
        active.amount = Set(amount.trim().to_string());
    }
    if let Some(time) = patch.time {
        active.time = Set(time);
    }
    if let Some(frequency) = patch.frequency {
        active.frequency = Set(frequency.as_str().to_string());
    }
    if let Some(notes) = patch.notes {
        active.notes = Set(notes);
    }
    active.updated_at = Set(now());

    active.update(db).await?.try_into()
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let res = FeedingSchedules::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(Error::not_found("FeedingSchedule", id));
    }
    Ok(())
}
