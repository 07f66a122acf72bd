use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::now;
use crate::entities::{health_record, HealthRecords};
use crate::error::{Error, Result};
use crate::records::{Draft, HealthRecord, HealthRecordPatch, NewHealthRecord};

pub async fn create(db: &DatabaseConnection, draft: NewHealthRecord) -> Result<HealthRecord> {
    draft.check()?;

    let now = now();
    let model = health_record::ActiveModel {
        id: Set(Uuid::new_v4()),
        pet_id: Set(draft.pet_id),
        kind: Set(draft.kind.as_str().to_string()),
        title: Set(draft.title.trim().to_string()),
        date: Set(draft.date),
        next_due: Set(draft.next_due),
        notes: Set(draft.notes),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    model.try_into()
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<HealthRecord> {
    HealthRecords::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("HealthRecord", id))?
        .try_into()
}

/// Most recent first.
pub async fn list_by_pet(db: &DatabaseConnection, pet_id: Uuid) -> Result<Vec<HealthRecord>> {
    HealthRecords::find()
        .filter(health_record::Column::PetId.eq(pet_id))
        .order_by_desc(health_record::Column::Date)
        .order_by_desc(health_record::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(HealthRecord::try_from)
        .collect()
}

pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    patch: HealthRecordPatch,
) -> Result<HealthRecord> {
    patch.validate()?;

    let existing = HealthRecords::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("HealthRecord", id))?;

    let date = patch.date.unwrap_or(existing.date);
    let next_due = patch.next_due.unwrap_or(existing.next_due);
    if matches!(next_due, Some(due) if due < date) {
        return Err(Error::validation(
            "next_due",
            "must not be earlier than the record date",
        ));
    }

    let mut active = existing.into_active_model();
    if let Some(kind) = patch.kind {
        active.kind = Set(kind.as_str().to_string());
    }
    if let Some(title) = patch.title {
        active.title = Set(title.trim().to_string());
    }
    active.date = Set(date);
    active.next_due = Set(next_due);
    if let Some(notes) = patch.notes {
        active.notes = Set(notes);
    }
    active.updated_at = Set(now());

    active.update(db).await?.try_into()
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let res = HealthRecords::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(Error::not_found("HealthRecord", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::records::HealthRecordKind;
    use crate::test_support::test_db;

    fn draft(pet_id: Uuid, day: u32) -> NewHealthRecord {
        NewHealthRecord {
            pet_id,
            kind: HealthRecordKind::Checkup,
            title: format!("Checkup {day}"),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            next_due: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn lists_newest_first_and_only_for_the_pet() {
        let db = test_db().await;
        let pet = Uuid::new_v4();
        let other = Uuid::new_v4();
        create(&db, draft(pet, 3)).await.unwrap();
        create(&db, draft(pet, 20)).await.unwrap();
        create(&db, draft(other, 10)).await.unwrap();

        let records = list_by_pet(&db, pet).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Checkup 20");
        assert!(records.iter().all(|r| r.pet_id == pet));
    }

    #[tokio::test]
    async fn update_checks_due_date_against_stored_date() {
        let db = test_db().await;
        let record = create(&db, draft(Uuid::new_v4(), 15)).await.unwrap();

        let err = update(
            &db,
            record.id,
            HealthRecordPatch {
                next_due: Some(NaiveDate::from_ymd_opt(2024, 6, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "next_due", .. }));

        let ok = update(
            &db,
            record.id,
            HealthRecordPatch {
                next_due: Some(NaiveDate::from_ymd_opt(2025, 6, 15)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ok.next_due, NaiveDate::from_ymd_opt(2025, 6, 15));
    }

    #[tokio::test]
    async fn due_date_and_notes_can_be_cleared() {
        let db = test_db().await;
        let mut d = draft(Uuid::new_v4(), 10);
        d.next_due = NaiveDate::from_ymd_opt(2025, 6, 10);
        d.notes = Some("Bring the vaccination card".into());
        let record = create(&db, d).await.unwrap();

        let title_only = update(
            &db,
            record.id,
            HealthRecordPatch {
                title: Some("Annual checkup".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(title_only.next_due, record.next_due);
        assert_eq!(title_only.notes, record.notes);

        let cleared = update(
            &db,
            record.id,
            HealthRecordPatch {
                next_due: Some(None),
                notes: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.next_due, None);
        assert_eq!(cleared.notes, None);
        assert_eq!(cleared.title, "Annual checkup");
    }
}
