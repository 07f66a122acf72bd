use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use uuid::Uuid;

use super::now;
use crate::entities::{user, Users};
use crate::error::{Error, Result};

pub async fn create(
    db: &DatabaseConnection,
    email: &str,
    password_hash: String,
    verification_token: String,
) -> Result<user::Model> {
    if find_by_email(db, email).await?.is_some() {
        return Err(Error::Conflict {
            message: "Email already exists".into(),
        });
    }

    let now = now();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(normalize_email(email)),
        password_hash: Set(password_hash),
        verified: Set(false),
        verification_token: Set(Some(verification_token)),
        reset_token: Set(None),
        reset_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    new_user.insert(db).await.map_err(duplicate_email)
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<user::Model> {
    Users::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", id))
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    Ok(Users::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?)
}

/// Marks the account holding `token` as verified and consumes the token.
pub async fn verify(db: &DatabaseConnection, token: &str) -> Result<Option<user::Model>> {
    let Some(found) = Users::find()
        .filter(user::Column::VerificationToken.eq(token))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let mut active = found.into_active_model();
    active.verified = Set(true);
    active.verification_token = Set(None);
    active.updated_at = Set(now());
    Ok(Some(active.update(db).await?))
}

pub async fn set_reset_token(
    db: &DatabaseConnection,
    user: user::Model,
    token: String,
    expires_at: NaiveDateTime,
) -> Result<user::Model> {
    let mut active = user.into_active_model();
    active.reset_token = Set(Some(token));
    active.reset_expires_at = Set(Some(expires_at));
    active.updated_at = Set(now());
    Ok(active.update(db).await?)
}

/// Swaps the password for the account holding a live reset token.
pub async fn reset_password(
    db: &DatabaseConnection,
    token: &str,
    password_hash: String,
) -> Result<user::Model> {
    let found = Users::find()
        .filter(user::Column::ResetToken.eq(token))
        .one(db)
        .await?
        .filter(|u| u.reset_expires_at.is_some_and(|exp| exp > now()))
        .ok_or_else(|| Error::validation("token", "reset link is invalid or expired"))?;

    let mut active = found.into_active_model();
    active.password_hash = Set(password_hash);
    active.reset_token = Set(None);
    active.reset_expires_at = Set(None);
    active.updated_at = Set(now());
    Ok(active.update(db).await?)
}

/// A changed address must be verified again.
pub async fn update_email(
    db: &DatabaseConnection,
    id: Uuid,
    new_email: &str,
    verification_token: String,
) -> Result<user::Model> {
    if let Some(other) = find_by_email(db, new_email).await? {
        if other.id != id {
            return Err(Error::Conflict {
                message: "Email already exists".into(),
            });
        }
    }

    let mut active = find(db, id).await?.into_active_model();
    active.email = Set(normalize_email(new_email));
    active.verified = Set(false);
    active.verification_token = Set(Some(verification_token));
    active.updated_at = Set(now());
    active.update(db).await.map_err(duplicate_email)
}

pub async fn update_password_hash(
    db: &DatabaseConnection,
    id: Uuid,
    password_hash: String,
) -> Result<()> {
    let mut active = find(db, id).await?.into_active_model();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(now());
    active.update(db).await?;
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Lost races against the unique index surface as a conflict, not a 500.
fn duplicate_email(e: sea_orm::DbErr) -> Error {
    let msg = e.to_string();
    if msg.contains("duplicate key value violates unique constraint")
        || msg.contains("UNIQUE constraint failed")
    {
        Error::Conflict {
            message: "Email already exists".into(),
        }
    } else {
        Error::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn emails_are_unique_ignoring_case() {
        let db = test_db().await;
        create(&db, "Dana@Example.com", "hash".into(), "t1".into())
            .await
            .unwrap();
        let err = create(&db, "dana@example.com", "hash".into(), "t2".into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn verification_consumes_token() {
        let db = test_db().await;
        create(&db, "erin@example.com", "hash".into(), "verify-me".into())
            .await
            .unwrap();

        let verified = verify(&db, "verify-me").await.unwrap().unwrap();
        assert!(verified.verified);
        assert!(verify(&db, "verify-me").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_reset_token_is_refused() {
        let db = test_db().await;
        let user = create(&db, "finn@example.com", "old".into(), "t".into())
            .await
            .unwrap();
        let past = now() - chrono::Duration::minutes(5);
        set_reset_token(&db, user, "reset-1".into(), past).await.unwrap();

        let err = reset_password(&db, "reset-1", "new".into()).await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "token", .. }));
    }

    #[tokio::test]
    async fn live_reset_token_swaps_the_hash_once() {
        let db = test_db().await;
        let user = create(&db, "gwen@example.com", "old".into(), "t".into())
            .await
            .unwrap();
        let later = now() + chrono::Duration::minutes(30);
        set_reset_token(&db, user, "reset-2".into(), later).await.unwrap();

        let updated = reset_password(&db, "reset-2", "new".into()).await.unwrap();
        assert_eq!(updated.password_hash, "new");
        assert!(updated.reset_token.is_none());
        assert!(updated.reset_expires_at.is_none());

        let err = reset_password(&db, "reset-2", "newer".into()).await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "token", .. }));
    }
}
