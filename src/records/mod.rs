//! Typed records shared by the HTTP API and the client.
//!
//! Each collection has a stored record (`Pet`, `FeedingSchedule`, ...), a
//! draft used to create one (`NewPet`, ...) and a patch for partial updates.
//! Drafts and patches are validated before anything reaches a backend.

mod feeding;
mod health;
mod pet;
mod user;
mod vet;

pub use feeding::{parse_time, FeedingSchedule, FeedingSchedulePatch, Frequency, NewFeedingSchedule};
pub use health::{HealthRecord, HealthRecordKind, HealthRecordPatch, NewHealthRecord};
pub use pet::{NewPet, Pet, PetPatch};
pub use user::SessionUser;
pub use vet::{search_clinics, NewVetClinic, VetClinic};

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A stored record that lives in a list scoped by its parent.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const RESOURCE: &'static str;
    /// Name of the parent the list is scoped by, used in missing-parent errors.
    const PARENT: &'static str;

    fn id(&self) -> Uuid;

    /// Foreign key the record's list is scoped by (owner for pets, pet otherwise).
    fn parent_id(&self) -> Uuid;
}

/// Form state for a record that does not exist yet.
pub trait Draft: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Output: Record;

    fn parent_id(&self) -> Uuid;

    fn validate(&self) -> Result<()>;

    /// Local stand-in shown until the backend assigns an ID.
    fn provisional(&self) -> Self::Output;

    /// Validation plus the missing-parent guard, run before any backend call.
    fn check(&self) -> Result<()> {
        if self.parent_id().is_nil() {
            return Err(Error::MissingParent {
                resource: Self::Output::RESOURCE,
                parent: Self::Output::PARENT,
            });
        }
        self.validate()
    }
}

pub(crate) fn required_text(field: &'static str, value: &str, max: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > max {
        return Err(Error::validation(field, format!("must be at most {max} characters")));
    }
    Ok(())
}

pub(crate) fn optional_text(field: &'static str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(Error::validation(
            field,
            format!("must be at most {max} characters"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_before_checking() {
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", " Rex ", 10).is_ok());
        assert!(required_text("name", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn drafts_without_parent_fail_before_validation() {
        let draft = NewFeedingSchedule {
            pet_id: Uuid::nil(),
            food_type: String::new(),
            amount: "200g".into(),
            time: "08:00 AM".into(),
            frequency: Frequency::Daily,
            notes: None,
        };
        assert!(matches!(
            draft.check(),
            Err(Error::MissingParent { parent: "pet", .. })
        ));
    }
}
