//! Contracts the screens talk to. `ApiClient` implements the backend ones;
//! the image picker is supplied by the embedding app.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::records::{
    Draft, FeedingSchedule, FeedingSchedulePatch, HealthRecord, HealthRecordPatch,
    NewFeedingSchedule, NewHealthRecord, NewPet, Pet, PetPatch, Record, VetClinic,
};

/// CRUD over one collection, scoped by the record's parent.
#[async_trait]
pub trait RecordSource<R: Record>: Send + Sync {
    type Draft: Draft<Output = R>;
    type Patch: Serialize + Send + Sync + 'static;

    /// Stores the draft and returns the record with its assigned ID.
    async fn create(&self, draft: Self::Draft) -> Result<R>;

    async fn list_by_parent(&self, parent_id: Uuid) -> Result<Vec<R>>;

    async fn update(&self, id: Uuid, patch: Self::Patch) -> Result<R>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

pub type PetSource = dyn RecordSource<Pet, Draft = NewPet, Patch = PetPatch>;
pub type FeedingSource =
    dyn RecordSource<FeedingSchedule, Draft = NewFeedingSchedule, Patch = FeedingSchedulePatch>;
pub type HealthSource =
    dyn RecordSource<HealthRecord, Draft = NewHealthRecord, Patch = HealthRecordPatch>;

#[async_trait]
pub trait VetDirectory: Send + Sync {
    async fn list_by_district(&self, district: &str) -> Result<Vec<VetClinic>>;

    async fn list_all(&self) -> Result<Vec<VetClinic>>;
}

/// Local notifications for the signed-in user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn schedule_at(&self, at: DateTime<Utc>, title: &str, body: &str) -> Result<()>;

    async fn cancel_all(&self) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `Ok(None)` means the user backed out of the picker.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn pick_from_library(&self) -> Result<Option<PickedImage>>;

    async fn capture_from_camera(&self) -> Result<Option<PickedImage>>;
}

#[async_trait]
pub trait PhotoUploader: Send + Sync {
    async fn upload_pet_image(&self, pet_id: Uuid, image: PickedImage) -> Result<Pet>;
}
