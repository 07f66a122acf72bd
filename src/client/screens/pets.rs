use std::sync::Arc;

use futures::future::try_join_all;
use uuid::Uuid;

use super::NoticeBoard;
use crate::client::collaborators::{FeedingSource, ImagePicker, PetSource, PhotoUploader};
use crate::client::optimistic::{OptimisticList, SlotKey};
use crate::client::session::SessionContext;
use crate::error::Result;
use crate::records::{Draft, NewPet, Pet, PetPatch};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhotoSource {
    Library,
    Camera,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PetSummary {
    pub pet: Pet,
    pub feeding_count: usize,
}

/// The signed-in user's pets.
pub struct PetsScreen {
    session: SessionContext,
    pets: Arc<PetSource>,
    feeding: Arc<FeedingSource>,
    photos: Arc<dyn PhotoUploader>,
    list: OptimisticList<Pet>,
    notices: NoticeBoard,
}

impl PetsScreen {
    pub fn new(
        session: SessionContext,
        pets: Arc<PetSource>,
        feeding: Arc<FeedingSource>,
        photos: Arc<dyn PhotoUploader>,
    ) -> Self {
        Self {
            session,
            pets,
            feeding,
            photos,
            list: OptimisticList::new(),
            notices: NoticeBoard::default(),
        }
    }

    pub fn pets(&self) -> Vec<Pet> {
        self.list.snapshot()
    }

    pub fn notice(&self) -> Option<String> {
        self.notices.last()
    }

    pub async fn load(&self) -> Result<()> {
        let result = async {
            let user = self.session.require()?;
            let pets = self.pets.list_by_parent(user.id).await?;
            self.list.replace_all(pets);
            Ok(())
        }
        .await;
        self.notices.settle("load your pets", result)
    }

    /// The owner is taken from the session, whatever the draft says.
    pub async fn add(&self, mut draft: NewPet) -> Result<Pet> {
        let result = async {
            draft.owner_id = self.session.require()?.id;
            draft.check()?;
            self.list
                .create(draft.provisional(), self.pets.create(draft.clone()))
                .await
        }
        .await;
        self.notices.settle("add the pet", result)
    }

    pub async fn remove(&self, pet_id: Uuid) -> Result<()> {
        let result = self.list.delete(pet_id, self.pets.delete(pet_id)).await;
        self.notices.settle("remove the pet", result)
    }

    pub async fn update(&self, pet_id: Uuid, patch: PetPatch) -> Result<Pet> {
        let result = async {
            patch.validate()?;
            let pet = self.pets.update(pet_id, patch).await?;
            self.list.upsert(pet.clone());
            Ok(pet)
        }
        .await;
        self.notices.settle("update the pet", result)
    }

    /// Picks or captures a photo and uploads it. `Ok(None)` when the user
    /// cancels the picker.
    pub async fn attach_photo(
        &self,
        pet_id: Uuid,
        picker: &dyn ImagePicker,
        source: PhotoSource,
    ) -> Result<Option<Pet>> {
        let result: Result<Option<Pet>> = async {
            let picked = match source {
                PhotoSource::Library => picker.pick_from_library().await?,
                PhotoSource::Camera => picker.capture_from_camera().await?,
            };
            let Some(image) = picked else {
                return Ok(None);
            };
            let pet = self.photos.upload_pet_image(pet_id, image).await?;
            self.list.upsert(pet.clone());
            Ok(Some(pet))
        }
        .await;
        self.notices.settle("upload the photo", result)
    }

    /// Feeding schedule counts for every saved pet, read concurrently.
    pub async fn summaries(&self) -> Result<Vec<PetSummary>> {
        let pets: Vec<Pet> = self
            .list
            .entries()
            .into_iter()
            .filter(|e| matches!(e.key, SlotKey::Saved(_)))
            .map(|e| e.item)
            .collect();

        let result = try_join_all(pets.iter().map(|pet| self.feeding.list_by_parent(pet.id))).await;
        let counts = self.notices.settle("load feeding summaries", result)?;

        Ok(pets
            .into_iter()
            .zip(counts)
            .map(|(pet, schedules)| PetSummary {
                pet,
                feeding_count: schedules.len(),
            })
            .collect())
    }
}
