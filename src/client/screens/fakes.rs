//! In-memory collaborators for screen tests.

use std::{
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::client::collaborators::{
    ImagePicker, Notifier, PhotoUploader, PickedImage, RecordSource, VetDirectory,
};
use crate::error::{Error, Result};
use crate::records::{Draft, Pet, Record, SessionUser, VetClinic};

pub fn backend_down() -> Error {
    Error::Api {
        status: 503,
        code: "unavailable".into(),
        message: "Service unavailable".into(),
    }
}

pub fn signed_in() -> (crate::client::SessionContext, SessionUser) {
    let session = crate::client::SessionContext::new();
    let user = SessionUser {
        id: Uuid::new_v4(),
        email: "owner@example.com".into(),
        verified: true,
    };
    session.set(user.clone());
    (session, user)
}

/// Stores records in a vector. Patches are merged field by field through
/// their JSON form; an explicit `null` clears the field.
pub struct FakeSource<D: Draft, P> {
    pub items: Mutex<Vec<D::Output>>,
    pub failing: AtomicBool,
    pub calls: AtomicUsize,
    _patch: PhantomData<fn(P)>,
}

impl<D: Draft, P> Default for FakeSource<D, P> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            _patch: PhantomData,
        }
    }
}

impl<D: Draft, P> FakeSource<D, P> {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_down());
        }
        Ok(())
    }
}

#[async_trait]
impl<D, P> RecordSource<D::Output> for FakeSource<D, P>
where
    D: Draft,
    P: Serialize + Send + Sync + 'static,
{
    type Draft = D;
    type Patch = P;

    async fn create(&self, draft: D) -> Result<D::Output> {
        self.enter()?;
        let mut value = serde_json::to_value(draft.provisional()).unwrap();
        value["id"] = json!(Uuid::new_v4());
        let record: D::Output = serde_json::from_value(value).unwrap();
        self.items.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_by_parent(&self, parent_id: Uuid) -> Result<Vec<D::Output>> {
        self.enter()?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.parent_id() == parent_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, patch: P) -> Result<D::Output> {
        self.enter()?;
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::not_found(D::Output::RESOURCE, id))?;

        let mut value = serde_json::to_value(&*item).unwrap();
        if let Value::Object(fields) = serde_json::to_value(&patch).unwrap() {
            for (key, field) in fields {
                value[key] = field;
            }
        }
        *item = serde_json::from_value(value).unwrap();
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.enter()?;
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|r| r.id() != id);
        if items.len() == before {
            return Err(Error::not_found(D::Output::RESOURCE, id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub scheduled: Mutex<Vec<(DateTime<Utc>, String)>>,
    pub cancelled: AtomicUsize,
    pub failing: AtomicBool,
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn schedule_at(&self, at: DateTime<Utc>, title: &str, _body: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_down());
        }
        self.scheduled.lock().unwrap().push((at, title.to_string()));
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        self.scheduled.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    pub clinics: Vec<VetClinic>,
    pub failing: AtomicBool,
}

#[async_trait]
impl VetDirectory for FakeDirectory {
    async fn list_by_district(&self, district: &str) -> Result<Vec<VetClinic>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_down());
        }
        Ok(self
            .clinics
            .iter()
            .filter(|c| c.district == district)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<VetClinic>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_down());
        }
        Ok(self.clinics.clone())
    }
}

/// Returns the same picked image (or cancellation) from both sources.
pub struct FakePicker(pub Option<PickedImage>);

#[async_trait]
impl ImagePicker for FakePicker {
    async fn pick_from_library(&self) -> Result<Option<PickedImage>> {
        Ok(self.0.clone())
    }

    async fn capture_from_camera(&self) -> Result<Option<PickedImage>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct FakeUploader {
    pub uploads: AtomicUsize,
    pub pets: Mutex<Vec<Pet>>,
}

#[async_trait]
impl PhotoUploader for FakeUploader {
    async fn upload_pet_image(&self, pet_id: Uuid, image: PickedImage) -> Result<Pet> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let mut pets = self.pets.lock().unwrap();
        let pet = pets
            .iter_mut()
            .find(|p| p.id == pet_id)
            .ok_or_else(|| Error::not_found("Pet", pet_id))?;
        pet.image_url = Some(format!("https://images.test/{}", image.file_name));
        Ok(pet.clone())
    }
}
