use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{multipart, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::collaborators::{Notifier, PhotoUploader, PickedImage, RecordSource, VetDirectory};
use super::session::SessionContext;
use crate::auth::password;
use crate::error::{Error, Result};
use crate::images::image_content_type;
use crate::records::{
    Draft, FeedingSchedule, FeedingSchedulePatch, HealthRecord, HealthRecordPatch,
    NewFeedingSchedule, NewHealthRecord, NewPet, Pet, PetPatch, Record, SessionUser, VetClinic,
};
use crate::reminders::Reminder;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

/// Maps a non-success answer onto the crate error.
pub(crate) fn api_error(status: StatusCode, body: &str) -> Error {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let code = parsed.as_ref().map(|b| b.code.as_str()).unwrap_or("");

    if code == "recent_login_required" {
        return Error::RecentLoginRequired;
    }
    if status == StatusCode::UNAUTHORIZED && (code.is_empty() || code == "unauthenticated") {
        return Error::Unauthenticated;
    }

    match parsed {
        Some(body) => Error::Api {
            status: status.as_u16(),
            code: body.code,
            message: body.error,
        },
        None => Error::Api {
            status: status.as_u16(),
            code: "unknown".into(),
            message: status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string(),
        },
    }
}

/// Typed client for the PawTrack HTTP API. Keeps the session cookie and the
/// `SessionContext` in step.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: SessionContext::new(),
        })
    }

    pub fn session(&self) -> SessionContext {
        self.session.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = api_error(status, &body);
        if matches!(err, Error::Unauthenticated) {
            self.session.clear();
        }
        tracing::debug!("API answered {}: {}", status, err);
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.execute(request).await?.json::<T>().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.fetch(self.http.post(self.url(path)).json(body)).await
    }

    // Auth

    pub async fn register(&self, email: &str, password: &str) -> Result<SessionUser> {
        password::validate_email(email)?;
        password::validate_password(password)?;
        let user: SessionUser = self
            .post_json("/auth/register", &json!({"email": email, "password": password}))
            .await?;
        self.session.set(user.clone());
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser> {
        password::validate_email(email)?;
        let user: SessionUser = self
            .post_json("/auth/login", &json!({"email": email, "password": password}))
            .await?;
        self.session.set(user.clone());
        Ok(user)
    }

    /// Clears the local session even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self.execute(self.http.post(self.url("/auth/logout"))).await;
        self.session.clear();
        result.map(|_| ())
    }

    /// Re-reads the session from the server, e.g. at start-up.
    pub async fn refresh_session(&self) -> Result<Option<SessionUser>> {
        match self.fetch::<SessionUser>(self.http.get(self.url("/auth/session"))).await {
            Ok(user) => {
                self.session.set(user.clone());
                Ok(Some(user))
            }
            Err(Error::Unauthenticated) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        password::validate_email(email)?;
        self.execute(
            self.http
                .post(self.url("/auth/password-reset"))
                .json(&json!({ "email": email })),
        )
        .await?;
        Ok(())
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        password::validate_password(new_password)?;
        self.execute(
            self.http
                .post(self.url("/auth/password-reset/confirm"))
                .json(&json!({"token": token, "new_password": new_password})),
        )
        .await?;
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> Result<SessionUser> {
        let user: SessionUser = self.post_json("/auth/verify", &json!({ "token": token })).await?;
        if self.session.current().is_some_and(|s| s.id == user.id) {
            self.session.set(user.clone());
        }
        Ok(user)
    }

    /// Needs a signed-in session. Pass `current_password` when the login is
    /// no longer recent; otherwise the server answers `RecentLoginRequired`.
    pub async fn update_email(
        &self,
        new_email: &str,
        current_password: Option<&str>,
    ) -> Result<SessionUser> {
        self.session.require()?;
        password::validate_email(new_email)?;
        let user: SessionUser = self
            .fetch(self.http.patch(self.url("/auth/email")).json(&json!({
                "new_email": new_email,
                "current_password": current_password,
            })))
            .await?;
        self.session.set(user.clone());
        Ok(user)
    }

    pub async fn update_password(
        &self,
        new_password: &str,
        current_password: Option<&str>,
    ) -> Result<()> {
        self.session.require()?;
        password::validate_password(new_password)?;
        self.execute(self.http.patch(self.url("/auth/password")).json(&json!({
            "new_password": new_password,
            "current_password": current_password,
        })))
        .await?;
        Ok(())
    }
}

fn require_parent<R: Record>(parent_id: Uuid) -> Result<()> {
    if parent_id.is_nil() {
        return Err(Error::MissingParent {
            resource: R::RESOURCE,
            parent: R::PARENT,
        });
    }
    Ok(())
}

#[async_trait]
impl RecordSource<Pet> for ApiClient {
    type Draft = NewPet;
    type Patch = PetPatch;

    async fn create(&self, draft: NewPet) -> Result<Pet> {
        draft.check()?;
        self.post_json("/pets", &draft).await
    }

    async fn list_by_parent(&self, owner_id: Uuid) -> Result<Vec<Pet>> {
        require_parent::<Pet>(owner_id)?;
        let mut pets: Vec<Pet> = self.fetch(self.http.get(self.url("/pets"))).await?;
        pets.retain(|p| p.owner_id == owner_id);
        Ok(pets)
    }

    async fn update(&self, id: Uuid, patch: PetPatch) -> Result<Pet> {
        patch.validate()?;
        self.fetch(self.http.patch(self.url(&format!("/pets/{id}"))).json(&patch))
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.execute(self.http.delete(self.url(&format!("/pets/{id}"))))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordSource<FeedingSchedule> for ApiClient {
    type Draft = NewFeedingSchedule;
    type Patch = FeedingSchedulePatch;

    async fn create(&self, draft: NewFeedingSchedule) -> Result<FeedingSchedule> {
        draft.check()?;
        self.post_json("/feeding-schedules", &draft).await
    }

    async fn list_by_parent(&self, pet_id: Uuid) -> Result<Vec<FeedingSchedule>> {
        require_parent::<FeedingSchedule>(pet_id)?;
        self.fetch(
            self.http
                .get(self.url(&format!("/pets/{pet_id}/feeding-schedules"))),
        )
        .await
    }

    async fn update(&self, id: Uuid, patch: FeedingSchedulePatch) -> Result<FeedingSchedule> {
        patch.validate()?;
        self.fetch(
            self.http
                .patch(self.url(&format!("/feeding-schedules/{id}")))
                .json(&patch),
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.execute(self.http.delete(self.url(&format!("/feeding-schedules/{id}"))))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordSource<HealthRecord> for ApiClient {
    type Draft = NewHealthRecord;
    type Patch = HealthRecordPatch;

    async fn create(&self, draft: NewHealthRecord) -> Result<HealthRecord> {
        draft.check()?;
        self.post_json("/health-records", &draft).await
    }

    async fn list_by_parent(&self, pet_id: Uuid) -> Result<Vec<HealthRecord>> {
        require_parent::<HealthRecord>(pet_id)?;
        self.fetch(self.http.get(self.url(&format!("/pets/{pet_id}/health-records"))))
            .await
    }

    async fn update(&self, id: Uuid, patch: HealthRecordPatch) -> Result<HealthRecord> {
        patch.validate()?;
        self.fetch(
            self.http
                .patch(self.url(&format!("/health-records/{id}")))
                .json(&patch),
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.execute(self.http.delete(self.url(&format!("/health-records/{id}"))))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VetDirectory for ApiClient {
    async fn list_by_district(&self, district: &str) -> Result<Vec<VetClinic>> {
        self.fetch(
            self.http
                .get(self.url("/vets"))
                .query(&[("district", district)]),
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<VetClinic>> {
        self.fetch(self.http.get(self.url("/vets"))).await
    }
}

#[async_trait]
impl Notifier for ApiClient {
    async fn schedule_at(&self, at: DateTime<Utc>, title: &str, body: &str) -> Result<()> {
        let reminder = Reminder {
            at,
            title: title.to_string(),
            body: body.to_string(),
        };
        self.execute(self.http.post(self.url("/reminders")).json(&reminder))
            .await?;
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        self.execute(self.http.delete(self.url("/reminders"))).await?;
        Ok(())
    }
}

#[async_trait]
impl PhotoUploader for ApiClient {
    async fn upload_pet_image(&self, pet_id: Uuid, image: PickedImage) -> Result<Pet> {
        let content_type = image_content_type(&image.file_name)?;
        let part = multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&content_type)?;
        let form = multipart::Form::new().part("image", part);
        self.fetch(
            self.http
                .post(self.url(&format!("/pets/{pet_id}/image")))
                .multipart(form),
        )
        .await
    }
}
