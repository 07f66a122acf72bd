pub mod auth;
pub mod feeding;
pub mod health;
pub mod pet;
pub mod reminders;
pub mod vets;

use std::{sync::Arc, time::Duration};

use axum::{
    routing::{get, patch, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::{auth_middleware, Session, SessionRegistry};
use crate::error::{Error, Result};
use crate::images::{ImageStore, MAX_IMAGE_BYTES};
use crate::notifications::Mailer;
use crate::records::Pet;
use crate::reminders::ReminderQueue;
use crate::store;

/// Settings handlers read at request time.
///
/// Verification links open this API (`public_base_url`); reset links open
/// the app (`app_base_url`), which asks for the new password.
#[derive(Clone, Debug)]
pub struct ApiSettings {
    pub public_base_url: String,
    pub app_base_url: String,
    pub recent_login_window: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8000".into(),
            app_base_url: "pawtrack://app".into(),
            recent_login_window: Duration::from_secs(300),
        }
    }
}

pub type SharedReminders = Arc<dyn ReminderQueue>;
pub type SharedImages = Option<Arc<dyn ImageStore>>;

/// Everything the router hands to handlers as extensions.
#[derive(Clone)]
pub struct Services {
    pub db: DatabaseConnection,
    pub sessions: SessionRegistry,
    pub mailer: Mailer,
    pub reminders: SharedReminders,
    pub images: SharedImages,
    pub settings: ApiSettings,
}

async fn health_check() -> &'static str {
    "OK"
}

/// API routes with their extensions. Cookie handling is included; tracing,
/// CORS and metrics layers are added by the server binary.
pub fn router(services: Services) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/verify",
            get(auth::verify_email_link).post(auth::verify_email),
        )
        .route("/auth/password-reset", post(auth::send_password_reset))
        .route(
            "/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        );

    let protected_routes = Router::new()
        .route("/auth/session", get(auth::current_session))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/email", patch(auth::update_email))
        .route("/auth/password", patch(auth::update_password))
        .route("/pets", get(pet::list_pets).post(pet::create_pet))
        .route(
            "/pets/:id",
            get(pet::get_pet)
                .patch(pet::update_pet)
                .delete(pet::delete_pet),
        )
        .route("/pets/:id/image", post(pet::upload_image))
        .route(
            "/pets/:id/feeding-schedules",
            get(feeding::list_feeding_schedules),
        )
        .route("/feeding-schedules", post(feeding::create_feeding_schedule))
        .route(
            "/feeding-schedules/:id",
            patch(feeding::update_feeding_schedule).delete(feeding::delete_feeding_schedule),
        )
        .route("/pets/:id/health-records", get(health::list_health_records))
        .route("/health-records", post(health::create_health_record))
        .route(
            "/health-records/:id",
            patch(health::update_health_record).delete(health::delete_health_record),
        )
        .route("/vets", get(vets::list_vets).post(vets::create_vet))
        .route(
            "/reminders",
            post(reminders::schedule_reminder).delete(reminders::cancel_reminders),
        )
        .route_layer(axum::middleware::from_fn(auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(Extension(services.db))
        .layer(Extension(services.sessions))
        .layer(Extension(services.mailer))
        .layer(Extension(services.reminders))
        .layer(Extension(services.images))
        .layer(Extension(services.settings))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(axum::extract::DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024))
}

/// Loads a pet and checks it belongs to the session user.
pub(crate) async fn owned_pet(db: &DatabaseConnection, session: &Session, pet_id: Uuid) -> Result<Pet> {
    let pet = store::pets::find(db, pet_id).await?;
    if pet.owner_id != session.user_id {
        return Err(Error::Forbidden { resource: "Pet" });
    }
    tracing::Span::current().record("pet_id", tracing::field::display(pet.id));
    Ok(pet)
}

#[cfg(test)]
mod tests;
