use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::{Cookie, Cookies};

use super::ApiSettings;
use crate::auth::{password, Session, SessionRegistry, SESSION_COOKIE};
use crate::entities::user;
use crate::error::{Error, Result};
use crate::notifications::Mailer;
use crate::records::SessionUser;
use crate::store::users;

const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    token: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    email: String,
}

#[derive(Deserialize)]
pub struct ConfirmResetRequest {
    token: String,
    new_password: String,
}

#[derive(Deserialize)]
pub struct UpdateEmailRequest {
    new_email: String,
    current_password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    new_password: String,
    current_password: Option<String>,
}

fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn set_session_cookie(cookies: &Cookies, session: &Session) {
    let mut cookie = Cookie::new(SESSION_COOKIE, session.token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookies.add(cookie);
}

fn clear_session_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookies.remove(cookie);
}

// Mail goes out in the background; a failed send must not fail the request
fn spawn_verification_mail(mailer: &Mailer, settings: &ApiSettings, user: &user::Model) {
    let Some(token) = user.verification_token.clone() else {
        return;
    };
    let link = format!("{}/auth/verify?token={}", settings.public_base_url, token);
    let mailer = mailer.clone();
    let to = user.email.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_verification(&to, &link).await {
            tracing::warn!("Verification email to {} failed: {}", to, e);
        }
    });
}

pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Extension(sessions): Extension<SessionRegistry>,
    Extension(mailer): Extension<Mailer>,
    Extension(settings): Extension<ApiSettings>,
    cookies: Cookies,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse> {
    password::validate_email(&payload.email)?;
    password::validate_password(&payload.password)?;

    let password_hash = password::hash_password(&payload.password)?;
    let user = match users::create(&db, &payload.email, password_hash, new_token()).await {
        Ok(user) => user,
        Err(e) => {
            tracing::Span::current()
                .record("table", "users")
                .record("action", "register_user_failed");
            return Err(e);
        }
    };

    let session = sessions.open(&user);
    set_session_cookie(&cookies, &session);
    spawn_verification_mail(&mailer, &settings, &user);

    tracing::Span::current()
        .record("table", "users")
        .record("action", "register_user")
        .record("user_id", tracing::field::display(user.id))
        .record("business_event", "User registered successfully");
    crate::metrics::increment_users_registered();

    Ok((StatusCode::CREATED, Json(session.user())))
}

pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(sessions): Extension<SessionRegistry>,
    cookies: Cookies,
    Json(payload): Json<Credentials>,
) -> Result<Json<SessionUser>> {
    let user = users::find_by_email(&db, &payload.email)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !password::verify_password(&payload.password, &user.password_hash)? {
        tracing::Span::current()
            .record("table", "users")
            .record("action", "login_user_failed");
        return Err(Error::InvalidCredentials);
    }

    let session = sessions.open(&user);
    set_session_cookie(&cookies, &session);

    tracing::Span::current()
        .record("table", "users")
        .record("action", "login_user")
        .record("user_id", tracing::field::display(user.id))
        .record("business_event", "User logged in successfully");

    Ok(Json(session.user()))
}

pub async fn logout(
    Extension(sessions): Extension<SessionRegistry>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> StatusCode {
    sessions.close(session.token);
    clear_session_cookie(&cookies);
    tracing::Span::current()
        .record("table", "users")
        .record("action", "logout_user");
    StatusCode::NO_CONTENT
}

pub async fn current_session(Extension(session): Extension<Session>) -> Json<SessionUser> {
    Json(session.user())
}

pub async fn verify_email(
    Extension(db): Extension<DatabaseConnection>,
    Extension(sessions): Extension<SessionRegistry>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<SessionUser>> {
    complete_verification(&db, &sessions, &payload.token).await
}

/// Target of the emailed verification link.
pub async fn verify_email_link(
    Extension(db): Extension<DatabaseConnection>,
    Extension(sessions): Extension<SessionRegistry>,
    Query(query): Query<TokenRequest>,
) -> Result<Json<SessionUser>> {
    complete_verification(&db, &sessions, &query.token).await
}

async fn complete_verification(
    db: &DatabaseConnection,
    sessions: &SessionRegistry,
    token: &str,
) -> Result<Json<SessionUser>> {
    let user = users::verify(db, token)
        .await?
        .ok_or_else(|| Error::validation("token", "verification link is invalid"))?;
    sessions.sync_user(&user);

    tracing::Span::current()
        .record("table", "users")
        .record("action", "verify_email")
        .record("user_id", tracing::field::display(user.id));

    Ok(Json(SessionUser {
        id: user.id,
        email: user.email,
        verified: user.verified,
    }))
}

/// Always 202, whether or not the address has an account.
pub async fn send_password_reset(
    Extension(db): Extension<DatabaseConnection>,
    Extension(mailer): Extension<Mailer>,
    Extension(settings): Extension<ApiSettings>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse> {
    password::validate_email(&payload.email)?;

    if let Some(user) = users::find_by_email(&db, &payload.email).await? {
        let token = new_token();
        let expires_at =
            crate::store::now() + chrono::Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        let user = users::set_reset_token(&db, user, token.clone(), expires_at).await?;

        let link = format!("{}/reset-password?token={}", settings.app_base_url, token);
        tokio::spawn(async move {
            if let Err(e) = mailer.send_password_reset(&user.email, &link).await {
                tracing::warn!("Password reset email to {} failed: {}", user.email, e);
            }
        });
    }

    tracing::Span::current()
        .record("table", "users")
        .record("action", "password_reset_requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({"message": "If the address has an account, a reset link is on its way"})),
    ))
}

pub async fn confirm_password_reset(
    Extension(db): Extension<DatabaseConnection>,
    Extension(sessions): Extension<SessionRegistry>,
    Json(payload): Json<ConfirmResetRequest>,
) -> Result<StatusCode> {
    password::validate_password(&payload.new_password)?;
    let hash = password::hash_password(&payload.new_password)?;
    let user = users::reset_password(&db, &payload.token, hash).await?;

    let closed = sessions.close_user(user.id);
    tracing::info!("Password reset for user {}, closed {} sessions", user.id, closed);

    Ok(StatusCode::NO_CONTENT)
}

/// Credential changes need a fresh login or the current password.
async fn ensure_recent_login(
    db: &DatabaseConnection,
    sessions: &SessionRegistry,
    settings: &ApiSettings,
    session: &Session,
    current_password: Option<&str>,
) -> Result<()> {
    match current_password {
        Some(current) => {
            let user = users::find(db, session.user_id).await?;
            if !password::verify_password(current, &user.password_hash)? {
                return Err(Error::InvalidCredentials);
            }
            sessions.reauthenticate(session.token);
            Ok(())
        }
        None if session.is_recent(settings.recent_login_window) => Ok(()),
        None => Err(Error::RecentLoginRequired),
    }
}

pub async fn update_email(
    Extension(db): Extension<DatabaseConnection>,
    Extension(sessions): Extension<SessionRegistry>,
    Extension(mailer): Extension<Mailer>,
    Extension(settings): Extension<ApiSettings>,
    Extension(session): Extension<Session>,
    Json(payload): Json<UpdateEmailRequest>,
) -> Result<Json<SessionUser>> {
    password::validate_email(&payload.new_email)?;
    ensure_recent_login(
        &db,
        &sessions,
        &settings,
        &session,
        payload.current_password.as_deref(),
    )
    .await?;

    let user = users::update_email(&db, session.user_id, &payload.new_email, new_token()).await?;
    sessions.sync_user(&user);
    spawn_verification_mail(&mailer, &settings, &user);

    tracing::Span::current()
        .record("table", "users")
        .record("action", "update_email")
        .record("business_event", "User changed email");

    Ok(Json(SessionUser {
        id: user.id,
        email: user.email,
        verified: user.verified,
    }))
}

pub async fn update_password(
    Extension(db): Extension<DatabaseConnection>,
    Extension(sessions): Extension<SessionRegistry>,
    Extension(settings): Extension<ApiSettings>,
    Extension(session): Extension<Session>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<StatusCode> {
    password::validate_password(&payload.new_password)?;
    ensure_recent_login(
        &db,
        &sessions,
        &settings,
        &session,
        payload.current_password.as_deref(),
    )
    .await?;

    let hash = password::hash_password(&payload.new_password)?;
    users::update_password_hash(&db, session.user_id, hash).await?;
    let closed = sessions.close_user_except(session.user_id, session.token);
    tracing::info!("Password changed for user {}, closed {} other sessions", session.user_id, closed);

    tracing::Span::current()
        .record("table", "users")
        .record("action", "update_password");

    Ok(StatusCode::NO_CONTENT)
}
