use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;
use uuid::Uuid;

use super::SessionRegistry;
use crate::error::Error;

pub const SESSION_COOKIE: &str = "pawtrack_session";

/// Resolves the session cookie and injects the `Session` for handlers.
pub async fn auth_middleware(cookies: Cookies, mut request: Request, next: Next) -> Response {
    let registry = request.extensions().get::<SessionRegistry>().cloned();
    let token = cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<Uuid>().ok());

    if let (Some(registry), Some(token)) = (registry, token) {
        if let Some(session) = registry.get(token) {
            tracing::Span::current().record("user_id", tracing::field::display(session.user_id));
            request.extensions_mut().insert(session);
            return next.run(request).await;
        }
    }

    Error::Unauthenticated.into_response()
}
