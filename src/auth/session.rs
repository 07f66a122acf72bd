use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::user;
use crate::records::SessionUser;

/// How long a session lives after login unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// An authenticated session, resolved per request and handed to handlers.
#[derive(Clone, Debug)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub verified: bool,
    pub authenticated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.user_id,
            email: self.email.clone(),
            verified: self.verified,
        }
    }

    /// Whether the password was proven within `window`.
    pub fn is_recent(&self, window: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.authenticated_at);
        age.to_std().map(|age| age <= window).unwrap_or(true)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Live sessions keyed by the token stored in the session cookie. Expired
/// sessions are refused on lookup and swept out whenever a new one opens.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Session>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Session>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self, user: &user::Model) -> Session {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = Session {
            token: Uuid::new_v4(),
            user_id: user.id,
            email: user.email.clone(),
            verified: user.verified,
            authenticated_at: now,
            expires_at,
        };

        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::debug!("Swept {} expired sessions", swept);
        }
        sessions.insert(session.token, session.clone());
        session
    }

    pub fn get(&self, token: Uuid) -> Option<Session> {
        let session = self.read().get(&token).cloned()?;
        if session.is_expired(Utc::now()) {
            self.write().remove(&token);
            return None;
        }
        Some(session)
    }

    pub fn close(&self, token: Uuid) -> Option<Session> {
        self.write().remove(&token)
    }

    /// Ends every session of a user, e.g. after a password reset.
    pub fn close_user(&self, user_id: Uuid) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }

    /// Ends the user's other sessions, keeping the one at `keep`.
    pub fn close_user_except(&self, user_id: Uuid, keep: Uuid) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|token, s| s.user_id != user_id || *token == keep);
        before - sessions.len()
    }

    /// Sessions held in memory, expired ones not yet swept included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reauthenticate(&self, token: Uuid) {
        if let Some(session) = self.write().get_mut(&token) {
            session.authenticated_at = Utc::now();
        }
    }

    /// Pushes account changes (email, verification) into every open session.
    pub fn sync_user(&self, user: &user::Model) {
        let mut sessions = self.write();
        for session in sessions.values_mut().filter(|s| s.user_id == user.id) {
            session.email = user.email.clone();
            session.verified = user.verified;
        }
    }
}
