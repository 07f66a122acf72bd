use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::records::SessionUser;

/// The signed-in user as the client sees it. One per `ApiClient`, handed to
/// every screen. Only the client's auth calls write to it.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<SessionUser>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn require(&self) -> Result<SessionUser> {
        self.current().ok_or(Error::Unauthenticated)
    }

    pub(crate) fn set(&self, user: SessionUser) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub(crate) fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
