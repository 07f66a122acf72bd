//! Per-feature state holders. Each screen loads its own list, applies
//! changes optimistically and keeps the last failure as a user notice.

mod feeding;
mod health;
mod pets;
mod vets;

#[cfg(test)]
mod fakes;

pub use feeding::FeedingScreen;
pub use health::{reminder_time, HealthScreen, DEFAULT_LEAD_DAYS};
pub use pets::{PetSummary, PetsScreen, PhotoSource};
pub use vets::VetsScreen;

use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

/// Holds the message of the last failed action until the next success.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    last: Mutex<Option<String>>,
}

impl NoticeBoard {
    pub fn last(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, notice: Option<String>) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = notice;
    }

    /// Records the outcome of `action` and passes the result through.
    pub(crate) fn settle<T>(&self, action: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.set(None),
            Err(err) => {
                tracing::warn!("Failed to {}: {}", action, err);
                self.set(Some(notice_for(action, err)));
            }
        }
        result
    }
}

fn notice_for(action: &str, err: &Error) -> String {
    match err {
        Error::Validation { .. }
        | Error::MissingParent { .. }
        | Error::Unauthenticated
        | Error::RecentLoginRequired
        | Error::MutationInProgress => err.user_message(),
        _ => format!("Failed to {action}. Please try again."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_failures_get_a_generic_notice() {
        let board = NoticeBoard::default();
        let result: Result<()> = board.settle(
            "add the pet",
            Err(Error::Api {
                status: 500,
                code: "internal".into(),
                message: "db down".into(),
            }),
        );
        assert!(result.is_err());
        assert_eq!(board.last().unwrap(), "Failed to add the pet. Please try again.");

        board.settle("add the pet", Ok(())).unwrap();
        assert!(board.last().is_none());
    }

    #[test]
    fn input_problems_are_shown_as_is() {
        let board = NoticeBoard::default();
        let _ = board.settle::<()>("add the pet", Err(Error::validation("name", "must not be empty")));
        assert_eq!(board.last().unwrap(), "Invalid name: must not be empty");
    }
}
