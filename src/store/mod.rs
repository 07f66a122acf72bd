//! Scoped data access, one module per collection.
//!
//! Every list operation filters on the record's foreign key; backend errors
//! come back as `Error::Database` without further interpretation.

pub mod feeding;
pub mod health;
pub mod pets;
pub mod users;
pub mod vets;

pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
