pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod entities;
pub mod error;
pub mod images;
pub mod metrics;
pub mod migrator;
pub mod notifications;
pub mod records;
pub mod reminders;
pub mod store;
pub mod telemetry;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
pub use redis;
pub use sea_orm;
