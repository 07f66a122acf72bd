//! Client-side data layer: a typed HTTP client, the session context it
//! maintains, and screen state built on optimistic list updates.

pub mod collaborators;
pub mod http;
pub mod optimistic;
pub mod screens;
pub mod session;

pub use collaborators::{
    FeedingSource, HealthSource, ImagePicker, Notifier, PetSource, PhotoUploader, PickedImage,
    RecordSource, VetDirectory,
};
pub use http::ApiClient;
pub use optimistic::{OptimisticList, SlotKey, TempId};
pub use session::SessionContext;
