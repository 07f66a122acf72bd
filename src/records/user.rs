use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed-in user as seen by the rest of the app.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
}
