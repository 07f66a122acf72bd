pub mod middleware;
pub mod password;
pub mod session;

pub use middleware::{auth_middleware, SESSION_COOKIE};
pub use session::{Session, SessionRegistry, DEFAULT_SESSION_TTL};
