pub mod mailer;
pub mod templates;

pub use mailer::{Mailer, SentMail};
pub use templates::NotificationTemplates;
