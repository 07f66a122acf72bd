//! Shared fixtures for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::error::Result;
use crate::migrator::Migrator;
use crate::notifications::Mailer;
use crate::reminders::{QueuedReminder, Reminder, ReminderQueue};
use crate::store::users;

/// Fresh in-memory SQLite database with every migration applied.
pub async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn seed_user(db: &DatabaseConnection, email: &str) -> Uuid {
    users::create(db, email, "not-a-real-hash".into(), Uuid::new_v4().to_string())
        .await
        .unwrap()
        .id
}

/// Waits until a mock mailer holds `count` mails. Mail goes out from
/// spawned tasks, which run once the test yields.
pub async fn wait_for_mail(mailer: &Mailer, count: usize) {
    for _ in 0..100 {
        if mailer.outbox().len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
}

/// The button link of a rendered account email.
pub fn emailed_link(html: &str) -> String {
    let start = html.find("href=\"").expect("mail has a link") + "href=\"".len();
    let len = html[start..].find('"').expect("link is closed");
    html[start..start + len].to_string()
}

/// The `token` query value of an emailed link.
pub fn link_token(link: &str) -> String {
    link.split("token=").nth(1).expect("link has a token").to_string()
}

/// Reminder queue kept in memory, for handlers and the worker loop.
#[derive(Default)]
pub struct MemoryReminderQueue {
    pending: Mutex<Vec<QueuedReminder>>,
}

impl MemoryReminderQueue {
    pub fn pending(&self) -> Vec<QueuedReminder> {
        self.pending.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderQueue for MemoryReminderQueue {
    async fn schedule(&self, user_id: Uuid, reminder: Reminder) -> Result<QueuedReminder> {
        let queued = QueuedReminder::new(user_id, reminder);
        self.pending.lock().unwrap().push(queued.clone());
        Ok(queued)
    }

    async fn cancel_all(&self, user_id: Uuid) -> Result<usize> {
        let mut pending = self.pending.lock().unwrap();
        let before = pending.len();
        pending.retain(|r| r.user_id != user_id);
        Ok(before - pending.len())
    }

    async fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<QueuedReminder>> {
        let mut pending = self.pending.lock().unwrap();
        let (due, rest): (Vec<_>, Vec<_>) = pending.drain(..).partition(|r| r.at <= now);
        *pending = rest;
        Ok(due)
    }
}
