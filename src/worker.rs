//! Reminder delivery loop run by the `worker` binary.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::Instrument;

use crate::error::Result;
use crate::notifications::Mailer;
use crate::reminders::{QueuedReminder, ReminderQueue};
use crate::store::users;

/// Takes every reminder due at `now` and emails it to its owner. Returns how
/// many were delivered. A reminder whose delivery fails is dropped, not retried.
pub async fn deliver_due(
    db: &DatabaseConnection,
    queue: &dyn ReminderQueue,
    mailer: &Mailer,
    now: DateTime<Utc>,
) -> Result<usize> {
    let due = queue.take_due(now).await?;
    if due.is_empty() {
        return Ok(0);
    }
    tracing::info!("Delivering {} due reminders", due.len());

    let mut delivered = 0;
    for reminder in due {
        let span = tracing::info_span!(
            "deliver_reminder",
            reminder_id = %reminder.id,
            user_id = %reminder.user_id,
        );
        match deliver_one(db, mailer, &reminder).instrument(span).await {
            Ok(()) => {
                delivered += 1;
                crate::metrics::increment_reminders_delivered("sent");
            }
            Err(e) => {
                tracing::error!("Reminder {} not delivered: {}", reminder.id, e);
                crate::metrics::increment_reminders_delivered("failed");
            }
        }
    }
    Ok(delivered)
}

async fn deliver_one(db: &DatabaseConnection, mailer: &Mailer, reminder: &QueuedReminder) -> Result<()> {
    let user = users::find(db, reminder.user_id).await?;
    let at = reminder.at.format("%b %-d, %Y %H:%M UTC").to_string();
    mailer
        .send_reminder(&user.email, &reminder.title, &reminder.body, &at)
        .await
}

/// Polls the queue forever. Errors are logged and the next tick retries.
pub async fn run_reminder_loop(
    db: DatabaseConnection,
    queue: Arc<dyn ReminderQueue>,
    mailer: Mailer,
    poll: Duration,
) {
    tracing::info!("Reminder worker started, polling every {:?}", poll);
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = deliver_due(&db, queue.as_ref(), &mailer, Utc::now()).await {
            tracing::error!("Reminder poll failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminders::Reminder;
    use crate::test_support::{seed_user, test_db, MemoryReminderQueue};

    fn reminder(at: DateTime<Utc>, title: &str) -> Reminder {
        Reminder {
            at,
            title: title.into(),
            body: "Biscuit is due".into(),
        }
    }

    #[tokio::test]
    async fn delivers_only_due_reminders_to_the_owner() {
        let db = test_db().await;
        let user = seed_user(&db, "owner@example.com").await;
        let queue = MemoryReminderQueue::default();
        let mailer = Mailer::mock().unwrap();
        let now = Utc::now();

        queue
            .schedule(user, reminder(now - chrono::Duration::minutes(1), "Rabies booster"))
            .await
            .unwrap();
        queue
            .schedule(user, reminder(now + chrono::Duration::days(2), "Checkup"))
            .await
            .unwrap();

        let delivered = deliver_due(&db, &queue, &mailer, now).await.unwrap();
        assert_eq!(delivered, 1);

        let outbox = mailer.outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "owner@example.com");
        assert!(outbox[0].html.contains("Rabies booster"));

        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Checkup");
    }

    #[tokio::test]
    async fn reminder_for_unknown_user_is_dropped() {
        let db = test_db().await;
        let queue = MemoryReminderQueue::default();
        let mailer = Mailer::mock().unwrap();
        let now = Utc::now();

        queue
            .schedule(uuid::Uuid::new_v4(), reminder(now, "Orphan"))
            .await
            .unwrap();

        assert_eq!(deliver_due(&db, &queue, &mailer, now).await.unwrap(), 0);
        assert!(mailer.outbox().is_empty());
        assert!(queue.pending().is_empty());
    }
}
