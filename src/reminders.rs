//! Server-side reminder queue backing the notification contract
//! (`schedule_at`, `cancel_all`). The worker drains due reminders.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

const DUE_KEY: &str = "reminders:due";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

impl Reminder {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title", "must not be empty"));
        }
        if self.at <= now {
            return Err(Error::validation("at", "must be in the future"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueuedReminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

impl QueuedReminder {
    pub fn new(user_id: Uuid, reminder: Reminder) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            at: reminder.at,
            title: reminder.title,
            body: reminder.body,
        }
    }
}

#[async_trait]
pub trait ReminderQueue: Send + Sync {
    async fn schedule(&self, user_id: Uuid, reminder: Reminder) -> Result<QueuedReminder>;

    /// Drops every pending reminder of the user, returning how many went.
    async fn cancel_all(&self, user_id: Uuid) -> Result<usize>;

    /// Removes and returns reminders due at or before `now`. A reminder is
    /// handed to exactly one caller even with several workers polling.
    async fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<QueuedReminder>>;
}

/// Sorted set `reminders:due` scored by due time, plus a per-user set of the
/// same members so `cancel_all` can find them.
#[derive(Clone)]
pub struct RedisReminderQueue {
    client: redis::Client,
}

impl RedisReminderQueue {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn user_key(user_id: Uuid) -> String {
        format!("reminders:user:{user_id}")
    }
}

impl fmt::Debug for RedisReminderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisReminderQueue").finish_non_exhaustive()
    }
}

fn encode_member(reminder: &QueuedReminder) -> Result<String> {
    serde_json::to_string(reminder).map_err(|e| Error::Internal {
        operation: format!("encode reminder: {e}"),
    })
}

fn decode_member(member: &str) -> Option<QueuedReminder> {
    match serde_json::from_str(member) {
        Ok(reminder) => Some(reminder),
        Err(e) => {
            tracing::error!("Dropping undecodable reminder: {}", e);
            None
        }
    }
}

#[async_trait]
impl ReminderQueue for RedisReminderQueue {
    async fn schedule(&self, user_id: Uuid, reminder: Reminder) -> Result<QueuedReminder> {
        let queued = QueuedReminder::new(user_id, reminder);
        let member = encode_member(&queued)?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .zadd(DUE_KEY, &member, queued.at.timestamp())
            .ignore()
            .sadd(Self::user_key(user_id), &member)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(queued)
    }

    async fn cancel_all(&self, user_id: Uuid) -> Result<usize> {
        let user_key = Self::user_key(user_id);
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let members: Vec<String> = conn.smembers(&user_key).await?;
        if members.is_empty() {
            return Ok(0);
        }
        // Only the members read above go; one scheduled meanwhile stays
        // indexed for the next cancel
        let (removed,): (usize,) = redis::pipe()
            .atomic()
            .zrem(DUE_KEY, &members)
            .srem(&user_key, &members)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(removed)
    }

    async fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<QueuedReminder>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let members: Vec<String> = conn.zrangebyscore(DUE_KEY, "-inf", now.timestamp()).await?;

        let mut due = Vec::with_capacity(members.len());
        for member in members {
            // Whoever removes the member owns the delivery
            let claimed: redis::RedisResult<i64> = conn.zrem(DUE_KEY, &member).await;
            match claimed {
                Ok(0) => continue,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Stopped claiming reminders after {}: {}", due.len(), e);
                    break;
                }
            }
            let Some(reminder) = decode_member(&member) else {
                continue;
            };
            let unindexed: redis::RedisResult<()> =
                conn.srem(Self::user_key(reminder.user_id), &member).await;
            if let Err(e) = unindexed {
                tracing::warn!("Reminder {} still indexed for its user: {}", reminder.id, e);
            }
            due.push(reminder);
        }
        Ok(due)
    }
}
