use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::NoticeBoard;
use crate::client::collaborators::{HealthSource, Notifier};
use crate::client::optimistic::OptimisticList;
use crate::error::Result;
use crate::records::{Draft, HealthRecord, NewHealthRecord};

pub const DEFAULT_LEAD_DAYS: i64 = 3;
const REMINDER_HOUR_UTC: u32 = 9;

/// When to remind about a record due on `next_due`: `lead_days` earlier at
/// 09:00 UTC.
pub fn reminder_time(next_due: NaiveDate, lead_days: i64) -> Option<DateTime<Utc>> {
    let day = next_due.checked_sub_signed(chrono::Duration::days(lead_days))?;
    Some(day.and_hms_opt(REMINDER_HOUR_UTC, 0, 0)?.and_utc())
}

/// Health records of one pet, newest first as the backend orders them.
pub struct HealthScreen {
    pet_id: Uuid,
    source: Arc<HealthSource>,
    notifier: Arc<dyn Notifier>,
    lead_days: i64,
    list: OptimisticList<HealthRecord>,
    notices: NoticeBoard,
}

impl HealthScreen {
    pub fn new(pet_id: Uuid, source: Arc<HealthSource>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pet_id,
            source,
            notifier,
            lead_days: DEFAULT_LEAD_DAYS,
            list: OptimisticList::new(),
            notices: NoticeBoard::default(),
        }
    }

    pub fn with_lead_days(mut self, lead_days: i64) -> Self {
        self.lead_days = lead_days;
        self
    }

    pub fn records(&self) -> Vec<HealthRecord> {
        self.list.snapshot()
    }

    pub fn notice(&self) -> Option<String> {
        self.notices.last()
    }

    pub async fn load(&self) -> Result<()> {
        let result = async {
            let records = self.source.list_by_parent(self.pet_id).await?;
            self.list.replace_all(records);
            Ok(())
        }
        .await;
        self.notices.settle("load health records", result)
    }

    /// Adds the record and, when it has a due date far enough ahead,
    /// schedules a reminder. A reminder that cannot be scheduled is only
    /// logged.
    pub async fn add(&self, mut draft: NewHealthRecord) -> Result<HealthRecord> {
        draft.pet_id = self.pet_id;
        let result = async {
            draft.check()?;
            self.list
                .create(draft.provisional(), self.source.create(draft.clone()))
                .await
        }
        .await;
        let record = self.notices.settle("add the health record", result)?;

        self.schedule_reminder(&record).await;
        Ok(record)
    }

    async fn schedule_reminder(&self, record: &HealthRecord) {
        let Some(due) = record.next_due else {
            return;
        };
        let Some(at) = reminder_time(due, self.lead_days) else {
            return;
        };
        if at <= Utc::now() {
            tracing::debug!("Reminder for {} would be in the past, skipping", record.id);
            return;
        }

        let title = format!("{} due: {}", record.kind.label(), record.title);
        let body = format!("{} is due on {}", record.title, due.format("%b %-d, %Y"));
        if let Err(e) = self.notifier.schedule_at(at, &title, &body).await {
            tracing::warn!("Could not schedule reminder for {}: {}", record.id, e);
        }
    }

    /// Reminders already scheduled for the record stay scheduled.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let result = self.list.delete(id, self.source.delete(id)).await;
        self.notices.settle("remove the health record", result)
    }
}
