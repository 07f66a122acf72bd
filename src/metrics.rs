use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

use crate::entities::{FeedingSchedules, HealthRecords, Pets, Users};

/// Seeds the totals gauges from the database at start-up.
pub async fn init_metrics(db: &DatabaseConnection) {
    let user_count = Users::find().count(db).await.unwrap_or(0);
    metrics::gauge!("pawtrack_users_total").set(user_count as f64);

    let pet_count = Pets::find().count(db).await.unwrap_or(0);
    metrics::gauge!("pawtrack_pets_total").set(pet_count as f64);

    let feeding_count = FeedingSchedules::find().count(db).await.unwrap_or(0);
    metrics::gauge!("pawtrack_feeding_schedules_total").set(feeding_count as f64);

    let health_count = HealthRecords::find().count(db).await.unwrap_or(0);
    metrics::gauge!("pawtrack_health_records_total").set(health_count as f64);

    tracing::info!(
        "Initialized metrics: Users={}, Pets={}, FeedingSchedules={}, HealthRecords={}",
        user_count,
        pet_count,
        feeding_count,
        health_count
    );
}

pub fn record_created(collection: &'static str) {
    metrics::counter!("pawtrack_records_created_total", "collection" => collection).increment(1);
    metrics::gauge!(format!("pawtrack_{collection}_total")).increment(1.0);
}

pub fn record_deleted(collection: &'static str) {
    metrics::counter!("pawtrack_records_deleted_total", "collection" => collection).increment(1);
    metrics::gauge!(format!("pawtrack_{collection}_total")).decrement(1.0);
}

pub fn increment_users_registered() {
    metrics::counter!("pawtrack_users_registered_total").increment(1);
    metrics::gauge!("pawtrack_users_total").increment(1.0);
}

pub fn increment_reminders_scheduled() {
    metrics::counter!("pawtrack_reminders_scheduled_total").increment(1);
}

pub fn increment_reminders_delivered(outcome: &'static str) {
    metrics::counter!("pawtrack_reminders_delivered_total", "outcome" => outcome).increment(1);
}

pub fn increment_emails_sent() {
    metrics::counter!("pawtrack_emails_sent_total").increment(1);
}

pub fn increment_emails_failed() {
    metrics::counter!("pawtrack_emails_failed_total").increment(1);
}
