use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users_and_pets;
mod m20260301_000002_create_care_records;
mod m20260301_000003_create_vet_clinics;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users_and_pets::Migration),
            Box::new(m20260301_000002_create_care_records::Migration),
            Box::new(m20260301_000003_create_vet_clinics::Migration),
        ]
    }
}
