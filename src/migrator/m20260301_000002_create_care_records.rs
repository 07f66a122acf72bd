use sea_orm_migration::prelude::*;

/// Feeding schedules and health records. `pet_id` is indexed only, with no
/// foreign key, so deleting a pet leaves its records behind.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeedingSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeedingSchedules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeedingSchedules::PetId).uuid().not_null())
                    .col(ColumnDef::new(FeedingSchedules::FoodType).string().not_null())
                    .col(ColumnDef::new(FeedingSchedules::Amount).string().not_null())
                    .col(ColumnDef::new(FeedingSchedules::Time).string().not_null())
                    .col(
                        ColumnDef::new(FeedingSchedules::Frequency)
                            .string()
                            .not_null()
                            .default("daily"),
                    )
                    .col(ColumnDef::new(FeedingSchedules::Notes).text())
                    .col(
                        ColumnDef::new(FeedingSchedules::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeedingSchedules::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feeding_schedules_pet_id")
                    .table(FeedingSchedules::Table)
                    .col(FeedingSchedules::PetId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HealthRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HealthRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HealthRecords::PetId).uuid().not_null())
                    .col(ColumnDef::new(HealthRecords::Kind).string().not_null())
                    .col(ColumnDef::new(HealthRecords::Title).string().not_null())
                    .col(ColumnDef::new(HealthRecords::Date).date().not_null())
                    .col(ColumnDef::new(HealthRecords::NextDue).date())
                    .col(ColumnDef::new(HealthRecords::Notes).text())
                    .col(
                        ColumnDef::new(HealthRecords::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HealthRecords::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_health_records_pet_id")
                    .table(HealthRecords::Table)
                    .col(HealthRecords::PetId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HealthRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FeedingSchedules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FeedingSchedules {
    Table,
    Id,
    PetId,
    FoodType,
    Amount,
    Time,
    Frequency,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum HealthRecords {
    Table,
    Id,
    PetId,
    Kind,
    Title,
    Date,
    NextDue,
    Notes,
    CreatedAt,
    UpdatedAt,
}
