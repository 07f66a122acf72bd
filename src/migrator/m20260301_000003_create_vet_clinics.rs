use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VetClinics::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(VetClinics::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(VetClinics::Name).string().not_null())
                    .col(ColumnDef::new(VetClinics::Address).text().not_null())
                    .col(ColumnDef::new(VetClinics::Contact).string().not_null())
                    .col(ColumnDef::new(VetClinics::District).string().not_null())
                    .col(
                        ColumnDef::new(VetClinics::Emergency)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(VetClinics::Rating)
                            .float()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(VetClinics::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // Directory lookups filter by district and sort by name
        manager
            .create_index(
                Index::create()
                    .name("idx_vet_clinics_district_name")
                    .table(VetClinics::Table)
                    .col(VetClinics::District)
                    .col(VetClinics::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VetClinics::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VetClinics {
    Table,
    Id,
    Name,
    Address,
    Contact,
    District,
    Emergency,
    Rating,
    CreatedAt,
}
