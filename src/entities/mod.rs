pub mod feeding_schedule;
pub mod health_record;
pub mod pet;
pub mod user;
pub mod vet_clinic;

pub use feeding_schedule::Entity as FeedingSchedules;
pub use health_record::Entity as HealthRecords;
pub use pet::Entity as Pets;
pub use user::Entity as Users;
pub use vet_clinic::Entity as VetClinics;

pub mod prelude {
    pub use super::{FeedingSchedules, HealthRecords, Pets, Users, VetClinics};
}
