use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{required_text, Record};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VetClinic {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact: String,
    pub district: String,
    pub emergency: bool,
    pub rating: f32,
}

impl Record for VetClinic {
    const RESOURCE: &'static str = "VetClinic";
    const PARENT: &'static str = "directory";

    fn id(&self) -> Uuid {
        self.id
    }

    /// Clinics are not owned; the directory is global.
    fn parent_id(&self) -> Uuid {
        Uuid::nil()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewVetClinic {
    pub name: String,
    pub address: String,
    pub contact: String,
    pub district: String,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub rating: f32,
}

impl NewVetClinic {
    pub fn validate(&self) -> Result<()> {
        required_text("name", &self.name, 120)?;
        required_text("address", &self.address, 240)?;
        required_text("contact", &self.contact, 60)?;
        required_text("district", &self.district, 60)?;
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(Error::validation("rating", "must be between 0 and 5"));
        }
        Ok(())
    }
}

/// Case-insensitive substring match over clinic name and address.
pub fn search_clinics<'a>(
    clinics: &'a [VetClinic],
    query: &str,
    emergency_only: bool,
) -> Vec<&'a VetClinic> {
    let needle = query.trim().to_lowercase();
    clinics
        .iter()
        .filter(|c| !emergency_only || c.emergency)
        .filter(|c| {
            needle.is_empty()
                || c.name.to_lowercase().contains(&needle)
                || c.address.to_lowercase().contains(&needle)
        })
        .collect()
}
