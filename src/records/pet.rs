use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{now, optional_text, required_text, Draft, Record};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub breed: String,
    pub age: i32,
    pub weight: f64,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Record for Pet {
    const RESOURCE: &'static str = "Pet";
    const PARENT: &'static str = "owner";

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Uuid {
        self.owner_id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewPet {
    /// Filled from the session by screens; the server only accepts its own user.
    #[serde(default)]
    pub owner_id: Uuid,
    pub name: String,
    pub breed: String,
    pub age: i32,
    pub weight: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Draft for NewPet {
    type Output = Pet;

    fn parent_id(&self) -> Uuid {
        self.owner_id
    }

    fn validate(&self) -> Result<()> {
        required_text("name", &self.name, 50)?;
        required_text("breed", &self.breed, 50)?;
        validate_age(self.age)?;
        validate_weight(self.weight)?;
        optional_text("image_url", self.image_url.as_deref(), 2048)
    }

    fn provisional(&self) -> Pet {
        let now = now();
        Pet {
            id: Uuid::nil(),
            owner_id: self.owner_id,
            name: self.name.trim().to_string(),
            breed: self.breed.trim().to_string(),
            age: self.age,
            weight: self.weight,
            image_url: self.image_url.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl PetPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            required_text("name", name, 50)?;
        }
        if let Some(breed) = &self.breed {
            required_text("breed", breed, 50)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        if let Some(weight) = self.weight {
            validate_weight(weight)?;
        }
        Ok(())
    }

    pub fn apply(&self, pet: &mut Pet) {
        if let Some(name) = &self.name {
            pet.name = name.trim().to_string();
        }
        if let Some(breed) = &self.breed {
            pet.breed = breed.trim().to_string();
        }
        if let Some(age) = self.age {
            pet.age = age;
        }
        if let Some(weight) = self.weight {
            pet.weight = weight;
        }
    }
}

fn validate_age(age: i32) -> Result<()> {
    if !(0..=50).contains(&age) {
        return Err(Error::validation("age", "must be between 0 and 50 years"));
    }
    Ok(())
}

fn validate_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 || weight > 500.0 {
        return Err(Error::validation("weight", "must be between 0 and 500 kg"));
    }
    Ok(())
}
