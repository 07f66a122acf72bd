use std::{fmt, str::FromStr};

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use uuid::Uuid;

use super::{now, optional_text, required_text, Draft, Record};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    TwiceDaily,
    Weekly,
    AsNeeded,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::TwiceDaily => "twice_daily",
            Frequency::Weekly => "weekly",
            Frequency::AsNeeded => "as_needed",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "twice_daily" => Ok(Frequency::TwiceDaily),
            "weekly" => Ok(Frequency::Weekly),
            "as_needed" => Ok(Frequency::AsNeeded),
            other => Err(Error::validation(
                "frequency",
                format!("unknown frequency '{other}'"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedingSchedule {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub food_type: String,
    pub amount: String,
    /// Wall-clock time as entered, e.g. "08:00 AM" or "18:30".
    pub time: String,
    pub frequency: Frequency,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Record for FeedingSchedule {
    const RESOURCE: &'static str = "FeedingSchedule";
    const PARENT: &'static str = "pet";

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Uuid {
        self.pet_id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewFeedingSchedule {
    pub pet_id: Uuid,
    pub food_type: String,
    pub amount: String,
    pub time: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Draft for NewFeedingSchedule {
    type Output = FeedingSchedule;

    fn parent_id(&self) -> Uuid {
        self.pet_id
    }

    fn validate(&self) -> Result<()> {
        required_text("food_type", &self.food_type, 80)?;
        required_text("amount", &self.amount, 40)?;
        parse_time(&self.time)?;
        optional_text("notes", self.notes.as_deref(), 500)
    }

    fn provisional(&self) -> FeedingSchedule {
        FeedingSchedule {
            id: Uuid::nil(),
            pet_id: self.pet_id,
            food_type: self.food_type.trim().to_string(),
            amount: self.amount.trim().to_string(),
            time: self.time.clone(),
            frequency: self.frequency,
            notes: self.notes.clone(),
            created_at: now(),
        }
    }
}

/// Fields left `None` stay unchanged; `notes: Some(None)` clears the notes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedingSchedulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl FeedingSchedulePatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(food_type) = &self.food_type {
            required_text("food_type", food_type, 80)?;
        }
        if let Some(amount) = &self.amount {
            required_text("amount", amount, 40)?;
        }
        if let Some(time) = &self.time {
            parse_time(time)?;
        }
        optional_text("notes", self.notes.as_ref().and_then(|n| n.as_deref()), 500)
    }
}

/// Accepts 12-hour ("08:00 AM") and 24-hour ("18:30") clock times.
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| Error::validation("time", format!("'{value}' is not a clock time")))
}
