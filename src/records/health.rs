use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use uuid::Uuid;

use super::{now, optional_text, required_text, Draft, Record};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthRecordKind {
    Vaccination,
    Checkup,
    Medication,
    Treatment,
}

impl HealthRecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthRecordKind::Vaccination => "vaccination",
            HealthRecordKind::Checkup => "checkup",
            HealthRecordKind::Medication => "medication",
            HealthRecordKind::Treatment => "treatment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthRecordKind::Vaccination => "Vaccination",
            HealthRecordKind::Checkup => "Checkup",
            HealthRecordKind::Medication => "Medication",
            HealthRecordKind::Treatment => "Treatment",
        }
    }
}

impl fmt::Display for HealthRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthRecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vaccination" => Ok(HealthRecordKind::Vaccination),
            "checkup" => Ok(HealthRecordKind::Checkup),
            "medication" => Ok(HealthRecordKind::Medication),
            "treatment" => Ok(HealthRecordKind::Treatment),
            other => Err(Error::validation("type", format!("unknown record type '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: Uuid,
    pub pet_id: Uuid,
    #[serde(rename = "type")]
    pub kind: HealthRecordKind,
    pub title: String,
    pub date: NaiveDate,
    pub next_due: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Record for HealthRecord {
    const RESOURCE: &'static str = "HealthRecord";
    const PARENT: &'static str = "pet";

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Uuid {
        self.pet_id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewHealthRecord {
    pub pet_id: Uuid,
    #[serde(rename = "type")]
    pub kind: HealthRecordKind,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub next_due: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Draft for NewHealthRecord {
    type Output = HealthRecord;

    fn parent_id(&self) -> Uuid {
        self.pet_id
    }

    fn validate(&self) -> Result<()> {
        required_text("title", &self.title, 120)?;
        validate_due(self.date, self.next_due)?;
        optional_text("notes", self.notes.as_deref(), 1000)
    }

    fn provisional(&self) -> HealthRecord {
        HealthRecord {
            id: Uuid::nil(),
            pet_id: self.pet_id,
            kind: self.kind,
            title: self.title.trim().to_string(),
            date: self.date,
            next_due: self.next_due,
            notes: self.notes.clone(),
            created_at: now(),
        }
    }
}

/// `next_due` and `notes` take `Some(None)` to clear the stored value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthRecordPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<HealthRecordKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub next_due: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl HealthRecordPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            required_text("title", title, 120)?;
        }
        if let (Some(date), Some(next_due)) = (self.date, self.next_due) {
            validate_due(date, next_due)?;
        }
        optional_text("notes", self.notes.as_ref().and_then(|n| n.as_deref()), 1000)
    }
}

fn validate_due(date: NaiveDate, next_due: Option<NaiveDate>) -> Result<()> {
    match next_due {
        Some(due) if due < date => Err(Error::validation(
            "next_due",
            "must not be earlier than the record date",
        )),
        _ => Ok(()),
    }
}
