//! Form, catalog and result models
//!
//! `FormState` is what the user typed, `PredictionRequest` is what goes on
//! the wire, and `PredictionResult` is the fully populated, immutable view of
//! a successful scoring response.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fallback for `PredictionResult::message` when the service omits it
pub const DEFAULT_MESSAGE: &str = "No message provided";

/// Fallback for `PredictionResult::tribe` and `PredictionResult::zodiac`
pub const UNKNOWN: &str = "Unknown";

/// Form fields, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Name,
    Dob,
    Tribe,
    Gender,
}

impl FormField {
    /// Fields that must be non-empty and valid before submission
    pub const REQUIRED: [FormField; 3] = [FormField::Name, FormField::Dob, FormField::Tribe];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Dob => "dob",
            FormField::Tribe => "tribe",
            FormField::Gender => "gender",
        }
    }

    /// Prompt label shown by front ends
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Full Name *",
            FormField::Dob => "Date of Birth (MM/DD/YYYY) *",
            FormField::Tribe => "Select Your Tribe *",
            FormField::Gender => "Gender (Optional)",
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, FormField::Gender)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(FormField::Name),
            "dob" => Ok(FormField::Dob),
            "tribe" => Ok(FormField::Tribe),
            "gender" => Ok(FormField::Gender),
            other => Err(Error::InvalidInput(format!("Unknown form field: {}", other))),
        }
    }
}

/// Optional gender selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown gender option: {}", s)))
    }
}

/// Raw form contents as entered by the user
///
/// `dob` stays in `MM/DD/YYYY` form here; it is only normalized to ISO 8601
/// when a `PredictionRequest` is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub dob: String,
    pub tribe: String,
    pub gender: Option<Gender>,
}

impl FormState {
    /// Current raw value of a field (empty string when unset)
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Dob => &self.dob,
            FormField::Tribe => &self.tribe,
            FormField::Gender => self.gender.map(|g| g.as_str()).unwrap_or(""),
        }
    }

    /// True if any required field has nothing in it
    pub fn missing_required(&self) -> bool {
        self.name.trim().is_empty() || self.dob.is_empty() || self.tribe.is_empty()
    }
}

/// Per-field validation messages; an empty string means the field is valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrorMap {
    errors: BTreeMap<FormField, String>,
}

impl Default for FieldErrorMap {
    fn default() -> Self {
        Self {
            errors: FormField::REQUIRED
                .into_iter()
                .map(|field| (field, String::new()))
                .collect(),
        }
    }
}

impl FieldErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the message for a field (empty clears it)
    pub fn set(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn get(&self, field: FormField) -> &str {
        self.errors.get(&field).map(String::as_str).unwrap_or("")
    }

    /// True when every entry is empty
    pub fn is_clear(&self) -> bool {
        self.errors.values().all(|msg| msg.is_empty())
    }

    /// Fields that currently carry an error, in display order
    pub fn failing(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.errors
            .iter()
            .filter(|(_, msg)| !msg.is_empty())
            .map(|(field, msg)| (*field, msg.as_str()))
    }
}

/// One entry in the tribe selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribeOption {
    pub value: String,
    pub label: String,
}

impl TribeOption {
    /// Catalog entries use the tribe name as both value and label
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            value: name.clone(),
            label: name,
        }
    }
}

/// Body of `POST {base}/predict`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub name: String,
    /// ISO 8601 date (`YYYY-MM-DD`)
    pub dob: String,
    pub tribe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

/// A successful scoring result with every optional field filled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionResult {
    /// Identity of this result; animation runs are scoped to it
    pub id: Uuid,
    pub percentage: u8,
    pub status: String,
    pub message: String,
    pub zodiac: String,
    pub tribe: String,
}

impl PredictionResult {
    /// Map a scoring response body into a result
    ///
    /// `percentage` must be a JSON number in 0..=100; fractional values are
    /// floored. Missing, null or empty optional fields get their fallbacks
    /// here, once, so the result never changes afterwards.
    pub fn from_response(body: &Value) -> Result<Self> {
        let percentage = match body.get("percentage") {
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|p| p.is_finite() && (0.0..=100.0).contains(p))
                .map(|p| p.floor() as u8)
                .ok_or_else(|| {
                    Error::InvalidResponse(format!("percentage out of range: {}", n))
                })?,
            Some(other) => {
                return Err(Error::InvalidResponse(format!(
                    "percentage is not a number: {}",
                    other
                )))
            }
            None => {
                return Err(Error::InvalidResponse(
                    "missing percentage field".to_string(),
                ))
            }
        };

        Ok(Self {
            id: Uuid::new_v4(),
            percentage,
            status: text_field(body, "status").unwrap_or_else(|| default_status(percentage)),
            message: text_field(body, "message").unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            zodiac: text_field(body, "zodiac").unwrap_or_else(|| UNKNOWN.to_string()),
            tribe: text_field(body, "tribe").unwrap_or_else(|| UNKNOWN.to_string()),
        })
    }
}

/// Status line used when the service does not send one
pub fn default_status(percentage: u8) -> String {
    format!("You are {}% single", percentage)
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
