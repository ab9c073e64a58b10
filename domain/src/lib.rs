use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Missing required field(s) (firstName, lastName)")]
    MissingName,
    #[error("Birthday field is missing")]
    MissingBirthday,
    #[error("Birthday field is invalid: '{0}'")]
    InvalidBirthday(String),
}

/// Date format used for birthdays on the wire and in query parameters.
pub const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// Parses a birthday given either as a plain calendar date (`1990-05-15`)
/// or as an RFC 3339 timestamp (`1990-05-15T00:00:00Z`), keeping the date part.
pub fn parse_birthday(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, BIRTHDAY_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

// --- Raw record as found in data files ---

/// A person record exactly as decoded from JSON, before validation.
/// Every field is optional here; [`Person::try_from`] enforces the invariants.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

// --- Person ---

/// A validated contact entry. Immutable once constructed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "PersonRecord")]
pub struct Person {
    first_name: String,
    last_name: String,
    #[serde(serialize_with = "serialize_birthday")]
    birthday: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
}

impl Person {
    /// Creates a person, rejecting empty names and the zero date.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthday: NaiveDate,
    ) -> Result<Self, DomainError> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(DomainError::MissingName);
        }
        if birthday == zero_date() {
            return Err(DomainError::InvalidBirthday(birthday.to_string()));
        }
        Ok(Self {
            first_name,
            last_name,
            birthday,
            address: None,
            phone_number: None,
        })
    }

    /// Attaches the optional contact details carried alongside the record.
    pub fn with_contact(mut self, address: Option<String>, phone_number: Option<String>) -> Self {
        self.address = address;
        self.phone_number = phone_number;
        self
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn birthday(&self) -> NaiveDate {
        self.birthday
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// "First Last", handy for logs and assertions.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl TryFrom<PersonRecord> for Person {
    type Error = DomainError;

    fn try_from(record: PersonRecord) -> Result<Self, Self::Error> {
        let first_name = record.first_name.unwrap_or_default();
        let last_name = record.last_name.unwrap_or_default();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(DomainError::MissingName);
        }
        let raw_birthday = match record.birthday {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(DomainError::MissingBirthday),
        };
        let birthday =
            parse_birthday(&raw_birthday).ok_or(DomainError::InvalidBirthday(raw_birthday))?;

        Ok(Person::new(first_name, last_name, birthday)?
            .with_contact(record.address, record.phone_number))
    }
}

// 0001-01-01, the zero value some exporters write for an unset timestamp.
fn zero_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn serialize_birthday<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&date.format(BIRTHDAY_FORMAT).to_string())
}
