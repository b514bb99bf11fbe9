//! Shared helpers for decoding SQLite TEXT columns into domain types.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::StorageError;

pub fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|e| StorageError::Decode {
        entity: field.to_string(),
        message: e.to_string(),
    })
}

pub fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Decode {
            entity: field.to_string(),
            message: e.to_string(),
        })
}

pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| StorageError::Decode {
        entity: field.to_string(),
        message: e.to_string(),
    })
}

pub fn parse_enum<T: FromStr<Err = String>>(raw: &str, field: &str) -> Result<T, StorageError> {
    raw.parse().map_err(|message| StorageError::Decode {
        entity: field.to_string(),
        message,
    })
}

pub fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, field: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Decode {
        entity: field.to_string(),
        message: e.to_string(),
    })
}
