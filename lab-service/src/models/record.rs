//! Free-form lab records: orders, projects and reservations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Order,
    Project,
    Reservation,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Order => "order",
            RecordKind::Project => "project",
            RecordKind::Reservation => "reservation",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored record. The payload is kept exactly as the client sent it.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    /// Identifier of the account that created the record.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
