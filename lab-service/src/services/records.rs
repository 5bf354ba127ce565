use std::sync::Arc;

use super::{store::RecordStore, ServiceError};
use crate::models::{Record, RecordKind};

/// Orders, projects and reservations. Payloads are stored untouched.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, kind: RecordKind) -> Result<Vec<Record>, ServiceError> {
        Ok(self.store.list_records(kind).await?)
    }

    pub async fn create(
        &self,
        kind: RecordKind,
        data: serde_json::Value,
        created_by: &str,
    ) -> Result<Record, ServiceError> {
        let record = self.store.insert_record(kind, data, created_by).await?;
        tracing::info!(record_id = record.id, kind = %kind, created_by = %created_by, "Record created");
        Ok(record)
    }
}
