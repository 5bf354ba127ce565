use std::sync::Arc;

use super::{
    store::{ComponentStore, StoreError},
    ServiceError,
};
use crate::models::{Component, NewComponent};

#[derive(Clone)]
pub struct ComponentService {
    store: Arc<dyn ComponentStore>,
}

impl ComponentService {
    pub fn new(store: Arc<dyn ComponentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, component: NewComponent) -> Result<Component, ServiceError> {
        if self
            .store
            .find_component_by_part_number(&component.part_number)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicatePartNumber);
        }

        let created = self
            .store
            .insert_component(component)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => ServiceError::DuplicatePartNumber,
                other => ServiceError::Store(other),
            })?;

        tracing::info!(component_id = created.id, part_number = %created.part_number, "Component created");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<Component>, ServiceError> {
        Ok(self.store.list_components().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Component, ServiceError> {
        self.store
            .find_component(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Component".to_string()))
    }

    pub async fn get_by_part_number(&self, part_number: &str) -> Result<Component, ServiceError> {
        self.store
            .find_component_by_part_number(part_number)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Component".to_string()))
    }

    /// A blank term matches everything.
    pub async fn search(&self, term: &str) -> Result<Vec<Component>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return self.list().await;
        }
        Ok(self.store.search_components(term).await?)
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<Component>, ServiceError> {
        Ok(self.store.list_components_by_category(category).await?)
    }

    /// Barcode lookup is not wired to any catalog yet; always `None`.
    pub async fn by_barcode(&self, code: &str) -> Result<Option<Component>, ServiceError> {
        tracing::debug!(code = %code, "Barcode lookup requested");
        Ok(None)
    }
}
