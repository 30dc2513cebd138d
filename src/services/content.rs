//! Generic content service
//!
//! One service instance per table. Reads go through the query cache; every
//! write validates its input, hits the table store once and drops the
//! table's cached queries.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{decode_record, ListQuery, SqlValue, StoreError, TableRepository};
use crate::models::{Entity, FieldErrors, RowError, Validate};
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{table} record '{id}' not found")]
    NotFound { table: &'static str, id: String },

    #[error("Duplicate value: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Row(#[from] RowError),
}

impl From<StoreError> for ContentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { table, id } => ContentError::NotFound { table, id },
            StoreError::Conflict(message) => ContentError::Conflict(message),
            other => ContentError::Store(other),
        }
    }
}

impl From<FieldErrors> for ContentError {
    fn from(errors: FieldErrors) -> Self {
        ContentError::Validation(errors)
    }
}

pub struct ContentService<E: Entity> {
    repo: Arc<dyn TableRepository>,
    cache: Arc<Cache>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for ContentService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            cache: self.cache.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> ContentService<E> {
    pub fn new(repo: Arc<dyn TableRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            _entity: PhantomData,
        }
    }

    pub fn table_name(&self) -> &'static str {
        E::TABLE.name
    }

    /// Every row matching `query`, in the table's order
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<E>, ContentError> {
        self.cached_list("list", query).await
    }

    /// Rows visible on the public site
    pub async fn list_public(&self, query: &ListQuery) -> Result<Vec<E>, ContentError> {
        let mut query = query.clone();
        if let Some((column, value)) = E::published_condition() {
            query = query.with_condition(column, value);
        }
        self.cached_list("public", &query).await
    }

    async fn cached_list(&self, kind: &str, query: &ListQuery) -> Result<Vec<E>, ContentError> {
        let key = format!("{}:{}:{}", E::TABLE.name, kind, query.cache_key());
        if let Some(rows) = self.cache.get::<Vec<E>>(&key).await.ok().flatten() {
            tracing::debug!("Cache hit for {}", key);
            return Ok(rows);
        }

        let rows = self
            .repo
            .list(E::TABLE, query)
            .await?
            .into_iter()
            .map(|row| decode_record::<E>(E::TABLE, row))
            .collect::<Result<Vec<_>, _>>()?;

        if let Err(e) = self.cache.put(&key, &rows).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        Ok(rows)
    }

    pub async fn get(&self, id: &str) -> Result<E, ContentError> {
        match self.repo.get(E::TABLE, id).await? {
            Some(row) => Ok(decode_record(E::TABLE, row)?),
            None => Err(ContentError::NotFound {
                table: E::TABLE.name,
                id: id.to_string(),
            }),
        }
    }

    /// First row where `column = value`, uncached
    pub async fn find_by(
        &self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> Result<Option<E>, ContentError> {
        match self.repo.find_by(E::TABLE, column, value.into()).await? {
            Some(row) => Ok(Some(decode_record(E::TABLE, row)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, input: E::Create) -> Result<E, ContentError> {
        input.validate()?;
        let row = E::create_row(input)?;
        let created = self.repo.insert(E::TABLE, row).await?;
        let record: E = decode_record(E::TABLE, created)?;

        tracing::info!("Created {} {}", E::TABLE.name, record.id());
        self.invalidate().await;
        Ok(record)
    }

    /// Apply a partial patch; fields left out of `patch` keep their values
    pub async fn update(&self, id: &str, patch: E::Update) -> Result<E, ContentError> {
        patch.validate()?;
        let current = self.get(id).await?;
        let mut row = E::update_row(patch)?;
        current.complete_update(&mut row);
        let updated = self.repo.update(E::TABLE, id, row).await?;
        let record = decode_record(E::TABLE, updated)?;

        tracing::info!("Updated {} {}", E::TABLE.name, id);
        self.invalidate().await;
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ContentError> {
        self.repo.delete(E::TABLE, id).await?;

        tracing::info!("Deleted {} {}", E::TABLE.name, id);
        self.invalidate().await;
        Ok(())
    }

    /// Drop every cached query for this table
    pub async fn invalidate(&self) {
        let pattern = E::TABLE.cache_pattern();
        if let Err(e) = self.cache.delete_pattern(&pattern).await {
            tracing::warn!("Failed to invalidate {}: {}", pattern, e);
        }
    }
}
