use chrono::{DateTime, Utc};
use std::sync::Arc;
use todoc_api::endpoints::records::{
    CategoryRecord, Record, RecordCategory, RecordFields, RecordType,
};
use todoc_api::endpoints::{KidId, RecordId};
use todoc_api::{Gateway, Request};

use super::call;
use crate::cache::ListCache;
use crate::error::AppError;

/// Filters for the combined record listing
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub record_type: Option<RecordType>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// Care records of one kid
pub struct RecordService {
    gateway: Arc<Gateway>,
    kid_id: KidId,
    records: ListCache<Record>,
}

impl RecordService {
    pub fn new(gateway: Arc<Gateway>, kid_id: KidId) -> Self {
        Self {
            gateway,
            kid_id,
            records: ListCache::new(),
        }
    }

    pub fn kid_id(&self) -> KidId {
        self.kid_id
    }

    pub fn records(&self) -> &ListCache<Record> {
        &self.records
    }

    pub async fn load(&mut self, filter: RecordFilter) -> Result<&[Record], AppError> {
        tracing::info!("Loading records for kid {} ({:?})", self.kid_id, filter);

        let mut request = Request::records(self.kid_id).list();
        if let Some(record_type) = filter.record_type {
            request = request.record_type(record_type);
        }
        if let Some(date_from) = filter.date_from {
            request = request.date_from(date_from);
        }
        if let Some(date_to) = filter.date_to {
            request = request.date_to(date_to);
        }
        if let Some(limit) = filter.limit {
            request = request.limit(limit);
        }

        let records = call(&self.gateway, request).await?;
        tracing::debug!("Loaded {} records", records.len());
        self.records.replace_all(records);
        Ok(self.records.items())
    }

    /// Recent entries of one category, newest first
    pub async fn list_category<D>(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<CategoryRecord<D>>, AppError>
    where
        D: RecordCategory,
    {
        let mut request = Request::records(self.kid_id).list_category::<D>();
        if let Some(limit) = limit {
            request = request.limit(limit);
        }
        call(&self.gateway, request).await
    }

    pub async fn create<D>(
        &mut self,
        detail: D,
        fields: RecordFields,
    ) -> Result<CategoryRecord<D>, AppError>
    where
        D: RecordCategory + Clone,
    {
        let request = Request::records(self.kid_id).create(detail).fields(fields);
        let created = call(&self.gateway, request).await?;
        tracing::info!("Created {} record {}", D::RECORD_TYPE, created.id);

        match created.clone().into_record() {
            Some(record) => self.records.apply_created(record),
            None => tracing::warn!("Record {} returned without its base row", created.id),
        }
        Ok(created)
    }

    pub async fn delete(&mut self, record_id: RecordId) -> Result<(), AppError> {
        call(&self.gateway, Request::records(self.kid_id).delete(record_id)).await?;
        tracing::info!("Deleted record {}", record_id);
        self.records.apply_deleted(record_id);
        Ok(())
    }
}
