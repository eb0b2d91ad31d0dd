use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use todoc_api::endpoints::kids::{Dashboard, Gender, Kid, KidChanges};
use todoc_api::endpoints::KidId;
use todoc_api::{Gateway, Request, Upload, ValidationError};

use super::call;
use crate::cache::ListCache;
use crate::error::AppError;

/// Kid profiles of the signed-in user
pub struct KidService {
    gateway: Arc<Gateway>,
    kids: ListCache<Kid>,
}

impl KidService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            kids: ListCache::new(),
        }
    }

    pub fn kids(&self) -> &ListCache<Kid> {
        &self.kids
    }

    pub async fn load(&mut self) -> Result<&[Kid], AppError> {
        tracing::info!("Loading kids");
        let kids = call(&self.gateway, Request::kids().list()).await?;
        tracing::debug!("Loaded {} kids", kids.len());
        self.kids.replace_all(kids);
        Ok(self.kids.items())
    }

    pub async fn create(
        &mut self,
        name: &str,
        birth_date: NaiveDate,
        gender: Gender,
    ) -> Result<Kid, AppError> {
        let kid = call(
            &self.gateway,
            Request::kids().create(name.trim(), birth_date, gender),
        )
        .await?;
        tracing::info!("Created kid {}", kid.id);
        self.kids.apply_created(kid.clone());
        Ok(kid)
    }

    pub async fn get(&mut self, kid_id: KidId) -> Result<Kid, AppError> {
        let kid = call(&self.gateway, Request::kids().get(kid_id)).await?;
        self.kids.apply_created(kid.clone());
        Ok(kid)
    }

    pub async fn update(&mut self, kid_id: KidId, changes: KidChanges) -> Result<Kid, AppError> {
        let mut request = Request::kids().update(kid_id);
        if let Some(name) = changes.name {
            request = request.name(name);
        }
        if let Some(birth_date) = changes.birth_date {
            request = request.birth_date(birth_date);
        }
        if let Some(gender) = changes.gender {
            request = request.gender(gender);
        }
        if let Some(image_url) = changes.image_url {
            request = request.image_url(image_url);
        }

        let kid = call(&self.gateway, request).await?;
        self.kids.apply_updated(kid.clone());
        Ok(kid)
    }

    pub async fn delete(&mut self, kid_id: KidId) -> Result<(), AppError> {
        call(&self.gateway, Request::kids().delete(kid_id)).await?;
        tracing::info!("Deleted kid {}", kid_id);
        self.kids.apply_deleted(kid_id);
        Ok(())
    }

    pub async fn upload_photo(&mut self, kid_id: KidId, upload: Upload) -> Result<Kid, AppError> {
        let kid = call(&self.gateway, Request::kids().upload_photo(kid_id, upload)).await?;
        self.kids.apply_updated(kid.clone());
        Ok(kid)
    }

    /// Read an image from disk and upload it as the kid's photo
    pub async fn upload_photo_file(&mut self, kid_id: KidId, path: &Path) -> Result<Kid, AppError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ValidationError::Invalid(format!("not a file: {}", path.display())))?
            .to_string();
        let content_type = Upload::image_content_type(&file_name).ok_or_else(|| {
            ValidationError::Invalid(
                "Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed.".into(),
            )
        })?;
        let bytes = tokio::fs::read(path).await.map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.upload_photo(kid_id, Upload::new(file_name, content_type, bytes))
            .await
    }

    pub async fn dashboard(&self, kid_id: KidId) -> Result<Dashboard, AppError> {
        call(&self.gateway, Request::kids().dashboard(kid_id)).await
    }
}
