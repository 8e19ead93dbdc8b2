use chrono::{SubsecRound, Utc};
use eyre::{eyre, Context};
use thiserror::Error;
use tracing::{error, info, instrument, warn, Instrument};

use crate::{
    interact,
    model::{
        repository::{self, db::DbPool},
        Asset, AssetId, AssetListFilter, AssetPatch, CreateAsset,
    },
    storage::{asset_file_key, PublicUrls, Storage},
    upload::{normalize_name, normalize_tags, ValidatedUpload, ValidationError},
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no asset with id {0}")]
    NotFound(AssetId),
    #[error(transparent)]
    Store(#[from] eyre::Report),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Blob and record are both gone
    Deleted,
    NotFound,
}

/// Asset operations spanning the record store and the blob store.
#[derive(Clone)]
pub struct AssetService {
    pool: DbPool,
    storage: Storage,
    urls: PublicUrls,
}

impl AssetService {
    pub fn new(pool: DbPool, storage: Storage, urls: PublicUrls) -> AssetService {
        AssetService {
            pool,
            storage,
            urls,
        }
    }

    pub fn urls(&self) -> &PublicUrls {
        &self.urls
    }

    /// Stores the file, then inserts the record pointing to it.
    #[instrument(skip(self, upload), fields(file_name = %upload.file.file_name, size = upload.file.data.len()))]
    pub async fn create(&self, upload: ValidatedUpload) -> ServiceResult<Asset> {
        let uploaded_at = Utc::now().trunc_subsecs(3);
        let key = asset_file_key(uploaded_at, &upload.file.file_name);
        self.storage
            .put(&key, &upload.file.data)
            .in_current_span()
            .await
            .wrap_err("error storing uploaded file")?;
        let create = CreateAsset {
            name: upload.name,
            file_url: self.urls.public_url(&key),
            ty: upload.ty,
            size: upload.file.data.len() as i64,
            tags: upload.tags,
            uploaded_at,
        };
        let conn = self.pool.get().in_current_span().await?;
        let inserted = interact!(conn, move |conn| {
            repository::asset::insert_asset(conn, &create)
        })
        .await
        .and_then(|r| r);
        match inserted {
            Ok(asset) => {
                info!(asset_id = %asset.id, key = %key, "created asset");
                Ok(asset)
            }
            Err(err) => {
                if let Err(remove_err) = self.storage.remove(&key).in_current_span().await {
                    warn!(key = %key, "could not remove file of failed upload: {:#}", remove_err);
                }
                Err(err.wrap_err("error inserting asset record").into())
            }
        }
    }

    pub async fn list(&self, filter: AssetListFilter) -> ServiceResult<Vec<Asset>> {
        let conn = self.pool.get().in_current_span().await?;
        let assets = interact!(conn, move |conn| {
            repository::asset::get_assets(conn, &filter)
        })
        .await??;
        Ok(assets)
    }

    /// Last write wins, there is no concurrency check.
    #[instrument(skip(self))]
    pub async fn update(&self, id: AssetId, patch: AssetPatch) -> ServiceResult<Asset> {
        let name = match patch.name {
            None => None,
            Some(name) => Some(normalize_name(&name).ok_or(ValidationError::EmptyName)?),
        };
        let patch = AssetPatch {
            name,
            tags: patch
                .tags
                .map(|tags| normalize_tags(tags).unwrap_or_default()),
        };
        let conn = self.pool.get().in_current_span().await?;
        let updated = interact!(conn, move |conn| {
            repository::asset::update_asset(conn, id, &patch)
        })
        .await??;
        updated.ok_or(ServiceError::NotFound(id))
    }

    /// Removes the blob first and the record only once the blob is gone.
    /// If removing the record fails after that, the record points to a missing
    /// file until [`AssetService::sweep_orphaned_records`] runs.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AssetId) -> ServiceResult<DeleteOutcome> {
        let conn = self.pool.get().in_current_span().await?;
        let asset = interact!(conn, move |conn| repository::asset::get_asset(conn, id)).await??;
        let Some(asset) = asset else {
            return Ok(DeleteOutcome::NotFound);
        };
        let key = self
            .urls
            .key_from_public_url(&asset.file_url)
            .ok_or_else(|| eyre!("can not derive storage key from url {}", asset.file_url))?
            .to_owned();
        self.storage
            .remove(&key)
            .in_current_span()
            .await
            .wrap_err("error removing asset file")?;
        let removed = interact!(conn, move |conn| repository::asset::delete_asset(conn, id))
            .await
            .and_then(|r| r);
        match removed {
            Ok(true) => {
                info!(%id, key = %key, "deleted asset");
                Ok(DeleteOutcome::Deleted)
            }
            // deleted concurrently
            Ok(false) => Ok(DeleteOutcome::NotFound),
            Err(err) => {
                error!(%id, key = %key, "file removed but record could not be deleted: {:#}", err);
                Err(err.into())
            }
        }
    }

    /// Deletes every record whose file no longer exists in storage.
    /// Records with a file url outside this server's file path are left alone.
    /// Returns the ids of the removed records.
    #[instrument(skip(self))]
    pub async fn sweep_orphaned_records(&self) -> ServiceResult<Vec<AssetId>> {
        let assets = self.list(AssetListFilter::default()).await?;
        let mut orphaned: Vec<AssetId> = Vec::new();
        for asset in assets {
            let Some(key) = self.urls.key_from_public_url(&asset.file_url) else {
                warn!(id = %asset.id, url = %asset.file_url, "skipping record with unrecognised file url");
                continue;
            };
            if !self.storage.exists(key).in_current_span().await? {
                orphaned.push(asset.id);
            }
        }
        if orphaned.is_empty() {
            return Ok(orphaned);
        }
        let conn = self.pool.get().in_current_span().await?;
        let ids = orphaned.clone();
        interact!(conn, move |conn| {
            for id in ids {
                repository::asset::delete_asset(conn, id)?;
            }
            Ok(())
        })
        .await??;
        warn!(count = orphaned.len(), ids = ?orphaned, "removed asset records without file");
        Ok(orphaned)
    }
}
