use chrono::{DateTime, Utc};

use super::{AssetId, AssetType};

/// A stored model file and its metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Public URL the blob can be fetched from
    pub file_url: String,
    pub ty: AssetType,
    /// bytes
    pub size: i64,
    /// `None` when the asset was never tagged; never contains blank entries
    pub tags: Option<Vec<String>>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAsset {
    pub name: String,
    pub file_url: String,
    pub ty: AssetType,
    pub size: i64,
    pub tags: Option<Vec<String>>,
    pub uploaded_at: DateTime<Utc>,
}

/// Partial update of the mutable fields of an [`Asset`].
/// Fields left `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.tags.is_none()
    }
}

/// Server side filters for listing assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetListFilter {
    /// Case-insensitive substring of the asset name
    pub search: Option<String>,
    pub ty: Option<AssetType>,
}
