use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use modelshelf_core::model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Glb,
    Gltf,
    Fbx,
    Obj,
}

impl From<model::AssetType> for AssetType {
    fn from(value: model::AssetType) -> Self {
        match value {
            model::AssetType::Glb => AssetType::Glb,
            model::AssetType::Gltf => AssetType::Gltf,
            model::AssetType::Fbx => AssetType::Fbx,
            model::AssetType::Obj => AssetType::Obj,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    /// Public URL of the model file
    pub file_url: String,
    #[serde(rename = "type")]
    pub ty: AssetType,
    /// Bytes
    pub size: i64,
    pub tags: Option<Vec<String>>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<model::Asset> for Asset {
    fn from(value: model::Asset) -> Self {
        Asset {
            id: value.id.0,
            name: value.name,
            file_url: value.file_url,
            ty: value.ty.into(),
            size: value.size,
            tags: value.tags,
            uploaded_at: value.uploaded_at,
        }
    }
}

/// Multipart form of an upload
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadAssetForm {
    /// .glb, .gltf, .fbx or .obj file
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Defaults to the file name without extension
    name: Option<String>,
    /// Comma separated
    tags: Option<String>,
}

/// Fields left out are not changed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<UpdateAssetRequest> for model::AssetPatch {
    fn from(value: UpdateAssetRequest) -> Self {
        model::AssetPatch {
            name: value.name,
            tags: value.tags,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssetListQuery {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    /// File type, one of glb, gltf, fbx, obj
    #[serde(rename = "type")]
    pub ty: Option<String>,
}

/// Tags and types present across all assets, sorted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Facets {
    pub tags: Vec<String>,
    pub types: Vec<String>,
}
