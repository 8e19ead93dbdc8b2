//! Support for the 3D preview: which loader handles a model, and a cache of
//! loaded models shared between viewers.

mod cache;
mod loader;

pub use cache::*;
pub use loader::*;

use crate::model::AssetType;

/// Model formats a preview loader exists for. `glb` is binary glTF and
/// handled by the same loader as `gltf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Gltf,
    Fbx,
    Obj,
}

impl From<AssetType> for ModelFormat {
    fn from(value: AssetType) -> Self {
        match value {
            AssetType::Glb | AssetType::Gltf => ModelFormat::Gltf,
            AssetType::Fbx => ModelFormat::Fbx,
            AssetType::Obj => ModelFormat::Obj,
        }
    }
}

impl ModelFormat {
    /// Format of a client record's `type` field, if it names a known format.
    pub fn from_type_name(ty: &str) -> Option<ModelFormat> {
        AssetType::from_extension(ty).map(ModelFormat::from)
    }
}
