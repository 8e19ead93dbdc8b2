use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// File format of a stored model, named by its lowercase file extension.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AssetType {
    Glb,
    Gltf,
    Fbx,
    Obj,
}

impl AssetType {
    /// Case-insensitive lookup of an extension without the leading dot.
    pub fn from_extension(ext: &str) -> Option<AssetType> {
        ext.parse().ok()
    }

    /// Looks at the text after the last `.` of `file_name`.
    /// A name without any `.` has no extension and is never accepted.
    pub fn from_file_name(file_name: &str) -> Option<AssetType> {
        let (_, ext) = file_name.rsplit_once('.')?;
        AssetType::from_extension(ext)
    }
}
