use std::borrow::Cow;

use diesel::{prelude::Insertable, AsChangeset, Queryable, Selectable};
use eyre::{eyre, Result};

use crate::model::{
    util::{datetime_from_db_repr, tags_from_db_repr},
    Asset, AssetId, AssetType,
};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = super::super::schema::Asset)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbAsset {
    pub asset_id: i64,
    pub name: String,
    pub file_url: String,
    pub ty: String,
    pub size: i64,
    pub tags: Option<String>,
    pub uploaded_at: i64,
}

impl TryFrom<DbAsset> for Asset {
    type Error = eyre::Report;

    fn try_from(value: DbAsset) -> Result<Self, Self::Error> {
        Ok(Asset {
            id: AssetId(value.asset_id),
            ty: from_db_asset_ty(&value.ty)?,
            tags: tags_from_db_repr(value.tags.as_deref())?,
            uploaded_at: datetime_from_db_repr(value.uploaded_at)?,
            name: value.name,
            file_url: value.file_url,
            size: value.size,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = super::super::schema::Asset)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbInsertAsset<'a> {
    pub name: Cow<'a, str>,
    pub file_url: Cow<'a, str>,
    pub ty: &'static str,
    pub size: i64,
    pub tags: Option<String>,
    pub uploaded_at: i64,
}

/// `tags: Some(None)` clears the tags column.
#[derive(Debug, Clone, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = super::super::schema::Asset)]
pub struct DbAssetChangeset<'a> {
    pub name: Option<Cow<'a, str>>,
    pub tags: Option<Option<String>>,
}

pub fn to_db_asset_ty(ty: AssetType) -> &'static str {
    match ty {
        AssetType::Glb => "glb",
        AssetType::Gltf => "gltf",
        AssetType::Fbx => "fbx",
        AssetType::Obj => "obj",
    }
}

pub fn from_db_asset_ty(s: &str) -> Result<AssetType> {
    match s {
        "glb" => Ok(AssetType::Glb),
        "gltf" => Ok(AssetType::Gltf),
        "fbx" => Ok(AssetType::Fbx),
        "obj" => Ok(AssetType::Obj),
        other => Err(eyre!("Invalid column ty in Asset row: {}", other)),
    }
}
