use std::borrow::Cow;

use diesel::prelude::*;
use eyre::{Context, Result};
use tracing::instrument;

use crate::model::{
    util::{datetime_to_db_repr, tags_to_db_repr},
    Asset, AssetId, AssetListFilter, AssetPatch, CreateAsset,
};

use super::db::DbConn;
use super::db_entity::{to_db_asset_ty, DbAsset, DbAssetChangeset, DbInsertAsset};
use super::schema;

#[instrument(skip(conn), level = "trace")]
pub fn get_asset(conn: &mut DbConn, id: AssetId) -> Result<Option<Asset>> {
    use schema::Asset;
    let db_asset: Option<DbAsset> = Asset::table
        .find(id.0)
        .select(DbAsset::as_select())
        .first(conn)
        .optional()
        .wrap_err("could not query table Asset")?;
    db_asset.map(|a| a.try_into()).transpose()
}

/// All assets matching `filter`, newest first.
/// Assets uploaded in the same millisecond are ordered by descending id.
#[instrument(skip(conn))]
pub fn get_assets(conn: &mut DbConn, filter: &AssetListFilter) -> Result<Vec<Asset>> {
    use schema::Asset;
    let mut query = Asset::table.select(DbAsset::as_select()).into_boxed();
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        // sqlite LIKE is case-insensitive for ASCII
        query = query.filter(Asset::name.like(like_pattern(search)).escape('\\'));
    }
    if let Some(ty) = filter.ty {
        query = query.filter(Asset::ty.eq(to_db_asset_ty(ty)));
    }
    let db_assets: Vec<DbAsset> = query
        .order((Asset::uploaded_at.desc(), Asset::asset_id.desc()))
        .load(conn)
        .wrap_err("could not query table Asset")?;
    db_assets
        .into_iter()
        .map(|a| a.try_into())
        .collect::<Result<Vec<_>>>()
}

#[instrument(skip(conn))]
pub fn insert_asset(conn: &mut DbConn, asset: &CreateAsset) -> Result<Asset> {
    use schema::Asset;
    let insert = DbInsertAsset {
        name: Cow::Borrowed(&asset.name),
        file_url: Cow::Borrowed(&asset.file_url),
        ty: to_db_asset_ty(asset.ty),
        size: asset.size,
        tags: tags_to_db_repr(asset.tags.as_deref())?,
        uploaded_at: datetime_to_db_repr(&asset.uploaded_at),
    };
    let row: DbAsset = diesel::insert_into(Asset::table)
        .values(&insert)
        .returning(DbAsset::as_returning())
        .get_result(conn)
        .wrap_err("could not insert into table Asset")?;
    row.try_into()
}

/// Applies `patch` and returns the updated asset, or `None` if no asset has this id.
#[instrument(skip(conn))]
pub fn update_asset(conn: &mut DbConn, id: AssetId, patch: &AssetPatch) -> Result<Option<Asset>> {
    use schema::Asset;
    if patch.is_empty() {
        return get_asset(conn, id);
    }
    let changeset = DbAssetChangeset {
        name: patch.name.as_deref().map(Cow::Borrowed),
        tags: patch
            .tags
            .as_ref()
            .map(|tags| match tags.is_empty() {
                true => Ok(None),
                false => tags_to_db_repr(Some(tags)),
            })
            .transpose()?,
    };
    let row: Option<DbAsset> = diesel::update(Asset::table.find(id.0))
        .set(&changeset)
        .returning(DbAsset::as_returning())
        .get_result(conn)
        .optional()
        .wrap_err("could not update table Asset")?;
    row.map(|r| r.try_into()).transpose()
}

/// Returns whether a row was deleted.
#[instrument(skip(conn))]
pub fn delete_asset(conn: &mut DbConn, id: AssetId) -> Result<bool> {
    use schema::Asset;
    let num_deleted = diesel::delete(Asset::table.find(id.0))
        .execute(conn)
        .wrap_err("could not delete from table Asset")?;
    Ok(num_deleted > 0)
}

fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
