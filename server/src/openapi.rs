use utoipa::OpenApi;

use crate::{routes::asset, schema};

#[derive(OpenApi)]
#[openapi(
    paths(
        asset::post_asset,
        asset::get_assets,
        asset::get_facets,
        asset::put_asset,
        asset::delete_asset,
    ),
    components(schemas(
        schema::Asset,
        schema::AssetType,
        schema::UploadAssetForm,
        schema::UpdateAssetRequest,
        schema::Facets,
        schema::ErrorBody,
    )),
    tags((name = "modelshelf"))
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn documents_all_asset_routes() {
        let doc = ApiDoc::openapi();
        let mut paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        paths.sort();
        assert_eq!(paths, vec!["/assets", "/assets/facets", "/assets/{id}"]);
    }
}
