use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{debug, Instrument};

use modelshelf_core::{
    model::{self, AssetListFilter},
    query::{available_tags, available_types},
    service::DeleteOutcome,
    upload::{
        check_file_name, check_size, validate_upload, UploadForm, UploadLimits, UploadedFile,
        ValidationError,
    },
};

use crate::{
    app_state::SharedState,
    http_error::{ApiResult, HttpError},
    schema::{Asset, AssetListQuery, ErrorBody, Facets, UpdateAssetRequest, UploadAssetForm},
};

/// Room for the non-file form fields and multipart framing
const FORM_OVERHEAD: u64 = 64 * 1024;

pub fn router(upload_limits: &UploadLimits) -> Router<SharedState> {
    let body_limit = usize::try_from(upload_limits.max_size.saturating_add(FORM_OVERHEAD))
        .unwrap_or(usize::MAX);
    Router::new()
        .route("/", get(get_assets).post(post_asset))
        .route("/facets", get(get_facets))
        .route("/:id", put(put_asset).delete(delete_asset))
        .layer(DefaultBodyLimit::max(body_limit))
}

#[utoipa::path(post, path = "/assets",
request_body(content = UploadAssetForm, content_type = "multipart/form-data"),
responses(
    (status = CREATED, body = Asset),
    (status = BAD_REQUEST, body = ErrorBody, description = "Upload rejected, see error code"),
    (status = INTERNAL_SERVER_ERROR, body = ErrorBody)
),
)]
#[tracing::instrument(skip(app_state, multipart))]
pub async fn post_asset(
    State(app_state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Asset>)> {
    let mut multipart = multipart.map_err(|_| HttpError::BadRequest("INVALID_MULTIPART"))?;
    let form = read_upload_form(&mut multipart, &app_state.upload_limits)
        .in_current_span()
        .await?;
    let upload = validate_upload(form, &app_state.upload_limits)?;
    let asset = app_state.service.create(upload).in_current_span().await?;
    Ok((StatusCode::CREATED, Json(asset.into())))
}

/// Reads the form, rejecting a disallowed file type as soon as the file name
/// is known and an oversized file as soon as the limit is crossed.
async fn read_upload_form(
    multipart: &mut Multipart,
    limits: &UploadLimits,
) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        match (field_name.as_deref(), file_name) {
            (Some("file"), Some(file_name)) => {
                if form.file.is_some() {
                    return Err(ValidationError::UnexpectedFile.into());
                }
                check_file_name(&file_name)?;
                let content_type = field.content_type().map(str::to_owned);
                let mut data: Vec<u8> = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    data.extend_from_slice(&chunk);
                    check_size(data.len() as u64, limits)?;
                }
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            // a file under any other field name
            (_, Some(_)) => return Err(ValidationError::UnexpectedFile.into()),
            (Some("name"), None) => {
                form.name = Some(field.text().await.map_err(multipart_error)?);
            }
            (Some("tags"), None) => {
                form.tags = Some(field.text().await.map_err(multipart_error)?);
            }
            (other, None) => {
                debug!(field = ?other, "ignoring unknown form field");
            }
        }
    }
    Ok(form)
}

fn multipart_error(err: MultipartError) -> HttpError {
    match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ValidationError::FileTooLarge.into(),
        _ => HttpError::BadRequest("INVALID_MULTIPART"),
    }
}

#[utoipa::path(get, path = "/assets",
params(AssetListQuery),
responses(
    (status = 200, body = [Asset], description = "Newest first"),
    (status = INTERNAL_SERVER_ERROR, body = ErrorBody)
),
)]
#[tracing::instrument(skip(app_state))]
pub async fn get_assets(
    State(app_state): State<SharedState>,
    Query(query): Query<AssetListQuery>,
) -> ApiResult<Json<Vec<Asset>>> {
    let ty = match query.ty.as_deref().filter(|ty| !ty.is_empty()) {
        None => None,
        Some(ty) => match model::AssetType::from_extension(ty) {
            Some(ty) => Some(ty),
            // no asset can have an unknown type
            None => return Ok(Json(Vec::new())),
        },
    };
    let filter = AssetListFilter {
        search: query.search.filter(|search| !search.is_empty()),
        ty,
    };
    let assets = app_state
        .service
        .list(filter)
        .in_current_span()
        .await?
        .into_iter()
        .map(Asset::from)
        .collect();
    Ok(Json(assets))
}

#[utoipa::path(get, path = "/assets/facets",
responses(
    (status = 200, body = Facets),
    (status = INTERNAL_SERVER_ERROR, body = ErrorBody)
),
)]
#[tracing::instrument(skip(app_state))]
pub async fn get_facets(State(app_state): State<SharedState>) -> ApiResult<Json<Facets>> {
    let assets = app_state
        .service
        .list(AssetListFilter::default())
        .in_current_span()
        .await?;
    Ok(Json(Facets {
        tags: available_tags(&assets),
        types: available_types(&assets),
    }))
}

#[utoipa::path(put, path = "/assets/{id}",
request_body = UpdateAssetRequest,
responses(
    (status = 200, body = Asset),
    (status = BAD_REQUEST, body = ErrorBody, description = "EMPTY_NAME or INVALID_BODY"),
    (status = NOT_FOUND, description = "Asset not found"),
    (status = INTERNAL_SERVER_ERROR, body = ErrorBody)
),
params(
    ("id" = i64, Path, description = "AssetId")
)
)]
#[tracing::instrument(skip(app_state, payload))]
pub async fn put_asset(
    Path(id): Path<String>,
    State(app_state): State<SharedState>,
    payload: Result<Json<UpdateAssetRequest>, JsonRejection>,
) -> ApiResult<Json<Asset>> {
    let id = parse_asset_id(&id)?;
    let Json(request) = payload.map_err(|rejection| {
        debug!("invalid update body: {}", rejection.body_text());
        HttpError::BadRequest("INVALID_BODY")
    })?;
    let asset = app_state
        .service
        .update(id, request.into())
        .in_current_span()
        .await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(delete, path = "/assets/{id}",
responses(
    (status = NO_CONTENT, description = "File and record deleted"),
    (status = NOT_FOUND, description = "Asset not found"),
    (status = INTERNAL_SERVER_ERROR, body = ErrorBody)
),
params(
    ("id" = i64, Path, description = "AssetId")
)
)]
#[tracing::instrument(skip(app_state))]
pub async fn delete_asset(
    Path(id): Path<String>,
    State(app_state): State<SharedState>,
) -> ApiResult<StatusCode> {
    let id = parse_asset_id(&id)?;
    match app_state.service.delete(id).in_current_span().await? {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::NotFound => Err(HttpError::NotFound),
    }
}

/// An id that is not a number can not name an asset
fn parse_asset_id(id: &str) -> ApiResult<model::AssetId> {
    id.parse::<i64>()
        .map(model::AssetId)
        .map_err(|_| HttpError::NotFound)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Method, Request, Response},
        Router,
    };
    use camino::Utf8PathBuf as PathBuf;
    use pretty_assertions::assert_eq;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use modelshelf_core::{
        model::repository::db,
        service::AssetService,
        storage::{LocalFileStorage, PublicUrls},
    };

    use super::*;
    use crate::{app_state::AppState, routes::app};

    const BOUNDARY: &str = "modelshelf-test-boundary";
    const BASE_URL: &str = "http://localhost:8080";

    struct TestApp {
        _dir: tempfile::TempDir,
        router: Router,
    }

    impl TestApp {
        async fn new(max_size: u64) -> TestApp {
            let dir = tempfile::tempdir().unwrap();
            let root = PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
            let pool = db::open_and_migrate(root.join("test.db").as_str())
                .await
                .unwrap();
            let files_dir = root.join("assets");
            let storage = LocalFileStorage::new(files_dir.clone());
            storage.init().await.unwrap();
            let service = AssetService::new(pool, Arc::new(storage), PublicUrls::new(BASE_URL));
            let state = Arc::new(AppState {
                service,
                upload_limits: UploadLimits { max_size },
                files_dir,
            });
            TestApp {
                _dir: dir,
                router: app(state),
            }
        }

        async fn send(&self, request: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn upload(&self, parts: &[Part<'_>]) -> Response<Body> {
            self.send(multipart_request(parts)).await
        }

        async fn get(&self, uri: &str) -> Response<Body> {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn put_json(&self, uri: &str, json: &str) -> Response<Body> {
            self.send(
                Request::put(uri)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_owned()))
                    .unwrap(),
            )
            .await
        }

        async fn delete(&self, uri: &str) -> Response<Body> {
            self.send(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
        }
    }

    enum Part<'a> {
        File(&'a str, &'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
        let mut body: Vec<u8> = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::File(field, file_name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            field, file_name
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
                Part::Text(field, value) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                            field, value
                        )
                        .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Request::post("/assets")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json<T: DeserializeOwned>(response: Response<Body>) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn error_code(response: Response<Body>) -> String {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        json::<serde_json::Value>(response).await["error"]
            .as_str()
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn upload_list_and_download() {
        let app = TestApp::new(1024).await;
        let response = app
            .upload(&[
                Part::Text("name", "Office Chair"),
                Part::Text("tags", "chair, wood"),
                Part::File("file", "chair.GLB", b"glTF binary"),
            ])
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Asset = json(response).await;
        assert_eq!(created.name, "Office Chair");
        assert_eq!(created.ty, crate::schema::AssetType::Glb);
        assert_eq!(created.size, 11);
        assert_eq!(
            created.tags,
            Some(vec!["chair".to_owned(), "wood".to_owned()])
        );
        assert!(created.file_url.starts_with("http://localhost:8080/files/assets/"));

        let response = app.get("/assets").await;
        assert_eq!(response.status(), StatusCode::OK);
        let listed: Vec<Asset> = json(response).await;
        assert_eq!(listed, vec![created.clone()]);

        let file_path = created.file_url.trim_start_matches(BASE_URL);
        let response = app.get(file_path).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"glTF binary");
    }

    #[tokio::test]
    async fn upload_without_name_uses_file_stem() {
        let app = TestApp::new(1024).await;
        let response = app
            .upload(&[Part::File("file", "lamp.obj", b"v 0 0 0")])
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Asset = json(response).await;
        assert_eq!(created.name, "lamp");
        assert_eq!(created.tags, None);
    }

    #[tokio::test]
    async fn upload_rejections() {
        let app = TestApp::new(16).await;
        let response = app.upload(&[Part::Text("name", "No file")]).await;
        assert_eq!(error_code(response).await, "FILE_MISSING");
        let response = app
            .upload(&[Part::File("file", "model.stl", b"solid")])
            .await;
        assert_eq!(error_code(response).await, "INVALID_TYPE");
        let response = app
            .upload(&[Part::File("file", "big.fbx", &[0u8; 17])])
            .await;
        assert_eq!(error_code(response).await, "LIMIT_FILE_SIZE");
        let response = app
            .upload(&[
                Part::File("file", "a.obj", b"a"),
                Part::File("file", "b.obj", b"b"),
            ])
            .await;
        assert_eq!(error_code(response).await, "LIMIT_UNEXPECTED_FILE");
        let response = app
            .upload(&[Part::File("attachment", "a.obj", b"a")])
            .await;
        assert_eq!(error_code(response).await, "LIMIT_UNEXPECTED_FILE");

        let listed: Vec<Asset> = json(app.get("/assets").await).await;
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn list_filters_and_facets() {
        let app = TestApp::new(1024).await;
        for (name, file_name, tags) in [
            ("Chair", "chair.glb", "wood"),
            ("Lamp", "lamp.obj", "light, metal"),
            ("Armchair", "armchair.fbx", "wood, soft"),
        ] {
            let response = app
                .upload(&[
                    Part::Text("name", name),
                    Part::Text("tags", tags),
                    Part::File("file", file_name, b"data"),
                ])
                .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }
        let names = |assets: Vec<Asset>| -> Vec<String> {
            let mut names: Vec<String> = assets.into_iter().map(|a| a.name).collect();
            names.sort();
            names
        };
        let found: Vec<Asset> = json(app.get("/assets?search=CHAIR").await).await;
        assert_eq!(names(found), vec!["Armchair", "Chair"]);
        let found: Vec<Asset> = json(app.get("/assets?search=chair&type=glb").await).await;
        assert_eq!(names(found), vec!["Chair"]);
        let found: Vec<Asset> = json(app.get("/assets?type=stl").await).await;
        assert!(found.is_empty());
        let found: Vec<Asset> = json(app.get("/assets?search=&type=").await).await;
        assert_eq!(found.len(), 3);

        let facets: Facets = json(app.get("/assets/facets").await).await;
        assert_eq!(
            facets,
            Facets {
                tags: vec!["light", "metal", "soft", "wood"]
                    .into_iter()
                    .map(str::to_owned)
                    .collect(),
                types: vec!["fbx", "glb", "obj"]
                    .into_iter()
                    .map(str::to_owned)
                    .collect(),
            }
        );
    }

    #[tokio::test]
    async fn update_asset() {
        let app = TestApp::new(1024).await;
        let created: Asset = json(
            app.upload(&[Part::File("file", "chair.glb", b"data")])
                .await,
        )
        .await;
        let uri = format!("/assets/{}", created.id);

        let response = app
            .put_json(&uri, r#"{"name": " Desk Chair ", "tags": ["office", " ", "office"]}"#)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Asset = json(response).await;
        assert_eq!(updated.name, "Desk Chair");
        assert_eq!(updated.tags, Some(vec!["office".to_owned()]));
        assert_eq!(updated.file_url, created.file_url);
        assert_eq!(updated.uploaded_at, created.uploaded_at);

        let response = app.put_json(&uri, r#"{"name": "  "}"#).await;
        assert_eq!(error_code(response).await, "EMPTY_NAME");
        let response = app.put_json(&uri, r#"{"size": 1}"#).await;
        assert_eq!(error_code(response).await, "INVALID_BODY");
        let response = app.put_json("/assets/4242", r#"{"name": "x"}"#).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = app.put_json("/assets/abc", r#"{"name": "x"}"#).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_asset_removes_file_and_record() {
        let app = TestApp::new(1024).await;
        let created: Asset = json(
            app.upload(&[Part::File("file", "chair.glb", b"data")])
                .await,
        )
        .await;
        let uri = format!("/assets/{}", created.id);
        let response = app.delete(&uri).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = app.delete(&uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = app.get(created.file_url.trim_start_matches(BASE_URL)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let listed: Vec<Asset> = json(app.get("/assets").await).await;
        assert!(listed.is_empty());
    }
}
