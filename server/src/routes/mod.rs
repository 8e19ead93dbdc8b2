use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    request_id::MakeRequestUuid,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};

use crate::app_state::SharedState;

pub mod asset;

/// All routes with request tracing. CORS is left to the caller.
pub fn app(state: SharedState) -> Router {
    let files = ServeDir::new(state.files_dir.as_std_path());
    Router::new()
        .nest("/assets", asset::router(&state.upload_limits))
        .nest_service("/files/assets", files)
        .layer(
            ServiceBuilder::new()
                .set_x_request_id(MakeRequestUuid)
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().include_headers(true))
                        .on_response(DefaultOnResponse::new().include_headers(true)),
                ),
        )
        .with_state(state)
}
