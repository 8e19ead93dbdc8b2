use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use camino::Utf8PathBuf as PathBuf;
use clap::Parser;
use eyre::{self, Context, Result};
use modelshelf::{
    app_state::{AppState, SharedState},
    routes,
};
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

use modelshelf_core::{
    config::{read_config, Config},
    model::repository::db,
    service::AssetService,
    storage::{LocalFileStorage, PublicUrls, Storage},
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long)]
    config: String,
    #[cfg(feature = "opentelemetry")]
    #[arg(long)]
    otel_endpoint: Option<String>,
}

/// Only `frontend_url` may call the API if it is configured, any origin otherwise.
fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let allow_origin: AllowOrigin = match &config.frontend_url {
        Some(url) => HeaderValue::from_str(url)
            .wrap_err("invalid frontend_url")?
            .into(),
        None => Any.into(),
    };
    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(allow_origin))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "1")
    }
    if std::env::var("RUST_SPANTRACE").is_err() {
        std::env::set_var("RUST_SPANTRACE", "1");
    }
    color_eyre::install()?;
    if std::env::var("MODELSHELF_LOG").is_err() {
        std::env::set_var("MODELSHELF_LOG", "debug,hyper=info")
    }
    let tracing = tracing_subscriber::registry()
        .with(EnvFilter::from_env("MODELSHELF_LOG"))
        .with(ErrorLayer::default())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    #[cfg(feature = "opentelemetry")]
    {
        use opentelemetry_otlp::WithExportConfig;
        let telemetry = args
            .otel_endpoint
            .as_ref()
            .map(|otel_endpoint| {
                opentelemetry_otlp::new_pipeline()
                    .tracing()
                    .with_exporter(
                        opentelemetry_otlp::new_exporter()
                            .tonic()
                            .with_endpoint(otel_endpoint),
                    )
                    .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
                        opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                            "modelshelf",
                        )]),
                    ))
                    .install_batch(opentelemetry_sdk::runtime::Tokio)
            })
            .transpose()
            .wrap_err("error setting up opentelemetry exporter")?
            .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));
        tracing.with(telemetry).init();
    }
    #[cfg(not(feature = "opentelemetry"))]
    {
        tracing.init();
    }

    let config_path = PathBuf::from(args.config);
    let config = read_config(&config_path).await?;

    let addr: IpAddr = config
        .address
        .parse()
        .wrap_err("error parsing listening address")?;
    let port = config.port;

    info!("Starting up...");
    tokio::fs::create_dir_all(&config.data_dir.path)
        .await
        .wrap_err("error creating data directory")?;
    let pool = db::open_and_migrate(config.data_dir.db_path().as_str()).await?;
    let files_dir = config.data_dir.assets_path();
    let local_storage = LocalFileStorage::new(files_dir.clone());
    local_storage.init().await?;
    let storage: Storage = Arc::new(local_storage);
    let service = AssetService::new(pool, storage, PublicUrls::new(&config.public_base_url));
    service.sweep_orphaned_records().await?;

    let cors = cors_layer(&config)?;
    let shared_state: SharedState = Arc::new(AppState {
        service,
        upload_limits: config.upload,
        files_dir,
    });
    let app = routes::app(shared_state).layer(cors);
    let listener = tokio::net::TcpListener::bind(SocketAddr::new(addr, port))
        .await
        .wrap_err("Error binding socket")?;
    info!(%addr, port, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;
    info!("Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {}
        Err(err) => {
            eprintln!("Unable to listen for shutdown signal: {}", err);
            // we also shut down in case of error
            std::process::exit(1);
        }
    }
}
