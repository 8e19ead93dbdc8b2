use camino::{Utf8Path as Path, Utf8PathBuf as PathBuf};
use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

use crate::upload::{UploadLimits, DEFAULT_MAX_UPLOAD_SIZE};

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlDataDir {
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlUpload {
    max_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub frontend_url: Option<String>,
    pub public_base_url: Option<String>,
    #[serde(rename = "DataDir")]
    pub data_dir: TomlDataDir,
    #[serde(rename = "Upload")]
    pub upload: Option<TomlUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    pub path: PathBuf,
}

impl DataDir {
    pub fn db_path(&self) -> PathBuf {
        self.path.join("modelshelf.db")
    }

    /// Directory blobs are stored in
    pub fn assets_path(&self) -> PathBuf {
        self.path.join("assets")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address: String,
    pub port: u16,
    /// Allowed CORS origin. Any origin is allowed if unset.
    pub frontend_url: Option<String>,
    /// Base of the URLs stored in `file_url`
    pub public_base_url: String,
    pub data_dir: DataDir,
    pub upload: UploadLimits,
}

pub async fn read_config(path: &Path) -> Result<Config> {
    let toml_str = tokio::fs::read_to_string(path)
        .await
        .context(format!("Error reading config file {}", path))?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    parse_config(&toml_str, base_dir)
}

/// Relative paths in the config are resolved against `base_dir`.
pub fn parse_config(toml_str: &str, base_dir: &Path) -> Result<Config> {
    let toml_config: TomlConfig = toml::from_str(toml_str).context("Error parsing config file")?;
    let address = toml_config
        .address
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());
    let port = toml_config.port.unwrap_or(DEFAULT_PORT);
    let data_dir = {
        let path = PathBuf::from(toml_config.data_dir.path);
        let path = if path.is_relative() {
            base_dir.join(path)
        } else {
            path
        };
        DataDir { path }
    };
    let max_size = match toml_config.upload.and_then(|upload| upload.max_size) {
        Some(s) => parse_size::parse_size(&s)
            .with_context(|| format!("Invalid Upload.max_size '{}'", s))?,
        None => DEFAULT_MAX_UPLOAD_SIZE,
    };
    let public_base_url = toml_config
        .public_base_url
        .unwrap_or_else(|| format!("http://{}:{}", address, port));
    Ok(Config {
        address,
        port,
        frontend_url: toml_config.frontend_url,
        public_base_url,
        data_dir,
        upload: UploadLimits { max_size },
    })
}
