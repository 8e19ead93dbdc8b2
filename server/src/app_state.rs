use std::sync::Arc;

use camino::Utf8PathBuf as PathBuf;
use modelshelf_core::{service::AssetService, upload::UploadLimits};

pub struct AppState {
    pub service: AssetService,
    pub upload_limits: UploadLimits,
    /// Served under /files/assets
    pub files_dir: PathBuf,
}

pub type SharedState = Arc<AppState>;
