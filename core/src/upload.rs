use thiserror::Error;

use crate::model::AssetType;

/// 50 MiB
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;

/// Rejections of client input. Each variant has a stable machine-readable
/// code that is sent back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no file in upload")]
    FileMissing,
    #[error("file type not allowed, expected one of glb, gltf, fbx, obj")]
    InvalidType,
    #[error("file exceeds the upload size limit")]
    FileTooLarge,
    #[error("more than one file in upload")]
    UnexpectedFile,
    #[error("asset name can not be empty")]
    EmptyName,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::FileMissing => "FILE_MISSING",
            ValidationError::InvalidType => "INVALID_TYPE",
            ValidationError::FileTooLarge => "LIMIT_FILE_SIZE",
            ValidationError::UnexpectedFile => "LIMIT_UNEXPECTED_FILE",
            ValidationError::EmptyName => "EMPTY_NAME",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_size: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        UploadLimits {
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Raw form fields of an upload request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub name: Option<String>,
    /// Comma separated
    pub tags: Option<String>,
}

/// An upload that passed all checks and can be written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub file: UploadedFile,
    pub ty: AssetType,
    pub name: String,
    pub tags: Option<Vec<String>>,
}

/// Checked as soon as the file name is known, before reading the file body.
pub fn check_file_name(file_name: &str) -> Result<AssetType, ValidationError> {
    AssetType::from_file_name(file_name).ok_or(ValidationError::InvalidType)
}

pub fn check_size(size: u64, limits: &UploadLimits) -> Result<(), ValidationError> {
    match size > limits.max_size {
        true => Err(ValidationError::FileTooLarge),
        false => Ok(()),
    }
}

pub fn validate_upload(
    form: UploadForm,
    limits: &UploadLimits,
) -> Result<ValidatedUpload, ValidationError> {
    let file = form.file.ok_or(ValidationError::FileMissing)?;
    let ty = check_file_name(&file.file_name)?;
    check_size(file.data.len() as u64, limits)?;
    let name = form
        .name
        .as_deref()
        .and_then(normalize_name)
        .or_else(|| normalize_name(file_stem(&file.file_name)))
        .unwrap_or_else(|| file.file_name.clone());
    let tags = form.tags.as_deref().and_then(parse_tags);
    Ok(ValidatedUpload {
        file,
        ty,
        name,
        tags,
    })
}

/// Trimmed name, `None` if nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    match name.is_empty() {
        true => None,
        false => Some(name.to_owned()),
    }
}

/// Splits a comma separated tag list.
pub fn parse_tags(raw: &str) -> Option<Vec<String>> {
    normalize_tags(raw.split(','))
}

/// Trims every tag and drops blank and repeated ones, keeping first-seen
/// order. `None` if no tag is left.
pub fn normalize_tags<I, S>(tags: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_owned());
        }
    }
    match normalized.is_empty() {
        true => None,
        false => Some(normalized),
    }
}

/// Everything before the first `.`
fn file_stem(file_name: &str) -> &str {
    let base_name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    base_name.split('.').next().unwrap_or(base_name)
}
