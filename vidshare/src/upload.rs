//! Seam to the media upload service.

use std::path::Path;

use url::Url;

use crate::errors::RepoError;

/// What the upload service hands back for a stored file.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
    /// Seconds, when the service can tell (videos)
    pub duration: Option<f64>,
}

#[allow(async_fn_in_trait)]
pub trait MediaUploader: Send + Sync {
    /// Upload a local file. `None` means the service produced nothing.
    async fn upload(&self, path: &Path) -> Result<Option<UploadedMedia>, RepoError>;
}

/// Upload `path` and insist on a usable absolute URL.
pub async fn upload_required<U>(uploader: &U, path: &Path, what: &str) -> Result<UploadedMedia, RepoError>
where
    U: MediaUploader,
{
    let media = uploader
        .upload(path)
        .await?
        .ok_or_else(|| RepoError::UpstreamFailure {
            message: format!("{what} upload returned nothing"),
        })?;
    if media.url.trim().is_empty() {
        return Err(RepoError::UpstreamFailure {
            message: format!("{what} upload returned an empty url"),
        });
    }
    Url::parse(&media.url).map_err(|err| RepoError::UpstreamFailure {
        message: format!("{what} upload returned an unusable url `{}`: {err}", media.url),
    })?;
    Ok(media)
}

/// Deterministic uploader: maps a file to `<base>/<file name>` without
/// touching the network. Used for seeding and tests.
#[derive(Debug, Clone)]
pub struct PrefixUploader {
    base: Url,
    duration: Option<f64>,
}

impl PrefixUploader {
    pub fn new(base: &str) -> Result<Self, RepoError> {
        let base = Url::parse(base).map_err(|err| RepoError::invalid("base", err.to_string()))?;
        Ok(Self { base, duration: None })
    }

    /// Report this duration for every upload.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

impl MediaUploader for PrefixUploader {
    async fn upload(&self, path: &Path) -> Result<Option<UploadedMedia>, RepoError> {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        let url = self
            .base
            .join(name)
            .map_err(|err| RepoError::UpstreamFailure { message: err.to_string() })?;
        Ok(Some(UploadedMedia {
            url: url.to_string(),
            duration: self.duration,
        }))
    }
}
