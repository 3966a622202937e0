//! Upload handler
//!
//! Shared pipeline behind `/resize_image`, `/crop_image` and
//! `/adjust_contrast`:
//!
//! 1. take the `file` part (400 if absent)
//! 2. accept only `image/jpeg` and `image/png`, matched exactly (415)
//! 3. bind and validate the endpoint's form fields (400)
//! 4. write the raw upload to `<image_dir>/<prefix>-<param><filename>`
//! 5. decode, check the output size (400), transform, re-encode, overwrite
//!    the same file
//! 6. answer `{"filePath", "contentType"}`
//!
//! A failure after step 4 leaves the raw upload on disk.

pub mod error;
pub mod form;
pub mod locks;
pub mod operation;
pub mod path;

pub use error::UploadError;
pub use form::{UploadForm, UploadedFile};
pub use locks::PathLocks;
pub use operation::{ContrastRequest, CropRequest, Operation, OperationKind, ResizeRequest};
pub use path::{destination_path, sanitize_filename};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::constants::FILE_FIELD;
use crate::metrics::Metrics;
use crate::transform::{self, EncodeSettings, ImageConfig, ImageKind, Transform};

/// Success body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub file_path: String,
    pub content_type: String,
}

/// Status plus JSON body, independent of the HTTP framework
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    /// `{"message": ...}` with the given status
    pub fn message(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "message": message.into() }))
    }

    pub fn ok(outcome: &UploadOutcome) -> Self {
        Self::json(200, json!(outcome))
    }

    pub fn from_error(err: &UploadError) -> Self {
        Self::message(err.to_http_status(), err.to_string())
    }

    pub fn body_bytes(&self) -> Bytes {
        Bytes::from(self.body.to_string())
    }
}

/// Blocking half of the pipeline: persist, decode, transform, overwrite
struct TransformJob {
    path: PathBuf,
    data: Bytes,
    kind: ImageKind,
    transform: Transform,
    settings: EncodeSettings,
    limits: ImageConfig,
}

impl TransformJob {
    /// Returns the number of bytes in the final file
    fn run(self) -> Result<usize, UploadError> {
        std::fs::write(&self.path, &self.data).map_err(|e| UploadError::storage(&self.path, e))?;

        let img = transform::decode(&self.data, self.kind, self.limits.max_source_pixels)?;
        self.transform
            .check_output(img.width(), img.height(), &self.limits)?;
        let img = self.transform.apply(&img)?;
        let encoded = transform::encode(&img, self.kind, self.settings)?;

        std::fs::write(&self.path, &encoded).map_err(|e| UploadError::storage(&self.path, e))?;
        Ok(encoded.len())
    }
}

pub struct UploadHandler {
    image_dir: PathBuf,
    image: ImageConfig,
    settings: EncodeSettings,
    locks: Option<PathLocks>,
    permits: Arc<Semaphore>,
    metrics: Arc<Metrics>,
}

impl UploadHandler {
    pub fn new(config: &Config, metrics: Arc<Metrics>) -> Self {
        Self {
            image_dir: config.storage.image_dir.clone(),
            image: config.image.clone(),
            settings: EncodeSettings::from_config(&config.image),
            locks: config.storage.serialize_same_path.then(PathLocks::new),
            permits: Arc::new(Semaphore::new(config.server.max_concurrent_transforms)),
            metrics,
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Run the pipeline for one upload.
    pub async fn handle(
        &self,
        kind: OperationKind,
        mut form: UploadForm,
    ) -> Result<UploadOutcome, UploadError> {
        let file = form
            .take_file()
            .ok_or(UploadError::MissingFile(FILE_FIELD))?;

        let content_type = file.content_type.unwrap_or_default();
        let image_kind = ImageKind::from_content_type(&content_type).map_err(|_| {
            UploadError::UnsupportedMediaType {
                content_type: content_type.clone(),
            }
        })?;

        let operation = kind.bind(&form)?;
        let transform = operation.to_transform(&self.image)?;
        let file_name = sanitize_filename(&file.file_name)?;
        let path = destination_path(&self.image_dir, &operation, &file_name);

        let _path_guard = match &self.locks {
            Some(locks) => Some(locks.acquire(&path).await),
            None => None,
        };
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))?;

        tracing::debug!(
            operation = kind.as_str(),
            path = %path.display(),
            bytes = file.data.len(),
            "Transforming upload"
        );

        let job = TransformJob {
            path: path.clone(),
            data: file.data,
            kind: image_kind,
            transform,
            settings: self.settings,
            limits: self.image.clone(),
        };

        self.metrics.increment_active_transforms();
        let result = tokio::task::spawn_blocking(move || job.run()).await;
        self.metrics.decrement_active_transforms();

        let written = result
            .map_err(|e| UploadError::Internal(format!("transform task failed: {}", e)))??;
        self.metrics.add_bytes_written(written as u64);

        Ok(UploadOutcome {
            file_path: path.to_string_lossy().into_owned(),
            content_type: image_kind.content_type().to_string(),
        })
    }

    /// [`handle`](Self::handle) plus logging and metrics, as a response
    pub async fn respond(&self, kind: OperationKind, form: UploadForm) -> ApiResponse {
        let start = Instant::now();
        self.metrics.increment_operation_count(kind.as_str());

        match self.handle(kind, form).await {
            Ok(outcome) => {
                tracing::info!(
                    operation = kind.as_str(),
                    file_path = %outcome.file_path,
                    content_type = %outcome.content_type,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Upload transformed"
                );
                ApiResponse::ok(&outcome)
            }
            Err(err) => {
                self.metrics.increment_upload_error(err.kind());
                let status = err.to_http_status();
                if status >= 500 {
                    tracing::error!(
                        operation = kind.as_str(),
                        status = status,
                        error = %err,
                        "Upload failed"
                    );
                } else {
                    tracing::warn!(
                        operation = kind.as_str(),
                        status = status,
                        error_kind = err.kind(),
                        error = %err,
                        "Upload rejected"
                    );
                }
                ApiResponse::from_error(&err)
            }
        }
    }
}
