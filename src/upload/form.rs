//! Multipart form extraction.
//!
//! The server buffers the whole body (bounded by `server.max_body_size`)
//! before handing it here, so parsing runs over a single in-memory chunk.

use bytes::Bytes;
use std::collections::HashMap;
use std::convert::Infallible;

use super::error::UploadError;
use crate::constants::FILE_FIELD;

/// The `file` part of an upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as sent by the client, unsanitized
    pub file_name: String,
    /// Raw `Content-Type` header of the part, if any
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Text fields plus the first `file` part of a multipart body
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field. The first value for a name wins.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.entry(name.into()).or_insert_with(|| value.into());
        self
    }

    pub fn with_file(
        mut self,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        if self.file.is_none() {
            self.file = Some(UploadedFile {
                file_name: file_name.into(),
                content_type: content_type.map(str::to_string),
                data: data.into(),
            });
        }
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn take_file(&mut self) -> Option<UploadedFile> {
        self.file.take()
    }

    /// Parse a buffered `multipart/form-data` body.
    ///
    /// Only parts carrying a filename count as files; a plain text part named
    /// `file` is kept as a field and does not satisfy the upload.
    pub async fn parse(content_type: &str, body: Bytes) -> Result<Self, UploadError> {
        let boundary = multer::parse_boundary(content_type)?;
        let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut form = UploadForm::new();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                // Take the header verbatim; multer's parsed mime is normalised
                let content_type = field
                    .headers()
                    .get(http::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let data = field.bytes().await?;
                if name == FILE_FIELD {
                    form = form.with_file(file_name, content_type.as_deref(), data);
                }
                continue;
            }

            let value = field.text().await?;
            form = form.with_field(name, value);
        }

        Ok(form)
    }
}
