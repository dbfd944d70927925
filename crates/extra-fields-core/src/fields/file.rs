//! Base64 encoded file uploads
//!
//! [`Base64FileField`] accepts a base64 string, optionally prefixed with a
//! data URI header (`data:image/gif;base64,`), decodes it and asks its
//! [`FileKind`] what kind of file the bytes hold. [`Base64ImageField`] is
//! the field specialized to raster images.
//!
//! Copyright (c) 2025 Extra Fields Team
//! Licensed under the Apache-2.0 license

use super::{messages, Field, FieldDeclaration, FieldOptions};
use crate::error::{ValidationError, ValidationResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use serde_json::Value;
use std::fmt;
use tracing::{debug, trace};
use uuid::Uuid;

const DATA_URI_MARKER: &str = ";base64,";

/// Length of the generated part of a file name
const NAME_LENGTH: usize = 12;

/// Why a decoded payload was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The bytes are not a file of this kind
    Invalid,
    /// The file is well formed but its type is not accepted
    UnknownType,
}

/// Knows how to recognize one kind of file
pub trait FileKind: Send + Sync {
    /// Extensions accepted when the field does not override them
    fn default_allowed_types(&self) -> Vec<String>;

    /// Detect the extension of `content`, or refuse it
    fn inspect(&self, content: &[u8]) -> Result<String, Rejection>;

    /// Message reported for a rejection
    fn message(&self, rejection: Rejection) -> &'static str;
}

/// Raster images, detected and fully decoded with the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageKind;

impl ImageKind {
    fn extension(format: ImageFormat) -> Option<&'static str> {
        match format {
            ImageFormat::Jpeg => Some("jpg"),
            ImageFormat::Png => Some("png"),
            ImageFormat::Gif => Some("gif"),
            ImageFormat::WebP => Some("webp"),
            ImageFormat::Tiff => Some("tiff"),
            ImageFormat::Bmp => Some("bmp"),
            ImageFormat::Ico => Some("ico"),
            other => other.extensions_str().first().copied(),
        }
    }
}

impl FileKind for ImageKind {
    fn default_allowed_types(&self) -> Vec<String> {
        ["jpeg", "jpg", "png", "gif"].iter().map(|t| t.to_string()).collect()
    }

    fn inspect(&self, content: &[u8]) -> Result<String, Rejection> {
        let format = image::guess_format(content).map_err(|_| Rejection::Invalid)?;
        // Truncated or corrupt data must not pass on its magic bytes alone
        image::load_from_memory_with_format(content, format).map_err(|e| {
            debug!(?format, error = %e, "image payload failed to decode");
            Rejection::Invalid
        })?;
        trace!(?format, "detected image format");
        Self::extension(format)
            .map(str::to_string)
            .ok_or(Rejection::UnknownType)
    }

    fn message(&self, rejection: Rejection) -> &'static str {
        match rejection {
            Rejection::Invalid => messages::INVALID_IMAGE,
            Rejection::UnknownType => messages::INVALID_IMAGE_TYPE,
        }
    }
}

/// A decoded upload
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Generated file name, `<12 characters of a UUID>.<extension>`
    pub name: String,
    /// Detected extension
    pub extension: String,
    /// Decoded bytes
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Wrap decoded bytes under a freshly generated name
    pub fn new(extension: String, content: Vec<u8>) -> Self {
        let id = Uuid::new_v4().to_string();
        let name = format!("{}.{}", &id[..NAME_LENGTH], extension);
        Self {
            name,
            extension,
            content,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Field accepting base64 encoded files of kind `K`
///
/// An empty string means "no file", which lets an update remove a stored
/// file.
#[derive(Debug, Clone)]
pub struct Base64FileField<K: FileKind = ImageKind> {
    options: FieldOptions,
    kind: K,
    allowed_types: Vec<String>,
    represent_in_base64: bool,
}

/// Base64 field for raster images
pub type Base64ImageField = Base64FileField<ImageKind>;

impl Default for Base64FileField<ImageKind> {
    fn default() -> Self {
        Self::with_kind(ImageKind)
    }
}

impl Base64FileField<ImageKind> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: FileKind> Base64FileField<K> {
    /// Field for a custom file kind
    pub fn with_kind(kind: K) -> Self {
        Self {
            options: FieldOptions::nullable(),
            allowed_types: kind.default_allowed_types(),
            kind,
            represent_in_base64: false,
        }
    }

    /// Replace the accepted extensions
    pub fn allowed_types<I, S>(mut self, allowed_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = allowed_types.into_iter().map(Into::into).collect();
        self
    }

    /// Render stored files as base64 instead of by name
    pub fn represent_in_base64(mut self, represent_in_base64: bool) -> Self {
        self.represent_in_base64 = represent_in_base64;
        self
    }

    fn reject(&self, rejection: Rejection) -> ValidationError {
        ValidationError::new(self.kind.message(rejection))
    }

    fn decode(&self, text: &str) -> ValidationResult<Vec<u8>> {
        let payload = match text.find(DATA_URI_MARKER) {
            Some(index) => &text[index + DATA_URI_MARKER.len()..],
            None => text,
        };
        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

        STANDARD.decode(payload.as_bytes()).map_err(|e| {
            debug!(error = %e, "payload is not valid base64");
            self.reject(Rejection::Invalid)
        })
    }
}

impl<K: FileKind> FieldDeclaration for Base64FileField<K> {
    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }
}

impl<K: FileKind> Field for Base64FileField<K> {
    type Value = UploadedFile;

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn to_internal_value(&self, data: &Value) -> ValidationResult<Option<UploadedFile>> {
        let text = match data {
            Value::String(text) if text.is_empty() => return Ok(None),
            Value::String(text) => text,
            other => return Err(ValidationError::new(messages::not_base64_string(other))),
        };

        let content = self.decode(text)?;
        let extension = self
            .kind
            .inspect(&content)
            .map_err(|rejection| self.reject(rejection))?;

        if !self.allowed_types.iter().any(|allowed| *allowed == extension) {
            debug!(%extension, "file type not allowed");
            return Err(self.reject(Rejection::UnknownType));
        }

        Ok(Some(UploadedFile::new(extension, content)))
    }

    fn to_representation(&self, value: &UploadedFile) -> Value {
        if self.represent_in_base64 {
            Value::String(STANDARD.encode(&value.content))
        } else {
            Value::String(value.name.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    const GIF: &str = "R0lGODlhAQABAIAAAP///////yH5BAEKAAEALAAAAAABAAEAAAICTAEAOw==";

    fn encoded(format: ImageFormat) -> String {
        let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        STANDARD.encode(bytes.into_inner())
    }

    /// Accepts anything starting with the PDF magic bytes
    struct PdfKind;

    impl FileKind for PdfKind {
        fn default_allowed_types(&self) -> Vec<String> {
            vec!["pdf".to_string()]
        }

        fn inspect(&self, content: &[u8]) -> Result<String, Rejection> {
            if content.starts_with(b"%PDF-") {
                Ok("pdf".to_string())
            } else {
                Err(Rejection::Invalid)
            }
        }

        fn message(&self, rejection: Rejection) -> &'static str {
            match rejection {
                Rejection::Invalid => messages::INVALID_FILE,
                Rejection::UnknownType => messages::INVALID_FILE_TYPE,
            }
        }
    }

    #[test]
    fn test_gif_is_accepted() {
        let field = Base64ImageField::new();
        let file = field.to_internal_value(&json!(GIF)).unwrap().unwrap();
        assert_eq!(file.extension, "gif");
        assert_eq!(file.name.len(), NAME_LENGTH + ".gif".len());
        assert!(file.name.ends_with(".gif"));
        assert!(!file.is_empty());
    }

    #[test]
    fn test_data_uri_prefix_and_whitespace() {
        let field = Base64ImageField::new();
        let wrapped = format!("data:image/gif;base64,{}\n{}", &GIF[..20], &GIF[20..]);
        let file = field.to_internal_value(&json!(wrapped)).unwrap().unwrap();
        assert_eq!(file.extension, "gif");
    }

    #[test]
    fn test_jpeg_is_normalized_to_jpg() {
        let field = Base64ImageField::new();
        let file = field
            .to_internal_value(&Value::String(encoded(ImageFormat::Jpeg)))
            .unwrap()
            .unwrap();
        assert_eq!(file.extension, "jpg");
        assert!(file.name.ends_with(".jpg"));
    }

    #[test]
    fn test_invalid_payloads() {
        let field = Base64ImageField::new();
        let not_an_image = STANDARD.encode(b"plain text, not pixels");
        let truncated = STANDARD.encode(&STANDARD.decode(GIF).unwrap()[..10]);
        for input in ["abc", "!!!!", not_an_image.as_str(), truncated.as_str()] {
            let error = field.to_internal_value(&json!(input)).unwrap_err();
            assert_eq!(error.messages(), vec![messages::INVALID_IMAGE], "input {}", input);
        }
    }

    #[test]
    fn test_disallowed_type() {
        let field = Base64ImageField::new();
        let error = field
            .to_internal_value(&Value::String(encoded(ImageFormat::Bmp)))
            .unwrap_err();
        assert_eq!(error.messages(), vec![messages::INVALID_IMAGE_TYPE]);

        let permissive = Base64ImageField::new().allowed_types(["bmp"]);
        let file = permissive
            .to_internal_value(&Value::String(encoded(ImageFormat::Bmp)))
            .unwrap()
            .unwrap();
        assert_eq!(file.extension, "bmp");
    }

    #[test]
    fn test_empty_string_and_wrong_types() {
        let field = Base64ImageField::new();
        assert_eq!(field.to_internal_value(&json!("")).unwrap(), None);
        assert!(field.run_validation(Some(&Value::Null)).unwrap().is_null());

        let error = field.to_internal_value(&json!(12)).unwrap_err();
        assert_eq!(
            error.messages(),
            vec!["Invalid type. This is not an base64 string: \"int\"."]
        );
    }

    #[test]
    fn test_representation() {
        let file = UploadedFile::new("gif".to_string(), STANDARD.decode(GIF).unwrap());
        assert_eq!(
            Base64ImageField::new().to_representation(&file),
            Value::String(file.name.clone())
        );
        assert_eq!(
            Base64ImageField::new()
                .represent_in_base64(true)
                .to_representation(&file),
            json!(GIF)
        );
    }

    #[test]
    fn test_custom_file_kind() {
        let field = Base64FileField::with_kind(PdfKind);
        let pdf = STANDARD.encode(b"%PDF-1.4 minimal");
        let file = field.to_internal_value(&Value::String(pdf)).unwrap().unwrap();
        assert_eq!(file.extension, "pdf");

        let error = field.to_internal_value(&json!(GIF)).unwrap_err();
        assert_eq!(error.messages(), vec![messages::INVALID_FILE]);
    }
}
