//! Multipart form data bodies.
//!
//! A [`MultipartBody`] holds named parts, each with its own content type.
//! It is written through a [`SerializationWriter`] for `multipart/form-data`
//! line by line, so any writer that appends strings and bytes can produce it.
//!
//! # Example
//!
//! ```
//! use keel_core::multipart::{MultipartBody, PartValue};
//!
//! let mut body = MultipartBody::with_boundary("b0undary");
//! body.add_or_replace_part("name", "text/plain", "John Doe")?;
//! body.add_or_replace_part("avatar", "image/png", PartValue::bytes(vec![0x89, 0x50]))?;
//!
//! assert_eq!(body.content_type(), "multipart/form-data; boundary=b0undary");
//! assert!(body.part("NAME")?.is_some());
//! # Ok::<(), keel_core::Error>(())
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::serialization::{Parsable, ScalarValue, SerializationWriter, SerializationWriterFactory};
use crate::{Error, Result};

/// Media type of multipart bodies, without the boundary parameter.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// The content of one part.
pub enum PartValue {
    /// Text, written as-is.
    Text(String),
    /// Binary content, written as-is.
    Bytes(Bytes),
    /// A model, serialized with the writer for the part's content type.
    Model(Box<dyn Parsable + Send + Sync>),
}

impl PartValue {
    /// Binary content.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self::Bytes(data.into())
    }

    /// A model.
    pub fn model(model: impl Parsable + Send + Sync + 'static) -> Self {
        Self::Model(Box::new(model))
    }

    /// The text, if this is a text part.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The bytes, if this is a binary part.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(data) => Some(data),
            _ => None,
        }
    }
}

impl fmt::Debug for PartValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Model(_) => f.write_str("Model(..)"),
        }
    }
}

impl From<&str> for PartValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PartValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Bytes> for PartValue {
    fn from(data: Bytes) -> Self {
        Self::Bytes(data)
    }
}

impl From<Vec<u8>> for PartValue {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(data))
    }
}

#[derive(Debug)]
struct Part {
    name: String,
    content_type: String,
    value: PartValue,
}

/// A `multipart/form-data` body.
///
/// Part names are matched case-insensitively; parts keep insertion order.
pub struct MultipartBody {
    boundary: String,
    parts: IndexMap<String, Part>,
    writer_factory: Option<Arc<dyn SerializationWriterFactory>>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MultipartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartBody")
            .field("boundary", &self.boundary)
            .field("parts", &self.parts.values().collect::<Vec<_>>())
            .field("writer_factory", &self.writer_factory.is_some())
            .finish()
    }
}

fn part_key(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::configuration("the part name is empty"));
    }
    Ok(name.to_lowercase())
}

impl MultipartBody {
    /// An empty body with a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(Uuid::new_v4().simple().to_string())
    }

    /// An empty body with a fixed boundary.
    ///
    /// The boundary must not appear in any part content.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: IndexMap::new(),
            writer_factory: None,
        }
    }

    /// Attach the factory used to serialize model parts.
    #[must_use]
    pub fn with_writer_factory(mut self, factory: Arc<dyn SerializationWriterFactory>) -> Self {
        self.writer_factory = Some(factory);
        self
    }

    /// Attach the factory used to serialize model parts.
    pub fn set_writer_factory(&mut self, factory: Arc<dyn SerializationWriterFactory>) {
        self.writer_factory = Some(factory);
    }

    /// The boundary token.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `multipart/form-data; boundary=<token>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("{MULTIPART_FORM_DATA}; boundary={}", self.boundary)
    }

    /// Add a part, replacing any part with the same name.
    pub fn add_or_replace_part(
        &mut self,
        name: &str,
        content_type: &str,
        value: impl Into<PartValue>,
    ) -> Result<()> {
        let key = part_key(name)?;
        if content_type.trim().is_empty() {
            return Err(Error::configuration("the part content type is empty"));
        }
        self.parts.insert(
            key,
            Part {
                name: name.trim().to_string(),
                content_type: content_type.trim().to_string(),
                value: value.into(),
            },
        );
        Ok(())
    }

    /// The value of part `name`.
    pub fn part(&self, name: &str) -> Result<Option<&PartValue>> {
        Ok(self.parts.get(&part_key(name)?).map(|part| &part.value))
    }

    /// The content type of part `name`.
    pub fn part_content_type(&self, name: &str) -> Result<Option<&str>> {
        Ok(self
            .parts
            .get(&part_key(name)?)
            .map(|part| part.content_type.as_str()))
    }

    /// Remove part `name`; returns `true` if it existed.
    pub fn remove_part(&mut self, name: &str) -> Result<bool> {
        Ok(self.parts.shift_remove(&part_key(name)?).is_some())
    }

    /// Part names in insertion order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.values().map(|part| part.name.as_str())
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if there are no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Write the body with `writer`.
    ///
    /// Model parts are serialized with a writer from `factory`, or from the
    /// attached factory when `factory` is `None`.
    pub fn serialize_with(
        &self,
        writer: &mut dyn SerializationWriter,
        factory: Option<&dyn SerializationWriterFactory>,
    ) -> Result<()> {
        let factory: &dyn SerializationWriterFactory = match factory {
            Some(factory) => factory,
            None => self.writer_factory.as_deref().ok_or_else(|| {
                Error::configuration(
                    "a serialization writer factory is required to write a multipart body",
                )
            })?,
        };
        if self.parts.is_empty() {
            return Err(Error::configuration("a multipart body needs at least one part"));
        }

        let delimiter = format!("--{}", self.boundary);
        for (index, part) in self.parts.values().enumerate() {
            if index > 0 {
                writer.write_string_value(None, "")?;
            }
            writer.write_string_value(None, &delimiter)?;
            writer.write_string_value(Some("Content-Type"), &part.content_type)?;
            writer.write_string_value(
                Some("Content-Disposition"),
                &format!("form-data; name=\"{}\"", part.name),
            )?;
            writer.write_string_value(None, "")?;

            match &part.value {
                PartValue::Text(text) => writer.write_string_value(None, text)?,
                PartValue::Bytes(data) => {
                    writer.write_scalar_value(None, &ScalarValue::Bytes(data.clone()))?;
                }
                PartValue::Model(model) => {
                    let content = crate::serialization::serialize(
                        factory,
                        &part.content_type,
                        model.as_ref(),
                    )?;
                    writer.write_scalar_value(None, &ScalarValue::Bytes(content))?;
                }
            }
        }
        writer.write_string_value(None, "")?;
        writer.write_string_value(None, &format!("{delimiter}--"))
    }
}

impl Parsable for MultipartBody {
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        self.serialize_with(writer, None)
    }
}
