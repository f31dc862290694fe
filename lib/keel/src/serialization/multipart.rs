use std::fmt;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use keel_core::multipart::MULTIPART_FORM_DATA;
use keel_core::serialization::{
    Parsable, ScalarKind, ScalarValue, SerializationHooks, SerializationWriter,
    SerializationWriterFactory, write_with_hooks,
};
use keel_core::{Error, Result};

const CRLF: &[u8] = b"\r\n";

/// Writes `multipart/form-data` bodies.
///
/// Strings are written as lines (`key: value` when keyed), binary content is
/// copied as-is.
#[derive(Default)]
pub struct MultipartSerializationWriter {
    buffer: BytesMut,
    hooks: Option<Arc<dyn SerializationHooks>>,
}

impl fmt::Debug for MultipartSerializationWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartSerializationWriter")
            .field("len", &self.buffer.len())
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

impl MultipartSerializationWriter {
    /// An empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&mut self, key: Option<&str>, value: &str) {
        if let Some(key) = key {
            self.buffer.put_slice(key.as_bytes());
            self.buffer.put_slice(b": ");
        }
        self.buffer.put_slice(value.as_bytes());
        self.buffer.put_slice(CRLF);
    }
}

impl SerializationWriter for MultipartSerializationWriter {
    fn write_scalar_value(&mut self, key: Option<&str>, value: &ScalarValue) -> Result<()> {
        match value {
            ScalarValue::Bytes(data) => self.buffer.put_slice(data),
            ScalarValue::String(text) => self.line(key, text),
            other => self.line(key, &other.to_string()),
        }
        Ok(())
    }

    fn write_collection_of_scalar_values(
        &mut self,
        _key: Option<&str>,
        _kind: ScalarKind,
        _values: &[ScalarValue],
    ) -> Result<()> {
        Err(Error::serialization("collections are not supported in multipart bodies"))
    }

    fn write_object_value(&mut self, _key: Option<&str>, value: &dyn Parsable) -> Result<()> {
        let hooks = self.hooks.clone();
        write_with_hooks(hooks.as_deref(), value, self)
    }

    fn write_collection_of_object_values(
        &mut self,
        _key: Option<&str>,
        _values: &[&dyn Parsable],
    ) -> Result<()> {
        Err(Error::serialization("collections are not supported in multipart bodies"))
    }

    fn write_null_value(&mut self, _key: Option<&str>) -> Result<()> {
        Ok(())
    }

    fn serialized_content(&mut self) -> Result<Bytes> {
        Ok(self.buffer.clone().freeze())
    }

    fn hooks(&self) -> Option<Arc<dyn SerializationHooks>> {
        self.hooks.clone()
    }

    fn set_hooks(&mut self, hooks: Arc<dyn SerializationHooks>) -> Result<()> {
        self.hooks = Some(hooks);
        Ok(())
    }
}

/// Hands out [`MultipartSerializationWriter`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipartSerializationWriterFactory;

impl SerializationWriterFactory for MultipartSerializationWriterFactory {
    fn valid_content_type(&self) -> Result<String> {
        Ok(MULTIPART_FORM_DATA.to_string())
    }

    fn writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if !essence.eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
            return Err(Error::configuration(format!(
                "expected a {MULTIPART_FORM_DATA} content type, got {content_type}"
            )));
        }
        Ok(Box::new(MultipartSerializationWriter::new()))
    }
}
