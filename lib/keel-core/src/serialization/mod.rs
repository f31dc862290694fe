//! Serialization contracts.
//!
//! Models implement [`Parsable`]; formats implement [`SerializationWriter`]
//! and hand them out through a [`SerializationWriterFactory`]. The
//! [`SerializationWriterFactoryRegistry`] picks the factory by content type.
//! A [`SerializationWriterProxyFactory`] adds [`SerializationHooks`] to the
//! writers of another factory.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use derive_more::{Display, From};
use uuid::Uuid;

use crate::duration::IsoDuration;
use crate::store::BackedModel;
use crate::temporal::{DateOnly, TimeOnly};
use crate::{Error, Result};

mod proxy;
mod registry;
mod untyped;

pub use self::proxy::{SerializationHooks, SerializationWriterProxyFactory, write_with_hooks};
pub use self::registry::{SerializationWriterFactoryRegistry, vendor_neutral_content_type};
pub use self::untyped::UntypedNode;

/// A model that can write itself.
pub trait Parsable {
    /// Write every field of `self` to `writer`.
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()>;

    /// The change-tracking view of `self`, for models kept in a backing
    /// store.
    fn backed_model(&self) -> Option<&dyn BackedModel> {
        None
    }
}

impl<T: Parsable + ?Sized> Parsable for &T {
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        (**self).serialize(writer)
    }

    fn backed_model(&self) -> Option<&dyn BackedModel> {
        (**self).backed_model()
    }
}

impl<T: Parsable + ?Sized> Parsable for Box<T> {
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        (**self).serialize(writer)
    }

    fn backed_model(&self) -> Option<&dyn BackedModel> {
        (**self).backed_model()
    }
}

/// The type of a [`ScalarValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ScalarKind {
    /// Text.
    #[display("string")]
    String,
    /// Boolean.
    #[display("bool")]
    Bool,
    /// Unsigned byte.
    #[display("byte")]
    Byte,
    /// Signed byte.
    #[display("int8")]
    Int8,
    /// 32-bit integer.
    #[display("int32")]
    Int32,
    /// 64-bit integer.
    #[display("int64")]
    Int64,
    /// 32-bit float.
    #[display("float32")]
    Float32,
    /// 64-bit float.
    #[display("float64")]
    Float64,
    /// UUID.
    #[display("uuid")]
    Uuid,
    /// Date and time with offset.
    #[display("date-time")]
    DateTime,
    /// Date without time.
    #[display("date-only")]
    DateOnly,
    /// Time without date.
    #[display("time-only")]
    TimeOnly,
    /// ISO-8601 duration.
    #[display("duration")]
    Duration,
    /// Binary content.
    #[display("bytes")]
    Bytes,
}

/// A primitive payload or field value.
#[derive(Debug, Clone, PartialEq, From)]
pub enum ScalarValue {
    /// Text.
    String(String),
    /// Boolean.
    Bool(bool),
    /// Unsigned byte.
    Byte(u8),
    /// Signed byte.
    Int8(i8),
    /// 32-bit integer.
    Int32(i32),
    /// 64-bit integer.
    Int64(i64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// UUID.
    Uuid(Uuid),
    /// Date and time with offset.
    DateTime(DateTime<FixedOffset>),
    /// Date without time.
    DateOnly(DateOnly),
    /// Time without date.
    TimeOnly(TimeOnly),
    /// ISO-8601 duration.
    Duration(IsoDuration),
    /// Binary content.
    Bytes(Bytes),
}

impl ScalarValue {
    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        match self {
            Self::String(_) => ScalarKind::String,
            Self::Bool(_) => ScalarKind::Bool,
            Self::Byte(_) => ScalarKind::Byte,
            Self::Int8(_) => ScalarKind::Int8,
            Self::Int32(_) => ScalarKind::Int32,
            Self::Int64(_) => ScalarKind::Int64,
            Self::Float32(_) => ScalarKind::Float32,
            Self::Float64(_) => ScalarKind::Float64,
            Self::Uuid(_) => ScalarKind::Uuid,
            Self::DateTime(_) => ScalarKind::DateTime,
            Self::DateOnly(_) => ScalarKind::DateOnly,
            Self::TimeOnly(_) => ScalarKind::TimeOnly,
            Self::Duration(_) => ScalarKind::Duration,
            Self::Bytes(_) => ScalarKind::Bytes,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Text form; binary content is rendered as its length.
impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Byte(value) => write!(f, "{value}"),
            Self::Int8(value) => write!(f, "{value}"),
            Self::Int32(value) => write!(f, "{value}"),
            Self::Int64(value) => write!(f, "{value}"),
            Self::Float32(value) => write!(f, "{value}"),
            Self::Float64(value) => write!(f, "{value}"),
            Self::Uuid(value) => write!(f, "{value}"),
            Self::DateTime(value) => f.write_str(&value.to_rfc3339()),
            Self::DateOnly(value) => write!(f, "{value}"),
            Self::TimeOnly(value) => write!(f, "{value}"),
            Self::Duration(value) => write!(f, "{value}"),
            Self::Bytes(value) => write!(f, "<{} bytes>", value.len()),
        }
    }
}

/// A format-specific writer.
///
/// `key` is `None` at the root of the payload and for collection elements.
pub trait SerializationWriter {
    /// Write a primitive value.
    fn write_scalar_value(&mut self, key: Option<&str>, value: &ScalarValue) -> Result<()>;

    /// Write a collection of primitives, all of kind `kind`.
    fn write_collection_of_scalar_values(
        &mut self,
        key: Option<&str>,
        kind: ScalarKind,
        values: &[ScalarValue],
    ) -> Result<()>;

    /// Write a nested model.
    fn write_object_value(&mut self, key: Option<&str>, value: &dyn Parsable) -> Result<()>;

    /// Write a collection of models.
    fn write_collection_of_object_values(
        &mut self,
        key: Option<&str>,
        values: &[&dyn Parsable],
    ) -> Result<()>;

    /// Write an explicit null.
    fn write_null_value(&mut self, key: Option<&str>) -> Result<()>;

    /// Write a string value.
    fn write_string_value(&mut self, key: Option<&str>, value: &str) -> Result<()> {
        self.write_scalar_value(key, &ScalarValue::String(value.to_string()))
    }

    /// Everything written so far.
    fn serialized_content(&mut self) -> Result<Bytes>;

    /// Release the writer.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// The hooks run around every model written, if any.
    fn hooks(&self) -> Option<Arc<dyn SerializationHooks>> {
        None
    }

    /// Run `hooks` around every model written from now on.
    ///
    /// Writers that never call hooks reject them with a configuration error.
    fn set_hooks(&mut self, _hooks: Arc<dyn SerializationHooks>) -> Result<()> {
        Err(Error::configuration("this serialization writer does not run hooks"))
    }
}

/// Creates writers for one content type.
pub trait SerializationWriterFactory: Send + Sync {
    /// The content type handled by this factory.
    fn valid_content_type(&self) -> Result<String>;

    /// A fresh writer for `content_type`.
    fn writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>>;
}

impl<T: SerializationWriterFactory + ?Sized> SerializationWriterFactory for Arc<T> {
    fn valid_content_type(&self) -> Result<String> {
        (**self).valid_content_type()
    }

    fn writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>> {
        (**self).writer(content_type)
    }
}

fn open_writer(
    factory: &dyn SerializationWriterFactory,
    content_type: &str,
) -> Result<Box<dyn SerializationWriter>> {
    if content_type.trim().is_empty() {
        return Err(Error::configuration("the content type is empty"));
    }
    factory.writer(content_type)
}

fn finish(mut writer: Box<dyn SerializationWriter>, written: Result<()>) -> Result<Bytes> {
    let content = written.and_then(|()| writer.serialized_content());
    let closed = writer.close();
    let content = content?;
    closed?;
    Ok(content)
}

/// Serialize one model to bytes.
pub fn serialize(
    factory: &dyn SerializationWriterFactory,
    content_type: &str,
    model: &dyn Parsable,
) -> Result<Bytes> {
    let mut writer = open_writer(factory, content_type)?;
    let written = writer.write_object_value(None, model);
    finish(writer, written)
}

/// Serialize a collection of models to bytes.
pub fn serialize_collection(
    factory: &dyn SerializationWriterFactory,
    content_type: &str,
    models: &[&dyn Parsable],
) -> Result<Bytes> {
    let mut writer = open_writer(factory, content_type)?;
    let written = writer.write_collection_of_object_values(None, models);
    finish(writer, written)
}
