//! Request body dispatch.
//!
//! The caller picks the payload shape; [`RequestBody`] routes it to the one
//! matching writer call and hands back the bytes.

use bytes::Bytes;

use crate::multipart::MultipartBody;
use crate::serialization::{Parsable, ScalarValue, SerializationWriterFactory};
use crate::{Error, Result};

/// A request payload, one variant per writer call.
#[derive(Clone, Copy)]
pub enum RequestBody<'a> {
    /// One model: `write_object_value`.
    Single(&'a dyn Parsable),
    /// Several models: `write_collection_of_object_values`.
    Collection(&'a [&'a dyn Parsable]),
    /// One primitive: `write_scalar_value`.
    Scalar(&'a ScalarValue),
    /// Several primitives of one kind: `write_collection_of_scalar_values`.
    ScalarCollection(&'a [ScalarValue]),
    /// A multipart form, written part by part.
    Multipart(&'a MultipartBody),
}

impl RequestBody<'_> {
    /// Variant name, for logs.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Single(_) => "single",
            Self::Collection(_) => "collection",
            Self::Scalar(_) => "scalar",
            Self::ScalarCollection(_) => "scalar-collection",
            Self::Multipart(_) => "multipart",
        }
    }
}

impl std::fmt::Debug for RequestBody<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Single(..)"),
            Self::Collection(models) => write!(f, "Collection(len={})", models.len()),
            Self::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            Self::ScalarCollection(values) => f.debug_tuple("ScalarCollection").field(values).finish(),
            Self::Multipart(body) => f.debug_tuple("Multipart").field(body).finish(),
        }
    }
}

/// The serialized payload and the `Content-Type` to send with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedBody {
    /// Value for the `Content-Type` header.
    pub content_type: String,
    /// Body bytes.
    pub content: Bytes,
}

/// Serialize `body` as `content_type` with a writer from `factory`.
///
/// Exactly one writer call is made. The writer is closed even when writing
/// fails; writer errors are returned unchanged.
pub fn serialize_body(
    factory: &dyn SerializationWriterFactory,
    content_type: &str,
    body: RequestBody<'_>,
) -> Result<SerializedBody> {
    let content_type = content_type.trim();
    if content_type.is_empty() {
        return Err(Error::configuration("the content type is empty"));
    }

    let scalar_kind = match body {
        RequestBody::ScalarCollection(values) => {
            let (first, rest) = values
                .split_first()
                .ok_or_else(|| Error::configuration("the scalar collection is empty"))?;
            let kind = first.kind();
            if let Some(other) = rest.iter().find(|value| value.kind() != kind) {
                return Err(Error::configuration(format!(
                    "mixed scalar collection: expected {kind}, found {}",
                    other.kind()
                )));
            }
            Some(kind)
        }
        _ => None,
    };

    let mut writer = factory.writer(content_type)?;
    let written = match body {
        RequestBody::Single(model) => writer.write_object_value(None, model),
        RequestBody::Collection(models) => writer.write_collection_of_object_values(None, models),
        RequestBody::Scalar(value) => writer.write_scalar_value(None, value),
        RequestBody::ScalarCollection(values) => match scalar_kind {
            Some(kind) => writer.write_collection_of_scalar_values(None, kind, values),
            None => Ok(()),
        },
        RequestBody::Multipart(multipart) => multipart.serialize_with(writer.as_mut(), Some(factory)),
    };

    let content = written.and_then(|()| writer.serialized_content());
    let closed = writer.close();
    let content = content?;
    closed?;

    let content_type = match body {
        RequestBody::Multipart(multipart) => multipart.content_type(),
        _ => content_type.to_string(),
    };
    tracing::debug!(
        shape = body.shape(),
        %content_type,
        bytes = content.len(),
        "serialized request body"
    );

    Ok(SerializedBody {
        content_type,
        content,
    })
}
