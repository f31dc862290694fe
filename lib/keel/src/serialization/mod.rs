//! Serialization writers shipped with keel.
//!
//! - [`JsonSerializationWriterFactory`] - `application/json`
//! - [`MultipartSerializationWriterFactory`] - `multipart/form-data`

mod json;
mod multipart;

pub use json::{JsonSerializationWriter, JsonSerializationWriterFactory};
pub use multipart::{MultipartSerializationWriter, MultipartSerializationWriterFactory};
