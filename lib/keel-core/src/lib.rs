//! Core types and traits for keel generated API clients.
//!
//! This crate provides the pieces every generated request builder relies on:
//! - [`RequestInformation`] - Method, URI template, parameters, headers,
//!   options and body of one request
//! - [`parameter`] - Normalization of typed query and path parameters
//! - [`uri_template`] - RFC 6570 URI template expansion
//! - [`IsoDuration`], [`DateOnly`], [`TimeOnly`] - Value types with canonical
//!   text forms
//! - [`serialization`] - Writer contracts and the content-type registry
//! - [`RequestBody`] - Dispatch of a body to the matching writer call
//! - [`MultipartBody`] - `multipart/form-data` bodies
//! - [`store`] - Change-tracked model storage
//! - [`RequestAdapter`] - The transport seam
//! - [`Error`] and [`Result`] - Error handling

mod adapter;
pub mod content;
pub mod duration;
mod error;
pub mod headers;
mod method;
pub mod multipart;
pub mod options;
pub mod parameter;
pub mod prelude;
mod request_information;
pub mod serialization;
pub mod store;
pub mod temporal;
pub mod uri_template;

pub use adapter::RequestAdapter;
pub use content::{RequestBody, SerializedBody, serialize_body};
pub use duration::{DurationError, IsoDuration};
pub use error::{BoxError, Error, Result};
pub use headers::RequestHeaders;
pub use method::Method;
pub use multipart::{MultipartBody, PartValue};
pub use options::{
    RequestOption, RequestOptionKey, RequestOptions, ResponseHandler, ResponseHandlerOption,
};
pub use parameter::{
    ParamValue, Parameter, ParameterList, ParameterSource, ParameterVisitor, RawValues,
    ToParamValue, ToParameter,
};
pub use request_information::{
    BASE_URL_KEY, OCTET_STREAM, RAW_URL_KEY, RequestConfiguration, RequestInformation,
};
pub use serialization::{
    Parsable, ScalarKind, ScalarValue, SerializationHooks, SerializationWriter,
    SerializationWriterFactory, SerializationWriterFactoryRegistry,
    SerializationWriterProxyFactory, UntypedNode,
};
pub use store::{BackedModel, BackingStore, SharedBackingStore};
pub use temporal::{DateOnly, TemporalError, TimeOnly};
pub use uri_template::UriTemplate;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
