//! Runtime abstractions for generated REST API clients.
//!
//! Generated request builders describe each call as a [`RequestInformation`]:
//! a URI template, typed path and query parameters, headers, options and a
//! serialized body. [`ApiClient`] authenticates it and hands it to a
//! [`RequestAdapter`].
//!
//! # Example
//!
//! ```
//! use keel::{Method, RequestInformation, UriParameters};
//!
//! #[derive(UriParameters)]
//! struct UsersQuery {
//!     #[uri(rename = "%24select")]
//!     select: Option<Vec<String>>,
//!     #[uri(rename = "%24top")]
//!     top: Option<i32>,
//! }
//!
//! let mut request =
//!     RequestInformation::with_method_and_template(Method::Get, "{+baseurl}/users{?%24select,%24top}");
//! request.set_path_parameter("baseurl", "https://graph.example.com/v1.0")?;
//! request.add_query_parameters(&UsersQuery {
//!     select: Some(vec!["id".to_string(), "displayName".to_string()]),
//!     top: None,
//! });
//!
//! assert_eq!(
//!     request.uri()?.as_str(),
//!     "https://graph.example.com/v1.0/users?%24select=id,displayName"
//! );
//! # Ok::<(), keel::Error>(())
//! ```

mod api_client;
pub mod auth;
mod config;
pub mod prelude;
pub mod serialization;

// Re-export client types
pub use api_client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_CONTENT_TYPE};

// Re-export core types
pub use keel_core::{
    BASE_URL_KEY, BackedModel, BackingStore, BoxError, DateOnly, DurationError, Error, IsoDuration, Method, MultipartBody,
    OCTET_STREAM, ParamValue, Parameter, ParameterList, ParameterSource, ParameterVisitor,
    PartValue, Parsable, RAW_URL_KEY, RawValues, RequestAdapter, RequestBody,
    RequestConfiguration, RequestHeaders, RequestInformation, RequestOption, RequestOptionKey,
    RequestOptions, ResponseHandler, ResponseHandlerOption, Result, ScalarKind, ScalarValue,
    SerializationHooks, SerializationWriter, SerializationWriterFactory,
    SerializationWriterFactoryRegistry, SerializationWriterProxyFactory, SharedBackingStore,
    TemporalError, TimeOnly, ToParamValue, ToParameter, UntypedNode, UriTemplate,
};
pub use keel_core::{
    content, duration, headers, multipart, options, parameter, store, temporal, uri_template,
};

// Re-export http types for status codes and headers
pub use keel_core::{StatusCode, header};

// Re-export macros
pub use keel_macro::{ParameterEnum, UriParameters};
