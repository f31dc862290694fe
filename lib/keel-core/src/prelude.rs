//! Prelude module for convenient imports.
//!
//! ```
//! use keel_core::prelude::*;
//! ```

pub use crate::{
    DateOnly, Error, IsoDuration, Method, MultipartBody, ParameterList, ParameterSource, Parsable,
    RequestAdapter, RequestBody, RequestConfiguration, RequestHeaders, RequestInformation,
    RequestOption, RequestOptions, Result, ScalarValue, SerializationWriter,
    SerializationWriterFactory, TimeOnly, ToParamValue, ToParameter,
};
