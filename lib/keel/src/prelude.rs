//! Prelude module for convenient imports.
//!
//! ```
//! use keel::prelude::*;
//! ```

pub use crate::auth::{AnonymousAuthenticationProvider, AuthenticationProvider};
pub use crate::{
    ApiClient, ClientConfig, Error, Method, MultipartBody, ParameterEnum, ParameterList,
    ParameterSource, Parsable, RequestAdapter, RequestBody, RequestConfiguration,
    RequestInformation, RequestOption, Result, ScalarValue, SerializationWriter, StatusCode,
    ToParamValue, ToParameter, UriParameters,
};
