//! Procedural macros for keel generated API clients.
//!
//! - `#[derive(UriParameters)]` - Describe a query parameter struct as a
//!   `ParameterSource`
//! - `#[derive(ParameterEnum)]` - Give a fieldless enum a wire name per
//!   variant so it can be used as a parameter value
//!
//! # Example
//!
//! ```ignore
//! use keel::{ParameterEnum, UriParameters};
//!
//! #[derive(ParameterEnum)]
//! #[uri(rename_all = "camelCase")]
//! enum Status {
//!     Active,
//!     Suspended,
//! }
//!
//! #[derive(UriParameters)]
//! #[uri(rename_all = "camelCase")]
//! struct UsersQuery {
//!     #[uri(rename = "%24select")]
//!     select: Option<Vec<String>>,
//!     #[uri(rename = "%24top")]
//!     top: Option<i32>,
//!     status: Option<Status>,
//! }
//! ```

mod enum_derive;
mod parameters_derive;
mod rename;

use proc_macro::TokenStream;

/// Derive `ParameterSource` for a struct with named fields.
///
/// Every field type must implement `ToParameter`. `Option` fields set to
/// `None` and empty sequences are left out of the request.
///
/// # Struct Attributes
///
/// - `#[uri(rename_all = "camelCase")]` - Rename all fields using a case convention
///
/// Supported case conventions:
/// - `lowercase`, `UPPERCASE`
/// - `camelCase`, `PascalCase`
/// - `snake_case`, `SCREAMING_SNAKE_CASE`
/// - `kebab-case`, `SCREAMING-KEBAB-CASE`
///
/// # Field Attributes
///
/// - `#[uri(rename = "%24select")]` - The name used in the URI template
///   (overrides `rename_all`)
/// - `#[uri(skip)]` - Leave the field out
#[proc_macro_derive(UriParameters, attributes(uri))]
pub fn derive_uri_parameters(input: TokenStream) -> TokenStream {
    parameters_derive::expand(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `ToParamValue` and `ToParameter` for a fieldless enum.
///
/// Each variant renders as its name, converted by `#[uri(rename_all = ...)]`
/// or replaced by `#[uri(rename = "...")]`.
#[proc_macro_derive(ParameterEnum, attributes(uri))]
pub fn derive_parameter_enum(input: TokenStream) -> TokenStream {
    enum_derive::expand(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
