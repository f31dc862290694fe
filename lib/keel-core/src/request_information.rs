//! The request description built by generated request builders.
//!
//! A [`RequestInformation`] collects the method, URI template, parameters,
//! headers, options and body of one call. [`RequestInformation::uri`]
//! expands the template; the `set_content_*` family serializes the body.
//!
//! # Example
//!
//! ```
//! use keel_core::parameter::ParameterList;
//! use keel_core::{Method, RequestInformation};
//!
//! let mut request = RequestInformation::with_method_and_template(
//!     Method::Get,
//!     "{+baseurl}/users{?%24select,%24top}",
//! );
//! request.set_path_parameter("baseurl", "https://graph.example.com/v1.0")?;
//! request.add_query_parameters(
//!     &ParameterList::new()
//!         .with_tagged("select", "%24select", vec!["id", "displayName"])
//!         .with_tagged("top", "%24top", 10),
//! );
//!
//! assert_eq!(
//!     request.uri()?.as_str(),
//!     "https://graph.example.com/v1.0/users?%24select=id,displayName&%24top=10"
//! );
//! # Ok::<(), keel_core::Error>(())
//! ```

use bytes::Bytes;
use indexmap::IndexMap;
use url::Url;

use crate::content::{RequestBody, serialize_body};
use crate::headers::{CONTENT_TYPE, RequestHeaders};
use crate::multipart::MultipartBody;
use crate::options::{RequestOption, RequestOptions};
use crate::parameter::{ParamValue, Parameter, ParameterSource, ToParameter, normalize};
use crate::serialization::{Parsable, ScalarValue, SerializationWriterFactory};
use crate::uri_template::{TemplateValue, TemplateVariables, UriTemplate};
use crate::{Error, Method, Result};

/// Path parameter holding a complete URL that replaces the template.
pub const RAW_URL_KEY: &str = "request-raw-url";

/// Path parameter holding the service base URL.
pub const BASE_URL_KEY: &str = "baseurl";

/// Media type of raw binary bodies.
pub const OCTET_STREAM: &str = "application/octet-stream";

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::configuration("the parameter name is empty"));
    }
    Ok(())
}

/// Description of one outgoing request.
#[derive(Debug, Clone, Default)]
pub struct RequestInformation {
    method: Method,
    url_template: String,
    path_parameters: IndexMap<String, String>,
    path_parameters_any: IndexMap<String, Parameter>,
    query_parameters: IndexMap<String, String>,
    query_parameters_any: IndexMap<String, Vec<ParamValue>>,
    headers: RequestHeaders,
    options: RequestOptions,
    content: Option<Bytes>,
}

impl RequestInformation {
    /// An empty `GET` request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A request with `method` and `url_template`.
    #[must_use]
    pub fn with_method_and_template(method: Method, url_template: impl Into<String>) -> Self {
        Self {
            method,
            url_template: url_template.into(),
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------------
    // Method and template
    // ------------------------------------------------------------------------

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Set the HTTP method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// The URI template.
    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Set the URI template.
    pub fn set_url_template(&mut self, url_template: impl Into<String>) {
        self.url_template = url_template.into();
    }

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------

    /// Path parameters already rendered as text.
    #[must_use]
    pub fn path_parameters(&self) -> &IndexMap<String, String> {
        &self.path_parameters
    }

    /// Path parameters kept in native form.
    #[must_use]
    pub fn path_parameters_any(&self) -> &IndexMap<String, Parameter> {
        &self.path_parameters_any
    }

    /// Query parameters in flattened form.
    #[must_use]
    pub fn query_parameters(&self) -> &IndexMap<String, String> {
        &self.query_parameters
    }

    /// Query parameters in native list form.
    #[must_use]
    pub fn query_parameters_any(&self) -> &IndexMap<String, Vec<ParamValue>> {
        &self.query_parameters_any
    }

    /// Set a text path parameter.
    pub fn set_path_parameter(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        check_name(name)?;
        self.path_parameters.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Set a path parameter that keeps its native form.
    ///
    /// An absent value removes the parameter.
    pub fn set_path_parameter_any(&mut self, name: &str, value: &dyn ToParameter) -> Result<()> {
        check_name(name)?;
        match value.to_parameter() {
            Some(parameter) => {
                self.path_parameters_any.insert(name.to_string(), parameter);
            }
            None => {
                self.path_parameters_any.shift_remove(name);
            }
        }
        Ok(())
    }

    /// Set a query parameter from text.
    pub fn set_query_parameter(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        check_name(name)?;
        self.query_parameters.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Remove a path parameter from both channels.
    pub fn remove_path_parameter(&mut self, name: &str) {
        self.path_parameters.shift_remove(name);
        self.path_parameters_any.shift_remove(name);
    }

    /// Remove a query parameter from both channels.
    pub fn remove_query_parameter(&mut self, name: &str) {
        self.query_parameters.shift_remove(name);
        self.query_parameters_any.shift_remove(name);
    }

    /// Normalize every present field of `source` into the query parameters.
    pub fn add_query_parameters(&mut self, source: &(impl ParameterSource + ?Sized)) {
        let normalized = normalize(source);
        self.query_parameters.extend(normalized.flattened);
        self.query_parameters_any.extend(normalized.native);
    }

    // ------------------------------------------------------------------------
    // URI
    // ------------------------------------------------------------------------

    /// Resolve the URI as text.
    ///
    /// A [`RAW_URL_KEY`] path parameter is returned verbatim and every other
    /// path and query parameter is discarded; the raw URL itself stays, so
    /// parameters added later never bring the template back. Otherwise the
    /// template is expanded; a template that needs [`BASE_URL_KEY`] without
    /// it fails with [`Error::MissingBaseUrl`].
    pub fn resolve_uri(&mut self) -> Result<String> {
        if let Some(raw) = self.path_parameters.get(RAW_URL_KEY).cloned() {
            Url::parse(&raw)?;
            self.clear_parameters();
            tracing::debug!(uri = %raw, "using raw request URL");
            return Ok(raw);
        }

        let template = UriTemplate::parse(&self.url_template)?;
        if template.references(BASE_URL_KEY)
            && !self.path_parameters.contains_key(BASE_URL_KEY)
            && !self.path_parameters_any.contains_key(BASE_URL_KEY)
        {
            return Err(Error::MissingBaseUrl);
        }

        let expanded = template.expand(&self.template_variables());
        Url::parse(&expanded)?;
        tracing::debug!(template = %self.url_template, uri = %expanded, "resolved request URI");
        Ok(expanded)
    }

    /// Resolve the URI.
    pub fn uri(&mut self) -> Result<Url> {
        Ok(Url::parse(&self.resolve_uri()?)?)
    }

    /// Use `uri` as-is from now on and drop every other path and query
    /// parameter.
    pub fn set_uri(&mut self, uri: Url) {
        self.clear_parameters();
        self.path_parameters.insert(RAW_URL_KEY.to_string(), uri.into());
    }

    /// Keeps the raw URL, if any.
    fn clear_parameters(&mut self) {
        self.path_parameters.retain(|name, _| name == RAW_URL_KEY);
        self.path_parameters_any.clear();
        self.query_parameters.clear();
        self.query_parameters_any.clear();
    }

    /// Flattened values first, native values on top.
    fn template_variables(&self) -> TemplateVariables {
        let mut variables = TemplateVariables::new();
        for (name, value) in &self.path_parameters {
            variables.insert_scalar(name.as_str(), value.as_str());
        }
        for (name, value) in &self.query_parameters {
            variables.insert_scalar(name.as_str(), value.as_str());
        }
        for (name, parameter) in &self.path_parameters_any {
            let value = match parameter {
                Parameter::Scalar(value) => TemplateValue::Scalar(value.to_string()),
                Parameter::List(values) | Parameter::Raw(values) => {
                    TemplateValue::List(values.iter().map(ToString::to_string).collect())
                }
            };
            variables.insert(name.as_str(), value);
        }
        for (name, values) in &self.query_parameters_any {
            variables.insert_list(name.as_str(), values.iter().map(ToString::to_string));
        }
        if let Some(TemplateValue::Scalar(base_url)) = variables.get(BASE_URL_KEY).cloned() {
            variables.insert_reserved(BASE_URL_KEY, base_url);
        }
        variables
    }

    // ------------------------------------------------------------------------
    // Headers and options
    // ------------------------------------------------------------------------

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    /// Mutable request headers.
    pub fn headers_mut(&mut self) -> &mut RequestHeaders {
        &mut self.headers
    }

    /// Request options.
    #[must_use]
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Mutable request options.
    pub fn options_mut(&mut self) -> &mut RequestOptions {
        &mut self.options
    }

    /// Attach `option`, replacing one of the same type.
    pub fn add_option<O: RequestOption>(&mut self, option: O) {
        self.options.add(option);
    }

    /// Merge headers, options and query parameters supplied by the caller.
    pub fn configure<Q: ParameterSource>(&mut self, config: &RequestConfiguration<Q>) {
        self.headers.add_all(&config.headers);
        self.options.extend(&config.options);
        if let Some(query) = &config.query_parameters {
            self.add_query_parameters(query);
        }
    }

    // ------------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------------

    /// The body, if set.
    #[must_use]
    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    /// Take the body out.
    pub fn take_content(&mut self) -> Option<Bytes> {
        self.content.take()
    }

    /// Serialize `body` as `content_type` and adopt it as the request body.
    ///
    /// `Content-Type` is added unless already present.
    pub fn set_content(
        &mut self,
        factory: &dyn SerializationWriterFactory,
        content_type: &str,
        body: RequestBody<'_>,
    ) -> Result<()> {
        let serialized = serialize_body(factory, content_type, body)?;
        self.content = Some(serialized.content);
        self.headers.try_add(CONTENT_TYPE, serialized.content_type);
        Ok(())
    }

    /// Body from one model.
    pub fn set_content_from_parsable(
        &mut self,
        factory: &dyn SerializationWriterFactory,
        content_type: &str,
        model: &dyn Parsable,
    ) -> Result<()> {
        self.set_content(factory, content_type, RequestBody::Single(model))
    }

    /// Body from a collection of models.
    pub fn set_content_from_parsable_collection(
        &mut self,
        factory: &dyn SerializationWriterFactory,
        content_type: &str,
        models: &[&dyn Parsable],
    ) -> Result<()> {
        self.set_content(factory, content_type, RequestBody::Collection(models))
    }

    /// Body from one primitive.
    pub fn set_content_from_scalar(
        &mut self,
        factory: &dyn SerializationWriterFactory,
        content_type: &str,
        value: &ScalarValue,
    ) -> Result<()> {
        self.set_content(factory, content_type, RequestBody::Scalar(value))
    }

    /// Body from a collection of primitives of one kind.
    pub fn set_content_from_scalar_collection(
        &mut self,
        factory: &dyn SerializationWriterFactory,
        content_type: &str,
        values: &[ScalarValue],
    ) -> Result<()> {
        self.set_content(factory, content_type, RequestBody::ScalarCollection(values))
    }

    /// Body from a multipart form.
    pub fn set_content_from_multipart(
        &mut self,
        factory: &dyn SerializationWriterFactory,
        content_type: &str,
        body: &MultipartBody,
    ) -> Result<()> {
        self.set_content(factory, content_type, RequestBody::Multipart(body))
    }

    /// Raw binary body, sent as `application/octet-stream`.
    pub fn set_stream_content(&mut self, content: impl Into<Bytes>) {
        self.set_stream_content_with_type(content, OCTET_STREAM);
    }

    /// Raw binary body with an explicit content type.
    pub fn set_stream_content_with_type(&mut self, content: impl Into<Bytes>, content_type: &str) {
        self.content = Some(content.into());
        self.headers.try_add(CONTENT_TYPE, content_type);
    }

    // ------------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------------

    /// Build the HTTP request for the transport, returning the options that
    /// travel alongside it.
    pub fn into_http_request(mut self) -> Result<(http::Request<Bytes>, RequestOptions)> {
        let uri = self.uri()?;
        let headers = self.headers.to_header_map()?;

        let mut request = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(uri.as_str())
            .body(self.content.take().unwrap_or_default())
            .map_err(|err| Error::configuration(format!("cannot build the HTTP request: {err}")))?;
        *request.headers_mut() = headers;

        Ok((request, self.options))
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Headers, options and query parameters supplied by the caller of a
/// generated request builder.
#[derive(Debug, Clone)]
pub struct RequestConfiguration<Q> {
    /// Extra headers.
    pub headers: RequestHeaders,
    /// Extra options.
    pub options: RequestOptions,
    /// Query parameters.
    pub query_parameters: Option<Q>,
}

impl<Q> Default for RequestConfiguration<Q> {
    fn default() -> Self {
        Self {
            headers: RequestHeaders::default(),
            options: RequestOptions::default(),
            query_parameters: None,
        }
    }
}

impl<Q> RequestConfiguration<Q> {
    /// An empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.add(key, value);
        self
    }

    /// Add an option.
    #[must_use]
    pub fn option<O: RequestOption>(mut self, option: O) -> Self {
        self.options.add(option);
        self
    }

    /// Set the query parameters.
    #[must_use]
    pub fn query(mut self, query_parameters: Q) -> Self {
        self.query_parameters = Some(query_parameters);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::duration::IsoDuration;
    use crate::parameter::{ParameterList, RawValues, ToParamValue};
    use crate::serialization::{ScalarKind, SerializationWriter};
    use crate::temporal::{DateOnly, TimeOnly};

    // ------------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------------

    #[derive(Debug, Clone, Copy)]
    enum PersonStatus {
        Active,
        Suspended,
    }

    impl ToParamValue for PersonStatus {
        fn to_param_value(&self) -> ParamValue {
            ParamValue::String(
                match self {
                    Self::Active => "active",
                    Self::Suspended => "suspended",
                }
                .to_string(),
            )
        }
    }

    impl ToParameter for PersonStatus {
        fn to_parameter(&self) -> Option<Parameter> {
            Some(Parameter::Scalar(self.to_param_value()))
        }
    }

    type Calls = Arc<Mutex<HashMap<&'static str, usize>>>;

    struct CountingWriter {
        calls: Calls,
    }

    impl CountingWriter {
        fn record(&self, call: &'static str) {
            *self.calls.lock().expect("lock").entry(call).or_default() += 1;
        }
    }

    impl SerializationWriter for CountingWriter {
        fn write_scalar_value(&mut self, _key: Option<&str>, _value: &ScalarValue) -> Result<()> {
            self.record("write_scalar_value");
            Ok(())
        }

        fn write_collection_of_scalar_values(
            &mut self,
            _key: Option<&str>,
            _kind: ScalarKind,
            _values: &[ScalarValue],
        ) -> Result<()> {
            self.record("write_collection_of_scalar_values");
            Ok(())
        }

        fn write_object_value(&mut self, _key: Option<&str>, _value: &dyn Parsable) -> Result<()> {
            self.record("write_object_value");
            Ok(())
        }

        fn write_collection_of_object_values(
            &mut self,
            _key: Option<&str>,
            _values: &[&dyn Parsable],
        ) -> Result<()> {
            self.record("write_collection_of_object_values");
            Ok(())
        }

        fn write_null_value(&mut self, _key: Option<&str>) -> Result<()> {
            Ok(())
        }

        fn serialized_content(&mut self) -> Result<Bytes> {
            Ok(Bytes::from_static(b"{}"))
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        calls: Calls,
    }

    impl CountingFactory {
        fn count(&self, call: &str) -> usize {
            self.calls
                .lock()
                .expect("lock")
                .get(call)
                .copied()
                .unwrap_or_default()
        }
    }

    impl SerializationWriterFactory for CountingFactory {
        fn valid_content_type(&self) -> Result<String> {
            Ok("application/json".to_string())
        }

        fn writer(&self, _content_type: &str) -> Result<Box<dyn SerializationWriter>> {
            Ok(Box::new(CountingWriter {
                calls: Arc::clone(&self.calls),
            }))
        }
    }

    struct Record;

    impl Parsable for Record {
        fn serialize(&self, _writer: &mut dyn SerializationWriter) -> Result<()> {
            Ok(())
        }
    }

    fn with_base(template: &str) -> RequestInformation {
        let mut request = RequestInformation::with_method_and_template(Method::Post, template);
        request
            .set_path_parameter(BASE_URL_KEY, "http://localhost")
            .expect("base url");
        request
    }

    // ------------------------------------------------------------------------
    // Query parameters
    // ------------------------------------------------------------------------

    #[test]
    fn adds_scalar_query_parameters() {
        let mut request = RequestInformation::new();
        request.add_query_parameters(
            &ParameterList::new()
                .with("Filter", "somefilter")
                .with("Count", Some(true))
                .with("Top", 42_i32),
        );

        check!(request.query_parameters()["Filter"] == "somefilter");
        check!(request.query_parameters()["Count"] == "true");
        check!(request.query_parameters()["Top"] == "42");
        check!(request.query_parameters_any().is_empty());
    }

    #[test]
    fn adds_array_query_parameters() {
        let mut request = RequestInformation::new();
        request.add_query_parameters(
            &ParameterList::new().with("Expand", vec!["somefilter", "someotherfilter"]),
        );
        check!(request.query_parameters()["Expand"] == "somefilter,someotherfilter");
        check!(request.query_parameters_any()["Expand"].len() == 2);
    }

    #[test]
    fn adds_raw_query_parameters() {
        let mut request = RequestInformation::new();
        request.add_query_parameters(
            &ParameterList::new().with("ExpandAny", RawValues::new(["somefilter", "someotherfilter"])),
        );
        check!(!request.query_parameters().contains_key("ExpandAny"));
        check!(request.query_parameters_any()["ExpandAny"].len() == 2);
    }

    #[test]
    fn rejects_empty_parameter_names() {
        let mut request = RequestInformation::new();
        let_assert!(Err(err) = request.set_path_parameter(" ", "x"));
        check!(err.is_configuration());
        let_assert!(Err(_) = request.set_query_parameter("", "x"));
        let_assert!(Err(_) = request.set_path_parameter_any("", &1_i32));
    }

    // ------------------------------------------------------------------------
    // URI resolution
    // ------------------------------------------------------------------------

    #[test]
    fn raw_url_overrides_everything() {
        let mut request = RequestInformation::new();
        request.set_url_template("https://someotherurl.com{?select}");
        let_assert!(Ok(()) = request.set_path_parameter(BASE_URL_KEY, "https://a"));
        let_assert!(Ok(()) = request.set_path_parameter(RAW_URL_KEY, "https://b"));
        request.add_query_parameters(&ParameterList::new().with("select", vec!["f1", "f2"]));

        let_assert!(Ok(uri) = request.resolve_uri());
        check!(uri == "https://b");
        check!(request.query_parameters().is_empty());
        check!(request.query_parameters_any().is_empty());
        check!(request.path_parameters().keys().collect::<Vec<_>>() == [RAW_URL_KEY]);
    }

    #[test]
    fn raw_url_survives_later_parameters() {
        let mut request = with_base("{+baseurl}/users{?top}");
        let_assert!(Ok(()) = request.set_path_parameter(RAW_URL_KEY, "https://b"));
        let_assert!(Ok(uri) = request.resolve_uri());
        check!(uri == "https://b");

        let_assert!(Ok(()) = request.set_query_parameter("top", "5"));
        request.set_url_template("{+baseurl}/other");
        let_assert!(Ok(uri) = request.resolve_uri());
        check!(uri == "https://b");
    }

    #[test]
    fn set_uri_drops_parameters() {
        let mut request = with_base("{+baseurl}/users");
        request.add_query_parameters(&ParameterList::new().with("top", 5_u32));
        request.set_uri(Url::parse("https://example.com/other?x=1").expect("url"));
        check!(request.path_parameters().keys().collect::<Vec<_>>() == [RAW_URL_KEY]);
        check!(request.query_parameters().is_empty());
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "https://example.com/other?x=1");
    }

    #[test]
    fn set_uri_survives_later_parameters() {
        let mut request = with_base("{+baseurl}/users{?top}");
        request.set_uri(Url::parse("https://b.example.com/other?k=1").expect("url"));
        request.add_query_parameters(&ParameterList::new().with("top", 5_u32));
        let_assert!(Ok(()) = request.set_path_parameter("id", "7"));

        let_assert!(Ok(uri) = request.resolve_uri());
        check!(uri == "https://b.example.com/other?k=1");
        check!(request.query_parameters().is_empty());
    }

    #[test]
    fn simple_base_url_token_keeps_the_scheme() {
        let mut request = RequestInformation::with_method_and_template(Method::Get, "{baseurl}/x{?top}");
        let_assert!(Ok(()) = request.set_path_parameter(BASE_URL_KEY, "https://a.example.com/v1"));
        request.add_query_parameters(&ParameterList::new().with("top", 5_u32));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "https://a.example.com/v1/x?top=5");

        let mut request = RequestInformation::with_method_and_template(Method::Get, "{baseurl}/x");
        let_assert!(Ok(()) = request.set_path_parameter_any(BASE_URL_KEY, &"https://a"));
        let_assert!(Ok(uri) = request.resolve_uri());
        check!(uri == "https://a/x");
    }

    #[test]
    fn raw_values_expand_element_by_element() {
        let when = Utc.with_ymd_and_hms(2022, 8, 1, 20, 34, 58).single().expect("when");
        let raw = RawValues(vec![
            ParamValue::Int(1),
            when.to_param_value(),
            ParamValue::String("a b".to_string()),
        ]);

        let mut request = with_base("{+baseurl}/items{?when}");
        request.add_query_parameters(&ParameterList::new().with("when", raw.clone()));
        check!(!request.query_parameters().contains_key("when"));
        let_assert!(Ok(uri) = request.resolve_uri());
        check!(uri == "http://localhost/items?when=1,2022-08-01T20%3A34%3A58Z,a%20b");

        let mut request = with_base("{+baseurl}/items{?when*}");
        request.add_query_parameters(&ParameterList::new().with("when", raw));
        let_assert!(Ok(uri) = request.resolve_uri());
        check!(uri == "http://localhost/items?when=1&when=2022-08-01T20%3A34%3A58Z&when=a%20b");
    }

    #[test]
    fn raw_path_values_expand_natively() {
        let time: TimeOnly = "08:15:00".parse().expect("time");
        let mut request = with_base("{+baseurl}/slots/{slots}");
        let_assert!(Ok(()) = request.set_path_parameter_any("slots", &RawValues::new([time])));
        check!(!request.path_parameters().contains_key("slots"));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/slots/08%3A15%3A00");
    }

    #[test]
    fn uuid_query_and_path_parameters_are_lowercase() {
        let id = Uuid::parse_str("95E943B8-52D5-4228-902D-61D65792CED7").expect("uuid");

        let mut request = RequestInformation::new();
        request.set_url_template("http://localhost/users{?id}");
        request.add_query_parameters(&ParameterList::new().with("id", Some(id)));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/users?id=95e943b8-52d5-4228-902d-61d65792ced7");

        let mut request = RequestInformation::new();
        request.set_url_template("http://localhost/users/{id}");
        let_assert!(Ok(()) = request.set_path_parameter_any("id", &id));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/users/95e943b8-52d5-4228-902d-61d65792ced7");
    }

    #[test]
    fn number_arrays_are_comma_joined() {
        let mut request = RequestInformation::new();
        request.set_url_template("http://localhost/me{?%24number}");
        request.add_query_parameters(&ParameterList::new().with("%24number", vec![1_i64, 2, 4]));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/me?%24number=1,2,4");
    }

    #[test]
    fn select_and_count() {
        let mut request = RequestInformation::new();
        request.set_url_template("http://localhost/me{?%24select,%24count}");
        request.add_query_parameters(
            &ParameterList::new()
                .with_tagged("select", "%24select", vec!["id", "displayName"])
                .with_tagged("count", "%24count", Some(true)),
        );
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/me?%24select=id,displayName&%24count=true");
    }

    #[test]
    fn exploded_select() {
        let mut request = RequestInformation::new();
        request.set_url_template("http://localhost/me{?%24select*}");
        request.add_query_parameters(
            &ParameterList::new()
                .with_tagged("select", "%24select", vec!["id", "displayName"])
                .with_tagged("count", "%24count", Some(true)),
        );
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/me?%24select=id&%24select=displayName");
    }

    #[test]
    fn empty_array_is_absent_but_empty_string_is_not() {
        let mut request = RequestInformation::new();
        request.set_url_template("http://localhost/me{?%24select}");
        request.add_query_parameters(&ParameterList::new().with("%24select", Vec::<String>::new()));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/me");

        let mut request = RequestInformation::new();
        request.set_url_template("http://localhost/me{?%24search}");
        request.add_query_parameters(&ParameterList::new().with("%24search", Some(String::new())));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/me?%24search=");
    }

    #[test]
    fn date_time_path_parameters_are_escaped() {
        let mut request = RequestInformation::new();
        request.set_url_template(
            "http://localhost/getDirectRoutingCalls(fromDateTime='{fromDateTime}',toDateTime='{toDateTime}')",
        );
        let from = Utc.with_ymd_and_hms(2022, 8, 1, 20, 34, 58).single().expect("from");
        let to = Utc.with_ymd_and_hms(2022, 8, 2, 20, 34, 58).single().expect("to");
        let_assert!(Ok(()) = request.set_path_parameter_any("fromDateTime", &from));
        let_assert!(Ok(()) = request.set_path_parameter_any("toDateTime", &to));

        let_assert!(Ok(uri) = request.resolve_uri());
        check!(uri.contains("fromDateTime='2022-08-01T20%3A34%3A58Z'"));
        check!(uri.contains("toDateTime='2022-08-02T20%3A34%3A58Z'"));
    }

    #[test]
    fn missing_base_url_is_a_configuration_error() {
        let mut request = RequestInformation::new();
        request.set_url_template("{+baseurl}/users{?%24count}");
        let_assert!(Err(Error::MissingBaseUrl) = request.uri());
    }

    #[test]
    fn builds_on_the_base_url() {
        let mut request = with_base("{+baseurl}/users{?%24count}");
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/users");
    }

    #[test]
    fn enum_values() {
        let mut request = with_base("{+baseurl}/users{?status}");
        request.add_query_parameters(&ParameterList::new().with("status", Some(PersonStatus::Active)));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/users?status=active");

        let mut request = with_base("{+baseurl}/users{?statuses}");
        request.add_query_parameters(
            &ParameterList::new().with("statuses", vec![PersonStatus::Active, PersonStatus::Suspended]),
        );
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/users?statuses=active,suspended");

        let mut request = with_base("{+baseurl}/{status}");
        let_assert!(Ok(()) = request.set_path_parameter_any("status", &PersonStatus::Active));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/active");

        let mut request = with_base("{+baseurl}/{statuses}");
        let statuses = [PersonStatus::Active, PersonStatus::Suspended];
        let_assert!(Ok(()) = request.set_path_parameter_any("statuses", &statuses));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/active,suspended");
    }

    fn standardized(
        array: &dyn ToParameter,
        single: &dyn ToParameter,
        reference_array: &dyn ToParameter,
        reference: &dyn ToParameter,
    ) -> String {
        let mut request = with_base(
            "{+baseurl}/array/{arrayValues}/single/{singleValue}/referenceArray/{referenceArray}/referenceValue/{referenceValue}",
        );
        request.set_path_parameter_any("arrayValues", array).expect("array");
        request.set_path_parameter_any("singleValue", single).expect("single");
        request
            .set_path_parameter_any("referenceArray", reference_array)
            .expect("reference array");
        request
            .set_path_parameter_any("referenceValue", reference)
            .expect("reference");
        request.uri().expect("uri").to_string()
    }

    #[test]
    fn date_times_are_standardized() {
        let first = Utc.with_ymd_and_hms(2022, 8, 1, 0, 0, 0).single().expect("first");
        let second = Utc.with_ymd_and_hms(2022, 8, 2, 0, 0, 0).single().expect("second");
        let uri = standardized(&vec![first, second], &first, &vec![&first, &second], &Some(&first));
        check!(
            uri == "http://localhost/array/2022-08-01T00%3A00%3A00Z,2022-08-02T00%3A00%3A00Z/single/2022-08-01T00%3A00%3A00Z/referenceArray/2022-08-01T00%3A00%3A00Z,2022-08-02T00%3A00%3A00Z/referenceValue/2022-08-01T00%3A00%3A00Z"
        );
    }

    #[test]
    fn durations_are_standardized() {
        let duration = |days, hours| IsoDuration {
            days,
            hours,
            ..IsoDuration::default()
        };
        let uri = standardized(
            &vec![duration(1, 1), duration(1, 2)],
            &duration(2, 1),
            &vec![&duration(1, 2)],
            &Some(&duration(1, 1)),
        );
        check!(uri == "http://localhost/array/P1DT1H,P1DT2H/single/P2DT1H/referenceArray/P1DT2H/referenceValue/P1DT1H");
    }

    #[test]
    fn time_only_values_are_standardized() {
        let time: TimeOnly = "16:20:21.000".parse().expect("time");
        let uri = standardized(&vec![time], &time, &vec![&time], &Some(&time));
        check!(
            uri == "http://localhost/array/16%3A20%3A21.000/single/16%3A20%3A21.000/referenceArray/16%3A20%3A21.000/referenceValue/16%3A20%3A21.000"
        );
    }

    #[test]
    fn date_only_values_are_standardized() {
        let date = DateOnly::from_ymd(2020, 1, 4).expect("date");
        let uri = standardized(&vec![date], &date, &vec![&date], &Some(&date));
        check!(uri == "http://localhost/array/2020-01-04/single/2020-01-04/referenceArray/2020-01-04/referenceValue/2020-01-04");
    }

    #[test]
    fn exploded_query_has_one_pair_per_element() {
        let values = ["a", "b", "c", "d"];
        let mut request = RequestInformation::new();
        request.set_url_template("http://localhost/items{?v*}");
        request.add_query_parameters(&ParameterList::new().with("v", values));
        let_assert!(Ok(uri) = request.uri());
        let_assert!(Some(query) = uri.query());
        check!(query.split('&').collect::<Vec<_>>() == ["v=a", "v=b", "v=c", "v=d"]);
    }

    // ------------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------------

    #[test]
    fn content_from_parsable() {
        let factory = CountingFactory::default();
        let mut request = with_base("{+baseurl}/users{?%24count}");
        let_assert!(Ok(()) = request.set_content_from_parsable(&factory, "application/json", &Record));
        check!(factory.count("write_object_value") == 1);
        check!(factory.count("write_collection_of_object_values") == 0);
        check!(request.headers().get_first("Content-Type") == Some("application/json"));
        check!(request.content() == Some(&Bytes::from_static(b"{}")));
    }

    #[test]
    fn content_from_parsable_collection() {
        let factory = CountingFactory::default();
        let mut request = with_base("{+baseurl}/users");
        let_assert!(
            Ok(()) = request.set_content_from_parsable_collection(&factory, "application/json", &[&Record])
        );
        check!(factory.count("write_object_value") == 0);
        check!(factory.count("write_collection_of_object_values") == 1);
    }

    #[test]
    fn content_from_scalars() {
        let factory = CountingFactory::default();
        let mut request = with_base("{+baseurl}/users");
        let_assert!(
            Ok(()) = request.set_content_from_scalar_collection(
                &factory,
                "application/json",
                &[ScalarValue::from("foo")]
            )
        );
        check!(factory.count("write_scalar_value") == 0);
        check!(factory.count("write_collection_of_scalar_values") == 1);

        let factory = CountingFactory::default();
        let_assert!(
            Ok(()) = request.set_content_from_scalar(&factory, "application/json", &ScalarValue::from("foo"))
        );
        check!(factory.count("write_scalar_value") == 1);
        check!(factory.count("write_collection_of_scalar_values") == 0);
    }

    #[test]
    fn content_preconditions() {
        let factory = CountingFactory::default();
        let mut request = with_base("{+baseurl}/users");

        let_assert!(Err(err) = request.set_content_from_parsable(&factory, " ", &Record));
        check!(err.is_configuration());
        let_assert!(Err(err) = request.set_content_from_scalar_collection(&factory, "application/json", &[]));
        check!(err.is_configuration());
        let_assert!(
            Err(err) = request.set_content_from_scalar_collection(
                &factory,
                "application/json",
                &[ScalarValue::from("a"), ScalarValue::from(1_i32)]
            )
        );
        check!(err.is_configuration());
        check!(request.content().is_none());
        check!(factory.count("write_collection_of_scalar_values") == 0);
    }

    #[test]
    fn multipart_sets_the_boundary() {
        let factory = CountingFactory::default();
        let mut request = with_base("{+baseurl}/users");
        let mut body = MultipartBody::new();
        let_assert!(Ok(()) = body.add_or_replace_part("name", "text/plain", "John"));

        let_assert!(Ok(()) = request.set_content_from_multipart(&factory, "multipart/form-data", &body));
        let expected = format!("multipart/form-data; boundary={}", body.boundary());
        check!(request.headers().get_first("Content-Type") == Some(expected.as_str()));
        check!(!body.boundary().is_empty());
    }

    #[test]
    fn stream_content() {
        let mut request = RequestInformation::new();
        request.set_stream_content(vec![1_u8, 2, 3]);
        check!(request.headers().get_first("content-type") == Some(OCTET_STREAM));
        check!(request.content().map(Bytes::len) == Some(3));
    }

    // ------------------------------------------------------------------------
    // Configuration and conversion
    // ------------------------------------------------------------------------

    #[derive(Debug)]
    struct Retry(u8);
    impl RequestOption for Retry {}

    #[test]
    fn configure_merges_everything() {
        let config = RequestConfiguration::new()
            .header("Accept", "application/json")
            .option(Retry(3))
            .query(ParameterList::new().with("top", 5_u32));

        let mut request = with_base("{+baseurl}/users{?top}");
        request.configure(&config);

        check!(request.headers().get_first("accept") == Some("application/json"));
        check!(request.options().get::<Retry>().map(|retry| retry.0) == Some(3));
        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "http://localhost/users?top=5");
    }

    #[test]
    fn converts_to_an_http_request() {
        let mut request = with_base("{+baseurl}/users");
        request.headers_mut().add("Accept", "application/json");
        request.add_option(Retry(1));
        request.set_stream_content_with_type("hello", "text/plain");

        let_assert!(Ok((http_request, options)) = request.into_http_request());
        check!(http_request.method() == http::Method::POST);
        check!(http_request.uri() == "http://localhost/users");
        check!(http_request.headers()["content-type"] == "text/plain");
        check!(http_request.body() == "hello");
        check!(options.contains::<Retry>());
    }
}
