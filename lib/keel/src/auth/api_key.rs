use std::future::Future;

use crate::auth::{AdditionalContext, AllowedHostsValidator, AuthenticationProvider};
use crate::{Error, RequestInformation, Result};

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLocation {
    /// As a request header.
    Header,
    /// As a query parameter appended to the resolved URI.
    QueryParameter,
}

/// Sends a static API key with every request.
#[derive(Debug, Clone)]
pub struct ApiKeyAuthenticationProvider {
    api_key: String,
    parameter_name: String,
    location: KeyLocation,
    validator: AllowedHostsValidator,
}

impl ApiKeyAuthenticationProvider {
    /// A provider sending `api_key` as `parameter_name` at `location`.
    pub fn new(
        api_key: impl Into<String>,
        parameter_name: impl Into<String>,
        location: KeyLocation,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let parameter_name = parameter_name.into();
        if api_key.trim().is_empty() {
            return Err(Error::configuration("the API key is empty"));
        }
        if parameter_name.trim().is_empty() {
            return Err(Error::configuration("the API key parameter name is empty"));
        }
        Ok(Self {
            api_key,
            parameter_name,
            location,
            validator: AllowedHostsValidator::default(),
        })
    }

    /// Only send the key to `hosts`.
    pub fn with_allowed_hosts<I, S>(mut self, hosts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.validator = AllowedHostsValidator::new(hosts)?;
        Ok(self)
    }

    /// The host allow-list.
    #[must_use]
    pub fn allowed_hosts_validator(&self) -> &AllowedHostsValidator {
        &self.validator
    }
}

impl ApiKeyAuthenticationProvider {
    fn apply(&self, request: &mut RequestInformation) -> Result<()> {
        let mut uri = request.uri()?;
        if !self.validator.is_url_host_valid(&uri) {
            tracing::warn!(
                host = uri.host_str(),
                "API key not sent to a host outside the allow-list"
            );
            return Ok(());
        }

        match self.location {
            KeyLocation::Header => {
                request
                    .headers_mut()
                    .add(&self.parameter_name, self.api_key.as_str());
            }
            KeyLocation::QueryParameter => {
                uri.query_pairs_mut()
                    .append_pair(&self.parameter_name, &self.api_key);
                request.set_uri(uri);
            }
        }
        Ok(())
    }
}

impl AuthenticationProvider for ApiKeyAuthenticationProvider {
    fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        _context: &AdditionalContext,
    ) -> impl Future<Output = Result<()>> + Send {
        std::future::ready(self.apply(request))
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    async fn authenticate(provider: &ApiKeyAuthenticationProvider, request: &mut RequestInformation) {
        let_assert!(Ok(()) = provider.authenticate_request(request, &AdditionalContext::new()).await);
    }

    fn request() -> RequestInformation {
        let mut request = RequestInformation::new();
        request.set_url_template("https://localhost{?param1}");
        request
    }

    #[test]
    fn rejects_empty_settings() {
        let_assert!(Err(err) = ApiKeyAuthenticationProvider::new("", "param", KeyLocation::QueryParameter));
        check!(err.is_configuration());
        let_assert!(Err(_) = ApiKeyAuthenticationProvider::new("key", " ", KeyLocation::QueryParameter));
        let_assert!(Ok(_) = ApiKeyAuthenticationProvider::new("key", "param", KeyLocation::Header));
    }

    #[tokio::test]
    async fn adds_the_key_to_the_query() {
        let_assert!(Ok(provider) = ApiKeyAuthenticationProvider::new("key", "param", KeyLocation::QueryParameter));
        let mut request = request();
        authenticate(&provider, &mut request).await;

        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "https://localhost/?param=key");
        check!(!request.headers().contains_key("param"));
    }

    #[tokio::test]
    async fn keeps_other_query_parameters() {
        let_assert!(Ok(provider) = ApiKeyAuthenticationProvider::new("key", "param", KeyLocation::QueryParameter));
        let mut request = request();
        let_assert!(Ok(()) = request.set_query_parameter("param1", "value1"));
        authenticate(&provider, &mut request).await;

        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "https://localhost/?param1=value1&param=key");
    }

    #[tokio::test]
    async fn adds_the_key_to_the_headers() {
        let_assert!(Ok(provider) = ApiKeyAuthenticationProvider::new("key", "param", KeyLocation::Header));
        let mut request = request();
        authenticate(&provider, &mut request).await;

        let_assert!(Ok(uri) = request.uri());
        check!(uri.as_str() == "https://localhost/");
        check!(request.headers().get_first("param") == Some("key"));
    }

    #[tokio::test]
    async fn skips_disallowed_hosts() {
        let_assert!(
            Ok(provider) = ApiKeyAuthenticationProvider::new("key", "param", KeyLocation::Header)
                .and_then(|provider| provider.with_allowed_hosts(["graph.example.com"]))
        );
        let mut request = request();
        authenticate(&provider, &mut request).await;
        check!(!request.headers().contains_key("param"));
    }
}
