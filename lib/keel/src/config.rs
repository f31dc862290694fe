//! Client configuration types.

/// Default content type used for request bodies.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Configuration for an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Value seeded into the `baseurl` path parameter of every request.
    pub base_url: Option<String>,
    /// Content type for bodies set through the client.
    pub default_content_type: String,
    /// `User-Agent` header added when a request has none.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            user_agent: Some(concat!("keel/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    default_content_type: Option<String>,
    user_agent: Option<Option<String>>,
}

impl ClientConfigBuilder {
    /// Set the base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Set the content type for request bodies.
    #[must_use]
    pub fn default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = Some(content_type.into());
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(Some(user_agent.into()));
        self
    }

    /// Do not send a `User-Agent` header.
    #[must_use]
    pub fn without_user_agent(mut self) -> Self {
        self.user_agent = Some(None);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self.base_url.or(defaults.base_url),
            default_content_type: self
                .default_content_type
                .unwrap_or(defaults.default_content_type),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        check!(config.base_url.is_none());
        check!(config.default_content_type == "application/json");
        check!(config.user_agent.as_deref().is_some_and(|agent| agent.starts_with("keel/")));
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder()
            .base_url("https://graph.example.com/v1.0/")
            .default_content_type("application/xml")
            .without_user_agent()
            .build();

        check!(config.base_url.as_deref() == Some("https://graph.example.com/v1.0"));
        check!(config.default_content_type == "application/xml");
        check!(config.user_agent.is_none());
    }
}
