//! The client generated request builders talk to.
//!
//! [`ApiClient`] owns the transport, the authentication provider and the
//! serialization registry shared by every request it creates.

use std::sync::Arc;

use bytes::Bytes;
use keel_core::serialization::SerializationWriterFactoryRegistry;
use keel_core::{
    BASE_URL_KEY, Method, RequestAdapter, RequestBody, RequestInformation, ResponseHandlerOption,
    SerializationWriterFactory,
};
use tracing::Instrument as _;

use crate::auth::{AdditionalContext, AnonymousAuthenticationProvider, AuthenticationProvider};
use crate::config::ClientConfig;
use crate::serialization::{JsonSerializationWriterFactory, MultipartSerializationWriterFactory};
use crate::Result;

const USER_AGENT: &str = "user-agent";

/// Builds and sends requests for one API.
///
/// # Example
///
/// ```ignore
/// use keel::{ApiClient, ClientConfig, Method};
/// use keel::auth::AnonymousAuthenticationProvider;
///
/// let client = ApiClient::new(
///     my_adapter,
///     AnonymousAuthenticationProvider,
///     ClientConfig::builder().base_url("https://graph.example.com/v1.0").build(),
/// );
///
/// let request = client.request(Method::Get, "{+baseurl}/me");
/// let response = client.send(request).await?;
/// ```
#[derive(Debug)]
pub struct ApiClient<A, P = AnonymousAuthenticationProvider> {
    adapter: A,
    auth: P,
    config: ClientConfig,
    registry: Arc<SerializationWriterFactoryRegistry>,
}

impl<A: Clone, P: Clone> Clone for ApiClient<A, P> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            auth: self.auth.clone(),
            config: self.config.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<A, P> ApiClient<A, P>
where
    A: RequestAdapter,
    P: AuthenticationProvider,
{
    /// A client with the JSON and multipart writers registered.
    pub fn new(adapter: A, auth: P, config: ClientConfig) -> Self {
        ApiClientBuilder::new(adapter, auth).config(config).build()
    }

    /// Start building a client.
    pub fn builder(adapter: A, auth: P) -> ApiClientBuilder<A, P> {
        ApiClientBuilder::new(adapter, auth)
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The transport.
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// The serialization registry, usable as a writer factory for any
    /// registered content type.
    #[must_use]
    pub fn writer_factory(&self) -> &SerializationWriterFactoryRegistry {
        &self.registry
    }

    /// A new request with the `baseurl` path parameter seeded from the
    /// configuration.
    pub fn request(&self, method: Method, url_template: &str) -> RequestInformation {
        let mut request = RequestInformation::with_method_and_template(method, url_template);
        if let Some(base_url) = &self.config.base_url
            && let Err(err) = request.set_path_parameter(BASE_URL_KEY, base_url.as_str())
        {
            tracing::warn!(%err, "cannot seed the base URL");
        }
        request
    }

    /// Serialize `body` into `request` with the default content type.
    pub fn set_content(&self, request: &mut RequestInformation, body: RequestBody<'_>) -> Result<()> {
        let content_type = match body {
            RequestBody::Multipart(multipart) => multipart.content_type(),
            _ => self.config.default_content_type.clone(),
        };
        request.set_content(self.registry.as_ref(), &content_type, body)
    }

    /// Authenticate and send `request`.
    pub async fn send(&self, request: RequestInformation) -> Result<http::Response<Bytes>> {
        self.send_with_context(request, &AdditionalContext::new())
            .await
    }

    /// Authenticate with `context` and send `request`.
    ///
    /// A [`ResponseHandlerOption`] attached to the request sees the response
    /// before it is returned.
    pub async fn send_with_context(
        &self,
        mut request: RequestInformation,
        context: &AdditionalContext,
    ) -> Result<http::Response<Bytes>> {
        let span = tracing::info_span!(
            "keel_request",
            method = %request.method(),
            url = tracing::field::Empty,
        );

        async move {
            if let Some(user_agent) = &self.config.user_agent {
                request.headers_mut().try_add(USER_AGENT, user_agent.as_str());
            }
            self.auth.authenticate_request(&mut request, context).await?;

            let (http_request, options) = request.into_http_request()?;
            tracing::Span::current().record("url", tracing::field::display(http_request.uri()));

            let handler = options.get::<ResponseHandlerOption>().cloned();
            let response = self.adapter.execute(http_request, options).await?;
            tracing::debug!(status = %response.status(), "received response");

            if let Some(handler) = handler {
                handler.handler().handle_response(&response)?;
            }
            Ok(response)
        }
        .instrument(span)
        .await
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder<A, P> {
    adapter: A,
    auth: P,
    config: ClientConfig,
    registry: Arc<SerializationWriterFactoryRegistry>,
    backing_store: bool,
}

impl<A, P> ApiClientBuilder<A, P>
where
    A: RequestAdapter,
    P: AuthenticationProvider,
{
    /// Start from the default configuration and a fresh registry.
    pub fn new(adapter: A, auth: P) -> Self {
        Self {
            adapter,
            auth,
            config: ClientConfig::default(),
            registry: Arc::default(),
            backing_store: false,
        }
    }

    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Share `registry` with other clients.
    #[must_use]
    pub fn registry(mut self, registry: Arc<SerializationWriterFactoryRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Register `factory` for its content type unless one is already
    /// registered.
    pub fn register_default_serializer(
        self,
        factory: impl SerializationWriterFactory + 'static,
    ) -> Result<Self> {
        self.registry.register_factory(Arc::new(factory))?;
        Ok(self)
    }

    /// Serialize backed models as their changes only.
    ///
    /// See [`SerializationWriterFactoryRegistry::enable_backing_store`].
    #[must_use]
    pub fn enable_backing_store(mut self) -> Self {
        self.backing_store = true;
        self
    }

    /// Build the client, registering the JSON and multipart writers where no
    /// other writer claims their content types.
    pub fn build(self) -> ApiClient<A, P> {
        for factory in [
            Arc::new(JsonSerializationWriterFactory) as Arc<dyn SerializationWriterFactory>,
            Arc::new(MultipartSerializationWriterFactory),
        ] {
            if let Err(err) = self.registry.register_factory(factory) {
                tracing::warn!(%err, "cannot register a default serialization writer");
            }
        }
        if self.backing_store {
            self.registry.enable_backing_store();
        }

        ApiClient {
            adapter: self.adapter,
            auth: self.auth,
            config: self.config,
            registry: self.registry,
        }
    }
}
