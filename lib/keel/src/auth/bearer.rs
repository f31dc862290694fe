use std::future::Future;

use url::Url;

use crate::auth::{AdditionalContext, AllowedHostsValidator, AuthenticationProvider};
use crate::{RequestInformation, Result};

const AUTHORIZATION: &str = "authorization";

/// Context key carrying a claims challenge; forces a fresh token.
pub const CLAIMS_KEY: &str = "claims";

/// Produces access tokens for a URL.
pub trait AccessTokenProvider: Send + Sync {
    /// The token for `uri`, or an empty string for none.
    fn authorization_token(
        &self,
        uri: &Url,
        context: &AdditionalContext,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Hosts the tokens may be sent to.
    fn allowed_hosts_validator(&self) -> &AllowedHostsValidator;
}

/// Adds `Authorization: Bearer <token>` using an [`AccessTokenProvider`].
///
/// An existing `Authorization` header is kept unless the context carries
/// [`CLAIMS_KEY`].
#[derive(Debug, Clone)]
pub struct BaseBearerTokenAuthenticationProvider<T> {
    provider: T,
}

impl<T: AccessTokenProvider> BaseBearerTokenAuthenticationProvider<T> {
    /// Wrap `provider`.
    pub const fn new(provider: T) -> Self {
        Self { provider }
    }

    /// The token provider.
    pub const fn access_token_provider(&self) -> &T {
        &self.provider
    }
}

impl<T: AccessTokenProvider> AuthenticationProvider for BaseBearerTokenAuthenticationProvider<T> {
    fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        context: &AdditionalContext,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            if context.contains_key(CLAIMS_KEY) {
                request.headers_mut().remove(AUTHORIZATION);
            }
            if request.headers().contains_key(AUTHORIZATION) {
                return Ok(());
            }

            let uri = request.uri()?;
            if !self.provider.allowed_hosts_validator().is_url_host_valid(&uri) {
                tracing::warn!(
                    host = uri.host_str(),
                    "bearer token not sent to a host outside the allow-list"
                );
                return Ok(());
            }

            let token = self.provider.authorization_token(&uri, context).await?;
            if !token.is_empty() {
                request
                    .headers_mut()
                    .add(AUTHORIZATION, format!("Bearer {token}"));
            }
            Ok(())
        }
    }
}
