//! Request authentication.
//!
//! An [`AuthenticationProvider`] runs right before a request is handed to the
//! transport and decorates it with credentials.
//!
//! - [`AnonymousAuthenticationProvider`] - No credentials
//! - [`ApiKeyAuthenticationProvider`] - A static key in a header or the query
//! - [`BaseBearerTokenAuthenticationProvider`] - `Authorization: Bearer` from
//!   an [`AccessTokenProvider`]

use std::collections::HashMap;
use std::future::Future;

use crate::{RequestInformation, Result};

mod allowed_hosts;
mod api_key;
mod bearer;

pub use allowed_hosts::AllowedHostsValidator;
pub use api_key::{ApiKeyAuthenticationProvider, KeyLocation};
pub use bearer::{AccessTokenProvider, BaseBearerTokenAuthenticationProvider, CLAIMS_KEY};

/// Extra values handed to the authentication provider for one call.
pub type AdditionalContext = HashMap<String, serde_json::Value>;

/// Authenticates requests before they are sent.
pub trait AuthenticationProvider: Send + Sync {
    /// Add credentials to `request`.
    fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        context: &AdditionalContext,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousAuthenticationProvider;

impl AuthenticationProvider for AnonymousAuthenticationProvider {
    fn authenticate_request(
        &self,
        _request: &mut RequestInformation,
        _context: &AdditionalContext,
    ) -> impl Future<Output = Result<()>> + Send {
        std::future::ready(Ok(()))
    }
}

impl<P: AuthenticationProvider> AuthenticationProvider for std::sync::Arc<P> {
    fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        context: &AdditionalContext,
    ) -> impl Future<Output = Result<()>> + Send {
        P::authenticate_request(self, request, context)
    }
}
