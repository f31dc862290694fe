//! The transport seam.
//!
//! Keel builds requests; something else sends them. Implement
//! [`RequestAdapter`] over the HTTP client of your choice, or over a
//! recording double in tests.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use crate::Result;
use crate::options::RequestOptions;

/// Executes fully built HTTP requests.
///
/// The options attached to the originating request travel with it so the
/// transport can honor the ones it understands (retries, redirects, ...).
pub trait RequestAdapter: Send + Sync {
    /// Send `request` and return the buffered response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) when the
    /// exchange fails.
    fn execute(
        &self,
        request: http::Request<Bytes>,
        options: RequestOptions,
    ) -> impl Future<Output = Result<http::Response<Bytes>>> + Send;
}

impl<A: RequestAdapter> RequestAdapter for Arc<A> {
    fn execute(
        &self,
        request: http::Request<Bytes>,
        options: RequestOptions,
    ) -> impl Future<Output = Result<http::Response<Bytes>>> + Send {
        A::execute(self, request, options)
    }
}

impl<A: RequestAdapter> RequestAdapter for &A {
    fn execute(
        &self,
        request: http::Request<Bytes>,
        options: RequestOptions,
    ) -> impl Future<Output = Result<http::Response<Bytes>>> + Send {
        A::execute(self, request, options)
    }
}
