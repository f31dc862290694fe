//! Typed request options.
//!
//! Options are a side-table for transport behavior (response handling,
//! retries, redirects) that request construction carries without
//! understanding. Each option type is its own key.
//!
//! ```
//! use keel_core::options::{RequestOption, RequestOptions};
//!
//! #[derive(Debug)]
//! struct MaxRetries(u8);
//!
//! impl RequestOption for MaxRetries {}
//!
//! let mut options = RequestOptions::new();
//! options.add(MaxRetries(2));
//! options.add(MaxRetries(5));
//!
//! assert_eq!(options.len(), 1);
//! assert_eq!(options.get::<MaxRetries>().map(|o| o.0), Some(5));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;

use crate::Result;

/// Identity of a request option: its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestOptionKey {
    id: TypeId,
    name: &'static str,
}

impl RequestOptionKey {
    /// The key for option type `O`.
    #[must_use]
    pub fn of<O: RequestOption>() -> Self {
        Self {
            id: TypeId::of::<O>(),
            name: std::any::type_name::<O>(),
        }
    }

    /// Type name of the option, for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for RequestOptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A value attached to a request for the transport.
pub trait RequestOption: Any + fmt::Debug + Send + Sync {
    /// The key this option is stored under.
    fn key(&self) -> RequestOptionKey {
        RequestOptionKey {
            id: self.type_id(),
            name: std::any::type_name::<Self>(),
        }
    }
}

/// Options keyed by type, at most one per key.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    entries: IndexMap<RequestOptionKey, Arc<dyn RequestOption>>,
}

impl RequestOptions {
    /// No options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `option`, replacing any option of the same type.
    pub fn add<O: RequestOption>(&mut self, option: O) {
        self.add_shared(Arc::new(option));
    }

    /// Add a shared option, replacing any option with the same key.
    pub fn add_shared(&mut self, option: Arc<dyn RequestOption>) {
        self.entries.insert(option.key(), option);
    }

    /// The option of type `O`.
    #[must_use]
    pub fn get<O: RequestOption>(&self) -> Option<&O> {
        let option: &dyn RequestOption = &**self.entries.get(&RequestOptionKey::of::<O>())?;
        let option: &dyn Any = option;
        option.downcast_ref()
    }

    /// The option stored under `key`.
    #[must_use]
    pub fn get_by_key(&self, key: &RequestOptionKey) -> Option<&Arc<dyn RequestOption>> {
        self.entries.get(key)
    }

    /// Remove the option of type `O`.
    pub fn remove<O: RequestOption>(&mut self) -> bool {
        self.remove_by_key(&RequestOptionKey::of::<O>())
    }

    /// Remove the option stored under `key`.
    pub fn remove_by_key(&mut self, key: &RequestOptionKey) -> bool {
        self.entries.shift_remove(key).is_some()
    }

    /// Returns `true` if an option of type `O` is present.
    #[must_use]
    pub fn contains<O: RequestOption>(&self) -> bool {
        self.entries.contains_key(&RequestOptionKey::of::<O>())
    }

    /// Number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RequestOptionKey, &Arc<dyn RequestOption>)> {
        self.entries.iter()
    }

    /// Add every option of `other`, replacing same-key entries.
    pub fn extend(&mut self, other: &Self) {
        for option in other.entries.values() {
            self.add_shared(Arc::clone(option));
        }
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// Response handler
// ============================================================================

/// Custom processing of the raw response.
///
/// When a [`ResponseHandlerOption`] is attached, the client hands it the
/// response before returning.
pub trait ResponseHandler: fmt::Debug + Send + Sync {
    /// Inspect `response`; an error fails the call.
    fn handle_response(&self, response: &http::Response<Bytes>) -> Result<()>;
}

/// Carries a [`ResponseHandler`] to the client.
#[derive(Debug, Clone)]
pub struct ResponseHandlerOption {
    handler: Arc<dyn ResponseHandler>,
}

impl ResponseHandlerOption {
    /// Wrap `handler`.
    pub fn new(handler: impl ResponseHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &dyn ResponseHandler {
        self.handler.as_ref()
    }
}

impl RequestOption for ResponseHandlerOption {}
