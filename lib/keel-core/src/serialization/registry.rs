use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::{SerializationWriter, SerializationWriterFactory};
use crate::store::backing_store_proxy;
use crate::{Error, Result};

/// Strip parameters and the vendor prefix from a content type.
///
/// `application/vnd.github+json; charset=utf-8` becomes `application/json`.
#[must_use]
pub fn vendor_neutral_content_type(content_type: &str) -> String {
    let essence = media_type_essence(content_type);
    match essence.split_once('/') {
        Some((kind, subtype)) => match subtype.rsplit_once('+') {
            Some((_, suffix)) => format!("{kind}/{suffix}"),
            None => essence,
        },
        None => essence,
    }
}

fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[derive(Default)]
struct Factories {
    by_content_type: HashMap<String, Arc<dyn SerializationWriterFactory>>,
    backing_store: bool,
}

/// Serialization writer factories keyed by content type.
///
/// Shared by every request of a client: registration takes the write lock,
/// lookups the read lock. Registering a content type twice keeps the first
/// factory.
#[derive(Default)]
pub struct SerializationWriterFactoryRegistry {
    factories: RwLock<Factories>,
}

impl std::fmt::Debug for SerializationWriterFactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationWriterFactoryRegistry")
            .field("content_types", &self.content_types())
            .field("backing_store", &self.backing_store_enabled())
            .finish()
    }
}

impl SerializationWriterFactoryRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `content_type`.
    ///
    /// Returns `false` when the content type already has a factory; the
    /// existing one is kept.
    pub fn register(
        &self,
        content_type: &str,
        factory: Arc<dyn SerializationWriterFactory>,
    ) -> Result<bool> {
        let content_type = media_type_essence(content_type);
        if content_type.is_empty() {
            return Err(Error::configuration("the content type is empty"));
        }

        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if factories.by_content_type.contains_key(&content_type) {
            tracing::debug!(%content_type, "serialization writer factory already registered");
            return Ok(false);
        }
        tracing::debug!(%content_type, "registering serialization writer factory");
        let factory: Arc<dyn SerializationWriterFactory> = if factories.backing_store {
            Arc::new(backing_store_proxy(factory))
        } else {
            factory
        };
        factories.by_content_type.insert(content_type, factory);
        Ok(true)
    }

    /// Register `factory` under its own [`valid_content_type`].
    ///
    /// [`valid_content_type`]: SerializationWriterFactory::valid_content_type
    pub fn register_factory(&self, factory: Arc<dyn SerializationWriterFactory>) -> Result<bool> {
        let content_type = factory.valid_content_type()?;
        self.register(&content_type, factory)
    }

    /// Remove the factory for `content_type`.
    pub fn unregister(&self, content_type: &str) -> bool {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .by_content_type
            .remove(&media_type_essence(content_type))
            .is_some()
    }

    /// Returns `true` if `content_type` has a factory.
    #[must_use]
    pub fn contains(&self, content_type: &str) -> bool {
        self.factory_for(content_type).is_some()
    }

    /// Registered content types, sorted.
    #[must_use]
    pub fn content_types(&self) -> Vec<String> {
        let factories = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut types = factories.by_content_type.keys().cloned().collect::<Vec<_>>();
        types.sort();
        types
    }

    /// Remove every factory.
    pub fn clear(&self) {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .by_content_type
            .clear();
    }

    /// Make every writer honor the backing store of the models it writes.
    ///
    /// Wraps the registered factories, and those registered later, with
    /// [`backing_store_proxy`]. Enabling twice does nothing.
    pub fn enable_backing_store(&self) {
        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if factories.backing_store {
            return;
        }
        factories.backing_store = true;
        for factory in factories.by_content_type.values_mut() {
            *factory = Arc::new(backing_store_proxy(Arc::clone(factory)));
        }
        tracing::debug!("backing store enabled for serialization writers");
    }

    /// Returns `true` once [`enable_backing_store`](Self::enable_backing_store) ran.
    #[must_use]
    pub fn backing_store_enabled(&self) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .backing_store
    }

    /// The factory for `content_type`, trying the exact type first and then
    /// the vendor-neutral one.
    #[must_use]
    pub fn factory_for(&self, content_type: &str) -> Option<Arc<dyn SerializationWriterFactory>> {
        let factories = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        factories
            .by_content_type
            .get(&media_type_essence(content_type))
            .or_else(|| {
                factories
                    .by_content_type
                    .get(&vendor_neutral_content_type(content_type))
            })
            .cloned()
    }
}

impl SerializationWriterFactory for SerializationWriterFactoryRegistry {
    fn valid_content_type(&self) -> Result<String> {
        Err(Error::configuration(
            "the registry supports multiple content types, get the registered factory instead",
        ))
    }

    fn writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>> {
        if content_type.trim().is_empty() {
            return Err(Error::configuration("the content type is empty"));
        }
        let factory = self.factory_for(content_type).ok_or_else(|| {
            Error::configuration(format!(
                "content type {content_type} does not have a factory registered to be serialized"
            ))
        })?;
        factory.writer(&vendor_neutral_content_type(content_type))
    }
}
