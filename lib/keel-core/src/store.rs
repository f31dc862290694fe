//! Change-tracked model storage.
//!
//! Generated models keep their field values in a [`BackingStore`] so that a
//! `PATCH` can send only what changed since the model was loaded. Wrap a
//! writer factory with [`backing_store_proxy`] to make serialization honor
//! the tracked changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde_json::Value;
use uuid::Uuid;

use crate::serialization::{
    Parsable, SerializationHooks, SerializationWriter, SerializationWriterFactory,
    SerializationWriterProxyFactory,
};
use crate::{Error, Result};

/// Called with `(key, previous, current)` whenever a value changes.
pub type BackingStoreSubscriber = Box<dyn FnMut(&str, Option<&Value>, &Value) + Send>;

/// Storage for model field values.
pub trait BackingStore: Send {
    /// The value for `key`.
    ///
    /// With [`return_only_changed_values`](Self::return_only_changed_values)
    /// set, unchanged values read as `None`.
    fn get(&self, key: &str) -> Result<Option<&Value>>;

    /// Store `value` under `key`, notifying subscribers when it changes.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Every visible value.
    fn enumerate(&self) -> IndexMap<String, Value>;

    /// Keys whose value was changed to null.
    fn enumerate_keys_for_values_changed_to_null(&self) -> Vec<String>;

    /// Register `subscriber` and return its id.
    fn subscribe(&mut self, subscriber: BackingStoreSubscriber) -> String;

    /// Register `subscriber` under `id`, replacing any previous one.
    fn subscribe_with_id(&mut self, subscriber: BackingStoreSubscriber, id: &str) -> Result<()>;

    /// Remove the subscriber registered under `id`.
    fn unsubscribe(&mut self, id: &str) -> Result<()>;

    /// Remove every value.
    fn clear(&mut self);

    /// Returns `true` once the model finished loading.
    fn initialization_completed(&self) -> bool;

    /// Changes made while loading are not tracked.
    fn set_initialization_completed(&mut self, completed: bool);

    /// Returns `true` if only changed values are visible.
    fn return_only_changed_values(&self) -> bool;

    /// Show only changed values.
    fn set_return_only_changed_values(&mut self, only_changed: bool);
}

/// Creates backing stores for new model instances.
pub trait BackingStoreFactory: Send + Sync {
    /// A fresh store.
    fn create_backing_store(&self) -> Box<dyn BackingStore>;
}

fn check_key(key: &str, what: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::configuration(format!("the {what} is empty")));
    }
    Ok(key.to_string())
}

/// A [`BackingStore`] kept in memory.
pub struct InMemoryBackingStore {
    values: IndexMap<String, Value>,
    changed: HashMap<String, bool>,
    subscribers: IndexMap<String, BackingStoreSubscriber>,
    initialization_completed: bool,
    return_only_changed_values: bool,
}

impl Default for InMemoryBackingStore {
    fn default() -> Self {
        Self {
            values: IndexMap::new(),
            changed: HashMap::new(),
            subscribers: IndexMap::new(),
            initialization_completed: true,
            return_only_changed_values: false,
        }
    }
}

impl fmt::Debug for InMemoryBackingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryBackingStore")
            .field("values", &self.values)
            .field("subscribers", &self.subscribers.len())
            .field("initialization_completed", &self.initialization_completed)
            .field("return_only_changed_values", &self.return_only_changed_values)
            .finish_non_exhaustive()
    }
}

impl InMemoryBackingStore {
    /// An empty store with initialization completed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn is_changed(&self, key: &str) -> bool {
        self.changed.get(key).copied().unwrap_or_default()
    }

    fn is_visible(&self, key: &str) -> bool {
        !self.return_only_changed_values || self.is_changed(key)
    }
}

impl BackingStore for InMemoryBackingStore {
    fn get(&self, key: &str) -> Result<Option<&Value>> {
        let key = check_key(key, "key")?;
        if !self.is_visible(&key) {
            return Ok(None);
        }
        Ok(self.values.get(&key))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let key = check_key(key, "key")?;
        if self.values.get(&key) == Some(&value) {
            return Ok(());
        }

        self.changed.insert(key.clone(), self.initialization_completed);
        let previous = self.values.insert(key.clone(), value.clone());
        tracing::trace!(%key, "backing store value changed");
        for subscriber in self.subscribers.values_mut() {
            subscriber(&key, previous.as_ref(), &value);
        }
        Ok(())
    }

    fn enumerate(&self) -> IndexMap<String, Value> {
        self.values
            .iter()
            .filter(|(key, _)| self.is_visible(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn enumerate_keys_for_values_changed_to_null(&self) -> Vec<String> {
        self.values
            .iter()
            .filter(|(key, value)| value.is_null() && self.is_changed(key))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn subscribe(&mut self, subscriber: BackingStoreSubscriber) -> String {
        let id = Uuid::new_v4().to_string();
        self.subscribers.insert(id.clone(), subscriber);
        id
    }

    fn subscribe_with_id(&mut self, subscriber: BackingStoreSubscriber, id: &str) -> Result<()> {
        let id = check_key(id, "subscription id")?;
        self.subscribers.insert(id, subscriber);
        Ok(())
    }

    fn unsubscribe(&mut self, id: &str) -> Result<()> {
        let id = check_key(id, "subscription id")?;
        self.subscribers.shift_remove(&id);
        Ok(())
    }

    fn clear(&mut self) {
        self.values.clear();
        self.changed.clear();
    }

    fn initialization_completed(&self) -> bool {
        self.initialization_completed
    }

    fn set_initialization_completed(&mut self, completed: bool) {
        self.initialization_completed = completed;
    }

    fn return_only_changed_values(&self) -> bool {
        self.return_only_changed_values
    }

    fn set_return_only_changed_values(&mut self, only_changed: bool) {
        self.return_only_changed_values = only_changed;
    }
}

/// Creates [`InMemoryBackingStore`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackingStoreFactory;

impl BackingStoreFactory for InMemoryBackingStoreFactory {
    fn create_backing_store(&self) -> Box<dyn BackingStore> {
        Box::new(InMemoryBackingStore::new())
    }
}

/// A backing store shared between a model and the serialization hooks.
#[derive(Clone)]
pub struct SharedBackingStore(Arc<Mutex<Box<dyn BackingStore>>>);

impl SharedBackingStore {
    /// Share `store`.
    pub fn new(store: impl BackingStore + 'static) -> Self {
        Self::from_box(Box::new(store))
    }

    /// Share an already boxed store.
    #[must_use]
    pub fn from_box(store: Box<dyn BackingStore>) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    /// Share a store created by `factory`.
    #[must_use]
    pub fn from_factory(factory: &dyn BackingStoreFactory) -> Self {
        Self::from_box(factory.create_backing_store())
    }

    /// Exclusive access to the store.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn BackingStore>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedBackingStore {
    fn default() -> Self {
        Self::new(InMemoryBackingStore::new())
    }
}

impl fmt::Debug for SharedBackingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedBackingStore").finish_non_exhaustive()
    }
}

/// A model whose field values live in a backing store.
///
/// Return `Some(self)` from [`Parsable::backed_model`] so the serialization
/// hooks can find the store.
pub trait BackedModel {
    /// The store holding the field values.
    fn backing_store(&self) -> &SharedBackingStore;
}

/// Serialization hooks that restrict backed models to their changes.
///
/// Before a backed model is written its store shows only changed values,
/// keys changed to null are written as explicit nulls, and afterwards the
/// store shows everything again with initialization completed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackingStoreHooks;

impl SerializationHooks for BackingStoreHooks {
    fn on_before(&self, model: &dyn Parsable) {
        if let Some(backed) = model.backed_model() {
            backed.backing_store().lock().set_return_only_changed_values(true);
        }
    }

    fn on_start(&self, model: &dyn Parsable, writer: &mut dyn SerializationWriter) -> Result<()> {
        let Some(backed) = model.backed_model() else {
            return Ok(());
        };
        let keys = backed
            .backing_store()
            .lock()
            .enumerate_keys_for_values_changed_to_null();
        for key in keys {
            writer.write_null_value(Some(key.as_str()))?;
        }
        Ok(())
    }

    fn on_after(&self, model: &dyn Parsable) {
        if let Some(backed) = model.backed_model() {
            let mut store = backed.backing_store().lock();
            store.set_return_only_changed_values(false);
            store.set_initialization_completed(true);
        }
    }
}

/// Wrap `factory` with [`BackingStoreHooks`].
pub fn backing_store_proxy(
    factory: Arc<dyn SerializationWriterFactory>,
) -> SerializationWriterProxyFactory {
    SerializationWriterProxyFactory::new(factory, BackingStoreHooks)
}
