use std::fmt;
use std::sync::Arc;

use super::{Parsable, SerializationWriter, SerializationWriterFactory};
use crate::Result;

/// Callbacks a writer runs around every model it writes.
pub trait SerializationHooks: Send + Sync {
    /// Before anything of `model` is written.
    fn on_before(&self, _model: &dyn Parsable) {}

    /// Once the object for `model` is open, before its fields.
    fn on_start(&self, _model: &dyn Parsable, _writer: &mut dyn SerializationWriter) -> Result<()> {
        Ok(())
    }

    /// After the fields of `model` were written.
    fn on_after(&self, _model: &dyn Parsable) {}
}

/// Runs `first`, then `then`, at every step.
struct ChainedHooks {
    first: Arc<dyn SerializationHooks>,
    then: Arc<dyn SerializationHooks>,
}

impl SerializationHooks for ChainedHooks {
    fn on_before(&self, model: &dyn Parsable) {
        self.first.on_before(model);
        self.then.on_before(model);
    }

    fn on_start(&self, model: &dyn Parsable, writer: &mut dyn SerializationWriter) -> Result<()> {
        self.first.on_start(model, writer)?;
        self.then.on_start(model, writer)
    }

    fn on_after(&self, model: &dyn Parsable) {
        self.first.on_after(model);
        self.then.on_after(model);
    }
}

/// Serialize `model` into `writer`, running `hooks` around it.
///
/// `on_after` runs even when writing fails.
pub fn write_with_hooks(
    hooks: Option<&dyn SerializationHooks>,
    model: &dyn Parsable,
    writer: &mut dyn SerializationWriter,
) -> Result<()> {
    let Some(hooks) = hooks else {
        return model.serialize(writer);
    };

    hooks.on_before(model);
    let written = hooks
        .on_start(model, writer)
        .and_then(|()| model.serialize(writer));
    hooks.on_after(model);
    written
}

/// Wraps a factory so that every writer it hands out runs extra hooks.
///
/// Hooks already installed on the writer run after the proxy's own.
#[derive(Clone)]
pub struct SerializationWriterProxyFactory {
    factory: Arc<dyn SerializationWriterFactory>,
    hooks: Arc<dyn SerializationHooks>,
}

impl fmt::Debug for SerializationWriterProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationWriterProxyFactory")
            .field("content_type", &self.factory.valid_content_type().ok())
            .finish_non_exhaustive()
    }
}

impl SerializationWriterProxyFactory {
    /// Proxy `factory` with `hooks`.
    pub fn new(
        factory: Arc<dyn SerializationWriterFactory>,
        hooks: impl SerializationHooks + 'static,
    ) -> Self {
        Self {
            factory,
            hooks: Arc::new(hooks),
        }
    }

    /// The wrapped factory.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn SerializationWriterFactory> {
        &self.factory
    }
}

impl SerializationWriterFactory for SerializationWriterProxyFactory {
    fn valid_content_type(&self) -> Result<String> {
        self.factory.valid_content_type()
    }

    fn writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>> {
        let mut writer = self.factory.writer(content_type)?;
        let hooks = match writer.hooks() {
            Some(existing) => Arc::new(ChainedHooks {
                first: Arc::clone(&self.hooks),
                then: existing,
            }) as Arc<dyn SerializationHooks>,
            None => Arc::clone(&self.hooks),
        };
        writer.set_hooks(hooks)?;
        Ok(writer)
    }
}
