use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Map, Number, Value};

use keel_core::serialization::{
    Parsable, ScalarKind, ScalarValue, SerializationHooks, SerializationWriter,
    SerializationWriterFactory, write_with_hooks,
};
use keel_core::{Error, Result};

const JSON: &str = "application/json";

/// Builds a JSON document from writer calls.
///
/// Keyed writes become object members; an unkeyed write replaces the root.
/// Installed hooks run around every model, nested ones included.
#[derive(Default)]
pub struct JsonSerializationWriter {
    members: Map<String, Value>,
    root: Option<Value>,
    hooks: Option<Arc<dyn SerializationHooks>>,
}

impl fmt::Debug for JsonSerializationWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSerializationWriter")
            .field("members", &self.members)
            .field("root", &self.root)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

impl JsonSerializationWriter {
    /// An empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The document written so far.
    #[must_use]
    pub fn value(&self) -> Value {
        match &self.root {
            Some(root) => root.clone(),
            None => Value::Object(self.members.clone()),
        }
    }

    fn into_value(self) -> Value {
        self.root.unwrap_or(Value::Object(self.members))
    }

    fn place(&mut self, key: Option<&str>, value: Value) {
        match key {
            Some(key) => {
                self.members.insert(key.to_string(), value);
            }
            None => self.root = Some(value),
        }
    }

    fn object(&self, model: &dyn Parsable) -> Result<Value> {
        let mut nested = Self {
            hooks: self.hooks.clone(),
            ..Self::default()
        };
        write_with_hooks(self.hooks.as_deref(), model, &mut nested)?;
        Ok(nested.into_value())
    }
}

fn float(value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| Error::serialization(format!("{value} cannot be represented in JSON")))
}

fn scalar(value: &ScalarValue) -> Result<Value> {
    Ok(match value {
        ScalarValue::String(value) => Value::String(value.clone()),
        ScalarValue::Bool(value) => Value::Bool(*value),
        ScalarValue::Byte(value) => Value::from(*value),
        ScalarValue::Int8(value) => Value::from(*value),
        ScalarValue::Int32(value) => Value::from(*value),
        ScalarValue::Int64(value) => Value::from(*value),
        ScalarValue::Float32(value) => float(f64::from(*value))?,
        ScalarValue::Float64(value) => float(*value)?,
        ScalarValue::Bytes(value) => Value::String(STANDARD.encode(value)),
        ScalarValue::Uuid(_)
        | ScalarValue::DateTime(_)
        | ScalarValue::DateOnly(_)
        | ScalarValue::TimeOnly(_)
        | ScalarValue::Duration(_) => Value::String(value.to_string()),
    })
}

impl SerializationWriter for JsonSerializationWriter {
    fn write_scalar_value(&mut self, key: Option<&str>, value: &ScalarValue) -> Result<()> {
        let value = scalar(value)?;
        self.place(key, value);
        Ok(())
    }

    fn write_collection_of_scalar_values(
        &mut self,
        key: Option<&str>,
        _kind: ScalarKind,
        values: &[ScalarValue],
    ) -> Result<()> {
        let values = values.iter().map(scalar).collect::<Result<Vec<_>>>()?;
        self.place(key, Value::Array(values));
        Ok(())
    }

    fn write_object_value(&mut self, key: Option<&str>, value: &dyn Parsable) -> Result<()> {
        let value = self.object(value)?;
        self.place(key, value);
        Ok(())
    }

    fn write_collection_of_object_values(
        &mut self,
        key: Option<&str>,
        values: &[&dyn Parsable],
    ) -> Result<()> {
        let values = values
            .iter()
            .map(|model| self.object(*model))
            .collect::<Result<Vec<_>>>()?;
        self.place(key, Value::Array(values));
        Ok(())
    }

    fn write_null_value(&mut self, key: Option<&str>) -> Result<()> {
        self.place(key, Value::Null);
        Ok(())
    }

    fn serialized_content(&mut self) -> Result<Bytes> {
        let content = serde_json::to_vec(&self.value()).map_err(Error::serialization)?;
        Ok(Bytes::from(content))
    }

    fn hooks(&self) -> Option<Arc<dyn SerializationHooks>> {
        self.hooks.clone()
    }

    fn set_hooks(&mut self, hooks: Arc<dyn SerializationHooks>) -> Result<()> {
        self.hooks = Some(hooks);
        Ok(())
    }
}

/// Hands out [`JsonSerializationWriter`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializationWriterFactory;

impl SerializationWriterFactory for JsonSerializationWriterFactory {
    fn valid_content_type(&self) -> Result<String> {
        Ok(JSON.to_string())
    }

    fn writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>> {
        if content_type.trim().is_empty() {
            return Err(Error::configuration("the content type is empty"));
        }
        if !content_type.trim().eq_ignore_ascii_case(JSON) {
            return Err(Error::configuration(format!(
                "expected a {JSON} content type, got {content_type}"
            )));
        }
        Ok(Box::new(JsonSerializationWriter::new()))
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use keel_core::serialization::serialize;

    use super::*;

    struct User {
        id: &'static str,
        tags: Vec<ScalarValue>,
        manager: Option<Box<User>>,
    }

    impl Parsable for User {
        fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
            writer.write_string_value(Some("id"), self.id)?;
            writer.write_collection_of_scalar_values(Some("tags"), ScalarKind::String, &self.tags)?;
            match &self.manager {
                Some(manager) => writer.write_object_value(Some("manager"), manager.as_ref()),
                None => writer.write_null_value(Some("manager")),
            }
        }
    }

    #[test]
    fn writes_nested_models() {
        let user = User {
            id: "42",
            tags: vec!["a".into(), "b".into()],
            manager: Some(Box::new(User {
                id: "7",
                tags: vec![],
                manager: None,
            })),
        };
        let_assert!(Ok(content) = serialize(&JsonSerializationWriterFactory, JSON, &user));
        let_assert!(Ok(value) = serde_json::from_slice::<Value>(&content));
        check!(
            value
                == serde_json::json!({
                    "id": "42",
                    "tags": ["a", "b"],
                    "manager": { "id": "7", "tags": [], "manager": null }
                })
        );
    }

    #[test]
    fn writes_root_scalars() {
        let mut writer = JsonSerializationWriter::new();
        let_assert!(Ok(()) = writer.write_scalar_value(None, &ScalarValue::Bytes(Bytes::from_static(b"hi"))));
        check!(writer.value() == Value::String("aGk=".to_string()));

        let_assert!(Err(err) = writer.write_scalar_value(None, &ScalarValue::Float64(f64::NAN)));
        check!(err.is_serialization());
    }

    #[test]
    fn nested_models_run_the_hooks() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct Counting(AtomicUsize);

        impl SerializationHooks for Counting {
            fn on_before(&self, _model: &dyn Parsable) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let hooks = Arc::new(Counting::default());
        let user = User {
            id: "42",
            tags: vec![],
            manager: Some(Box::new(User {
                id: "7",
                tags: vec![],
                manager: None,
            })),
        };

        let mut writer = JsonSerializationWriter::new();
        let_assert!(Ok(()) = writer.set_hooks(Arc::clone(&hooks) as Arc<dyn SerializationHooks>));
        check!(writer.hooks().is_some());
        let_assert!(Ok(()) = writer.write_object_value(None, &user));
        check!(hooks.0.load(Ordering::SeqCst) == 2);
        check!(writer.value()["manager"]["id"] == "7");
    }

    #[test]
    fn rejects_other_content_types() {
        let factory = JsonSerializationWriterFactory;
        let_assert!(Err(err) = factory.writer("application/xml"));
        check!(err.is_configuration());
        let_assert!(Ok(_) = factory.writer("Application/JSON"));
    }
}
