use indexmap::IndexMap;
use serde_json::Value;

use super::{Parsable, ScalarValue, SerializationWriter};
use crate::Result;

/// A value whose shape is only known at runtime, such as a property the API
/// description leaves untyped.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UntypedNode {
    /// An explicit null.
    #[default]
    Null,
    /// A boolean.
    Boolean(bool),
    /// A 32-bit integer.
    Integer(i32),
    /// A 64-bit integer.
    Long(i64),
    /// A 32-bit float.
    Float(f32),
    /// A 64-bit float.
    Double(f64),
    /// Text.
    String(String),
    /// An ordered collection.
    Array(Vec<UntypedNode>),
    /// Named properties, in insertion order.
    Object(IndexMap<String, UntypedNode>),
}

impl UntypedNode {
    /// Returns `true` for [`UntypedNode::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer, widened, if this is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(i64::from(*value)),
            Self::Long(value) => Some(*value),
            _ => None,
        }
    }

    /// The float, widened, if this is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(f64::from(*value)),
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// The text, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// The elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[UntypedNode]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The properties, if this is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, UntypedNode>> {
        match self {
            Self::Object(properties) => Some(properties),
            _ => None,
        }
    }

    /// Write `self` under `key`.
    pub fn write_to(&self, writer: &mut dyn SerializationWriter, key: Option<&str>) -> Result<()> {
        match self {
            Self::Null => writer.write_null_value(key),
            Self::Boolean(value) => writer.write_scalar_value(key, &ScalarValue::Bool(*value)),
            Self::Integer(value) => writer.write_scalar_value(key, &ScalarValue::Int32(*value)),
            Self::Long(value) => writer.write_scalar_value(key, &ScalarValue::Int64(*value)),
            Self::Float(value) => writer.write_scalar_value(key, &ScalarValue::Float32(*value)),
            Self::Double(value) => writer.write_scalar_value(key, &ScalarValue::Float64(*value)),
            Self::String(value) => writer.write_string_value(key, value),
            Self::Array(items) => {
                let items = items.iter().map(|item| item as &dyn Parsable).collect::<Vec<_>>();
                writer.write_collection_of_object_values(key, &items)
            }
            Self::Object(_) => writer.write_object_value(key, self),
        }
    }
}

/// Objects write their properties; every other node writes itself at the
/// root of the writer.
impl Parsable for UntypedNode {
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
        match self {
            Self::Object(properties) => {
                for (name, value) in properties {
                    value.write_to(writer, Some(name.as_str()))?;
                }
                Ok(())
            }
            other => other.write_to(writer, None),
        }
    }
}

impl From<Value> for UntypedNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Boolean(value),
            Value::Number(number) => match number.as_i64() {
                Some(value) => i32::try_from(value).map_or(Self::Long(value), Self::Integer),
                None => Self::Double(number.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(value) => Self::String(value),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(properties) => Self::Object(
                properties
                    .into_iter()
                    .map(|(name, value)| (name, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for UntypedNode {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for UntypedNode {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<i64> for UntypedNode {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for UntypedNode {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for UntypedNode {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for UntypedNode {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<UntypedNode>> From<Vec<T>> for UntypedNode {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}
