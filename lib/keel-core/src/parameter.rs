//! Parameter normalization.
//!
//! Generated request builders describe their query parameters as a
//! [`ParameterSource`]: something that walks `(field, tag, value)` triples.
//! [`normalize`] turns those into the two channels the URI template expander
//! reads from:
//!
//! - a flattened string per parameter, substituted as-is
//! - an ordered list of native values per sequence parameter, so exploded
//!   expressions (`{?name*}`) can emit one pair per element
//!
//! # Example
//!
//! ```
//! use keel_core::parameter::{normalize, ParameterList};
//!
//! let params = ParameterList::new()
//!     .with("select", vec!["id", "displayName"])
//!     .with("count", true)
//!     .with("filter", None::<String>);
//!
//! let normalized = normalize(&params);
//! assert_eq!(normalized.flattened["select"], "id,displayName");
//! assert_eq!(normalized.flattened["count"], "true");
//! assert!(!normalized.flattened.contains_key("filter"));
//! assert_eq!(normalized.native["select"].len(), 2);
//! ```

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::duration::IsoDuration;
use crate::temporal::{DateOnly, TimeOnly};

// ============================================================================
// Values
// ============================================================================

/// A single parameter value in its native form.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// `true` / `false`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// Text, including enumeration members already encoded.
    String(String),
    /// UUID, rendered lower-case hyphenated.
    Uuid(Uuid),
    /// Date and time with offset, rendered as RFC 3339.
    DateTime(DateTime<FixedOffset>),
    /// Date without time.
    Date(DateOnly),
    /// Time without date.
    Time(TimeOnly),
    /// ISO-8601 duration.
    Duration(IsoDuration),
}

/// Canonical text form used in URIs.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Uuid(value) => write!(f, "{}", value.hyphenated()),
            Self::DateTime(value) => f.write_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Date(value) => write!(f, "{value}"),
            Self::Time(value) => write!(f, "{value}"),
            Self::Duration(value) => write!(f, "{value}"),
        }
    }
}

/// Conversion of a scalar into a [`ParamValue`].
pub trait ToParamValue {
    /// The native value.
    fn to_param_value(&self) -> ParamValue;
}

impl<T: ToParamValue + ?Sized> ToParamValue for &T {
    fn to_param_value(&self) -> ParamValue {
        (**self).to_param_value()
    }
}

impl ToParamValue for ParamValue {
    fn to_param_value(&self) -> ParamValue {
        self.clone()
    }
}

impl ToParamValue for bool {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::Bool(*self)
    }
}

impl ToParamValue for str {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::String(self.to_string())
    }
}

impl ToParamValue for String {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::String(self.clone())
    }
}

impl ToParamValue for Uuid {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::Uuid(*self)
    }
}

impl<Tz: TimeZone> ToParamValue for DateTime<Tz> {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::DateTime(self.fixed_offset())
    }
}

impl ToParamValue for DateOnly {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::Date(*self)
    }
}

impl ToParamValue for NaiveDate {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::Date(DateOnly::new(*self))
    }
}

impl ToParamValue for TimeOnly {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::Time(*self)
    }
}

impl ToParamValue for NaiveTime {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::Time(TimeOnly::new(*self))
    }
}

impl ToParamValue for IsoDuration {
    fn to_param_value(&self) -> ParamValue {
        ParamValue::Duration(*self)
    }
}

macro_rules! impl_to_param_value {
    ($variant:ident as $target:ty => $($ty:ty),+) => {
        $(
            impl ToParamValue for $ty {
                fn to_param_value(&self) -> ParamValue {
                    ParamValue::$variant(<$target>::from(*self))
                }
            }
        )+
    };
}

impl_to_param_value!(Int as i64 => i8, i16, i32, i64);
impl_to_param_value!(UInt as u64 => u8, u16, u32, u64);
impl_to_param_value!(Float as f64 => f32, f64);

impl ToParamValue for isize {
    fn to_param_value(&self) -> ParamValue {
        i64::try_from(*self).map_or_else(|_| ParamValue::String(self.to_string()), ParamValue::Int)
    }
}

impl ToParamValue for usize {
    fn to_param_value(&self) -> ParamValue {
        u64::try_from(*self).map_or_else(|_| ParamValue::String(self.to_string()), ParamValue::UInt)
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// A normalized parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// A single value: flattened channel only.
    Scalar(ParamValue),
    /// A sequence: comma-joined in the flattened channel, element-wise in the
    /// native channel.
    List(Vec<ParamValue>),
    /// A raw passthrough sequence: native channel only.
    Raw(Vec<ParamValue>),
}

impl Parameter {
    /// The flattened text, `None` for raw values.
    #[must_use]
    pub fn flattened(&self) -> Option<String> {
        match self {
            Self::Scalar(value) => Some(value.to_string()),
            Self::List(values) => Some(join(values)),
            Self::Raw(_) => None,
        }
    }

    /// The native element list, `None` for scalars.
    #[must_use]
    pub fn native(&self) -> Option<&[ParamValue]> {
        match self {
            Self::Scalar(_) => None,
            Self::List(values) | Self::Raw(values) => Some(values),
        }
    }
}

fn join(values: &[ParamValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Conversion of a field value into a [`Parameter`].
///
/// `None` means the value is absent and the parameter is left out.
pub trait ToParameter {
    /// The normalized parameter, if present.
    fn to_parameter(&self) -> Option<Parameter>;
}

macro_rules! impl_scalar_parameter {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToParameter for $ty {
                fn to_parameter(&self) -> Option<Parameter> {
                    Some(Parameter::Scalar(self.to_param_value()))
                }
            }
        )+
    };
}

impl_scalar_parameter!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, str, String, Uuid,
    NaiveDate, NaiveTime, DateOnly, TimeOnly, IsoDuration, ParamValue,
);

impl<Tz: TimeZone> ToParameter for DateTime<Tz> {
    fn to_parameter(&self) -> Option<Parameter> {
        Some(Parameter::Scalar(self.to_param_value()))
    }
}

impl ToParameter for Parameter {
    fn to_parameter(&self) -> Option<Parameter> {
        Some(self.clone())
    }
}

impl<T: ToParameter + ?Sized> ToParameter for &T {
    fn to_parameter(&self) -> Option<Parameter> {
        (**self).to_parameter()
    }
}

impl<T: ToParameter + ?Sized> ToParameter for Box<T> {
    fn to_parameter(&self) -> Option<Parameter> {
        (**self).to_parameter()
    }
}

impl<T: ToParameter> ToParameter for Option<T> {
    fn to_parameter(&self) -> Option<Parameter> {
        self.as_ref().and_then(ToParameter::to_parameter)
    }
}

impl<T: ToParamValue> ToParameter for [T] {
    fn to_parameter(&self) -> Option<Parameter> {
        if self.is_empty() {
            return None;
        }
        Some(Parameter::List(
            self.iter().map(ToParamValue::to_param_value).collect(),
        ))
    }
}

impl<T: ToParamValue> ToParameter for Vec<T> {
    fn to_parameter(&self) -> Option<Parameter> {
        self.as_slice().to_parameter()
    }
}

impl<T: ToParamValue, const N: usize> ToParameter for [T; N] {
    fn to_parameter(&self) -> Option<Parameter> {
        self.as_slice().to_parameter()
    }
}

/// Raw passthrough values.
///
/// Recorded only in the native channel; the expander formats each element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawValues(pub Vec<ParamValue>);

impl RawValues {
    /// Collect raw values from anything convertible.
    pub fn new<T: ToParamValue>(values: impl IntoIterator<Item = T>) -> Self {
        Self(values.into_iter().map(|value| value.to_param_value()).collect())
    }
}

impl ToParameter for RawValues {
    fn to_parameter(&self) -> Option<Parameter> {
        if self.0.is_empty() {
            return None;
        }
        Some(Parameter::Raw(self.0.clone()))
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Receives the fields of a [`ParameterSource`].
pub trait ParameterVisitor {
    /// Visit one field.
    ///
    /// `tag` overrides `field` as the parameter name when present.
    fn visit(&mut self, field: &str, tag: Option<&str>, value: &dyn ToParameter);
}

/// A structured bag of named parameters.
///
/// Implement by hand, derive with `#[derive(UriParameters)]`, or build a
/// [`ParameterList`].
pub trait ParameterSource {
    /// Walk every field in declaration order.
    fn visit_parameters(&self, visitor: &mut dyn ParameterVisitor);
}

impl<T: ParameterSource + ?Sized> ParameterSource for &T {
    fn visit_parameters(&self, visitor: &mut dyn ParameterVisitor) {
        (**self).visit_parameters(visitor);
    }
}

/// An ordered list of `(name, tag, value)` entries.
#[derive(Debug, Clone, Default)]
pub struct ParameterList {
    entries: Vec<ParameterEntry>,
}

#[derive(Debug, Clone)]
struct ParameterEntry {
    field: String,
    tag: Option<String>,
    value: Option<Parameter>,
}

impl ParameterList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter named `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl ToParameter) -> Self {
        self.push(name, None::<String>, &value);
        self
    }

    /// Append a parameter whose field name is overridden by `tag`.
    #[must_use]
    pub fn with_tagged(
        mut self,
        field: impl Into<String>,
        tag: impl Into<String>,
        value: impl ToParameter,
    ) -> Self {
        self.push(field, Some(tag), &value);
        self
    }

    /// Append an entry.
    pub fn push(
        &mut self,
        field: impl Into<String>,
        tag: Option<impl Into<String>>,
        value: &dyn ToParameter,
    ) {
        self.entries.push(ParameterEntry {
            field: field.into(),
            tag: tag.map(Into::into),
            value: value.to_parameter(),
        });
    }

    /// Number of entries, present or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entry was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ParameterSource for ParameterList {
    fn visit_parameters(&self, visitor: &mut dyn ParameterVisitor) {
        for entry in &self.entries {
            visitor.visit(&entry.field, entry.tag.as_deref(), &entry.value);
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// The two channels produced by [`normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedParameters {
    /// Name to flattened text.
    pub flattened: IndexMap<String, String>,
    /// Name to element list, for sequence and raw parameters.
    pub native: IndexMap<String, Vec<ParamValue>>,
}

impl ParameterVisitor for NormalizedParameters {
    fn visit(&mut self, field: &str, tag: Option<&str>, value: &dyn ToParameter) {
        let name = tag.filter(|tag| !tag.is_empty()).unwrap_or(field);
        if name.is_empty() {
            tracing::trace!("skipping parameter without a name");
            return;
        }

        let Some(parameter) = value.to_parameter() else {
            tracing::trace!(name, "skipping absent parameter");
            return;
        };

        if let Some(flat) = parameter.flattened() {
            self.flattened.insert(name.to_string(), flat);
        }
        if let Some(native) = parameter.native() {
            self.native.insert(name.to_string(), native.to_vec());
        }
    }
}

/// Normalize every present field of `source`.
pub fn normalize(source: &(impl ParameterSource + ?Sized)) -> NormalizedParameters {
    let mut normalized = NormalizedParameters::default();
    source.visit_parameters(&mut normalized);
    normalized
}
