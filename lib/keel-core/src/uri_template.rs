//! RFC 6570 URI template expansion.
//!
//! Supports every level-4 operator on string and list values:
//!
//! | Form        | Example            | Expands to                   |
//! |-------------|--------------------|------------------------------|
//! | simple      | `{var}`            | `value`                      |
//! | reserved    | `{+base}/x`        | `http://host/x`              |
//! | fragment    | `{#var}`           | `#value`                     |
//! | label       | `{.var}`           | `.value`                     |
//! | path        | `{/var}`           | `/value`                     |
//! | path-style  | `{;var}`           | `;var=value`                 |
//! | query       | `{?a,b}`           | `?a=1&b=2`                   |
//! | continuation| `{&a}`             | `&a=1`                       |
//!
//! `*` explodes a list into one item (or one `name=value` pair) per element
//! and `:n` keeps the first `n` characters of a string.
//!
//! # Example
//!
//! ```
//! use keel_core::uri_template::{TemplateVariables, UriTemplate};
//!
//! let template = UriTemplate::parse("{+baseurl}/users{?select*,top}")?;
//! let mut variables = TemplateVariables::new();
//! variables.insert_scalar("baseurl", "https://api.example.com/v1");
//! variables.insert_list("select", ["id", "name"]);
//!
//! assert_eq!(
//!     template.expand(&variables),
//!     "https://api.example.com/v1/users?select=id&select=name"
//! );
//! # Ok::<(), keel_core::Error>(())
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{Error, Result};

/// Characters escaped in simple and query values: all but unreserved.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters escaped in reserved values and literals: all but unreserved and
/// reserved (`%` is handled separately).
const RESERVED: &AsciiSet = &UNRESERVED
    // gen-delims
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    // sub-delims
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

const MAX_PREFIX: usize = 10_000;

// ============================================================================
// Variables
// ============================================================================

/// A value bound to a template variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    /// A single string.
    Scalar(String),
    /// An ordered list of strings.
    List(Vec<String>),
    /// A string that keeps reserved characters under every operator, such
    /// as a base URL.
    Reserved(String),
}

/// Variable bindings for [`UriTemplate::expand`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVariables {
    values: IndexMap<String, TemplateValue>,
}

impl TemplateVariables {
    /// No bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: TemplateValue) {
        self.values.insert(name.into(), value);
    }

    /// Bind `name` to a string.
    pub fn insert_scalar(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, TemplateValue::Scalar(value.into()));
    }

    /// Bind `name` to a string whose reserved characters are never escaped.
    pub fn insert_reserved(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, TemplateValue::Reserved(value.into()));
    }

    /// Bind `name` to a list.
    pub fn insert_list<I>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.insert(
            name,
            TemplateValue::List(values.into_iter().map(Into::into).collect()),
        );
    }

    /// The binding for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.values.get(name)
    }

    /// Returns `true` if `name` is bound.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Template
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    Reserved,
    Fragment,
    Label,
    Path,
    PathParameter,
    Query,
    QueryContinuation,
}

impl Operator {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Reserved),
            '#' => Some(Self::Fragment),
            '.' => Some(Self::Label),
            '/' => Some(Self::Path),
            ';' => Some(Self::PathParameter),
            '?' => Some(Self::Query),
            '&' => Some(Self::QueryContinuation),
            _ => None,
        }
    }

    const fn first(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved => "",
            Self::Fragment => "#",
            Self::Label => ".",
            Self::Path => "/",
            Self::PathParameter => ";",
            Self::Query => "?",
            Self::QueryContinuation => "&",
        }
    }

    const fn separator(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved | Self::Fragment => ",",
            Self::Label => ".",
            Self::Path => "/",
            Self::PathParameter => ";",
            Self::Query | Self::QueryContinuation => "&",
        }
    }

    const fn named(self) -> bool {
        matches!(
            self,
            Self::PathParameter | Self::Query | Self::QueryContinuation
        )
    }

    const fn if_empty(self) -> &'static str {
        match self {
            Self::Query | Self::QueryContinuation => "=",
            _ => "",
        }
    }

    const fn allow_reserved(self) -> bool {
        matches!(self, Self::Reserved | Self::Fragment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VarSpec {
    name: String,
    explode: bool,
    prefix: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Expression {
        operator: Operator,
        variables: Vec<VarSpec>,
    },
}

/// A parsed URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    source: String,
    parts: Vec<Part>,
}

impl UriTemplate {
    /// Parse `template`.
    ///
    /// Fails with [`Error::InvalidUriTemplate`] on an unterminated
    /// expression, an unsupported operator, or a malformed variable.
    pub fn parse(template: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            if !literal.is_empty() {
                parts.push(Part::Literal(literal.to_string()));
            }
            let close = tail.find('}').ok_or_else(|| {
                Error::invalid_uri_template(format!("unclosed expression in {template:?}"))
            })?;
            let body = tail.get(1..close).unwrap_or_default();
            parts.push(parse_expression(body)?);
            rest = tail.get(close + 1..).unwrap_or_default();
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        Ok(Self {
            source: template.to_string(),
            parts,
        })
    }

    /// The template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of every variable referenced, in order of appearance.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .flat_map(|part| match part {
                Part::Literal(_) => <&[VarSpec]>::default(),
                Part::Expression { variables, .. } => variables.as_slice(),
            })
            .map(|spec| spec.name.as_str())
    }

    /// Returns `true` if the template references `name`.
    #[must_use]
    pub fn references(&self, name: &str) -> bool {
        self.variable_names().any(|candidate| candidate == name)
    }

    /// Expand against `variables`. Unbound variables contribute nothing.
    #[must_use]
    pub fn expand(&self, variables: &TemplateVariables) -> String {
        let mut out = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => encode_into(&mut out, text, true),
                Part::Expression {
                    operator,
                    variables: specs,
                } => expand_expression(&mut out, *operator, specs, variables),
            }
        }
        out
    }
}

impl FromStr for UriTemplate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_expression(body: &str) -> Result<Part> {
    let mut chars = body.chars();
    let first = chars.next().ok_or_else(|| Error::invalid_uri_template("empty expression"))?;

    let (operator, list) = match Operator::from_char(first) {
        Some(operator) => (operator, chars.as_str()),
        None if matches!(first, '=' | ',' | '!' | '@' | '|') => {
            return Err(Error::invalid_uri_template(format!(
                "unsupported operator {first:?}"
            )));
        }
        None => (Operator::Simple, body),
    };

    let variables = list
        .split(',')
        .map(parse_varspec)
        .collect::<Result<Vec<_>>>()?;

    Ok(Part::Expression {
        operator,
        variables,
    })
}

fn parse_varspec(spec: &str) -> Result<VarSpec> {
    let (name, explode, prefix) = if let Some(name) = spec.strip_suffix('*') {
        (name, true, None)
    } else if let Some((name, length)) = spec.split_once(':') {
        let length = length
            .parse::<usize>()
            .ok()
            .filter(|length| (1..MAX_PREFIX).contains(length))
            .ok_or_else(|| Error::invalid_uri_template(format!("invalid prefix in {spec:?}")))?;
        (name, false, Some(length))
    } else {
        (spec, false, None)
    };

    if !is_varname(name) {
        return Err(Error::invalid_uri_template(format!(
            "invalid variable name {name:?}"
        )));
    }

    Ok(VarSpec {
        name: name.to_string(),
        explode,
        prefix,
    })
}

fn is_varname(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.ends_with('.') {
        return false;
    }
    let bytes = name.as_bytes();
    let mut index = 0;
    while let Some(&byte) = bytes.get(index) {
        if byte == b'%' {
            if !is_pct_triplet(name.get(index..).unwrap_or_default()) {
                return false;
            }
            index += 3;
            continue;
        }
        if !(byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.') {
            return false;
        }
        index += 1;
    }
    true
}

fn is_pct_triplet(text: &str) -> bool {
    let bytes = text.as_bytes();
    matches!(
        bytes,
        [b'%', high, low, ..] if high.is_ascii_hexdigit() && low.is_ascii_hexdigit()
    )
}

fn expand_expression(
    out: &mut String,
    operator: Operator,
    specs: &[VarSpec],
    variables: &TemplateVariables,
) {
    let mut first = true;
    for spec in specs {
        let Some(value) = variables.get(&spec.name) else {
            continue;
        };
        if matches!(value, TemplateValue::List(items) if items.is_empty()) {
            continue;
        }

        if first {
            // A query already started by an earlier expression or literal
            // continues with `&`.
            if operator == Operator::Query && out.contains('?') {
                out.push('&');
            } else {
                out.push_str(operator.first());
            }
            first = false;
        } else {
            out.push_str(operator.separator());
        }

        let allow_reserved = operator.allow_reserved();
        match value {
            TemplateValue::Scalar(text) | TemplateValue::Reserved(text) => {
                if operator.named() {
                    out.push_str(&spec.name);
                    if text.is_empty() {
                        out.push_str(operator.if_empty());
                        continue;
                    }
                    out.push('=');
                }
                let text = match spec.prefix {
                    Some(length) => text.chars().take(length).collect::<String>(),
                    None => text.clone(),
                };
                let reserved = allow_reserved || matches!(value, TemplateValue::Reserved(_));
                encode_into(out, &text, reserved);
            }
            TemplateValue::List(items) if spec.explode => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push_str(operator.separator());
                    }
                    if operator.named() {
                        out.push_str(&spec.name);
                        if item.is_empty() {
                            out.push_str(operator.if_empty());
                            continue;
                        }
                        out.push('=');
                    }
                    encode_into(out, item, allow_reserved);
                }
            }
            TemplateValue::List(items) => {
                if operator.named() {
                    out.push_str(&spec.name);
                    out.push('=');
                }
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    encode_into(out, item, allow_reserved);
                }
            }
        }
    }
}

/// Percent-encode `text` into `out`.
///
/// With `allow_reserved`, reserved characters and existing `%XX` triplets
/// pass through.
fn encode_into(out: &mut String, text: &str, allow_reserved: bool) {
    if !allow_reserved {
        out.extend(utf8_percent_encode(text, UNRESERVED));
        return;
    }

    let mut rest = text;
    while let Some(index) = rest.find('%') {
        let (head, tail) = rest.split_at(index);
        out.extend(utf8_percent_encode(head, RESERVED));
        if is_pct_triplet(tail) {
            out.push_str(tail.get(..3).unwrap_or_default());
            rest = tail.get(3..).unwrap_or_default();
        } else {
            out.push_str("%25");
            rest = tail.get(1..).unwrap_or_default();
        }
    }
    out.extend(utf8_percent_encode(rest, RESERVED));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc_variables() -> TemplateVariables {
        let mut variables = TemplateVariables::new();
        variables.insert_scalar("var", "value");
        variables.insert_scalar("hello", "Hello World!");
        variables.insert_scalar("half", "50%");
        variables.insert_scalar("base", "http://example.com/home/");
        variables.insert_scalar("path", "/foo/bar");
        variables.insert_scalar("x", "1024");
        variables.insert_scalar("y", "768");
        variables.insert_scalar("empty", "");
        variables.insert_list("list", ["red", "green", "blue"]);
        variables.insert_list("nothing", Vec::<String>::new());
        variables
    }

    fn expand(template: &str) -> String {
        UriTemplate::parse(template)
            .expect("valid template")
            .expand(&rfc_variables())
    }

    #[test]
    fn simple_expansion() {
        assert_eq!(expand("{var}"), "value");
        assert_eq!(expand("{hello}"), "Hello%20World%21");
        assert_eq!(expand("{half}"), "50%25");
        assert_eq!(expand("{x,hello,y}"), "1024,Hello%20World%21,768");
        assert_eq!(expand("{var:3}"), "val");
        assert_eq!(expand("{list}"), "red,green,blue");
        assert_eq!(expand("{list*}"), "red,green,blue");
    }

    #[test]
    fn reserved_expansion() {
        assert_eq!(expand("{+var}"), "value");
        assert_eq!(expand("{+hello}"), "Hello%20World!");
        assert_eq!(expand("{+half}"), "50%25");
        assert_eq!(expand("{+base}index"), "http://example.com/home/index");
        assert_eq!(expand("{+path}/here"), "/foo/bar/here");
        assert_eq!(expand("{#hello}"), "#Hello%20World!");
        assert_eq!(expand("{#path:6}/here"), "#/foo/b/here");
    }

    #[test]
    fn reserved_values_keep_delimiters_in_every_form() {
        let mut variables = TemplateVariables::new();
        variables.insert_reserved("baseurl", "https://a.example.com/v1%2F");
        let expand = |template: &str| {
            UriTemplate::parse(template)
                .expect("valid template")
                .expand(&variables)
        };

        assert_eq!(expand("{baseurl}/x"), "https://a.example.com/v1%2F/x");
        assert_eq!(expand("{+baseurl}/x"), "https://a.example.com/v1%2F/x");
        assert_eq!(expand("/y{?baseurl}"), "/y?baseurl=https://a.example.com/v1%2F");
    }

    #[test]
    fn label_and_path_expansion() {
        assert_eq!(expand("X{.var}"), "X.value");
        assert_eq!(expand("X{.list*}"), "X.red.green.blue");
        assert_eq!(expand("{/var,x}/here"), "/value/1024/here");
        assert_eq!(expand("{/list*}"), "/red/green/blue");
        assert_eq!(expand("{;x,y}"), ";x=1024;y=768");
        assert_eq!(expand("{;x,y,empty}"), ";x=1024;y=768;empty");
        assert_eq!(expand("{;list*}"), ";list=red;list=green;list=blue");
    }

    #[test]
    fn query_expansion() {
        assert_eq!(expand("{?x,y}"), "?x=1024&y=768");
        assert_eq!(expand("{?x,y,empty}"), "?x=1024&y=768&empty=");
        assert_eq!(expand("?fixed=yes{&x}"), "?fixed=yes&x=1024");
        assert_eq!(expand("{?list}"), "?list=red,green,blue");
        assert_eq!(expand("{?list*}"), "?list=red&list=green&list=blue");
        assert_eq!(expand("{?x}{?y}"), "?x=1024&y=768");
    }

    #[test]
    fn undefined_variables_vanish() {
        assert_eq!(expand("{undef}"), "");
        assert_eq!(expand("{?undef}"), "");
        assert_eq!(expand("{?undef,x}"), "?x=1024");
        assert_eq!(expand("{/nothing*}"), "");
        assert_eq!(expand("/users{?nothing,undef}"), "/users");
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(expand("/a b/{var}"), "/a%20b/value");
        assert_eq!(expand("/caf\u{e9}"), "/caf%C3%A9");
        assert_eq!(expand("/%7Euser"), "/%7Euser");
    }

    #[test]
    fn scalar_structural_characters_are_escaped() {
        let mut variables = TemplateVariables::new();
        variables.insert_scalar("when", "2022-08-01T20:34:58Z");
        variables.insert_scalar("who", "o'neil,jr");
        let template = UriTemplate::parse("/at/{when}{?who}").expect("valid");
        assert_eq!(
            template.expand(&variables),
            "/at/2022-08-01T20%3A34%3A58Z?who=o%27neil%2Cjr"
        );
    }

    #[test]
    fn percent_encoded_names_are_kept() {
        let mut variables = TemplateVariables::new();
        variables.insert_list("%24select", ["id", "displayName"]);
        variables.insert_scalar("%24count", "true");
        let template = UriTemplate::parse("/me{?%24select,%24count}").expect("valid");
        assert_eq!(
            template.expand(&variables),
            "/me?%24select=id,displayName&%24count=true"
        );
    }

    #[test]
    fn reports_variable_names() {
        let template = UriTemplate::parse("{+baseurl}/users/{id}{?a,b*}").expect("valid");
        assert_eq!(
            template.variable_names().collect::<Vec<_>>(),
            ["baseurl", "id", "a", "b"]
        );
        assert!(template.references("baseurl"));
        assert!(!template.references("c"));
    }

    #[test]
    fn rejects_malformed_templates() {
        for template in ["{var", "{}", "{?}", "{a,,b}", "{=x}", "{var:0}", "{var:x}", "{a b}", "{.a.}"] {
            assert!(
                matches!(
                    UriTemplate::parse(template),
                    Err(Error::InvalidUriTemplate(_))
                ),
                "{template:?} should be rejected"
            );
        }
    }
}
