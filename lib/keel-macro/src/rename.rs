//! Case conventions for `rename_all`.

/// Case conversion rules for `rename_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub(crate) enum RenameRule {
    /// `lowercase`
    LowerCase,
    /// `UPPERCASE`
    UpperCase,
    /// `camelCase`
    CamelCase,
    /// `PascalCase`
    PascalCase,
    /// `snake_case`
    SnakeCase,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnakeCase,
    /// `kebab-case`
    KebabCase,
    /// `SCREAMING-KEBAB-CASE`
    ScreamingKebabCase,
}

const EXPECTED: &str = "lowercase, UPPERCASE, camelCase, PascalCase, snake_case, \
                        SCREAMING_SNAKE_CASE, kebab-case, SCREAMING-KEBAB-CASE";

impl RenameRule {
    /// Parse a rename rule from a string.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "lowercase" => Some(Self::LowerCase),
            "UPPERCASE" => Some(Self::UpperCase),
            "camelCase" => Some(Self::CamelCase),
            "PascalCase" => Some(Self::PascalCase),
            "snake_case" => Some(Self::SnakeCase),
            "SCREAMING_SNAKE_CASE" => Some(Self::ScreamingSnakeCase),
            "kebab-case" => Some(Self::KebabCase),
            "SCREAMING-KEBAB-CASE" => Some(Self::ScreamingKebabCase),
            _ => None,
        }
    }

    /// Parse the value of a `rename_all = "..."` attribute.
    pub(crate) fn parse_lit(value: &syn::LitStr) -> syn::Result<Self> {
        Self::parse(&value.value()).ok_or_else(|| {
            syn::Error::new_spanned(
                value,
                format!(
                    "unknown rename_all value: \"{}\". Expected one of: {EXPECTED}",
                    value.value()
                ),
            )
        })
    }

    /// Apply the rule to a `snake_case` field name.
    pub(crate) fn apply_to_field(self, name: &str) -> String {
        match self {
            Self::LowerCase | Self::SnakeCase => name.to_string(),
            Self::UpperCase | Self::ScreamingSnakeCase => name.to_ascii_uppercase(),
            Self::CamelCase => to_camel_case(name),
            Self::PascalCase => capitalize(&to_camel_case(name)),
            Self::KebabCase => name.replace('_', "-"),
            Self::ScreamingKebabCase => name.to_ascii_uppercase().replace('_', "-"),
        }
    }

    /// Apply the rule to a `PascalCase` variant name.
    pub(crate) fn apply_to_variant(self, name: &str) -> String {
        match self {
            Self::PascalCase => name.to_string(),
            Self::LowerCase => name.to_ascii_lowercase(),
            Self::UpperCase => name.to_ascii_uppercase(),
            Self::CamelCase => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            Self::SnakeCase => to_snake_case(name),
            Self::ScreamingSnakeCase => to_snake_case(name).to_ascii_uppercase(),
            Self::KebabCase => to_snake_case(name).replace('_', "-"),
            Self::ScreamingKebabCase => to_snake_case(name).to_ascii_uppercase().replace('_', "-"),
        }
    }
}

/// Convert a string to `snake_case`.
fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Convert a string to `camelCase`.
fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn field_names() {
        check!(RenameRule::CamelCase.apply_to_field("display_name") == "displayName");
        check!(RenameRule::PascalCase.apply_to_field("display_name") == "DisplayName");
        check!(RenameRule::KebabCase.apply_to_field("display_name") == "display-name");
        check!(RenameRule::ScreamingSnakeCase.apply_to_field("display_name") == "DISPLAY_NAME");
        check!(RenameRule::LowerCase.apply_to_field("top") == "top");
    }

    #[test]
    fn variant_names() {
        check!(RenameRule::CamelCase.apply_to_variant("SignedIn") == "signedIn");
        check!(RenameRule::SnakeCase.apply_to_variant("SignedIn") == "signed_in");
        check!(RenameRule::LowerCase.apply_to_variant("SignedIn") == "signedin");
        check!(RenameRule::ScreamingKebabCase.apply_to_variant("SignedIn") == "SIGNED-IN");
        check!(RenameRule::PascalCase.apply_to_variant("SignedIn") == "SignedIn");
    }

    #[test]
    fn unknown_rule() {
        check!(RenameRule::parse("Title Case").is_none());
        check!(RenameRule::parse("kebab-case") == Some(RenameRule::KebabCase));
    }
}
