//! `#[derive(UriParameters)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Fields, LitStr, parse2};

use crate::rename::RenameRule;

/// Container options parsed from `#[uri(...)]`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContainerOptions {
    pub(crate) rename_all: Option<RenameRule>,
}

/// Field or variant options parsed from `#[uri(...)]`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ItemOptions {
    pub(crate) rename: Option<String>,
    pub(crate) skip: bool,
}

pub(crate) fn parse_container_options(attrs: &[Attribute]) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("uri")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let value: LitStr = meta.value()?.parse()?;
                options.rename_all = Some(RenameRule::parse_lit(&value)?);
                Ok(())
            } else {
                Err(meta.error("expected `rename_all`"))
            }
        })?;
    }
    Ok(options)
}

pub(crate) fn parse_item_options(attrs: &[Attribute]) -> syn::Result<ItemOptions> {
    let mut options = ItemOptions::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("uri")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(syn::Error::new_spanned(&value, "rename must not be empty"));
                }
                options.rename = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `rename` or `skip`"))
            }
        })?;
    }
    Ok(options)
}

/// Expand `#[derive(UriParameters)]`.
///
/// Each field is visited with its (possibly `rename_all`-converted) name and
/// its `rename` as the tag, so explicit renames win during normalization.
pub(crate) fn expand(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let container = parse_container_options(&input.attrs)?;

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => return Ok(empty_source(&input)),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "UriParameters derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "UriParameters derive only supports structs",
            ));
        }
    };

    let mut visits = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let options = parse_item_options(&field.attrs)?;
        if options.skip {
            continue;
        }

        let raw = ident.to_string();
        let raw = raw.strip_prefix("r#").unwrap_or(&raw);
        let field_name = match container.rename_all {
            Some(rule) => rule.apply_to_field(raw),
            None => raw.to_string(),
        };
        let tag = match &options.rename {
            Some(rename) => quote! { ::core::option::Option::Some(#rename) },
            None => quote! { ::core::option::Option::None },
        };

        visits.push(quote! {
            visitor.visit(#field_name, #tag, &self.#ident);
        });
    }

    Ok(quote! {
        impl #impl_generics ::keel::ParameterSource for #name #ty_generics #where_clause {
            fn visit_parameters(&self, visitor: &mut dyn ::keel::ParameterVisitor) {
                #(#visits)*
            }
        }
    })
}

fn empty_source(input: &DeriveInput) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    quote! {
        impl #impl_generics ::keel::ParameterSource for #name #ty_generics #where_clause {
            fn visit_parameters(&self, _visitor: &mut dyn ::keel::ParameterVisitor) {}
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use quote::quote;

    use super::*;

    #[test]
    fn visits_fields_in_order_with_tags() {
        let input = quote! {
            #[uri(rename_all = "camelCase")]
            struct UsersQuery {
                #[uri(rename = "%24select")]
                select: Option<Vec<String>>,
                display_name: Option<String>,
                #[uri(skip)]
                internal: u8,
            }
        };
        let_assert!(Ok(tokens) = expand(input));
        let code = tokens.to_string();

        check!(code.contains("impl :: keel :: ParameterSource for UsersQuery"));
        check!(code.contains("\"select\" , :: core :: option :: Option :: Some (\"%24select\")"));
        check!(code.contains("\"displayName\" , :: core :: option :: Option :: None"));
        check!(!code.contains("internal"));
        let select = code.find("select").unwrap_or(usize::MAX);
        let display = code.find("displayName").unwrap_or(0);
        check!(select < display);
    }

    #[test]
    fn rejects_tuple_structs_and_enums() {
        let_assert!(Err(err) = expand(quote! { struct Pair(u8, u8); }));
        check!(err.to_string().contains("named fields"));
        let_assert!(Err(err) = expand(quote! { enum Kind { A } }));
        check!(err.to_string().contains("only supports structs"));
    }

    #[test]
    fn rejects_unknown_attributes() {
        let_assert!(Err(err) = expand(quote! {
            struct Query {
                #[uri(format = "csv")]
                tags: Vec<String>,
            }
        }));
        check!(err.to_string().contains("expected `rename` or `skip`"));

        let_assert!(Err(err) = expand(quote! {
            #[uri(rename_all = "Title Case")]
            struct Query { top: u32 }
        }));
        check!(err.to_string().contains("unknown rename_all value"));
    }
}
