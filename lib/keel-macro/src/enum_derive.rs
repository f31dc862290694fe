//! `#[derive(ParameterEnum)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Fields, parse2};

use crate::parameters_derive::{parse_container_options, parse_item_options};

/// Expand `#[derive(ParameterEnum)]` for a fieldless enum.
pub(crate) fn expand(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let container = parse_container_options(&input.attrs)?;

    let syn::Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input,
            "ParameterEnum derive only supports enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "ParameterEnum derive needs at least one variant",
        ));
    }

    let mut arms = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ParameterEnum variants must not carry data",
            ));
        }
        let options = parse_item_options(&variant.attrs)?;
        if options.skip {
            return Err(syn::Error::new_spanned(
                variant,
                "ParameterEnum variants cannot be skipped",
            ));
        }

        let ident = &variant.ident;
        let value = match (options.rename, container.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply_to_variant(&ident.to_string()),
            (None, None) => ident.to_string(),
        };
        arms.push(quote! { Self::#ident => #value, });
    }

    Ok(quote! {
        impl #impl_generics ::keel::ToParamValue for #name #ty_generics #where_clause {
            fn to_param_value(&self) -> ::keel::ParamValue {
                let value: &'static str = match self {
                    #(#arms)*
                };
                ::keel::ParamValue::String(::std::string::String::from(value))
            }
        }

        impl #impl_generics ::keel::ToParameter for #name #ty_generics #where_clause {
            fn to_parameter(&self) -> ::core::option::Option<::keel::Parameter> {
                ::core::option::Option::Some(::keel::Parameter::Scalar(
                    ::keel::ToParamValue::to_param_value(self),
                ))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use quote::quote;

    use super::*;

    #[test]
    fn wire_names() {
        let input = quote! {
            #[uri(rename_all = "camelCase")]
            enum Status {
                Active,
                SignedIn,
                #[uri(rename = "on-hold")]
                OnHold,
            }
        };
        let_assert!(Ok(tokens) = expand(input));
        let code = tokens.to_string();

        check!(code.contains("Self :: Active => \"active\""));
        check!(code.contains("Self :: SignedIn => \"signedIn\""));
        check!(code.contains("Self :: OnHold => \"on-hold\""));
        check!(code.contains(":: keel :: ToParameter for Status"));
    }

    #[test]
    fn rejects_data_and_structs() {
        let_assert!(Err(err) = expand(quote! { enum Value { Text(String) } }));
        check!(err.to_string().contains("must not carry data"));
        let_assert!(Err(err) = expand(quote! { struct Status; }));
        check!(err.to_string().contains("only supports enums"));
        let_assert!(Err(err) = expand(quote! { enum Never {} }));
        check!(err.to_string().contains("at least one variant"));
    }
}
