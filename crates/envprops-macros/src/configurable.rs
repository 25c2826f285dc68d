//! `Configurable` derive expansion.

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{DeriveInput, LitStr};

use crate::parse::{ConfigField, ConfigStruct, Kind};

/// Expands `#[derive(Configurable)]`.
pub fn expand_configurable(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let parsed = ConfigStruct::parse(&input)?;

    let ident = &input.ident;
    let type_name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let specs = parsed.fields.iter().map(field_spec);
    let arms = parsed
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| apply_arm(index, field));

    Ok(quote! {
        impl #impl_generics ::envprops::Configurable for #ident #ty_generics #where_clause {
            fn fields() -> &'static [::envprops::FieldSpec] {
                const FIELDS: &[::envprops::FieldSpec] = &[#(#specs),*];
                FIELDS
            }

            #[allow(
                unreachable_code,
                clippy::cast_possible_truncation,
                clippy::match_single_binding,
                clippy::useless_conversion
            )]
            fn apply(
                &mut self,
                index: usize,
                value: ::envprops::FieldValue,
            ) -> ::core::result::Result<(), ::envprops::ApplyError> {
                match (index, value) {
                    #(#arms)*
                    _ => return ::core::result::Result::Err(::envprops::ApplyError::Mismatch { index }),
                }
                ::core::result::Result::Ok(())
            }

            fn type_name() -> &'static str {
                #type_name
            }
        }
    })
}

fn optional_lit(lit: Option<&LitStr>) -> TokenStream {
    match lit {
        Some(lit) => quote! { ::core::option::Option::Some(#lit) },
        None => quote! { ::core::option::Option::None },
    }
}

fn field_spec(field: &ConfigField) -> TokenStream {
    let name = field.ident.unraw().to_string();
    let kind = match field.ty.kind {
        Kind::String => quote! { ::envprops::FieldKind::String },
        Kind::Integer => quote! { ::envprops::FieldKind::Integer },
        Kind::Boolean => quote! { ::envprops::FieldKind::Boolean },
        Kind::Float | Kind::Float32 => quote! { ::envprops::FieldKind::Float },
    };
    let rename = optional_lit(field.attrs.name.as_ref());
    let default = optional_lit(field.attrs.default.as_ref());
    let critical = optional_lit(field.attrs.critical.as_ref());

    quote! {
        ::envprops::FieldSpec {
            field: #name,
            kind: #kind,
            rename: #rename,
            default: #default,
            critical: #critical,
        }
    }
}

fn apply_arm(index: usize, field: &ConfigField) -> TokenStream {
    let ident = &field.ident;
    let inner = &field.ty.inner;

    let (pattern, converted) = match field.ty.kind {
        Kind::String => (quote! { String(v) }, quote! { v }),
        Kind::Boolean => (quote! { Boolean(v) }, quote! { v }),
        Kind::Float => (quote! { Float(v) }, quote! { v }),
        Kind::Float32 => (
            quote! { Float(v) },
            quote! {{
                let narrowed = v as f32;
                if v.is_finite() && !narrowed.is_finite() {
                    return ::core::result::Result::Err(::envprops::ApplyError::OutOfRange { index });
                }
                narrowed
            }},
        ),
        Kind::Integer => (
            quote! { Integer(v) },
            quote! {
                <#inner as ::core::convert::TryFrom<i64>>::try_from(v)
                    .map_err(|_| ::envprops::ApplyError::OutOfRange { index })?
            },
        ),
    };

    let assigned = if field.ty.optional {
        quote! { ::core::option::Option::Some(#converted) }
    } else {
        converted
    };

    quote! {
        (#index, ::envprops::FieldValue::#pattern) => {
            self.#ident = #assigned;
        }
    }
}
