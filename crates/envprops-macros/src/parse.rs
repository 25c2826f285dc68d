//! Parsing utilities for the `Configurable` derive.
//!
//! This module parses `#[envprops(...)]` field attributes and classifies field
//! types into configuration kinds.

use syn::{
    spanned::Spanned, Attribute, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr,
    PathArguments, Type,
};

/// Configuration kind of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `String`.
    String,
    /// Any primitive integer up to 64 bits.
    Integer,
    /// `bool`.
    Boolean,
    /// `f64`.
    Float,
    /// `f32`, narrowed from the parsed `f64`.
    Float32,
}

/// A classified field type.
#[derive(Debug)]
pub struct FieldType {
    /// The configuration kind.
    pub kind: Kind,
    /// Whether the field is wrapped in `Option`.
    pub optional: bool,
    /// The type the value is stored as, without `Option`.
    pub inner: Type,
}

impl FieldType {
    /// Classifies a field type.
    pub fn classify(ty: &Type) -> syn::Result<Self> {
        if let Some(inner) = option_inner(ty) {
            let kind = scalar_kind(inner).ok_or_else(|| unsupported(ty))?;
            return Ok(Self {
                kind,
                optional: true,
                inner: inner.clone(),
            });
        }

        let kind = scalar_kind(ty).ok_or_else(|| unsupported(ty))?;
        Ok(Self {
            kind,
            optional: false,
            inner: ty.clone(),
        })
    }
}

fn unsupported(ty: &Type) -> syn::Error {
    syn::Error::new(
        ty.span(),
        "unsupported configuration field type: expected String, an integer, bool, f32, f64 \
         or an Option of one of these; use #[envprops(skip)] to exclude the field",
    )
}

/// Returns the last segment of a plain type path.
fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path.path.segments.last(),
        _ => None,
    }
}

fn scalar_kind(ty: &Type) -> Option<Kind> {
    let segment = last_segment(ty)?;
    if !segment.arguments.is_empty() {
        return None;
    }
    match segment.ident.to_string().as_str() {
        "String" => Some(Kind::String),
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
            Some(Kind::Integer)
        }
        "bool" => Some(Kind::Boolean),
        "f64" => Some(Kind::Float),
        "f32" => Some(Kind::Float32),
        _ => None,
    }
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let segment = last_segment(ty)?;
    if segment.ident != "Option" {
        return None;
    }
    if let PathArguments::AngleBracketed(args) = &segment.arguments {
        if let Some(GenericArgument::Type(inner)) = args.args.first() {
            return Some(inner);
        }
    }
    None
}

/// Parsed `#[envprops(...)]` field attributes.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Lookup name override.
    pub name: Option<LitStr>,
    /// Default value.
    pub default: Option<LitStr>,
    /// Raw critical flag; a bare `critical` reads as `"true"`.
    pub critical: Option<LitStr>,
    /// Exclude the field from the schema.
    pub skip: bool,
}

impl FieldAttrs {
    /// Parses all `envprops` attributes of a field.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("envprops")) {
            attr.parse_nested_meta(|meta| {
                let ident = meta
                    .path
                    .get_ident()
                    .ok_or_else(|| meta.error("expected identifier"))?
                    .to_string();

                match ident.as_str() {
                    "name" => set_once(&mut parsed.name, meta.value()?.parse()?, &ident, &meta),
                    "default" => {
                        set_once(&mut parsed.default, meta.value()?.parse()?, &ident, &meta)
                    }
                    "critical" => {
                        let flag = if meta.input.peek(syn::Token![=]) {
                            meta.value()?.parse()?
                        } else {
                            LitStr::new("true", meta.path.span())
                        };
                        set_once(&mut parsed.critical, flag, &ident, &meta)
                    }
                    "skip" => {
                        parsed.skip = true;
                        Ok(())
                    }
                    _ => Err(meta.error(format!("unknown envprops attribute: {ident}"))),
                }
            })?;
        }

        Ok(parsed)
    }
}

fn set_once(
    slot: &mut Option<LitStr>,
    value: LitStr,
    ident: &str,
    meta: &syn::meta::ParseNestedMeta<'_>,
) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error(format!("duplicate envprops attribute: {ident}")));
    }
    *slot = Some(value);
    Ok(())
}

/// A configurable field.
#[derive(Debug)]
pub struct ConfigField {
    /// The field ident.
    pub ident: Ident,
    /// Classified type.
    pub ty: FieldType,
    /// Parsed attributes.
    pub attrs: FieldAttrs,
}

/// Parsed derive input.
#[derive(Debug)]
pub struct ConfigStruct {
    /// Fields taking part in the schema, in declaration order.
    pub fields: Vec<ConfigField>,
}

impl ConfigStruct {
    /// Parses a derive input, rejecting anything but a struct with named fields.
    pub fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named,
                _ => {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "Configurable requires a struct with named fields",
                    ))
                }
            },
            _ => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Configurable can only be derived for structs",
                ))
            }
        };

        let mut fields = Vec::new();
        for field in &named.named {
            let attrs = FieldAttrs::from_attrs(&field.attrs)?;
            if attrs.skip {
                continue;
            }
            let ident = field
                .ident
                .clone()
                .ok_or_else(|| syn::Error::new(field.span(), "expected named field"))?;
            fields.push(ConfigField {
                ident,
                ty: FieldType::classify(&field.ty)?,
                attrs,
            });
        }

        Ok(Self { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_classify_scalars() {
        let ty: Type = parse_quote!(String);
        assert_eq!(FieldType::classify(&ty).unwrap().kind, Kind::String);

        let ty: Type = parse_quote!(u16);
        assert_eq!(FieldType::classify(&ty).unwrap().kind, Kind::Integer);

        let ty: Type = parse_quote!(bool);
        assert_eq!(FieldType::classify(&ty).unwrap().kind, Kind::Boolean);

        let ty: Type = parse_quote!(f32);
        assert_eq!(FieldType::classify(&ty).unwrap().kind, Kind::Float32);

        let ty: Type = parse_quote!(std::string::String);
        assert_eq!(FieldType::classify(&ty).unwrap().kind, Kind::String);
    }

    #[test]
    fn test_classify_option() {
        let ty: Type = parse_quote!(Option<i64>);
        let classified = FieldType::classify(&ty).unwrap();
        assert_eq!(classified.kind, Kind::Integer);
        assert!(classified.optional);
    }

    #[test]
    fn test_classify_unsupported() {
        let ty: Type = parse_quote!(Vec<String>);
        assert!(FieldType::classify(&ty).is_err());

        let ty: Type = parse_quote!(Option<Option<bool>>);
        assert!(FieldType::classify(&ty).is_err());

        let ty: Type = parse_quote!(std::time::Duration);
        assert!(FieldType::classify(&ty).is_err());
    }

    #[test]
    fn test_parse_field_attrs() {
        let input: DeriveInput = parse_quote! {
            struct Settings {
                #[envprops(name = "PORT", default = "8080")]
                port: u16,
                #[envprops(critical)]
                host: String,
                #[envprops(critical = "y")]
                region: Option<String>,
                #[envprops(skip)]
                cache: Vec<u8>,
            }
        };
        let parsed = ConfigStruct::parse(&input).unwrap();
        assert_eq!(parsed.fields.len(), 3);

        let port = &parsed.fields[0];
        assert_eq!(port.attrs.name.as_ref().unwrap().value(), "PORT");
        assert_eq!(port.attrs.default.as_ref().unwrap().value(), "8080");
        assert!(port.attrs.critical.is_none());

        assert_eq!(parsed.fields[1].attrs.critical.as_ref().unwrap().value(), "true");
        assert_eq!(parsed.fields[2].attrs.critical.as_ref().unwrap().value(), "y");
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Settings {
                #[envprops(rename = "PORT")]
                port: u16,
            }
        };
        assert!(ConfigStruct::parse(&input).is_err());
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Settings {
                #[envprops(name = "A", name = "B")]
                port: u16,
            }
        };
        assert!(ConfigStruct::parse(&input).is_err());
    }

    #[test]
    fn test_non_struct_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Mode { A, B }
        };
        assert!(ConfigStruct::parse(&input).is_err());

        let input: DeriveInput = parse_quote! {
            struct Pair(u16, u16);
        };
        assert!(ConfigStruct::parse(&input).is_err());
    }
}
