//! Procedural macros for the memlayer project.
//!
//! This crate provides `#[derive(Identifiable)]`, which implements
//! `memlayer::record::Identifiable` for structs with an optional identifier field.
//!
//! The identifier field is the field marked `#[id]`, or the field named `id` when no
//! field is marked. It must be declared as `Option<K>`; `K` becomes the record's key type.
//!
//! Generated code refers to the trait through the `memlayer` facade. Crates that use
//! `memlayer-core` directly point the derive at it with `#[memlayer(crate = memlayer_core)]`.
//!
//! ```ignore
//! use memlayer::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Identifiable)]
//! pub struct Account {
//!     #[id]
//!     pub number: Option<u64>,
//!     pub owner: String,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as memlayer_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericArgument, Path, PathArguments, Type,
    TypePath, parse_macro_input, parse_quote,
};

#[proc_macro_derive(Identifiable, attributes(id, memlayer))]
pub fn derive_identifiable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_identifiable(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

fn expand_identifiable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(&input.ident, "Identifiable can only be derived for structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(Error::new_spanned(&input.ident, "Identifiable requires named fields"));
    };

    let marked: Vec<&Field> = fields
        .named
        .iter()
        .filter(|field| field.attrs.iter().any(|attr| attr.path().is_ident("id")))
        .collect();

    let field = match marked.as_slice() {
        [field] => *field,
        [] => fields
            .named
            .iter()
            .find(|field| field.ident.as_ref().is_some_and(|ident| ident == "id"))
            .ok_or_else(|| {
                Error::new_spanned(&input.ident, "expected a field named `id` or a field marked #[id]")
            })?,
        [_, extra, ..] => {
            return Err(Error::new_spanned(extra, "only one field may be marked #[id]"));
        }
    };

    let Some(field_ident) = &field.ident else {
        return Err(Error::new_spanned(field, "identifier field must be named"));
    };
    let key = option_inner(&field.ty)
        .ok_or_else(|| Error::new_spanned(&field.ty, "identifier field must be declared as Option<K>"))?;

    let krate = crate_path(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::record::Identifiable for #name #ty_generics #where_clause {
            type Key = #key;

            fn id(&self) -> ::core::option::Option<&Self::Key> {
                self.#field_ident.as_ref()
            }

            fn set_id(&mut self, id: Self::Key) {
                self.#field_ident = ::core::option::Option::Some(id);
            }
        }
    })
}

/// Reads `#[memlayer(crate = path)]`, defaulting to `::memlayer`.
fn crate_path(input: &DeriveInput) -> syn::Result<Path> {
    let mut krate = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("memlayer")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                krate = Some(meta.value()?.parse::<Path>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported memlayer attribute, expected `crate = path`"))
            }
        })?;
    }

    Ok(krate.unwrap_or_else(|| parse_quote!(::memlayer)))
}

/// Returns `K` for a type written as `Option<K>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    let segment = path.segments.last()?;

    if segment.ident != "Option" {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };

    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_field_named_id_by_default() {
        let input: DeriveInput = parse_quote! {
            struct Note {
                id: Option<String>,
                content: String,
            }
        };

        let expanded = expand_identifiable(&input).unwrap().to_string();

        assert!(expanded.contains("type Key = String"));
        assert!(expanded.contains("self . id"));
        assert!(expanded.replace(' ', "").contains("::memlayer::record::Identifiable"));
    }

    #[test]
    fn crate_path_can_be_overridden() {
        let input: DeriveInput = parse_quote! {
            #[memlayer(crate = memlayer_core)]
            struct Note {
                id: Option<String>,
            }
        };

        let expanded = expand_identifiable(&input).unwrap().to_string();

        let compact = expanded.replace(' ', "");
        assert!(compact.contains("implmemlayer_core::record::Identifiable"));
        assert!(!compact.contains("::memlayer::"));
    }

    #[test]
    fn rejects_unknown_memlayer_options() {
        let input: DeriveInput = parse_quote! {
            #[memlayer(path = memlayer_core)]
            struct Note {
                id: Option<String>,
            }
        };

        assert!(expand_identifiable(&input).is_err());
    }

    #[test]
    fn marked_field_wins() {
        let input: DeriveInput = parse_quote! {
            struct Account {
                id: String,
                #[id]
                number: Option<u64>,
            }
        };

        let expanded = expand_identifiable(&input).unwrap().to_string();

        assert!(expanded.contains("type Key = u64"));
        assert!(expanded.contains("number"));
    }

    #[test]
    fn rejects_non_optional_identifier() {
        let input: DeriveInput = parse_quote! {
            struct Note {
                id: String,
            }
        };

        assert!(expand_identifiable(&input).is_err());
    }

    #[test]
    fn rejects_two_marked_fields() {
        let input: DeriveInput = parse_quote! {
            struct Pair {
                #[id]
                a: Option<u64>,
                #[id]
                b: Option<u64>,
            }
        };

        assert!(expand_identifiable(&input).is_err());
    }

    #[test]
    fn rejects_enums() {
        let input: DeriveInput = parse_quote! {
            enum Choice { A, B }
        };

        assert!(expand_identifiable(&input).is_err());
    }
}
