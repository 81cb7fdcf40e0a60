//! Procedural macros for the doclink project.
//!
//! This crate provides the derive macros re-exported by the `doclink` crate:
//!
//! - `#[derive(Document)]` marks a serde type as a document shape that can be materialized by
//!   value into collection destinations
//! - `#[derive(Module)]` implements the extension `Module` descriptor

#[allow(unused_extern_crates)]
extern crate self as doclink_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, parse_quote, DeriveInput, LitStr};

/// Derives `doclink::document::Document` and `doclink::document::Element` for a type.
///
/// The type must also implement `Serialize` and `Deserialize`. Deriving `Element` lets
/// `Vec<T>` receive documents by value alongside the built-in `Vec<Box<T>>` and `Vec<Arc<T>>`.
///
/// ```ignore
/// use doclink::prelude::*;
///
/// #[derive(Debug, Serialize, Deserialize, Document)]
/// pub struct Guild {
///     pub guild_id: String,
/// }
/// ```
#[proc_macro_derive(Document)]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    // Generic shapes only qualify once their parameters make them serializable.
    let mut generics = input.generics.clone();
    if !generics.params.is_empty() {
        generics.make_where_clause().predicates.push(parse_quote! {
            Self: ::doclink::__private::Serialize
                + ::doclink::__private::DeserializeOwned
                + ::core::marker::Send
                + ::core::marker::Sync
                + 'static
        });
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics ::doclink::document::Document for #name #ty_generics #where_clause {}

        impl #impl_generics ::doclink::document::Element for #name #ty_generics #where_clause {
            type Document = Self;

            fn from_document(document: Self) -> Self {
                document
            }
        }
    }
    .into()
}

/// Derives `doclink::extension::Module` for a type.
///
/// The name and version come from an optional `#[module(name = "...", version = "...")]`
/// attribute and default to the deriving package's `CARGO_PKG_NAME` and `CARGO_PKG_VERSION`.
///
/// ```ignore
/// use doclink::prelude::*;
///
/// #[derive(Module)]
/// #[module(name = "levels", version = "1.2.0")]
/// pub struct Levels;
/// ```
#[proc_macro_derive(Module, attributes(module))]
pub fn derive_module(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_module(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_module(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let mut name: Option<LitStr> = None;
    let mut version: Option<LitStr> = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("module")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("version") {
                version = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `name` or `version`"))
            }
        })?;
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let name = match name {
        Some(lit) => quote! { #lit },
        None => quote! { ::core::env!("CARGO_PKG_NAME") },
    };
    let version = match version {
        Some(lit) => quote! { #lit },
        None => quote! { ::core::env!("CARGO_PKG_VERSION") },
    };

    Ok(quote! {
        impl #impl_generics ::doclink::extension::Module for #ident #ty_generics #where_clause {
            fn name(&self) -> &str {
                #name
            }

            fn version(&self) -> &str {
                #version
            }
        }
    })
}
