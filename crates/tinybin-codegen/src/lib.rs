// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::{Literal, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Member};

/// One struct field as seen by the generator.
struct FieldInfo {
    member: Member,
    /// Name recorded in the descriptor (`"0"`, `"1"`.. for tuple structs).
    name: String,
    ty: syn::Type,
    skip: bool,
}

/// `#[derive(Record)]` macro: generates the `Reflect` and `Record` impls
///
/// Every field type must implement `tinybin::Reflect` unless it is marked
/// `#[tinybin(skip)]`; skipped fields are left off the wire and rebuilt
/// with `Default::default()` on decode.
///
/// Example:
/// ```ignore
/// use tinybin::Record;
///
/// #[derive(Record)]
/// struct Sender {
///     id: u32,
///     name: String,
/// }
///
/// #[derive(Record)]
/// struct Frame {
///     seq: u64,
///     payload: Vec<u8>,
///     sender: Option<Box<Sender>>,
///     #[tinybin(skip)]
///     scratch: Vec<u32>,
/// }
/// ```
#[proc_macro_derive(Record, attributes(tinybin))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    // A generic struct would share one cached descriptor across instantiations.
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => collect_fields(&data.fields)?,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Record can only be derived for structs",
            ))
        }
    };
    let count = Literal::usize_unsuffixed(fields.len());

    let descriptors = fields.iter().map(|f| {
        let fname = &f.name;
        let ty = &f.ty;
        if f.skip {
            quote! {
                ::tinybin::types::FieldDescriptor::new(
                    #fname,
                    ::tinybin::types::TypeDescriptor::opaque(
                        ::std::any::type_name::<#ty>(),
                        ::tinybin::types::OpaqueKind::Foreign,
                    ),
                )
                .skipped()
            }
        } else {
            quote! {
                ::tinybin::types::FieldDescriptor::new(
                    #fname,
                    ::tinybin::types::TypeRef::Lazy(<#ty as ::tinybin::Reflect>::descriptor),
                )
            }
        }
    });

    let to_values = fields.iter().map(|f| {
        let member = &f.member;
        if f.skip {
            quote! { ::tinybin::Value::Null }
        } else {
            quote! { ::tinybin::Reflect::to_value(&self.#member) }
        }
    });

    let inits = fields.iter().enumerate().map(|(i, f)| {
        let member = &f.member;
        let ty = &f.ty;
        let index = Literal::usize_unsuffixed(i);
        if f.skip {
            quote! { #member: ::std::default::Default::default() }
        } else {
            quote! { #member: <#ty as ::tinybin::Reflect>::from_value(&fields[#index])? }
        }
    });

    Ok(quote! {
        impl ::tinybin::Reflect for #name {
            fn descriptor() -> ::std::sync::Arc<::tinybin::types::TypeDescriptor> {
                static DESCRIPTOR: ::std::sync::OnceLock<
                    ::std::sync::Arc<::tinybin::types::TypeDescriptor>,
                > = ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(DESCRIPTOR.get_or_init(|| {
                    ::std::sync::Arc::new(::tinybin::types::TypeDescriptor::struct_type(
                        ::std::any::type_name::<Self>(),
                        ::std::vec![#(#descriptors),*],
                    ))
                }))
            }

            fn to_value(&self) -> ::tinybin::Value {
                ::tinybin::Value::Struct(::std::vec![#(#to_values),*])
            }

            #[allow(unused_variables)]
            fn from_value(value: &::tinybin::Value) -> ::tinybin::Result<Self> {
                let fields = ::tinybin::types::struct_fields(
                    value,
                    #count,
                    ::std::any::type_name::<Self>(),
                )?;
                ::std::result::Result::Ok(Self { #(#inits),* })
            }
        }

        impl ::tinybin::Record for #name {}
    })
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<FieldInfo>> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let (member, name) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
                None => (Member::Unnamed(i.into()), i.to_string()),
            };
            Ok(FieldInfo {
                member,
                name,
                ty: field.ty.clone(),
                skip: is_skipped(field)?,
            })
        })
        .collect()
}

/// `#[tinybin(skip)]`
fn is_skipped(field: &syn::Field) -> syn::Result<bool> {
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("tinybin") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported tinybin attribute, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}
