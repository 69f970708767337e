//! Derive macro for DbEnum

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::attributes;

pub fn derive_db_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let enum_name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(enum_name.span(), "DbEnum can only be derived for enums"));
    };

    let default_encoding = match attributes::extract_enum_type(&input.attrs)? {
        Some(encoding) => quote!(::core::option::Option::Some(#encoding)),
        None => quote!(::core::option::Option::None),
    };

    let mut members = Vec::new();
    let mut to_ordinal = Vec::new();
    let mut from_ordinal = Vec::new();
    for (ordinal, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(variant.ident.span(), "DbEnum variants cannot carry data"));
        }
        let ident = &variant.ident;
        let name = ident.to_string();
        let id = match attributes::extract_enum_id(&variant.attrs)? {
            Some(id) => quote!(::core::option::Option::Some(#id)),
            None => quote!(::core::option::Option::None),
        };
        members.push(quote!(::tidemark::EnumMember { name: #name, id: #id }));
        to_ordinal.push(quote!(Self::#ident => #ordinal));
        from_ordinal.push(quote!(#ordinal => ::core::option::Option::Some(Self::#ident)));
    }

    let descriptor_name = enum_name.to_string();
    Ok(quote! {
        impl ::tidemark::value::DbEnum for #enum_name {
            fn descriptor() -> &'static ::tidemark::EnumDescriptor {
                static DESCRIPTOR: ::tidemark::EnumDescriptor = ::tidemark::EnumDescriptor {
                    name: #descriptor_name,
                    default_encoding: #default_encoding,
                    members: &[#(#members),*],
                };
                &DESCRIPTOR
            }

            fn ordinal(&self) -> usize {
                match self {
                    #(#to_ordinal,)*
                }
            }

            fn from_ordinal(ordinal: usize) -> ::core::option::Option<Self> {
                match ordinal {
                    #(#from_ordinal,)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}
