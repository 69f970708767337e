//! Derive macro for Entity
//!
//! Generates `Entity::schema()` plus one `FieldKey` constant per declared field.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields, Type, Visibility};

use crate::attributes::{self, ColumnAttributes, FieldKind, TableAttributes};
use crate::utils;

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn optional_string(value: &Option<String>) -> TokenStream2 {
    match value {
        Some(s) => quote!(::core::option::Option::Some(::std::string::String::from(#s))),
        None => quote!(::core::option::Option::None),
    }
}

fn table_tokens(table: &TableAttributes) -> TokenStream2 {
    let name = optional_string(&table.name);
    let primary_key = optional_string(&table.primary_key);
    let inherit_columns = table.inherit_columns;
    let create_if_required = table.create_if_required.unwrap_or(true);
    let strict_type_mapping = table.strict_type_mapping.unwrap_or(true);
    let annotations_only = table.annotations_only.unwrap_or(true);
    let memory_table = table.memory_table;
    quote! {
        ::tidemark::TableOptions {
            name: #name,
            primary_key: #primary_key,
            inherit_columns: #inherit_columns,
            create_if_required: #create_if_required,
            strict_type_mapping: #strict_type_mapping,
            annotations_only: #annotations_only,
            memory_table: #memory_table,
        }
    }
}

fn column_tokens(column: &ColumnAttributes) -> TokenStream2 {
    let name = optional_string(&column.name);
    let primary_key = column.primary_key;
    let auto_increment = column.auto_increment;
    let length = column.length.unwrap_or(0);
    let trim = column.trim;
    let nullable = column.nullable.unwrap_or(true);
    let default_value = optional_string(&column.default_value);
    quote! {
        ::tidemark::ColumnOptions {
            name: #name,
            primary_key: #primary_key,
            auto_increment: #auto_increment,
            length: #length,
            trim: #trim,
            nullable: #nullable,
            default_value: #default_value,
        }
    }
}

/// Short name of a type, used as the type name of `#[text]` fields
fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        other => quote!(#other).to_string().replace(' ', ""),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(input.generics.span(), "Entity cannot be derived for generic structs"));
    }
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Entity can only be derived for structs with named fields",
            ))
        }
    };

    let model_name = struct_name.to_string();
    let mut schema = quote!(::tidemark::ModelSchema::<#struct_name>::new(#model_name));

    if let Some(table) = attributes::parse_table_attributes(&input.attrs)? {
        let table = table_tokens(&table);
        schema = quote!(#schema.table(#table));
    }
    if let Some(schema_name) = attributes::extract_schema_name(&input.attrs)? {
        schema = quote!(#schema.schema_name(#schema_name));
    }
    if let Some(version) = attributes::extract_version(&input.attrs)? {
        schema = quote!(#schema.version(#version));
    }
    for index in attributes::parse_index_attributes(&input.attrs)? {
        let kind = &index.kind;
        let columns = &index.columns;
        let mut options = quote!(::tidemark::IndexOptions::new(#kind, &[#(#columns),*]));
        if let Some(name) = &index.name {
            options = quote!(#options.named(#name));
        }
        schema = quote!(#schema.index(#options));
    }

    let mut keys = Vec::new();
    let mut parent = None;
    let mut declared = 0usize;
    for field in fields {
        let Some(ident) = &field.ident else { continue };
        let attrs = attributes::parse_field_attributes(field)?;
        if attrs.skip {
            continue;
        }
        let ty = &field.ty;
        if attrs.parent {
            if parent.is_some() {
                return Err(syn::Error::new(field.span(), "only one #[parent] field is allowed"));
            }
            parent = Some((ident, ty));
            continue;
        }

        let name = ident.to_string().trim_start_matches("r#").to_string();
        let get = quote!(|m: &#struct_name| &m.#ident);
        let set = quote!(|m: &mut #struct_name, v: #ty| m.#ident = v);
        let mut spec = match attrs.kind {
            FieldKind::Value => quote!(::tidemark::FieldSpec::value(#name, #get, #set)),
            FieldKind::Enumeration => quote!(::tidemark::FieldSpec::enumeration(#name, #get, #set)),
            FieldKind::Text => {
                let type_name = type_name(ty);
                quote!(::tidemark::FieldSpec::text(#name, #type_name, #get, #set))
            }
            FieldKind::Json => quote!(::tidemark::FieldSpec::json(#name, #get, #set)),
        };
        if !matches!(field.vis, Visibility::Public(_)) {
            spec = quote!(#spec.private());
        }
        if let Some(column) = &attrs.column {
            let column = column_tokens(column);
            spec = quote!(#spec.column(#column));
        }
        if let Some(encoding) = &attrs.enum_type {
            spec = quote!(#spec.enum_type(#encoding));
        }
        if let Some(adapter) = &attrs.adapter {
            spec = quote!(#spec.adapter(#adapter));
        }
        schema = quote!(#schema.field(#spec));

        let key_name = format_ident!("{}", utils::constant_case(&name));
        let index = declared;
        keys.push(quote! {
            pub const #key_name: ::tidemark::FieldKey<Self> = ::tidemark::FieldKey::new(#index);
        });
        declared += 1;
    }

    let (inherit, inherited) = match parent {
        Some((ident, ty)) => (
            quote! {
                fn parent_ref(m: &#struct_name) -> &#ty {
                    &m.#ident
                }
                fn parent_mut(m: &mut #struct_name) -> &mut #ty {
                    &mut m.#ident
                }
                let schema = schema.inherit(parent_ref, parent_mut);
            },
            quote! {
                /// Key of a field declared on the embedded parent.
                pub const fn inherited(key: ::tidemark::FieldKey<#ty>) -> ::tidemark::FieldKey<Self> {
                    ::tidemark::FieldKey::new(#declared + key.index())
                }
            },
        ),
        None => (quote!(), quote!()),
    };

    Ok(quote! {
        #[allow(dead_code)]
        impl #struct_name {
            #(#keys)*
            #inherited
        }

        impl ::tidemark::model::Entity for #struct_name {
            fn schema() -> ::tidemark::ModelSchema<Self> {
                let schema = #schema;
                #inherit
                schema
            }
        }
    })
}
