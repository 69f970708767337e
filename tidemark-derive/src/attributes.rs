//! Attribute parsing utilities

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, ExprLit, Field, Lit, LitBool, LitInt, LitStr, Meta, Token};

use crate::utils;

/// Options from `#[table(...)]`
#[derive(Default)]
pub struct TableAttributes {
    pub name: Option<String>,
    pub primary_key: Option<String>,
    pub inherit_columns: bool,
    pub create_if_required: Option<bool>,
    pub strict_type_mapping: Option<bool>,
    pub annotations_only: Option<bool>,
    pub memory_table: bool,
}

/// One `#[index(...)]` declaration
pub struct IndexAttributes {
    pub name: Option<String>,
    pub kind: TokenStream2,
    pub columns: Vec<String>,
}

/// Options from `#[column(...)]`
#[derive(Default)]
pub struct ColumnAttributes {
    pub name: Option<String>,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub length: Option<usize>,
    pub trim: bool,
    pub nullable: Option<bool>,
    pub default_value: Option<String>,
}

/// How a field's value reaches the mapping layer
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Value,
    Enumeration,
    Text,
    Json,
}

/// Everything declared on one field
pub struct FieldAttributes {
    pub column: Option<ColumnAttributes>,
    pub kind: FieldKind,
    pub enum_type: Option<TokenStream2>,
    pub adapter: Option<syn::Path>,
    pub parent: bool,
    pub skip: bool,
}

fn string_value(meta: &ParseNestedMeta) -> syn::Result<String> {
    let s: LitStr = meta.value()?.parse()?;
    Ok(s.value())
}

/// A bare flag means `true`; `flag = false` is also accepted
fn flag_value(meta: &ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.peek(Token![=]) {
        let b: LitBool = meta.value()?.parse()?;
        Ok(b.value)
    } else {
        Ok(true)
    }
}

/// Literal of a `#[name = literal]` attribute
fn name_value_lit(attr: &Attribute) -> syn::Result<&Lit> {
    let meta = attr.meta.require_name_value()?;
    match &meta.value {
        Expr::Lit(ExprLit { lit, .. }) => Ok(lit),
        other => Err(syn::Error::new(other.span(), "expected a literal")),
    }
}

fn name_value_str(attr: &Attribute) -> syn::Result<String> {
    match name_value_lit(attr)? {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new(other.span(), "expected a string literal")),
    }
}

fn name_value_int(attr: &Attribute) -> syn::Result<i32> {
    match name_value_lit(attr)? {
        Lit::Int(i) => i.base10_parse(),
        other => Err(syn::Error::new(other.span(), "expected an integer literal")),
    }
}

/// Map an encoding name to its `EnumType` variant
pub fn enum_type_tokens(value: &str, span: proc_macro2::Span) -> syn::Result<TokenStream2> {
    match value.to_ascii_lowercase().as_str() {
        "name" => Ok(quote!(::tidemark::EnumType::Name)),
        "ordinal" => Ok(quote!(::tidemark::EnumType::Ordinal)),
        "enum_id" | "enumid" => Ok(quote!(::tidemark::EnumType::EnumId)),
        _ => Err(syn::Error::new(
            span,
            format!("unknown enum encoding '{value}', expected name, ordinal or enum_id"),
        )),
    }
}

fn index_kind_tokens(value: &str, span: proc_macro2::Span) -> syn::Result<TokenStream2> {
    match value.to_ascii_lowercase().as_str() {
        "standard" => Ok(quote!(::tidemark::IndexType::Standard)),
        "unique" => Ok(quote!(::tidemark::IndexType::Unique)),
        "hash" => Ok(quote!(::tidemark::IndexType::Hash)),
        "unique_hash" => Ok(quote!(::tidemark::IndexType::UniqueHash)),
        _ => Err(syn::Error::new(
            span,
            format!("unknown index kind '{value}', expected standard, unique, hash or unique_hash"),
        )),
    }
}

/// Parse `#[table(...)]`; `None` when the struct has no table attribute
pub fn parse_table_attributes(attrs: &[Attribute]) -> syn::Result<Option<TableAttributes>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("table")) else {
        return Ok(None);
    };
    let mut table = TableAttributes::default();
    if let Meta::Path(_) = attr.meta {
        return Ok(Some(table));
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            table.name = Some(string_value(&meta)?);
        } else if meta.path.is_ident("primary_key") {
            table.primary_key = Some(string_value(&meta)?);
        } else if meta.path.is_ident("inherit_columns") {
            table.inherit_columns = flag_value(&meta)?;
        } else if meta.path.is_ident("create_if_required") {
            table.create_if_required = Some(flag_value(&meta)?);
        } else if meta.path.is_ident("strict_type_mapping") {
            table.strict_type_mapping = Some(flag_value(&meta)?);
        } else if meta.path.is_ident("annotations_only") {
            table.annotations_only = Some(flag_value(&meta)?);
        } else if meta.path.is_ident("memory_table") {
            table.memory_table = flag_value(&meta)?;
        } else {
            return Err(meta.error("unknown table option"));
        }
        Ok(())
    })?;
    Ok(Some(table))
}

/// Parse every `#[index(...)]` in declaration order
pub fn parse_index_attributes(attrs: &[Attribute]) -> syn::Result<Vec<IndexAttributes>> {
    let mut indexes = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("index")) {
        let mut name = None;
        let mut kind = quote!(::tidemark::IndexType::Standard);
        let mut columns = Vec::new();
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(string_value(&meta)?);
            } else if meta.path.is_ident("kind") {
                let value: LitStr = meta.value()?.parse()?;
                kind = index_kind_tokens(&value.value(), value.span())?;
            } else if meta.path.is_ident("columns") {
                columns = utils::split_columns(&string_value(&meta)?);
            } else {
                return Err(meta.error("unknown index option"));
            }
            Ok(())
        })?;
        if columns.is_empty() {
            return Err(syn::Error::new(attr.span(), "index requires at least one column"));
        }
        indexes.push(IndexAttributes { name, kind, columns });
    }
    Ok(indexes)
}

/// `#[schema_name = "..."]`
pub fn extract_schema_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    attrs
        .iter()
        .find(|a| a.path().is_ident("schema_name"))
        .map(name_value_str)
        .transpose()
}

/// `#[version = N]`
pub fn extract_version(attrs: &[Attribute]) -> syn::Result<Option<i32>> {
    attrs.iter().find(|a| a.path().is_ident("version")).map(name_value_int).transpose()
}

/// `#[enum_type = "..."]` on an enum or field
pub fn extract_enum_type(attrs: &[Attribute]) -> syn::Result<Option<TokenStream2>> {
    match attrs.iter().find(|a| a.path().is_ident("enum_type")) {
        Some(attr) => {
            let value = name_value_str(attr)?;
            enum_type_tokens(&value, attr.span()).map(Some)
        }
        None => Ok(None),
    }
}

/// `#[enum_id = N]` on an enum variant
pub fn extract_enum_id(attrs: &[Attribute]) -> syn::Result<Option<i32>> {
    attrs.iter().find(|a| a.path().is_ident("enum_id")).map(name_value_int).transpose()
}

fn parse_column(attr: &Attribute) -> syn::Result<ColumnAttributes> {
    let mut column = ColumnAttributes::default();
    if let Meta::Path(_) = attr.meta {
        return Ok(column);
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            column.name = Some(string_value(&meta)?);
        } else if meta.path.is_ident("primary_key") {
            column.primary_key = flag_value(&meta)?;
        } else if meta.path.is_ident("auto_increment") {
            column.auto_increment = flag_value(&meta)?;
        } else if meta.path.is_ident("length") {
            let value: LitInt = meta.value()?.parse()?;
            column.length = Some(value.base10_parse()?);
        } else if meta.path.is_ident("trim") {
            column.trim = flag_value(&meta)?;
        } else if meta.path.is_ident("nullable") {
            column.nullable = Some(flag_value(&meta)?);
        } else if meta.path.is_ident("default_value") {
            column.default_value = Some(string_value(&meta)?);
        } else {
            return Err(meta.error("unknown column option"));
        }
        Ok(())
    })?;
    Ok(column)
}

/// Parse all field attributes
pub fn parse_field_attributes(field: &Field) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes {
        column: None,
        kind: FieldKind::Value,
        enum_type: None,
        adapter: None,
        parent: false,
        skip: false,
    };
    let mut kinds = 0;
    for attr in &field.attrs {
        let path = attr.path();
        if path.is_ident("column") {
            parsed.column = Some(parse_column(attr)?);
        } else if path.is_ident("enumeration") {
            if parsed.kind != FieldKind::Enumeration {
                parsed.kind = FieldKind::Enumeration;
                kinds += 1;
            }
        } else if path.is_ident("enum_type") {
            parsed.enum_type = Some(enum_type_tokens(&name_value_str(attr)?, attr.span())?);
            if parsed.kind != FieldKind::Enumeration {
                parsed.kind = FieldKind::Enumeration;
                kinds += 1;
            }
        } else if path.is_ident("text") {
            parsed.kind = FieldKind::Text;
            kinds += 1;
        } else if path.is_ident("json") {
            parsed.kind = FieldKind::Json;
            kinds += 1;
        } else if path.is_ident("adapter") {
            let value = name_value_str(attr)?;
            parsed.adapter = Some(syn::parse_str(&value).map_err(|e| syn::Error::new(attr.span(), e))?);
        } else if path.is_ident("parent") {
            parsed.parent = true;
        } else if path.is_ident("skip") {
            parsed.skip = true;
        }
    }
    if kinds > 1 {
        return Err(syn::Error::new(
            field.span(),
            "a field can be only one of enumeration, text or json",
        ));
    }
    if parsed.parent && (parsed.column.is_some() || kinds > 0) {
        return Err(syn::Error::new(field.span(), "#[parent] cannot be combined with column attributes"));
    }
    Ok(parsed)
}
