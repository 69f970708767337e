//! Procedural macros for Tidemark
//!
//! This crate provides derive macros for `Entity` and `DbEnum`.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Entity` - generates the model descriptor
///
/// This macro generates:
/// - `Entity::schema()` describing the table, indexes and every declared field
/// - one `FieldKey` constant per declared field, named after the field in upper case
/// - `inherited()` for naming fields of a `#[parent]` struct, when one is declared
///
/// Struct attributes: `#[table(...)]`, `#[schema_name = "..."]`, `#[version = N]`,
/// `#[index(...)]`. Field attributes: `#[column(...)]`, `#[enumeration]`,
/// `#[enum_type = "..."]`, `#[text]`, `#[json]`, `#[adapter = "..."]`,
/// `#[parent]`, `#[skip]`.
///
/// # Example
///
/// ```ignore
/// use tidemark::Entity;
///
/// #[derive(Default, Entity)]
/// #[table(name = "Product", primary_key = "id")]
/// #[index(kind = "unique", columns = "name")]
/// pub struct Product {
///     #[column(auto_increment)]
///     pub id: i64,
///     #[column(length = 40, trim)]
///     pub name: String,
/// }
///
/// let key = Product::NAME;
/// ```
#[proc_macro_derive(Entity, attributes(table, schema_name, version, index, column, enumeration, enum_type, text, json, adapter, parent, skip))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    macros::derive_entity(input)
}

/// Derive macro for `DbEnum` - makes a fieldless enum storable
///
/// `#[enum_type = "name" | "ordinal" | "enum_id"]` on the enum sets the
/// type-level encoding; `#[enum_id = N]` on a variant supplies its identifier.
#[proc_macro_derive(DbEnum, attributes(enum_type, enum_id))]
pub fn derive_db_enum(input: TokenStream) -> TokenStream {
    macros::derive_db_enum(input)
}
