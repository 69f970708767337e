//! Tests for the Entity and DbEnum derives

use serde::{Deserialize, Serialize};
use tidemark::{
    Alias, DbEnum, Dialect, Entity, EnumType, FieldType, IndexType, JsonTextAdapter, MappingRegistry, Query,
    TableDefinition,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, DbEnum)]
enum Flavor {
    #[default]
    #[enum_id = 10]
    Vanilla,
    #[enum_id = 20]
    Chocolate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, DbEnum)]
#[enum_type = "ordinal"]
enum Size {
    #[default]
    Small,
    Large,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Tags {
    labels: Vec<String>,
}

#[derive(Debug, Default, Entity)]
#[table(name = "ICE_CREAM", primary_key = "id")]
#[schema_name = "shop"]
#[version = 3]
#[index(kind = "unique", columns = "name")]
#[index(name = "flavor_size", kind = "hash", columns = "flavor, size")]
pub struct IceCream {
    #[column(auto_increment)]
    pub id: i64,
    #[column(length = 12, trim, nullable = false)]
    pub name: String,
    #[column(name = "flavor")]
    #[enum_type = "enum_id"]
    pub flavor: Flavor,
    #[column]
    #[enumeration]
    pub size: Size,
    #[column(default_value = "0")]
    pub scoops: Option<i32>,
    #[column]
    #[json]
    #[adapter = "JsonTextAdapter::boxed"]
    pub tags: Tags,
    pub note: Option<String>,
    #[skip]
    pub cached: bool,
}

#[test]
fn test_entity_table_options() {
    let def = TableDefinition::<IceCream>::build().unwrap();
    assert_eq!(def.table_name, "ICE_CREAM");
    assert_eq!(def.schema_name.as_deref(), Some("shop"));
    assert_eq!(def.version, 3);
    assert!(def.create_if_required);
    assert_eq!(def.primary_key_columns(), ["id".to_string()]);
}

#[test]
fn test_entity_columns_follow_annotations() {
    let def = TableDefinition::<IceCream>::build().unwrap();
    let columns: Vec<&str> = def.fields().iter().map(|f| f.column_name.as_str()).collect();
    // `note` has no column attribute and annotations_only defaults to true
    assert_eq!(columns, vec!["id", "name", "flavor", "size", "scoops", "tags"]);

    let name = def.find_field("name").unwrap();
    assert_eq!(name.max_length, 12);
    assert!(name.trim_string);
    assert!(!name.allow_null);

    let id = def.find_field("id").unwrap();
    assert!(id.is_primary_key);
    assert!(id.is_auto_increment);

    assert_eq!(def.find_field("flavor").unwrap().enum_type, Some(EnumType::EnumId));
    assert_eq!(def.find_field("size").unwrap().enum_type, Some(EnumType::Ordinal));
    assert_eq!(def.find_field("scoops").unwrap().default_value.as_deref(), Some("0"));
    assert_eq!(def.find_field("tags").unwrap().field_type, FieldType::Json);
    assert!(def.find_field("tags").unwrap().adapter().is_some());
}

#[test]
fn test_entity_indexes() {
    let def = TableDefinition::<IceCream>::build().unwrap();
    let indexes = def.indexes();
    assert_eq!(indexes.len(), 2);
    assert_eq!(indexes[0].kind, IndexType::Unique);
    assert_eq!(indexes[0].column_names, vec!["name".to_string()]);
    assert_eq!(indexes[1].name, "flavor_size");
    assert_eq!(indexes[1].kind, IndexType::Hash);
    assert_eq!(indexes[1].column_names, vec!["flavor".to_string(), "size".to_string()]);
}

#[test]
fn test_field_keys_follow_declaration_order() {
    assert_eq!(IceCream::ID.index(), 0);
    assert_eq!(IceCream::NAME.index(), 1);
    assert_eq!(IceCream::TAGS.index(), 5);
    assert_eq!(IceCream::NOTE.index(), 6);
}

#[test]
fn test_db_enum_descriptor() {
    let descriptor = Flavor::descriptor();
    assert_eq!(descriptor.name, "Flavor");
    assert_eq!(descriptor.default_encoding, None);
    assert_eq!(descriptor.members[1].name, "Chocolate");
    assert_eq!(descriptor.members[1].id, Some(20));
    assert_eq!(Flavor::Chocolate.ordinal(), 1);
    assert_eq!(Flavor::from_ordinal(0), Some(Flavor::Vanilla));
    assert_eq!(Flavor::from_ordinal(2), None);
    assert_eq!(Size::descriptor().default_encoding, Some(EnumType::Ordinal));
}

#[derive(Debug, Default, Entity)]
#[table(name = "BASE")]
pub struct Audit {
    #[column]
    pub created_by: String,
    #[column]
    pub revision: i32,
}

#[derive(Debug, Default, Entity)]
#[table(name = "DOCUMENT", primary_key = "id", inherit_columns)]
pub struct Document {
    #[column]
    pub id: i64,
    #[column]
    pub title: String,
    #[parent]
    pub audit: Audit,
}

#[test]
fn test_parent_fields_are_inherited() {
    let def = TableDefinition::<Document>::build().unwrap();
    let columns: Vec<&str> = def.fields().iter().map(|f| f.column_name.as_str()).collect();
    assert_eq!(columns, vec!["id", "title", "created_by", "revision"]);
    assert_eq!(Document::inherited(Audit::REVISION).index(), 3);
}

#[test]
fn test_derived_model_in_query() {
    let registry = MappingRegistry::new();
    let doc = Alias::<Document>::of(&registry).unwrap();
    let statement = Query::from(&doc)
        .where_(doc.field(Document::inherited(Audit::CREATED_BY)))
        .unwrap()
        .is("ann")
        .unwrap()
        .to_select(Dialect::Ansi);
    assert!(statement.sql.ends_with("WHERE created_by = ?"), "{}", statement.sql);
}

#[derive(Debug, Default, Entity)]
pub struct Reflective {
    pub id: i32,
    pub label: String,
    hidden: i32,
}

#[test]
fn test_reflective_mapping_uses_public_fields() {
    let def = TableDefinition::<Reflective>::build().unwrap();
    let columns: Vec<&str> = def.fields().iter().map(|f| f.column_name.as_str()).collect();
    assert_eq!(columns, vec!["id", "label"]);
    assert_eq!(def.table_name, "Reflective");
    let _ = Reflective::default().hidden;
}
