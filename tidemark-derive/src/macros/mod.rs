//! Macro implementations

pub mod db_enum;
pub mod entity;

pub use db_enum::derive_db_enum;
pub use entity::derive_entity;
