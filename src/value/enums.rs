//! Enum encoding strategies.
//!
//! An enum field is stored by member name, by ordinal position, or by an
//! explicit identifier supplied by the enum type. The encoding is chosen per
//! field: the enum type may declare a default, a field may override it.

use sea_query::Value;

use super::types::is_null;
use crate::error::{Result, TideError};

/// How an enum member is written to its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumType {
    /// Member name, stored as VARCHAR
    #[default]
    Name,
    /// Zero-based declaration position, stored as INT
    Ordinal,
    /// Identifier supplied by the enum type, stored as INT
    EnumId,
}

/// One member of an enum as seen by the mapping layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumMember {
    pub name: &'static str,
    pub id: Option<i32>,
}

/// Static description of an enum type.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: &'static str,
    /// Type-level encoding, applied to every field of this enum type unless overridden
    pub default_encoding: Option<EnumType>,
    /// Members in declaration order
    pub members: &'static [EnumMember],
}

impl EnumDescriptor {
    /// Position of the member with the given name.
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

/// Implemented by enums that can be stored in a column.
///
/// Usually generated by `#[derive(DbEnum)]`.
pub trait DbEnum: Sized + 'static {
    fn descriptor() -> &'static EnumDescriptor;

    fn ordinal(&self) -> usize;

    fn from_ordinal(ordinal: usize) -> Option<Self>;
}

/// A type-erased enum member: the descriptor plus the member position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    descriptor: &'static EnumDescriptor,
    ordinal: usize,
}

impl EnumValue {
    /// The member at `ordinal`, or `None` when the descriptor has no such member.
    pub fn new(descriptor: &'static EnumDescriptor, ordinal: usize) -> Option<Self> {
        (ordinal < descriptor.members.len()).then_some(Self { descriptor, ordinal })
    }

    pub fn of<E: DbEnum>(member: &E) -> Result<Self> {
        let ordinal = member.ordinal();
        Self::new(E::descriptor(), ordinal).ok_or_else(|| TideError::UnknownEnumValue {
            enum_name: E::descriptor().name.to_string(),
            value: ordinal.to_string(),
        })
    }

    pub fn descriptor(&self) -> &'static EnumDescriptor {
        self.descriptor
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &'static str {
        self.member().name
    }

    fn member(&self) -> &'static EnumMember {
        &self.descriptor.members[self.ordinal]
    }

    /// Convert back into the concrete enum type.
    pub fn into_enum<E: DbEnum>(self) -> Result<E> {
        E::from_ordinal(self.ordinal).ok_or_else(|| TideError::UnknownEnumValue {
            enum_name: E::descriptor().name.to_string(),
            value: self.ordinal.to_string(),
        })
    }

    /// Encode the member for storage.
    ///
    /// `max_length` truncates name encoding when `trim` is set.
    pub fn encode(&self, encoding: EnumType, trim: bool, max_length: usize, field: &str) -> Result<Value> {
        match encoding {
            EnumType::Name => {
                let name = self.name();
                if trim && max_length > 0 && name.chars().count() > max_length {
                    Ok(Value::String(Some(name.chars().take(max_length).collect())))
                } else {
                    Ok(Value::String(Some(name.to_string())))
                }
            }
            EnumType::Ordinal => Ok(Value::Int(Some(self.ordinal as i32))),
            EnumType::EnumId => match self.member().id {
                Some(id) => Ok(Value::Int(Some(id))),
                None => Err(TideError::MissingEnumId {
                    field: field.to_string(),
                    enum_name: self.descriptor.name.to_string(),
                    member: self.name().to_string(),
                }),
            },
        }
    }

    /// Decode a stored value back into a member.
    ///
    /// Returns `Ok(None)` for NULL. Name decoding also accepts a name that
    /// differs only in ASCII case, or a truncated name, when exactly one
    /// member matches it.
    pub fn decode(descriptor: &'static EnumDescriptor, encoding: EnumType, raw: &Value) -> Result<Option<Self>> {
        if is_null(raw) {
            return Ok(None);
        }
        let unknown = || TideError::UnknownEnumValue {
            enum_name: descriptor.name.to_string(),
            value: format!("{raw:?}"),
        };
        let ordinal = match encoding {
            EnumType::Name => {
                let text = match raw {
                    Value::String(Some(s)) => s.as_str(),
                    _ => return Err(unknown()),
                };
                let folded: Vec<usize> = descriptor
                    .members
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.name.eq_ignore_ascii_case(text))
                    .map(|(ordinal, _)| ordinal)
                    .collect();
                match descriptor.ordinal_of(text) {
                    Some(ordinal) => ordinal,
                    None if folded.len() == 1 => folded[0],
                    None => {
                        let mut candidates = descriptor
                            .members
                            .iter()
                            .enumerate()
                            .filter(|(_, m)| !text.is_empty() && m.name.starts_with(text));
                        match (candidates.next(), candidates.next()) {
                            (Some((ordinal, _)), None) => ordinal,
                            _ => return Err(unknown()),
                        }
                    }
                }
            }
            EnumType::Ordinal => {
                let ordinal = super::conversion::as_i64(raw).ok_or_else(unknown)?;
                if ordinal < 0 || ordinal as usize >= descriptor.members.len() {
                    return Err(unknown());
                }
                ordinal as usize
            }
            EnumType::EnumId => {
                let id = super::conversion::as_i64(raw).ok_or_else(unknown)?;
                descriptor
                    .members
                    .iter()
                    .position(|m| m.id.map(i64::from) == Some(id))
                    .ok_or_else(unknown)?
            }
        };
        Self::new(descriptor, ordinal).map(Some).ok_or_else(unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TREE: EnumDescriptor = EnumDescriptor {
        name: "Tree",
        default_encoding: None,
        members: &[
            EnumMember { name: "PINE", id: Some(10) },
            EnumMember { name: "OAK", id: Some(20) },
            EnumMember { name: "BIRCH", id: Some(30) },
            EnumMember { name: "WALNUT", id: None },
        ],
    };

    #[test]
    fn test_encode_name_truncates_when_trimmed() {
        let birch = EnumValue::new(&TREE, 2).unwrap();
        assert_eq!(
            birch.encode(EnumType::Name, true, 3, "tree").unwrap(),
            Value::String(Some("BIR".to_string()))
        );
        assert_eq!(
            birch.encode(EnumType::Name, false, 3, "tree").unwrap(),
            Value::String(Some("BIRCH".to_string()))
        );
    }

    #[test]
    fn test_encode_ordinal_and_id() {
        let oak = EnumValue::new(&TREE, 1).unwrap();
        assert_eq!(oak.encode(EnumType::Ordinal, false, 0, "tree").unwrap(), Value::Int(Some(1)));
        assert_eq!(oak.encode(EnumType::EnumId, false, 0, "tree").unwrap(), Value::Int(Some(20)));
    }

    #[test]
    fn test_missing_enum_id_fails() {
        let walnut = EnumValue::new(&TREE, 3).unwrap();
        let err = walnut.encode(EnumType::EnumId, false, 0, "tree").unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::MissingEnumId);
    }

    #[test]
    fn test_decode_truncated_name() {
        let decoded = EnumValue::decode(&TREE, EnumType::Name, &Value::String(Some("BIR".into())))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.name(), "BIRCH");
    }

    #[test]
    fn test_decode_by_id_and_null() {
        let decoded = EnumValue::decode(&TREE, EnumType::EnumId, &Value::BigInt(Some(30)))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.ordinal(), 2);
        assert!(EnumValue::decode(&TREE, EnumType::Ordinal, &Value::Int(None)).unwrap().is_none());
        assert!(EnumValue::decode(&TREE, EnumType::Ordinal, &Value::Int(Some(9))).is_err());
    }

    #[test]
    fn test_new_rejects_out_of_range_ordinal() {
        assert!(EnumValue::new(&TREE, 3).is_some());
        assert!(EnumValue::new(&TREE, 4).is_none());
    }

    #[test]
    fn test_decode_name_ignoring_case() {
        let decoded = EnumValue::decode(&TREE, EnumType::Name, &Value::String(Some("Oak".into())))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.ordinal(), 1);
    }
}
