use crate::{
    serde::{ByteReader, ByteWriter, Serde, SerdeErr},
    types::EntityId,
};

/// A replicated field value. References to other entities travel as ids,
/// never as pointers into a peer's store.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    EntityRef(EntityId),
}

impl Value {
    /// The referenced entity id, if this value is a reference.
    pub fn entity_ref(&self) -> Option<EntityId> {
        match self {
            Value::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::EntityRef(_) => "entity-ref",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<EntityId> for Value {
    fn from(value: EntityId) -> Self {
        Value::EntityRef(value)
    }
}

impl Serde for Value {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Value::Null => 0u8.ser(writer),
            Value::Bool(inner) => {
                1u8.ser(writer);
                inner.ser(writer);
            }
            Value::Int(inner) => {
                2u8.ser(writer);
                inner.ser(writer);
            }
            Value::Float(inner) => {
                3u8.ser(writer);
                inner.ser(writer);
            }
            Value::Str(inner) => {
                4u8.ser(writer);
                inner.ser(writer);
            }
            Value::EntityRef(inner) => {
                5u8.ser(writer);
                inner.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(Value::Null),
            1 => Ok(Value::Bool(bool::de(reader)?)),
            2 => Ok(Value::Int(i64::de(reader)?)),
            3 => Ok(Value::Float(f64::de(reader)?)),
            4 => Ok(Value::Str(String::de(reader)?)),
            5 => Ok(Value::EntityRef(EntityId::de(reader)?)),
            // unknown tags may come from a malicious or newer peer
            _ => Err(SerdeErr),
        }
    }
}
