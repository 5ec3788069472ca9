use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Nested tensor contents produced by [`super::TensorView`].
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    Float(f64),
    Int(i64),
    UInt(u64),
    List(Vec<TensorValue>),
    /// Marks where decoding stopped because the element limit was reached.
    Ellipsis,
}

impl TensorValue {
    pub fn as_list(&self) -> Option<&[TensorValue]> {
        match self {
            TensorValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TensorValue::Float(value) => Some(*value),
            TensorValue::Int(value) => Some(*value as f64),
            TensorValue::UInt(value) => Some(*value as f64),
            TensorValue::List(_) | TensorValue::Ellipsis => None,
        }
    }

    pub fn is_ellipsis(&self) -> bool {
        matches!(self, TensorValue::Ellipsis)
    }
}

impl Serialize for TensorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TensorValue::Float(value) => serializer.serialize_f64(*value),
            TensorValue::Int(value) => serializer.serialize_i64(*value),
            TensorValue::UInt(value) => serializer.serialize_u64(*value),
            TensorValue::Ellipsis => serializer.serialize_str("..."),
            TensorValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
