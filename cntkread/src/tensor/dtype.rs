use serde::{Deserialize, Serialize};

/// Element type tag of a tensor payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float16,
    Float32,
    Float64,
    Int8,
    UInt8,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Bool,
    String,
    Unknown,
}

impl DType {
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "float16" | "half" => DType::Float16,
            "float32" | "float" => DType::Float32,
            "float64" | "double" => DType::Float64,
            "int8" => DType::Int8,
            "uint8" => DType::UInt8,
            "int32" => DType::Int32,
            "uint32" => DType::UInt32,
            "int64" => DType::Int64,
            "uint64" => DType::UInt64,
            "bool" | "boolean" => DType::Bool,
            "string" => DType::String,
            _ => DType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DType::Float16 => "float16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Int8 => "int8",
            DType::UInt8 => "uint8",
            DType::Int32 => "int32",
            DType::UInt32 => "uint32",
            DType::Int64 => "int64",
            DType::UInt64 => "uint64",
            DType::Bool => "bool",
            DType::String => "string",
            DType::Unknown => "?",
        }
    }

    /// Fixed element width in bytes, or `None` when no scalar decode exists.
    pub fn width(self) -> Option<usize> {
        match self {
            DType::Int8 | DType::UInt8 => Some(1),
            DType::Float16 => Some(2),
            DType::Float32 | DType::Int32 | DType::UInt32 => Some(4),
            DType::Float64 | DType::Int64 | DType::UInt64 => Some(8),
            DType::Bool | DType::String | DType::Unknown => None,
        }
    }

    /// Dtype matching a dense matrix element size.
    pub fn from_float_width(width: u64) -> Option<Self> {
        match width {
            2 => Some(DType::Float16),
            4 => Some(DType::Float32),
            8 => Some(DType::Float64),
            _ => None,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
