use serde::Serialize;

use crate::error::{FormatError, Result};
use crate::tensor::DType;

use super::records::{NodeRecord, OperatorTag};

/// Numeric storage width recorded per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Unspecified,
    Float,
    Double,
    Half,
}

impl Precision {
    pub fn parse(text: &str) -> Result<Self> {
        match text {
            "" => Ok(Precision::Unspecified),
            "float" => Ok(Precision::Float),
            "double" => Ok(Precision::Double),
            "half" => Ok(Precision::Half),
            other => Err(FormatError::unsupported(format!(
                "Invalid precision format '{}'.",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Unspecified => "",
            Precision::Float => "float",
            Precision::Double => "double",
            Precision::Half => "half",
        }
    }

    /// Element dtype; unspecified precision means single precision.
    pub fn dtype(self) -> DType {
        match self {
            Precision::Unspecified | Precision::Float => DType::Float32,
            Precision::Double => DType::Float64,
            Precision::Half => DType::Float16,
        }
    }
}

/// Attribute value exposed by a node record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    Shape(Vec<u32>),
    UIntList(Vec<u32>),
    BoolList(Vec<bool>),
}

/// A fully assembled node: its record from the node list plus its inputs
/// from the relation section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawNode {
    pub tag: OperatorTag,
    pub name: String,
    pub precision: Precision,
    pub record: NodeRecord,
    pub inputs: Vec<String>,
}

impl RawNode {
    pub fn operator(&self) -> &'static str {
        self.tag.as_str()
    }

    /// Each node produces exactly one value, named after the node.
    pub fn outputs(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        self.record.attributes()
    }
}

/// Node state between the node-list pass and the relation pass.
#[derive(Debug)]
pub(crate) struct NodeBuilder {
    tag: OperatorTag,
    name: String,
    precision: Precision,
    record: NodeRecord,
    inputs: Option<Vec<String>>,
}

impl NodeBuilder {
    pub(crate) fn new(
        tag: OperatorTag,
        name: String,
        precision: Precision,
        record: NodeRecord,
    ) -> Self {
        Self {
            tag,
            name,
            precision,
            record,
            inputs: None,
        }
    }

    pub(crate) fn tag(&self) -> OperatorTag {
        self.tag
    }

    pub(crate) fn record(&self) -> &NodeRecord {
        &self.record
    }

    pub(crate) fn set_inputs(&mut self, inputs: Vec<String>) -> Result<()> {
        if self.inputs.is_some() {
            return Err(FormatError::structural(format!(
                "Node '{}' appears twice in relation section.",
                self.name
            )));
        }
        self.inputs = Some(inputs);
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<RawNode> {
        let inputs = self.inputs.ok_or_else(|| {
            FormatError::structural(format!(
                "Node '{}' is missing from relation section.",
                self.name
            ))
        })?;
        Ok(RawNode {
            tag: self.tag,
            name: self.name,
            precision: self.precision,
            record: self.record,
            inputs,
        })
    }
}
