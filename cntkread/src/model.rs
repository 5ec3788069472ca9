//! Viewer-facing projection of a parsed network.
//!
//! `InputValue` nodes become graph inputs, `LearnableParameter` nodes become
//! initializers feeding the nodes that consume them, and every other node is
//! kept as an operator node. Graph outputs come from the output root list.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, Range};
use std::sync::Arc;

use memmap2::Mmap;
use rayon::prelude::*;
use serde::Serialize;

use crate::metadata::{ArgumentOption, ArgumentSchema, OperatorMetadata};
use crate::network::records::LearnableParameterRecord;
use crate::network::{AttrValue, ComputationNetwork, NodeRecord, Precision, RawNode, RootRole};
use crate::tensor::{DType, Materialized, TensorState, TensorValue, TensorView};
use crate::warning;

/// Bytes a network was parsed from.
#[derive(Debug)]
pub enum ModelBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for ModelBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            ModelBytes::Mapped(mmap) => &mmap[..],
            ModelBytes::Owned(bytes) => bytes.as_slice(),
        }
    }
}

/// A byte range of the shared model buffer.
#[derive(Debug, Clone)]
struct PayloadSlice {
    bytes: Arc<ModelBytes>,
    range: Range<usize>,
}

impl PayloadSlice {
    fn as_bytes(&self) -> Option<&[u8]> {
        self.bytes.get(self.range.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TensorType {
    pub dtype: DType,
    pub shape: Vec<usize>,
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.is_empty() {
            return write!(f, "{}", self.dtype);
        }
        let dims: Vec<String> = self.shape.iter().map(|dim| dim.to_string()).collect();
        write!(f, "{}[{}]", self.dtype, dims.join(","))
    }
}

/// Initializer tensor backed by the model buffer.
#[derive(Debug, Clone, Serialize)]
pub struct Tensor {
    name: String,
    #[serde(rename = "type")]
    tensor_type: TensorType,
    #[serde(skip)]
    payload: Option<PayloadSlice>,
}

impl Tensor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tensor_type(&self) -> &TensorType {
        &self.tensor_type
    }

    pub fn view(&self) -> TensorView<'_> {
        TensorView::new(
            self.tensor_type.dtype,
            self.tensor_type.shape.clone(),
            self.payload.as_ref().and_then(PayloadSlice::as_bytes),
        )
    }

    pub fn state(&self) -> Option<TensorState> {
        self.view().state()
    }

    pub fn materialize(&self, limit: usize) -> Result<Materialized, TensorState> {
        self.view().materialize(limit)
    }

    pub fn value(&self) -> Result<TensorValue, TensorState> {
        self.view().value()
    }

    pub fn to_display_string(&self, limit: usize) -> String {
        self.view().to_display_string(limit)
    }
}

/// One value flowing along an edge.
#[derive(Debug, Clone, Serialize)]
pub struct Connection {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tensor_type: Option<TensorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<Tensor>,
}

impl Connection {
    fn named(id: &str) -> Self {
        Self {
            id: id.to_string(),
            tensor_type: None,
            initializer: None,
        }
    }
}

/// A named group of connections.
#[derive(Debug, Clone, Serialize)]
pub struct Argument {
    pub name: String,
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub operator: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<Argument>,
    pub outputs: Vec<Argument>,
}

impl Node {
    fn new(
        raw: &RawNode,
        connections: &HashMap<String, Connection>,
        metadata: &OperatorMetadata,
    ) -> Self {
        let operator = raw.operator();
        let attributes = raw
            .attributes()
            .into_iter()
            .map(|(name, value)| Attribute {
                visible: metadata.is_attribute_visible(operator, name, &value),
                name: name.to_string(),
                value,
            })
            .collect();
        let connect = |id: &String| {
            connections
                .get(id)
                .cloned()
                .unwrap_or_else(|| Connection::named(id))
        };

        let schema = metadata.schema(operator);
        let inputs = bind_arguments(
            schema.and_then(|schema| schema.inputs.as_deref()),
            raw.inputs.iter().map(connect).collect(),
        );
        let outputs = bind_arguments(
            schema.and_then(|schema| schema.outputs.as_deref()),
            raw.outputs().iter().map(|id| Connection::named(id)).collect(),
        );

        Self {
            operator: operator.to_string(),
            name: raw.name.clone(),
            category: metadata.category(operator).map(str::to_string),
            attributes,
            inputs,
            outputs,
        }
    }
}

/// Group connections under schema argument names; extras are named by
/// position, e.g. `(2)`.
fn bind_arguments(
    params: Option<&[ArgumentSchema]>,
    connections: Vec<Connection>,
) -> Vec<Argument> {
    let mut arguments = Vec::new();
    let mut index = 0;
    for param in params.unwrap_or_default() {
        if index >= connections.len() && param.option == Some(ArgumentOption::Optional) {
            continue;
        }
        let count = match param.option {
            Some(ArgumentOption::Variadic) => connections.len().saturating_sub(index),
            _ => 1,
        };
        let start = index.min(connections.len());
        let end = (index + count).min(connections.len());
        arguments.push(Argument {
            name: param.name.clone(),
            connections: connections[start..end].to_vec(),
        });
        index += count;
    }
    for (position, connection) in connections.iter().enumerate().skip(index) {
        arguments.push(Argument {
            name: format!("({})", position),
            connections: vec![connection.clone()],
        });
    }
    arguments
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    pub inputs: Vec<Argument>,
    pub outputs: Vec<Argument>,
    pub nodes: Vec<Node>,
    pub initializers: Vec<Tensor>,
}

impl Graph {
    fn new(
        network: &ComputationNetwork,
        bytes: &Arc<ModelBytes>,
        metadata: &OperatorMetadata,
    ) -> Self {
        let mut graph = Graph::default();
        let mut connections = HashMap::new();
        for raw in network.nodes() {
            match &raw.record {
                NodeRecord::InputValue(record) => {
                    let tensor_type = TensorType {
                        dtype: raw.precision.dtype(),
                        shape: record.sample_layout.to_usize(),
                    };
                    graph.inputs.push(Argument {
                        name: raw.name.clone(),
                        connections: vec![Connection {
                            id: raw.name.clone(),
                            tensor_type: Some(tensor_type),
                            initializer: None,
                        }],
                    });
                }
                NodeRecord::LearnableParameter(record) => {
                    let tensor = initializer(raw, record, bytes);
                    if let Some(state) = tensor.state() {
                        warning!("model: initializer '{}': {}", raw.name, state);
                    }
                    connections.insert(
                        raw.name.clone(),
                        Connection {
                            id: raw.name.clone(),
                            tensor_type: Some(tensor.tensor_type.clone()),
                            initializer: Some(tensor.clone()),
                        },
                    );
                    graph.initializers.push(tensor);
                }
                _ => {}
            }
        }
        for raw in network.nodes() {
            if !matches!(
                raw.record,
                NodeRecord::InputValue(_) | NodeRecord::LearnableParameter(_)
            ) {
                graph.nodes.push(Node::new(raw, &connections, metadata));
            }
        }
        for name in network.roots(RootRole::Output) {
            graph.outputs.push(Argument {
                name: name.clone(),
                connections: vec![Connection::named(name)],
            });
        }
        graph
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn initializer(&self, name: &str) -> Option<&Tensor> {
        self.initializers.iter().find(|tensor| tensor.name == name)
    }
}

/// Dtype from the node precision, falling back to the matrix element width
/// for files that predate per-node precision.
fn initializer_dtype(precision: Precision, record: &LearnableParameterRecord) -> DType {
    match precision {
        Precision::Unspecified => {
            DType::from_float_width(record.value.element_size).unwrap_or(DType::Unknown)
        }
        other => other.dtype(),
    }
}

fn initializer(
    raw: &RawNode,
    record: &LearnableParameterRecord,
    bytes: &Arc<ModelBytes>,
) -> Tensor {
    let shape = if record.sample_layout.is_empty() {
        vec![record.value.rows as usize, record.value.columns as usize]
    } else {
        record.sample_layout.to_usize()
    };
    let payload = (!record.value.data.is_empty()).then(|| PayloadSlice {
        bytes: Arc::clone(bytes),
        range: record.value.data.clone(),
    });
    Tensor {
        name: raw.name.clone(),
        tensor_type: TensorType {
            dtype: initializer_dtype(raw.precision, record),
            shape,
        },
        payload,
    }
}

/// A loaded CNTK v1 model.
#[derive(Debug, Clone)]
pub struct Model {
    network: ComputationNetwork,
    graph: Graph,
}

impl Model {
    pub fn new(network: ComputationNetwork, bytes: Arc<ModelBytes>) -> Self {
        Self::with_metadata(network, bytes, OperatorMetadata::global())
    }

    pub fn with_metadata(
        network: ComputationNetwork,
        bytes: Arc<ModelBytes>,
        metadata: &OperatorMetadata,
    ) -> Self {
        let graph = Graph::new(&network, &bytes, metadata);
        Self { network, graph }
    }

    /// Format label, e.g. `CNTK v1.19`.
    pub fn format(&self) -> String {
        format!("CNTK v1.{}", self.network.version())
    }

    pub fn network(&self) -> &ComputationNetwork {
        &self.network
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Decode every initializer in parallel, in initializer order.
    pub fn materialize_initializers(
        &self,
        limit: usize,
    ) -> Vec<(String, Result<Materialized, TensorState>)> {
        self.graph
            .initializers
            .par_iter()
            .map(|tensor| (tensor.name.clone(), tensor.materialize(limit)))
            .collect()
    }
}
