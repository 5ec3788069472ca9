//! Binary CNTK v1 computation network.
//!
//! The stream is a sequence of bracketed sections:
//! `BCN BVersion <u48> EVersion <u48 count> BNodeList ... ENodeList
//! BRelation ... ERelation BRootNodes ... ERootNodes ECN`.

mod matrix;
mod node;
pub mod records;
mod shape;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{FormatError, Result};
use crate::reader::Reader;
use crate::trace;

pub use matrix::DenseMatrix;
pub use node::{AttrValue, Precision, RawNode};
pub use records::{NodeRecord, OperatorTag};
pub use shape::TensorShape;

use node::NodeBuilder;

/// File signature: the zero-terminated UTF-16 string `BCN`.
pub const SIGNATURE: &[u8; 8] = b"B\0C\0N\0\0\0";

/// Role of a root node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootRole {
    Feature,
    Label,
    Criterion,
    Eval,
    Output,
    Pair,
}

impl RootRole {
    pub const ALL: [RootRole; 6] = [
        RootRole::Feature,
        RootRole::Label,
        RootRole::Criterion,
        RootRole::Eval,
        RootRole::Output,
        RootRole::Pair,
    ];

    fn section(self) -> &'static str {
        match self {
            RootRole::Feature => "FeatureNodes",
            RootRole::Label => "LabelNodes",
            RootRole::Criterion => "CriterionNodes",
            RootRole::Eval => "EvalNodes",
            RootRole::Output => "OutputNodes",
            RootRole::Pair => "PairNodes",
        }
    }
}

/// Parsed network: nodes by name plus the root node lists.
#[derive(Debug, Clone, Serialize)]
pub struct ComputationNetwork {
    version: u64,
    order: Vec<String>,
    nodes: HashMap<String, RawNode>,
    roots: HashMap<RootRole, Vec<String>>,
}

impl ComputationNetwork {
    /// Returns true when `data` starts with the network signature.
    pub fn is_signature(data: &[u8]) -> bool {
        data.starts_with(SIGNATURE)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        reader.assert_tag("BCN")?;
        reader.assert_tag("BVersion")?;
        let version = reader.u48()?.get();
        reader.set_version(version);
        reader.assert_tag("EVersion")?;
        let node_count = reader.u48()?.get();
        trace!("cntk: version {} declares {} nodes", version, node_count);

        reader.assert_tag("BNodeList")?;
        let mut order = Vec::new();
        let mut builders: HashMap<String, NodeBuilder> = HashMap::new();
        for index in 0..node_count {
            if reader.match_tag("ENodeList") {
                return Err(count_mismatch("node list", node_count, index));
            }
            let precision = if reader.version() >= 7 {
                Precision::parse(&reader.string()?)?
            } else {
                Precision::Unspecified
            };
            let tag = OperatorTag::parse(&reader.string()?)?;
            let name = reader.string()?;
            let record = records::decode_record(tag, &mut reader)?;
            if builders.contains_key(&name) {
                return Err(FormatError::structural(format!(
                    "Duplicate node '{}'.",
                    name
                )));
            }
            order.push(name.clone());
            builders.insert(name.clone(), NodeBuilder::new(tag, name, precision, record));
        }
        reader.assert_tag("ENodeList")?;

        reader.assert_tag("BRelation")?;
        for _ in 0..node_count {
            let name = reader.string()?;
            let builder = builders.get_mut(&name).ok_or_else(|| {
                FormatError::structural(format!(
                    "Relation references unknown node '{}'.",
                    name
                ))
            })?;
            let count = reader.u48()?;
            let mut inputs = reader.strings(count)?;
            if version < 19 && builder.tag() == OperatorTag::BatchNormalization {
                return Err(FormatError::version_gap(
                    "BatchNormalization handler not implemented.",
                ));
            }
            if is_legacy_2d_convolution(builder.record()) {
                swap_leading_inputs(&mut inputs);
            }
            builder.set_inputs(inputs)?;
        }
        reader.assert_tag("ERelation")?;

        let roots = read_root_nodes(&mut reader)?;
        reader.assert_tag("ECN")?;

        let mut nodes = HashMap::with_capacity(builders.len());
        for (name, builder) in builders {
            nodes.insert(name, builder.finish()?);
        }
        trace!("cntk: parsed {} nodes, {} bytes", nodes.len(), reader.offset());
        Ok(Self {
            version,
            order,
            nodes,
            roots,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&RawNode> {
        self.nodes.get(name)
    }

    /// Nodes in node-list order.
    pub fn nodes(&self) -> impl Iterator<Item = &RawNode> + '_ {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    /// Root node names for `role`; empty when the section was absent.
    pub fn roots(&self, role: RootRole) -> &[String] {
        self.roots.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn count_mismatch(section: &str, declared: u64, found: u64) -> FormatError {
    FormatError::structural(format!(
        "Network declares {} nodes but {} has {}.",
        declared, section, found
    ))
}

fn is_legacy_2d_convolution(record: &NodeRecord) -> bool {
    matches!(record, NodeRecord::Convolution(conv) if conv.convolution_2d)
}

/// 2-D convolution nodes list their operand before their kernel.
fn swap_leading_inputs(inputs: &mut [String]) {
    if inputs.len() > 1 {
        inputs.swap(0, 1);
    }
}

fn read_root_nodes(reader: &mut Reader<'_>) -> Result<HashMap<RootRole, Vec<String>>> {
    reader.assert_tag("BRootNodes")?;
    let mut roots = HashMap::new();
    for role in [RootRole::Feature, RootRole::Label, RootRole::Criterion] {
        if let Some(names) = read_root_section(reader, role.section())? {
            roots.insert(role, names);
        }
    }
    let has_criterion = roots
        .get(&RootRole::Criterion)
        .is_some_and(|names| !names.is_empty());
    if !has_criterion {
        if let Some(names) = read_root_section(reader, "CriteriaNodes")? {
            roots.insert(RootRole::Criterion, names);
        }
    }
    // Recorded by old writers, unused by any reader.
    read_root_section(reader, "NodesReqMultiSeqHandling")?;
    for role in [RootRole::Eval, RootRole::Output, RootRole::Pair] {
        if let Some(names) = read_root_section(reader, role.section())? {
            roots.insert(role, names);
        }
    }
    reader.assert_tag("ERootNodes")?;
    Ok(roots)
}

fn read_root_section(reader: &mut Reader<'_>, section: &str) -> Result<Option<Vec<String>>> {
    if !reader.match_tag(&format!("B{}", section)) {
        return Ok(None);
    }
    let count = reader.u48()?;
    let names = reader.strings(count)?;
    reader.assert_tag(&format!("E{}", section))?;
    Ok(Some(names))
}
