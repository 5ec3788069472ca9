use anyhow::Result;
use cntkread::network::{NodeRecord, OperatorTag, Precision};
use cntkread::{ComputationNetwork, ErrorKind, RootRole};

use crate::common::{linear_network, NetworkBuilder, Stream};

#[test]
fn parses_linear_network() -> Result<()> {
    let network = ComputationNetwork::parse(&linear_network(26))?;
    assert_eq!(network.version(), 26);
    assert_eq!(network.len(), 5);
    let names: Vec<&str> = network.nodes().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["features", "W", "b", "times", "plus"]);

    let times = network.node("times").expect("times node");
    assert_eq!(times.tag, OperatorTag::Times);
    assert_eq!(times.precision, Precision::Float);
    assert_eq!(times.inputs, vec!["W".to_string(), "features".to_string()]);
    assert_eq!(times.outputs(), vec!["times".to_string()]);
    match &times.record {
        NodeRecord::Times(record) => {
            assert_eq!(record.output_rank, 1);
            assert_eq!(record.infer_input_rank_to_map, -1);
        }
        other => panic!("unexpected record {:?}", other),
    }

    let weights = network.node("W").expect("W node");
    match &weights.record {
        NodeRecord::LearnableParameter(record) => {
            assert_eq!(record.sample_layout.dims(), &[2, 3]);
            assert_eq!(record.value.rows, 2);
            assert_eq!(record.value.columns, 3);
            assert_eq!(record.value.byte_len(), 24);
        }
        other => panic!("unexpected record {:?}", other),
    }

    assert_eq!(network.roots(RootRole::Feature), &["features".to_string()]);
    assert_eq!(network.roots(RootRole::Output), &["plus".to_string()]);
    assert!(network.roots(RootRole::Pair).is_empty());
    Ok(())
}

#[test]
fn precision_is_absent_before_version_7() -> Result<()> {
    let bytes = NetworkBuilder::new(6)
        .plain("Exp", "e", &[])
        .build();
    let network = ComputationNetwork::parse(&bytes)?;
    assert_eq!(network.node("e").map(|node| node.precision), Some(Precision::Unspecified));
    Ok(())
}

#[test]
fn rejects_invalid_precision() {
    let bytes = NetworkBuilder::new(26)
        .node("int8", "Exp", "e", Stream::new())
        .relation("e", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
    assert_eq!(err.message(), "Invalid precision format 'int8'.");
}

#[test]
fn rejects_duplicate_nodes() {
    let bytes = NetworkBuilder::new(26)
        .plain("Exp", "x", &[])
        .plain("Log", "x", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    assert_eq!(err.message(), "Duplicate node 'x'.");
}

#[test]
fn rejects_relation_to_unknown_node() {
    let bytes = NetworkBuilder::new(26)
        .node("float", "Exp", "e", Stream::new())
        .relation("missing", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    assert!(err.message().contains("missing"));
}

#[test]
fn rejects_repeated_relation_entry() {
    let bytes = NetworkBuilder::new(26)
        .plain("Exp", "a", &[])
        .node("float", "Exp", "b", Stream::new())
        .relation("a", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
}

#[test]
fn node_may_share_a_section_marker_name() -> Result<()> {
    let bytes = NetworkBuilder::new(26)
        .plain("Exp", "a", &[])
        .plain("Log", "ERelation", &["a"])
        .build();
    let network = ComputationNetwork::parse(&bytes)?;
    assert_eq!(network.len(), 2);
    let log = network.node("ERelation").expect("ERelation node");
    assert_eq!(log.tag, OperatorTag::Log);
    assert_eq!(log.inputs, vec!["a".to_string()]);
    Ok(())
}

#[test]
fn rejects_bad_signature_and_truncation() {
    let err = ComputationNetwork::parse(b"PK\x03\x04").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    assert_eq!(err.message(), "Invalid 'BCN' signature.");

    let mut bytes = linear_network(26);
    bytes.truncate(bytes.len() / 2);
    assert!(ComputationNetwork::parse(&bytes).is_err());
}

#[test]
fn rejects_sparse_matrix() {
    let record = Stream::new().f32(1.0).shape(&[1]).byte(b's');
    let bytes = NetworkBuilder::new(26)
        .node("float", "LearnableParameter", "p", record)
        .relation("p", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
    assert_eq!(err.message(), "Matrix sparse type not implemented.");
}

#[test]
fn learnable_parameter_needs_version_3() {
    let bytes = NetworkBuilder::new(2)
        .node("", "LearnableParameter", "p", Stream::new())
        .relation("p", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VersionGap);
}

#[test]
fn network_serializes_to_json() -> Result<()> {
    let network = ComputationNetwork::parse(&linear_network(26))?;
    let json = serde_json::to_value(&network)?;
    assert_eq!(json["version"], 26);
    assert_eq!(json["nodes"]["plus"]["inputs"], serde_json::json!(["times", "b"]));
    Ok(())
}
