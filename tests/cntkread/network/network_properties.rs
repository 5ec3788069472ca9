use anyhow::Result;
use cntkread::network::TensorShape;
use cntkread::{ComputationNetwork, DType, ErrorKind, Reader, TensorValue, TensorView, U48};

use crate::common::{convolution_record, NetworkBuilder, Stream};

#[test]
fn declared_node_count_must_match_node_list() {
    let too_many = NetworkBuilder::new(26)
        .plain("Exp", "a", &[])
        .declare(2)
        .build();
    let err = ComputationNetwork::parse(&too_many).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    assert_eq!(err.message(), "Network declares 2 nodes but node list has 1.");

    let too_few = NetworkBuilder::new(26)
        .plain("Exp", "a", &[])
        .plain("Log", "b", &[])
        .declare(1)
        .build();
    let err = ComputationNetwork::parse(&too_few).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    assert_eq!(err.message(), "Invalid 'ENodeList' signature.");
}

#[test]
fn declared_node_count_must_match_relations() {
    let bytes = NetworkBuilder::new(26)
        .node("float", "Exp", "a", Stream::new())
        .node("float", "Log", "b", Stream::new())
        .relation("a", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    assert_eq!(
        err.message(),
        "Relation references unknown node 'ERelation'."
    );

    let bytes = NetworkBuilder::new(26)
        .plain("Exp", "a", &[])
        .relation("a", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
}

#[test]
fn shape_decoding() -> Result<()> {
    let bytes = Stream::new().shape(&[2, 3, 4]).into_bytes();
    let shape = TensorShape::read(&mut Reader::new(&bytes))?;
    assert_eq!(shape.dims(), &[2, 3, 4]);

    let bytes = Stream::new().u32(2).u32(0).u32(5).u32(7).into_bytes();
    let mut reader = Reader::new(&bytes);
    let shape = TensorShape::read_legacy(&mut reader)?;
    assert_eq!(shape.dims(), &[7, 2, 5]);
    assert_eq!(reader.remaining(), 0);

    let bytes = Stream::new().u32(0).into_bytes();
    assert!(TensorShape::read(&mut Reader::new(&bytes))?.is_empty());
    Ok(())
}

#[test]
fn u48_range() -> Result<()> {
    let bytes = Stream::new().u48_words(100, 0).into_bytes();
    assert_eq!(Reader::new(&bytes).u48()?.get(), 100);

    let err = U48::from_words(1, 65537).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RangeViolation);
    let bytes = Stream::new().u48_words(1, 65537).into_bytes();
    assert_eq!(
        Reader::new(&bytes).u48().unwrap_err().kind(),
        ErrorKind::RangeViolation
    );
    assert_eq!(U48::from_words(0, 0xffff)?.get(), 0xffff_0000_0000);
    Ok(())
}

#[test]
fn truncation_stops_the_cursor() -> Result<()> {
    let bytes: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0, 5.0]
        .iter()
        .flat_map(|value| value.to_le_bytes())
        .collect();
    let view = TensorView::new(DType::Float32, vec![5], Some(&bytes));
    let decoded = view.materialize(2).map_err(anyhow::Error::new)?;
    assert_eq!(
        decoded.value,
        TensorValue::List(vec![
            TensorValue::Float(1.0),
            TensorValue::Float(2.0),
            TensorValue::Ellipsis,
        ])
    );
    assert_eq!(decoded.bytes_read, 2 * 4);
    assert_eq!(serde_json::to_value(&decoded.value)?, serde_json::json!([1.0, 2.0, "..."]));
    Ok(())
}

#[test]
fn half_precision_reference_values() -> Result<()> {
    let bytes: Vec<u8> = [0x3c00u16, 0x0000, 0x7c00, 0x7e00]
        .iter()
        .flat_map(|bits| bits.to_le_bytes())
        .collect();
    let value = TensorView::new(DType::Float16, vec![4], Some(&bytes))
        .value()
        .map_err(anyhow::Error::new)?;
    let items = value.as_list().expect("list");
    assert_eq!(items[0].as_f64(), Some(1.0));
    assert_eq!(items[1].as_f64(), Some(0.0));
    assert_eq!(items[2].as_f64(), Some(f64::INFINITY));
    assert!(items[3].as_f64().is_some_and(f64::is_nan));
    Ok(())
}

#[test]
fn unknown_operator_names_the_tag() {
    let bytes = NetworkBuilder::new(26)
        .plain("FooBarOp", "x", &[])
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
    assert_eq!(err.message(), "Unknown operator 'FooBarOp'.");
    assert!(err.to_string().contains("FooBarOp"));
}

#[test]
fn convolution_2d_swaps_leading_inputs() -> Result<()> {
    let bytes = NetworkBuilder::new(26)
        .plain("Exp", "A", &[])
        .plain("Exp", "B", &[])
        .plain("Exp", "C", &[])
        .node("float", "Convolution", "conv", convolution_record(26, true))
        .relation("conv", &["A", "B", "C"])
        .node("float", "Convolution", "single", convolution_record(26, true))
        .relation("single", &["A"])
        .node("float", "Convolution", "nd", convolution_record(26, false))
        .relation("nd", &["A", "B"])
        .build();
    let network = ComputationNetwork::parse(&bytes)?;
    let inputs = |name: &str| network.node(name).map(|node| node.inputs.clone());
    assert_eq!(inputs("conv"), Some(vec!["B".into(), "A".into(), "C".into()]));
    assert_eq!(inputs("single"), Some(vec!["A".into()]));
    assert_eq!(inputs("nd"), Some(vec!["A".into(), "B".into()]));
    Ok(())
}
