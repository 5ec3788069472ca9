use anyhow::Result;
use cntkread::{ComputationNetwork, ErrorKind, RootRole};

use crate::common::NetworkBuilder;

fn with_roots(sections: &[(&str, &[&str])]) -> NetworkBuilder {
    sections.iter().fold(
        NetworkBuilder::new(26)
            .plain("Exp", "a", &[])
            .plain("Log", "b", &[]),
        |builder, (section, names)| builder.roots(section, names),
    )
}

#[test]
fn every_section_is_optional() -> Result<()> {
    let network = ComputationNetwork::parse(&with_roots(&[]).build())?;
    for role in RootRole::ALL {
        assert!(network.roots(role).is_empty());
    }
    Ok(())
}

#[test]
fn sections_map_to_roles() -> Result<()> {
    let bytes = with_roots(&[
        ("FeatureNodes", &["a"]),
        ("LabelNodes", &["b"]),
        ("CriterionNodes", &["b"]),
        ("NodesReqMultiSeqHandling", &["a", "b"]),
        ("EvalNodes", &["a"]),
        ("OutputNodes", &["a", "b"]),
        ("PairNodes", &["b"]),
    ])
    .build();
    let network = ComputationNetwork::parse(&bytes)?;
    assert_eq!(network.roots(RootRole::Feature), &["a".to_string()]);
    assert_eq!(network.roots(RootRole::Label), &["b".to_string()]);
    assert_eq!(network.roots(RootRole::Criterion), &["b".to_string()]);
    assert_eq!(network.roots(RootRole::Eval), &["a".to_string()]);
    assert_eq!(
        network.roots(RootRole::Output),
        &["a".to_string(), "b".to_string()]
    );
    assert_eq!(network.roots(RootRole::Pair), &["b".to_string()]);
    Ok(())
}

#[test]
fn criterion_falls_back_to_legacy_section() -> Result<()> {
    let bytes = with_roots(&[("CriteriaNodes", &["b"]), ("OutputNodes", &["a"])]).build();
    let network = ComputationNetwork::parse(&bytes)?;
    assert_eq!(network.roots(RootRole::Criterion), &["b".to_string()]);
    assert_eq!(network.roots(RootRole::Output), &["a".to_string()]);
    Ok(())
}

#[test]
fn empty_criterion_section_also_falls_back() -> Result<()> {
    let bytes = with_roots(&[("CriterionNodes", &[]), ("CriteriaNodes", &["a"])]).build();
    let network = ComputationNetwork::parse(&bytes)?;
    assert_eq!(network.roots(RootRole::Criterion), &["a".to_string()]);
    Ok(())
}

#[test]
fn root_bracket_is_mandatory() {
    let bytes = with_roots(&[("OutputNodes", &["a"])])
        .without_root_bracket()
        .build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    assert_eq!(err.message(), "Invalid 'BRootNodes' signature.");
}

#[test]
fn out_of_order_section_is_rejected() {
    let bytes = with_roots(&[("OutputNodes", &["a"]), ("FeatureNodes", &["b"])]).build();
    let err = ComputationNetwork::parse(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
    assert_eq!(err.message(), "Invalid 'ERootNodes' signature.");
}
