use anyhow::Result;
use cntkread::{DType, TensorState, TensorValue, TensorView, DISPLAY_LIMIT};

fn le_bytes<const N: usize, T: Copy>(values: &[T], to_bytes: fn(T) -> [u8; N]) -> Vec<u8> {
    values.iter().flat_map(|value| to_bytes(*value)).collect()
}

#[test]
fn decodes_every_fixed_width_dtype() -> Result<()> {
    let cases: Vec<(DType, Vec<u8>, serde_json::Value)> = vec![
        (
            DType::Float32,
            le_bytes(&[1.5f32, -2.0], f32::to_le_bytes),
            serde_json::json!([1.5, -2.0]),
        ),
        (
            DType::Float64,
            le_bytes(&[0.25f64, 8.0], f64::to_le_bytes),
            serde_json::json!([0.25, 8.0]),
        ),
        (DType::Int8, vec![0x80, 0x7f], serde_json::json!([-128, 127])),
        (DType::UInt8, vec![0x80, 0x7f], serde_json::json!([128, 127])),
        (
            DType::Int32,
            le_bytes(&[-5i32, 9], i32::to_le_bytes),
            serde_json::json!([-5, 9]),
        ),
        (
            DType::UInt32,
            le_bytes(&[u32::MAX, 0], u32::to_le_bytes),
            serde_json::json!([4294967295u32, 0]),
        ),
        (
            DType::Int64,
            le_bytes(&[i64::MIN, 1], i64::to_le_bytes),
            serde_json::json!([i64::MIN, 1]),
        ),
        (
            DType::UInt64,
            le_bytes(&[u64::MAX, 2], u64::to_le_bytes),
            serde_json::json!([u64::MAX, 2]),
        ),
    ];
    for (dtype, bytes, expected) in cases {
        let value = TensorView::new(dtype, vec![2], Some(&bytes))
            .value()
            .map_err(anyhow::Error::new)?;
        assert_eq!(serde_json::to_value(&value)?, expected, "dtype {}", dtype);
    }
    Ok(())
}

#[test]
fn nested_shapes_are_row_major() -> Result<()> {
    let bytes = le_bytes(&[0i32, 1, 2, 3, 4, 5], i32::to_le_bytes);
    let view = TensorView::new(DType::Int32, vec![3, 2], Some(&bytes));
    let value = view.value().map_err(anyhow::Error::new)?;
    assert_eq!(serde_json::to_value(&value)?, serde_json::json!([[0, 1], [2, 3], [4, 5]]));
    Ok(())
}

#[test]
fn truncation_marks_each_level_once() -> Result<()> {
    let bytes = le_bytes(&[0i32, 1, 2, 3, 4, 5], i32::to_le_bytes);
    let view = TensorView::new(DType::Int32, vec![3, 2], Some(&bytes));
    let decoded = view.materialize(3).map_err(anyhow::Error::new)?;
    assert!(decoded.truncated);
    assert_eq!(decoded.elements, 3);
    assert_eq!(
        serde_json::to_value(&decoded.value)?,
        serde_json::json!([[0, 1], [2, "..."], "..."])
    );
    Ok(())
}

#[test]
fn placeholder_states() {
    let bytes = [0u8; 8];
    let state = |dtype, shape: Vec<usize>, data: Option<&[u8]>| {
        TensorView::new(dtype, shape, data).state()
    };
    assert_eq!(state(DType::Float32, vec![2], None), Some(TensorState::Empty));
    assert_eq!(state(DType::Float32, vec![2], Some(&[])), Some(TensorState::Empty));
    assert_eq!(
        state(DType::from_name("complex64"), vec![2], Some(&bytes)),
        Some(TensorState::UnknownDataType)
    );
    assert_eq!(
        state(DType::String, vec![2], Some(&bytes)),
        Some(TensorState::NotImplemented(DType::String))
    );
    assert_eq!(
        state(DType::Float32, Vec::new(), Some(&bytes)),
        Some(TensorState::NoDimensions)
    );
    assert_eq!(
        state(DType::Float32, vec![3], Some(&bytes)),
        Some(TensorState::TooShort {
            expected: 12,
            actual: 8
        })
    );
    assert_eq!(TensorState::Empty.to_string(), "Tensor data is empty.");
    assert_eq!(
        TensorState::NoDimensions.to_string(),
        "Tensor has no dimensions."
    );
}

#[test]
fn display_string_respects_limit() {
    let bytes = le_bytes(&[1.0f32; 4], f32::to_le_bytes);
    let view = TensorView::new(DType::Float32, vec![4], Some(&bytes));
    let full: serde_json::Value =
        serde_json::from_str(&view.to_display_string(DISPLAY_LIMIT)).expect("json");
    assert_eq!(full, serde_json::json!([1.0, 1.0, 1.0, 1.0]));
    let short: serde_json::Value = serde_json::from_str(&view.to_display_string(1)).expect("json");
    assert_eq!(short, serde_json::json!([1.0, "..."]));
    assert_eq!(
        TensorView::new(DType::Bool, vec![1], Some(&bytes)).to_display_string(DISPLAY_LIMIT),
        ""
    );
}

#[test]
fn zero_limit_emits_only_the_marker() {
    let bytes = [7u8, 8];
    let decoded = TensorView::new(DType::UInt8, vec![2], Some(&bytes))
        .materialize(0)
        .expect("decodable");
    assert_eq!(decoded.value, TensorValue::List(vec![TensorValue::Ellipsis]));
    assert_eq!(decoded.bytes_read, 0);
}
