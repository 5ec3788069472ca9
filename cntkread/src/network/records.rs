//! Per-operator record decoders.
//!
//! Each decoder reads a fixed field sequence in which later format versions
//! only append fields, so one decoder covers every version at or above its
//! minimum. The reader's version selects which fields are present.

use serde::Serialize;

use crate::error::{FormatError, Result};
use crate::reader::Reader;

use super::matrix::DenseMatrix;
use super::node::AttrValue;
use super::shape::TensorShape;

macro_rules! operator_tags {
    ($($variant:ident),+ $(,)?) => {
        /// Operator type tag naming the record layout of a node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum OperatorTag {
            $($variant,)+
        }

        impl OperatorTag {
            pub const ALL: &'static [OperatorTag] = &[$(OperatorTag::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(OperatorTag::$variant => stringify!($variant),)+
                }
            }

            pub fn parse(tag: &str) -> Result<Self> {
                match tag {
                    $(stringify!($variant) => Ok(OperatorTag::$variant),)+
                    other => Err(FormatError::unsupported(format!(
                        "Unknown operator '{}'.",
                        other
                    ))),
                }
            }
        }
    };
}

operator_tags! {
    Minus,
    Plus,
    GreaterEqual,
    Equal,
    NotEqual,
    Exp,
    Log,
    Reciprocal,
    ElementTimes,
    ClassificationError,
    RectifiedLinear,
    Sigmoid,
    Tanh,
    Softmax,
    LogSoftmax,
    Negate,
    Abs,
    Sqrt,
    SquareError,
    Pass,
    InputValue,
    LearnableParameter,
    CrossEntropyWithSoftmax,
    Times,
    Dropout,
    Convolution,
    Pooling,
    MaxPooling,
    AveragePooling,
    ROIPooling,
    Reshape,
    ReduceElements,
    BatchNormalization,
}

/// Pooling mode shared by convolution-family records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PoolKind {
    None,
    Max,
    Average,
    Other(u32),
}

impl PoolKind {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => PoolKind::None,
            1 => PoolKind::Max,
            2 => PoolKind::Average,
            other => PoolKind::Other(other),
        }
    }

    fn to_attr(self) -> AttrValue {
        match self {
            PoolKind::None => AttrValue::Str("None".to_string()),
            PoolKind::Max => AttrValue::Str("Max".to_string()),
            PoolKind::Average => AttrValue::Str("Average".to_string()),
            PoolKind::Other(raw) => AttrValue::UInt(raw as u64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputValueRecord {
    pub rows: u64,
    pub columns: u64,
    pub sample_layout: TensorShape,
    pub dynamic_axis_node_name: String,
    pub learning_rate_multiplier: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnableParameterRecord {
    pub learning_rate_multiplier: f32,
    pub sample_layout: TensorShape,
    pub value: DenseMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossEntropyWithSoftmaxRecord {
    pub eval_mode: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimesRecord {
    pub output_rank: u64,
    pub infer_input_rank_to_map: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RngState {
    pub seed: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropoutRecord {
    pub rng_state: Option<RngState>,
}

/// Geometry common to convolution and pooling nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvolutionGeometry {
    pub kernel_shape: TensorShape,
    pub map_count: TensorShape,
    pub strides: TensorShape,
    pub sharing: Vec<bool>,
    pub auto_padding: Vec<bool>,
    pub lower_pad: TensorShape,
    pub upper_pad: TensorShape,
    pub pool_kind: PoolKind,
    pub image_layout: u32,
    pub max_temp_mem_size_in_samples: u64,
    pub transpose: bool,
    pub output_shape: Option<TensorShape>,
    pub ceil_out_dim: bool,
    pub include_pad: bool,
}

impl Default for ConvolutionGeometry {
    fn default() -> Self {
        Self {
            kernel_shape: TensorShape::default(),
            map_count: TensorShape::default(),
            strides: TensorShape::default(),
            sharing: Vec::new(),
            auto_padding: Vec::new(),
            lower_pad: TensorShape::default(),
            upper_pad: TensorShape::default(),
            pool_kind: PoolKind::None,
            image_layout: 0,
            max_temp_mem_size_in_samples: 0,
            transpose: false,
            output_shape: None,
            ceil_out_dim: false,
            include_pad: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvolutionRecord {
    pub geometry: ConvolutionGeometry,
    pub convolution_2d: bool,
    pub dilation: TensorShape,
}

/// Window parameters of the pre-geometry pooling nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolingWindow {
    pub image_layout_kind: u32,
    pub window_width: u32,
    pub window_height: u64,
    pub horizontal_subsample: u64,
    pub vertical_subsample: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiPoolingRecord {
    pub roi_output_shape: TensorShape,
    pub pool_kind: PoolKind,
    pub spatial_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReshapeRecord {
    pub begin_dim: u32,
    pub end_dim: u32,
    pub replacement_sample_layout: TensorShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReduceElementsRecord {
    pub axes: Vec<u32>,
    pub operation: String,
    pub keep_dimensions: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchNormalizationRecord {
    pub eval: Option<bool>,
    pub spatial: bool,
    pub normalization_time_constant: Option<f64>,
    pub blend_time_constant: Option<f64>,
    pub image_layout_kind: Option<i32>,
    /// `u64::MAX` stands for an untracked count.
    pub run_count_untied: u64,
    pub epsilon: Option<f64>,
    pub use_cntk_engine: Option<bool>,
    pub convert_running_variance_pending: bool,
}

/// Operator-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeRecord {
    Plain,
    InputValue(InputValueRecord),
    LearnableParameter(LearnableParameterRecord),
    CrossEntropyWithSoftmax(CrossEntropyWithSoftmaxRecord),
    Times(TimesRecord),
    Dropout(DropoutRecord),
    Convolution(ConvolutionRecord),
    Pooling(ConvolutionGeometry),
    PoolingWindow(PoolingWindow),
    RoiPooling(RoiPoolingRecord),
    Reshape(ReshapeRecord),
    ReduceElements(ReduceElementsRecord),
    BatchNormalization(BatchNormalizationRecord),
}

/// Decode the record that follows a node's tag and name.
pub fn decode_record(tag: OperatorTag, reader: &mut Reader<'_>) -> Result<NodeRecord> {
    use OperatorTag::*;
    Ok(match tag {
        Minus | Plus | GreaterEqual | Equal | NotEqual | Exp | Log | Reciprocal
        | ElementTimes | ClassificationError | RectifiedLinear | Sigmoid | Tanh | Softmax
        | LogSoftmax | Negate | Abs | Sqrt | SquareError | Pass => NodeRecord::Plain,
        InputValue => NodeRecord::InputValue(read_input_value(reader)?),
        LearnableParameter => NodeRecord::LearnableParameter(read_learnable_parameter(reader)?),
        CrossEntropyWithSoftmax => {
            NodeRecord::CrossEntropyWithSoftmax(read_cross_entropy_with_softmax(reader)?)
        }
        Times => NodeRecord::Times(read_times(reader)?),
        Dropout => NodeRecord::Dropout(read_dropout(reader)?),
        Convolution => NodeRecord::Convolution(read_convolution(reader)?),
        Pooling => NodeRecord::Pooling(read_convolution_geometry(reader)?),
        MaxPooling | AveragePooling => NodeRecord::PoolingWindow(read_pooling_window(reader)?),
        ROIPooling => NodeRecord::RoiPooling(read_roi_pooling(reader)?),
        Reshape => NodeRecord::Reshape(read_reshape(reader)?),
        ReduceElements => NodeRecord::ReduceElements(read_reduce_elements(reader)?),
        BatchNormalization => {
            NodeRecord::BatchNormalization(read_batch_normalization(reader)?)
        }
    })
}

fn read_input_value(reader: &mut Reader<'_>) -> Result<InputValueRecord> {
    let rows = reader.u48()?.get();
    let columns = reader.u48()?.get();
    let sample_layout = TensorShape::read_legacy(reader)?;
    let mut dynamic_axis_node_name = String::new();
    if reader.version() >= 8 {
        let axis_count = reader.u32()?;
        if axis_count == 1 {
            dynamic_axis_node_name = reader.string()?;
        }
    }
    let learning_rate_multiplier = if reader.version() >= 10 {
        reader.f32()?
    } else {
        0.0
    };
    Ok(InputValueRecord {
        rows,
        columns,
        sample_layout,
        dynamic_axis_node_name,
        learning_rate_multiplier,
    })
}

fn read_learnable_parameter(reader: &mut Reader<'_>) -> Result<LearnableParameterRecord> {
    if reader.version() < 3 {
        return Err(FormatError::version_gap(format!(
            "LearnableParameter reader not implemented for version {}.",
            reader.version()
        )));
    }
    let learning_rate_multiplier = reader.f32()?;
    let sample_layout = TensorShape::read(reader)?;
    let value = DenseMatrix::read(reader)?;
    Ok(LearnableParameterRecord {
        learning_rate_multiplier,
        sample_layout,
        value,
    })
}

fn read_cross_entropy_with_softmax(
    reader: &mut Reader<'_>,
) -> Result<CrossEntropyWithSoftmaxRecord> {
    let mut eval_mode = reader.u32()?;
    // Older writers had no eval mode; the word belongs to the next record.
    if eval_mode > 2 {
        eval_mode = 0;
        reader.seek(-4)?;
    }
    Ok(CrossEntropyWithSoftmaxRecord { eval_mode })
}

fn read_times(reader: &mut Reader<'_>) -> Result<TimesRecord> {
    let output_rank = if reader.version() >= 3 {
        reader.u48()?.get()
    } else {
        1
    };
    let infer_input_rank_to_map = if reader.version() >= 12 {
        reader.i32()?
    } else {
        -1
    };
    Ok(TimesRecord {
        output_rank,
        infer_input_rank_to_map,
    })
}

fn read_dropout(reader: &mut Reader<'_>) -> Result<DropoutRecord> {
    if reader.version() < 16 {
        return Ok(DropoutRecord { rng_state: None });
    }
    // Version 16 alone wrote a 32-bit seed.
    let seed = if reader.version() == 16 {
        reader.u32()? as u64
    } else {
        reader.u48()?.get()
    };
    let offset = reader.u48()?.get();
    Ok(DropoutRecord {
        rng_state: Some(RngState { seed, offset }),
    })
}

pub fn read_convolution_geometry(reader: &mut Reader<'_>) -> Result<ConvolutionGeometry> {
    let mut geometry = ConvolutionGeometry::default();
    if reader.version() >= 5 {
        geometry.kernel_shape = TensorShape::read(reader)?;
        geometry.map_count = TensorShape::read(reader)?;
        geometry.strides = TensorShape::read(reader)?;
        let count = reader.u48()?;
        geometry.sharing = reader.bools(count)?;
        let count = reader.u48()?;
        geometry.auto_padding = reader.bools(count)?;
        geometry.lower_pad = TensorShape::read(reader)?;
        geometry.upper_pad = TensorShape::read(reader)?;
        geometry.pool_kind = PoolKind::from_raw(reader.u32()?);
        geometry.image_layout = reader.u32()?;
        geometry.max_temp_mem_size_in_samples = reader.u48()?.get();
    }
    if reader.version() >= 9 {
        geometry.transpose = reader.bool()?;
    }
    if reader.version() >= 20 {
        geometry.output_shape = Some(TensorShape::read(reader)?);
    }
    if reader.version() >= 21 {
        geometry.ceil_out_dim = reader.bool()?;
    }
    if reader.version() >= 23 {
        geometry.include_pad = reader.bool()?;
    }
    Ok(geometry)
}

fn read_convolution(reader: &mut Reader<'_>) -> Result<ConvolutionRecord> {
    if reader.version() < 5 {
        return read_legacy_convolution(reader);
    }
    let geometry = read_convolution_geometry(reader)?;
    let convolution_2d = reader.bool()?;
    let dilation = if reader.version() >= 18 {
        TensorShape::read(reader)?
    } else {
        TensorShape::new(vec![1])
    };
    Ok(ConvolutionRecord {
        geometry,
        convolution_2d,
        dilation,
    })
}

/// Fixed 2-D layout written before convolution geometry became tensor shaped.
fn read_legacy_convolution(reader: &mut Reader<'_>) -> Result<ConvolutionRecord> {
    let kernel_width = legacy_dim(reader)?;
    let kernel_height = legacy_dim(reader)?;
    let stride_width = legacy_dim(reader)?;
    let stride_height = legacy_dim(reader)?;
    let output_channels = reader.u32()?;
    let image_layout = reader.u32()?;
    let auto_padding = reader.bool()?;
    let max_temp_mem_size_in_samples = reader.u48()?.get();
    let geometry = ConvolutionGeometry {
        kernel_shape: TensorShape::new(vec![kernel_width, kernel_height, 1]),
        map_count: TensorShape::new(vec![output_channels]),
        strides: TensorShape::new(vec![stride_width, stride_height, 1]),
        sharing: vec![true],
        auto_padding: vec![auto_padding],
        lower_pad: TensorShape::new(vec![0]),
        upper_pad: TensorShape::new(vec![0]),
        pool_kind: PoolKind::None,
        image_layout,
        max_temp_mem_size_in_samples,
        ..ConvolutionGeometry::default()
    };
    Ok(ConvolutionRecord {
        geometry,
        convolution_2d: true,
        dilation: TensorShape::new(vec![1]),
    })
}

fn legacy_dim(reader: &mut Reader<'_>) -> Result<u32> {
    let value = reader.u48()?.get();
    u32::try_from(value).map_err(|_| {
        FormatError::range(format!("Convolution dimension {} out of range.", value))
    })
}

fn read_pooling_window(reader: &mut Reader<'_>) -> Result<PoolingWindow> {
    Ok(PoolingWindow {
        image_layout_kind: reader.u32()?,
        window_width: reader.u32()?,
        window_height: reader.u48()?.get(),
        horizontal_subsample: reader.u48()?.get(),
        vertical_subsample: reader.u48()?.get(),
    })
}

fn read_roi_pooling(reader: &mut Reader<'_>) -> Result<RoiPoolingRecord> {
    let roi_output_shape = TensorShape::read(reader)?;
    let (pool_kind, spatial_scale) = if reader.version() < 26 {
        (PoolKind::Max, 0.0625)
    } else {
        (PoolKind::from_raw(reader.u32()?), reader.f64()?)
    };
    Ok(RoiPoolingRecord {
        roi_output_shape,
        pool_kind,
        spatial_scale,
    })
}

fn read_reshape(reader: &mut Reader<'_>) -> Result<ReshapeRecord> {
    Ok(ReshapeRecord {
        begin_dim: reader.u32()?,
        end_dim: reader.u32()?,
        replacement_sample_layout: TensorShape::read(reader)?,
    })
}

fn read_reduce_elements(reader: &mut Reader<'_>) -> Result<ReduceElementsRecord> {
    let axis_count = if reader.version() >= 27 {
        reader.u32()?
    } else {
        1
    };
    let mut axes = Vec::with_capacity((axis_count as usize).min(reader.remaining() / 4));
    for _ in 0..axis_count {
        axes.push(reader.u32()?);
    }
    let operation = reader.string()?;
    let keep_dimensions = if reader.version() >= 24 {
        Some(reader.bool()?)
    } else {
        None
    };
    Ok(ReduceElementsRecord {
        axes,
        operation,
        keep_dimensions,
    })
}

const BN_LEGACY_MIN_WRITTEN: i32 = 0x0001_0001;
const BN_LEGACY_MAX_READABLE: i32 = 0x0001_0004;

fn read_batch_normalization(reader: &mut Reader<'_>) -> Result<BatchNormalizationRecord> {
    let mut record = BatchNormalizationRecord {
        eval: None,
        spatial: false,
        normalization_time_constant: None,
        blend_time_constant: None,
        image_layout_kind: None,
        run_count_untied: 0,
        epsilon: None,
        use_cntk_engine: None,
        convert_running_variance_pending: false,
    };
    let mut mb_count = 0u64;
    if reader.version() >= 6 {
        record.spatial = reader.bool()?;
        record.normalization_time_constant = Some(reader.f64()?);
        record.blend_time_constant = Some(reader.f64()?);
        record.image_layout_kind = Some(reader.i32()?);
        if reader.version() >= 13 {
            // Version 19 stored only whether the run count was tracked.
            record.run_count_untied = if reader.version() == 19 {
                if reader.bool()? {
                    0
                } else {
                    u64::MAX
                }
            } else {
                reader.u48()?.get()
            };
        } else {
            mb_count = reader.u48()?.get();
        }
        record.epsilon = Some(reader.f64()?);
        record.use_cntk_engine = Some(reader.bool()?);
    } else {
        let written = reader.i32()?;
        let readable = reader.i32()?;
        if readable > written
            || written < BN_LEGACY_MIN_WRITTEN
            || readable > BN_LEGACY_MAX_READABLE
        {
            return Err(FormatError::unsupported(
                "BatchNormalization version not supported.",
            ));
        }
        record.eval = Some(reader.bool()?);
        record.spatial = reader.bool()?;
        if written >= 0x0001_0004 {
            record.normalization_time_constant = Some(reader.f64()?);
        } else {
            // expAvgFactor, superseded by the time constant
            reader.f64()?;
        }
        if written >= 0x0001_0002 {
            record.image_layout_kind = Some(reader.i32()?);
            mb_count = reader.u48()?.get();
        }
        if written >= 0x0001_0003 {
            record.epsilon = Some(reader.f64()?);
            record.use_cntk_engine = Some(reader.bool()?);
        }
    }
    if reader.version() < 13 {
        record.run_count_untied = mb_count.saturating_mul(16);
        record.convert_running_variance_pending = true;
    }
    Ok(record)
}

fn shape_attr(shape: &TensorShape) -> AttrValue {
    AttrValue::Shape(shape.dims().to_vec())
}

impl ConvolutionGeometry {
    fn push_attributes(&self, out: &mut Vec<(&'static str, AttrValue)>) {
        out.push(("kernelShape", shape_attr(&self.kernel_shape)));
        out.push(("mapCount", shape_attr(&self.map_count)));
        out.push(("strides", shape_attr(&self.strides)));
        out.push(("sharing", AttrValue::BoolList(self.sharing.clone())));
        out.push(("autoPadding", AttrValue::BoolList(self.auto_padding.clone())));
        out.push(("lowerPad", shape_attr(&self.lower_pad)));
        out.push(("upperPad", shape_attr(&self.upper_pad)));
        out.push(("poolKind", self.pool_kind.to_attr()));
        out.push(("imageLayout", AttrValue::UInt(self.image_layout as u64)));
        out.push((
            "maxTempMemSizeInSamples",
            AttrValue::UInt(self.max_temp_mem_size_in_samples),
        ));
        out.push(("transpose", AttrValue::Bool(self.transpose)));
        if let Some(shape) = &self.output_shape {
            out.push(("outputShape", shape_attr(shape)));
        }
        out.push(("ceilOutDim", AttrValue::Bool(self.ceil_out_dim)));
        out.push(("includePad", AttrValue::Bool(self.include_pad)));
    }
}

impl NodeRecord {
    /// Record fields as named attributes, in serialization order.
    pub fn attributes(&self) -> Vec<(&'static str, AttrValue)> {
        let mut out = Vec::new();
        match self {
            NodeRecord::Plain => {}
            NodeRecord::InputValue(record) => {
                out.push(("rows", AttrValue::UInt(record.rows)));
                out.push(("cols", AttrValue::UInt(record.columns)));
                out.push(("sampleLayout", shape_attr(&record.sample_layout)));
                out.push((
                    "dynamicAxisNodeName",
                    AttrValue::Str(record.dynamic_axis_node_name.clone()),
                ));
                out.push((
                    "learningRateMultiplier",
                    AttrValue::Float(record.learning_rate_multiplier as f64),
                ));
            }
            NodeRecord::LearnableParameter(record) => {
                out.push((
                    "learningRateMultiplier",
                    AttrValue::Float(record.learning_rate_multiplier as f64),
                ));
                out.push(("sampleLayout", shape_attr(&record.sample_layout)));
            }
            NodeRecord::CrossEntropyWithSoftmax(record) => {
                out.push(("evalMode", AttrValue::UInt(record.eval_mode as u64)));
            }
            NodeRecord::Times(record) => {
                out.push(("outputRank", AttrValue::UInt(record.output_rank)));
                out.push((
                    "inferInputRankToMap",
                    AttrValue::Int(record.infer_input_rank_to_map as i64),
                ));
            }
            NodeRecord::Dropout(record) => {
                if let Some(state) = record.rng_state {
                    out.push(("rngSeed", AttrValue::UInt(state.seed)));
                    out.push(("rngOffset", AttrValue::UInt(state.offset)));
                }
            }
            NodeRecord::Convolution(record) => {
                record.geometry.push_attributes(&mut out);
                out.push(("convolution2D", AttrValue::Bool(record.convolution_2d)));
                out.push(("dilation", shape_attr(&record.dilation)));
            }
            NodeRecord::Pooling(geometry) => geometry.push_attributes(&mut out),
            NodeRecord::PoolingWindow(window) => {
                out.push((
                    "imageLayoutKind",
                    AttrValue::UInt(window.image_layout_kind as u64),
                ));
                out.push(("windowWidth", AttrValue::UInt(window.window_width as u64)));
                out.push(("windowHeight", AttrValue::UInt(window.window_height)));
                out.push((
                    "horizontalSubsample",
                    AttrValue::UInt(window.horizontal_subsample),
                ));
                out.push((
                    "verticalSubsample",
                    AttrValue::UInt(window.vertical_subsample),
                ));
            }
            NodeRecord::RoiPooling(record) => {
                out.push(("roiOutputShape", shape_attr(&record.roi_output_shape)));
                out.push(("poolKind", record.pool_kind.to_attr()));
                out.push(("spatialScale", AttrValue::Float(record.spatial_scale)));
            }
            NodeRecord::Reshape(record) => {
                out.push(("beginDimParameter", AttrValue::UInt(record.begin_dim as u64)));
                out.push(("endDimParameter", AttrValue::UInt(record.end_dim as u64)));
                out.push((
                    "replacementSampleLayout",
                    shape_attr(&record.replacement_sample_layout),
                ));
            }
            NodeRecord::ReduceElements(record) => {
                out.push(("axes", AttrValue::UIntList(record.axes.clone())));
                out.push(("operation", AttrValue::Str(record.operation.clone())));
                if let Some(keep) = record.keep_dimensions {
                    out.push(("keepDimensions", AttrValue::Bool(keep)));
                }
            }
            NodeRecord::BatchNormalization(record) => {
                if let Some(eval) = record.eval {
                    out.push(("eval", AttrValue::Bool(eval)));
                }
                out.push(("spatial", AttrValue::Bool(record.spatial)));
                if let Some(value) = record.normalization_time_constant {
                    out.push(("normalizationTimeConstant", AttrValue::Float(value)));
                }
                if let Some(value) = record.blend_time_constant {
                    out.push(("blendTimeConstant", AttrValue::Float(value)));
                }
                if let Some(value) = record.image_layout_kind {
                    out.push(("imageLayoutKind", AttrValue::Int(value as i64)));
                }
                out.push(("runCountUntied", AttrValue::UInt(record.run_count_untied)));
                if let Some(value) = record.epsilon {
                    out.push(("epsilon", AttrValue::Float(value)));
                }
                if let Some(value) = record.use_cntk_engine {
                    out.push(("useCntkEngine", AttrValue::Bool(value)));
                }
            }
        }
        out
    }
}
