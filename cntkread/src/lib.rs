//! Reader for the binary CNTK v1 computation network format.

pub mod logging;

mod error;
mod metadata;
mod model;
mod model_loader;
pub mod network;
mod reader;
mod settings;
pub mod tensor;

pub use error::{ErrorKind, FormatError, Result};
pub use metadata::{
    ArgumentOption, ArgumentSchema, AttributeSchema, OperatorMetadata, OperatorSchema,
};
pub use model::{
    Argument, Attribute, Connection, Graph, Model, ModelBytes, Node, Tensor, TensorType,
};
pub use model_loader::ModelLoader;
pub use network::{ComputationNetwork, RootRole};
pub use reader::{Reader, U48};
pub use settings::Settings;
pub use tensor::{DType, Materialized, TensorState, TensorValue, TensorView, DISPLAY_LIMIT};
