mod dtype;
mod scalar;
mod value;
mod view;

pub use dtype::DType;
pub use scalar::F16;
pub use value::TensorValue;
pub use view::{Materialized, TensorState, TensorView, DISPLAY_LIMIT};
