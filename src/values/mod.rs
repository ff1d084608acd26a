//! Scalar utility nodes.

pub mod ramp;
pub mod variable;

pub use ramp::{FloatRamp, RampType};
pub use variable::{resolve_variable, VariableValue};
