//! Scalar-field collaborators for Farshore.
//!
//! Blue-noise acceptance masks and per-instance tint sources, sampled
//! bilinearly in normalized [0, 1] UV space.

mod scalar;
mod tint;

pub use scalar::{FieldError, RgbaField, ScalarField};
pub use tint::TintField;
