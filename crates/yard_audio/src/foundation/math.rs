//! Math utilities and types
//!
//! Only what is needed to hand a position to a playback source.

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;
