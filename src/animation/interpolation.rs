use std::ops::{Add, Mul};

/// Cubic Hermite between `value_b` and `value_a`.
///
/// Tangents are stored per unit of normalized time in the interchange format,
/// so they are scaled by the segment duration `dt` here.
pub fn hermite<T>(value_b: T, out_tangent_b: T, in_tangent_a: T, value_a: T, t: f32, dt: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let t2 = t * t;
    let t3 = t2 * t;
    value_b * (2.0 * t3 - 3.0 * t2 + 1.0)
        + out_tangent_b * ((t3 - 2.0 * t2 + t) * dt)
        + value_a * (-2.0 * t3 + 3.0 * t2)
        + in_tangent_a * ((t3 - t2) * dt)
}
