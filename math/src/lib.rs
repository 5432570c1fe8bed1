/// Defines useful functions for common math operations, tools and constants:
/// - Simple interpolation and barycentric interpolation on not only primitive types,
/// - Evaluation of Fourier cosine series,
/// - Macros to check if two math quantities are less than / greater than (or equal to) each other.
pub mod float;

/// Homogeneous-coordinate maths module.
/// - Types: 3D points and vectors, and the `Axis` enum to index them.
/// - Function `basis_around()` to build an orthogonal base from a `Vec3`.
/// - Functions `reflect()` and `refract_around()` to compute surface interactions.
pub mod hcm;

/// Provides `Prob` struct representing a probability mass or probability density.
pub mod prob;
