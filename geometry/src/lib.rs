/// Defines the `BBox` bounding-box type.
pub mod bvh;
/// Screen-to-world ray generation: perspective and orthographic cameras.
pub mod camera;
/// Reader for tabulated Fourier BSDF files.
pub mod fourier;
/// Fresnel reflectance for dielectrics and conductors.
pub mod fresnel;
pub mod interaction;
/// Trowbridge-Reitz microfacet distribution.
pub mod microfacet;
pub mod ray;

pub use interaction::SurfacePoint;
