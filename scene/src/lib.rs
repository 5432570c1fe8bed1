pub mod preset;

use std::sync::Arc;

use geometry::{bvh::BBox, ray::Ray};
use light::{AreaLight, Light};
use math::hcm::Vec3;
use sampling::Distribution1D;
use shape::{intersect_all, Mesh, MeshError, Shape, ShapeHitPoint, Triangle};
use thiserror::Error;
use tlas::{make_bvh, BuildError, BvhNode};

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("building the accelerator: {0}")]
    Accelerator(#[from] BuildError),

    #[error("invalid mesh: {0}")]
    Mesh(#[from] MeshError),

    #[error("shape with non-finite bounds: {0}")]
    NonFiniteShape(String),
}

/// Everything a tracer needs: the shapes, the lights, and the structures built over them.
///
/// Populate with `add_shape()`, `add_mesh()` and `add_light()`, then call `preprocess()` once
/// before casting any ray. `build_accelerator()` is optional: without it `cast_ray()` scans every
/// shape.
pub struct Scene {
    shapes: Vec<Arc<dyn Shape>>,
    lights: Vec<Box<dyn Light>>,
    accelerator: Option<BvhNode>,
    light_distribution: Option<Distribution1D>,
    radius: f32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            shapes: vec![],
            lights: vec![],
            accelerator: None,
            light_distribution: None,
            radius: 1.0,
        }
    }

    /// Registers a shape. Emissive shapes also become area lights.
    pub fn add_shape(&mut self, shape: Arc<dyn Shape>) -> Result<(), SceneError> {
        let bbox = shape.bbox();
        if !(Vec3::from(bbox.min()).is_finite() && Vec3::from(bbox.max()).is_finite()) {
            return Err(SceneError::NonFiniteShape(shape.summary()));
        }
        if let Some(glow) = shape.shading().glow {
            self.lights.push(Box::new(AreaLight::new(shape.clone(), glow)));
        }
        self.shapes.push(shape);
        Ok(())
    }

    /// Registers every non-degenerate triangle of `mesh`. Returns the number of triangles added.
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        let mesh = Arc::new(mesh);
        let glow = mesh.shading().glow;
        let (mut added, mut skipped) = (0, 0);
        for tri in Triangle::all(&mesh) {
            if tri.is_degenerate() {
                skipped += 1;
                continue;
            }
            let tri: Arc<dyn Shape> = Arc::new(tri);
            if let Some(glow) = glow {
                self.lights.push(Box::new(AreaLight::new(tri.clone(), glow)));
            }
            self.shapes.push(tri);
            added += 1;
        }
        if skipped > 0 {
            log::warn!("skipped {} degenerate triangles out of {}", skipped, added + skipped);
        }
        added
    }

    pub fn add_light(&mut self, light: Box<dyn Light>) {
        self.lights.push(light);
    }

    /// Propagates the scene radius to the lights, then builds the power distribution used by
    /// `sample_light()`. Call after the last shape or light was added.
    pub fn preprocess(&mut self) {
        let bbox = self.bbox();
        self.radius = if bbox.is_empty() {
            1.0
        } else {
            (bbox.diag().norm() * 0.5).max(f32::EPSILON)
        };
        for light in self.lights.iter_mut() {
            light.set_scene_radius(self.radius);
        }

        self.light_distribution = if self.lights.is_empty() {
            None
        } else {
            let powers: Vec<f32> = self.lights.iter().map(|l| l.power()).collect();
            let (distribution, total) = Distribution1D::new(&powers);
            if !(total > 0.0) {
                log::warn!(
                    "lights carry no power, picking among the {} lights uniformly",
                    self.lights.len()
                );
            }
            Some(distribution)
        };
        log::info!(
            "scene: {} shapes, {} lights, radius = {}",
            self.shapes.len(),
            self.lights.len(),
            self.radius
        );
    }

    /// Builds a BVH over the current shapes; `cast_ray()` uses it from then on.
    pub fn build_accelerator(&mut self) -> Result<(), SceneError> {
        let root = make_bvh(self.shapes.clone())?;
        log::info!("BVH built, height = {}", root.height());
        self.accelerator = Some(root);
        Ok(())
    }

    /// Nearest hit along `r` within its extent.
    pub fn cast_ray(&self, r: &Ray) -> Option<ShapeHitPoint> {
        match &self.accelerator {
            Some(root) => root.intersect(r),
            None => intersect_all(&self.shapes, r),
        }
    }

    /// Picks a light with probability proportional to its power. Returns the light and the
    /// probability of picking it; `None` if the scene has no lights.
    pub fn sample_light(&self) -> Option<(&dyn Light, f32)> {
        self.light_at(rand::random::<f32>())
    }

    /// Deterministic version of `sample_light()` for a uniform number `e` in [0, 1).
    pub fn light_at(&self, e: f32) -> Option<(&dyn Light, f32)> {
        let n = self.lights.len();
        match &self.light_distribution {
            Some(distribution) if n > 0 => {
                let (x, pdf) = distribution.sample(e);
                let index = distribution.bucket_of(x).min(n - 1);
                Some((self.lights[index].as_ref(), pdf / n as f32))
            }
            _ if n > 0 => {
                // Not preprocessed: fall back to uniform selection.
                let index = ((e * n as f32) as usize).min(n - 1);
                Some((self.lights[index].as_ref(), 1.0 / n as f32))
            }
            _ => None,
        }
    }

    pub fn shapes(&self) -> &[Arc<dyn Shape>] {
        &self.shapes
    }

    pub fn lights(&self) -> &[Box<dyn Light>] {
        &self.lights
    }

    /// Lights that a ray escaping the scene can see: every light but the area lights.
    pub fn non_area_lights(&self) -> impl Iterator<Item = &dyn Light> {
        self.lights
            .iter()
            .map(|l| l.as_ref())
            .filter(|l| l.as_area().is_none())
    }

    pub fn accelerator(&self) -> Option<&BvhNode> {
        self.accelerator.as_ref()
    }

    pub fn bbox(&self) -> BBox {
        self.shapes
            .iter()
            .fold(BBox::empty(), |b, s| geometry::bvh::union(b, s.bbox()))
    }

    /// Half the diagonal of the scene bounds, as computed by `preprocess()`.
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use light::DirectionalLight;
    use material::{Mirror, Shading};
    use math::hcm::{point3, Point3};
    use radiometry::color::Color;
    use shape::Sphere;

    #[test]
    fn test_emissive_shapes_become_lights() {
        let mut scene = Scene::new();
        let glowing = Shading::glowing(Arc::new(Mirror::new()), Color::white());
        scene
            .add_shape(Arc::new(Sphere::new(Point3::ORIGIN, 1.0).with_shading(glowing.clone())))
            .unwrap();
        scene
            .add_shape(Arc::new(Sphere::new(point3(3.0, 0.0, 0.0), 1.0)))
            .unwrap();
        let added = scene.add_mesh(Mesh::plane(point3(0.0, 0.0, 5.0), 1.0, 1.0).with_shading(glowing));
        assert_eq!(added, 2);
        assert_eq!(scene.shapes().len(), 4);
        assert_eq!(scene.lights().len(), 3);
        assert_eq!(scene.non_area_lights().count(), 0);
    }

    #[test]
    fn test_light_selection_follows_power() {
        let mut scene = Scene::new();
        let dim = DirectionalLight::new(-Vec3::Z, Color::gray(1.0)).unwrap();
        let bright = DirectionalLight::new(-Vec3::Z, Color::gray(3.0)).unwrap();
        scene.add_light(Box::new(dim));
        scene.add_light(Box::new(bright));
        scene.preprocess();
        let (_, p_dim) = scene.light_at(0.1).unwrap();
        let (_, p_bright) = scene.light_at(0.9).unwrap();
        assert!((p_dim - 0.25).abs() < 1e-5, "{}", p_dim);
        assert!((p_bright - 0.75).abs() < 1e-5, "{}", p_bright);
        assert!(Scene::new().sample_light().is_none());
    }

    #[test]
    fn test_non_finite_shape_is_rejected() {
        let mut scene = Scene::new();
        let bad = Sphere::new(point3(f32::NAN, 0.0, 0.0), 1.0);
        assert!(matches!(
            scene.add_shape(Arc::new(bad)),
            Err(SceneError::NonFiniteShape(_))
        ));
        assert!(matches!(
            scene.build_accelerator(),
            Err(SceneError::Accelerator(BuildError::Empty))
        ));
    }
}
