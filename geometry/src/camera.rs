use crate::ray::Ray;
use math::hcm::{Point3, Vec3};

/// Maps screen coordinates to world rays.
///
/// Screen space has y pointing up and x centered: the visible image spans y in [-0.5, 0.5] and
/// one unit equals the image height.
pub trait Camera: Send + Sync {
    fn generate_ray(&self, x: f32, y: f32) -> Ray;
}

/// Computes the (up, right) frame of a camera looking along `dir`. The world z-axis is "up"
/// unless the camera looks straight along it.
fn camera_frame(dir: Vec3) -> (Vec3, Vec3) {
    if dir.x == 0.0 && dir.y == 0.0 {
        return (Vec3::Y, Vec3::X);
    }
    let up = Vec3::Z.projected_onto_plane(dir.hat()).hat();
    let right = dir.cross(up).hat();
    (up, right)
}

pub struct PerspectiveCamera {
    position: Point3,
    /// Center of the screen plane relative to `position`.
    forward: Vec3,
    up: Vec3,
    right: Vec3,
}

impl PerspectiveCamera {
    /// `fov` is the vertical field of view in radians; `zoom` scales the screen plane down.
    pub fn new(position: Point3, direction: Vec3, fov: f32, zoom: f32) -> Self {
        let (up, right) = camera_frame(direction);
        Self {
            position,
            forward: direction.hat() * (0.5 / (fov * 0.5).tan()),
            up: up / zoom,
            right: right / zoom,
        }
    }
}

impl Camera for PerspectiveCamera {
    fn generate_ray(&self, x: f32, y: f32) -> Ray {
        Ray::new(self.position, self.up * y + self.right * x + self.forward)
    }
}

pub struct OrthoCamera {
    position: Point3,
    direction: Vec3,
    zoom: f32,
    up: Vec3,
    right: Vec3,
}

impl OrthoCamera {
    pub fn new(position: Point3, direction: Vec3, zoom: f32) -> Self {
        let (up, right) = camera_frame(direction);
        Self {
            position,
            direction,
            zoom,
            up,
            right,
        }
    }
}

impl Camera for OrthoCamera {
    fn generate_ray(&self, x: f32, y: f32) -> Ray {
        let (x, y) = (x / self.zoom, y / self.zoom);
        Ray::new(self.position + self.up * y + self.right * x, self.direction)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::assert_close;

    #[test]
    fn test_perspective_center_and_edges() {
        let cam = PerspectiveCamera::new(
            Point3::ORIGIN,
            Vec3::Y,
            std::f32::consts::FRAC_PI_2,
            1.0,
        );
        let center = cam.generate_ray(0.0, 0.0);
        assert_close!(center.dir.hat(), Vec3::Y);
        // With a 90-degree field of view, the top edge of the screen is 45 degrees up.
        let top = cam.generate_ray(0.0, 0.5).dir.hat();
        assert!((top.dot(Vec3::Y) - 0.5f32.sqrt()).abs() < 1e-5);
        assert!(top.z > 0.0);
        // x grows to the right of the viewing direction.
        let right = cam.generate_ray(0.5, 0.0).dir;
        assert!(right.x > 0.0, "{}", right);
    }

    #[test]
    fn test_ortho_looking_down() {
        let cam = OrthoCamera::new(Point3::new(0.0, 0.0, 5.0), -Vec3::Z, 2.0);
        let ray = cam.generate_ray(1.0, 1.0);
        assert_close!(ray.dir, -Vec3::Z);
        assert_close!(Vec3::from(ray.origin), Vec3::new(0.5, 0.5, 5.0));
    }
}
