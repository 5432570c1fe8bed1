use std::f32::consts::PI;
use std::sync::Arc;

use geometry::camera::{Camera, OrthoCamera, PerspectiveCamera};
use light::{DirectionalLight, InfiniteLight};
use material::{self as mtl, Material, Shading};
use math::hcm::{point3, vec3, Point3, Vec3};
use radiometry::color::Color;
use shape::{Mesh, Sphere};
use texture::{Image, Texture};

use crate::{Scene, SceneError};

/// A ready-to-render scene with its camera.
pub struct Preset {
    pub scene: Scene,
    pub camera: Box<dyn Camera>,
}

pub const NAMES: [&str; 3] = ["cornell", "sphere_over_plane", "showcase"];

/// Builds the preset called `name`; `None` for unknown names.
pub fn by_name(name: &str) -> Option<Result<Preset, SceneError>> {
    match name {
        "cornell" => Some(cornell_box()),
        "sphere_over_plane" => Some(sphere_over_plane()),
        "showcase" => Some(material_showcase()),
        _ => None,
    }
}

fn matte(color: Color) -> Arc<dyn Material> {
    Arc::new(mtl::Matte::solid(color, 0.0, false))
}

/// Quad with its front side towards the viewer who sees the corners counter-clockwise.
fn quad(corners: [Point3; 4], shading: Shading) -> Result<Mesh, SceneError> {
    let mesh = Mesh::new(corners.to_vec(), vec![0, 1, 2, 0, 2, 3], vec![], vec![])?;
    Ok(mesh.with_shading(shading))
}

fn finish(mut scene: Scene, camera: Box<dyn Camera>) -> Result<Preset, SceneError> {
    scene.preprocess();
    scene.build_accelerator()?;
    Ok(Preset { scene, camera })
}

/// Closed-front box, 2 units wide, lit by an emissive square under the ceiling. The left wall is
/// red and the right one green.
pub fn cornell_box() -> Result<Preset, SceneError> {
    let mut scene = Scene::new();
    let white = Shading::new(matte(Color::gray(0.75)));
    let p = |x, y, z| point3(x, y, z);

    scene.add_mesh(quad(
        [p(-1.0, -1.0, 0.0), p(1.0, -1.0, 0.0), p(1.0, 1.0, 0.0), p(-1.0, 1.0, 0.0)],
        white.clone(),
    )?);
    scene.add_mesh(quad(
        [p(-1.0, -1.0, 2.0), p(-1.0, 1.0, 2.0), p(1.0, 1.0, 2.0), p(1.0, -1.0, 2.0)],
        white.clone(),
    )?);
    scene.add_mesh(quad(
        [p(-1.0, 1.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 1.0, 2.0), p(-1.0, 1.0, 2.0)],
        white.clone(),
    )?);
    scene.add_mesh(quad(
        [p(-1.0, -1.0, 0.0), p(-1.0, 1.0, 0.0), p(-1.0, 1.0, 2.0), p(-1.0, -1.0, 2.0)],
        Shading::new(matte(Color::new(0.63, 0.065, 0.05))),
    )?);
    scene.add_mesh(quad(
        [p(1.0, 1.0, 0.0), p(1.0, -1.0, 0.0), p(1.0, -1.0, 2.0), p(1.0, 1.0, 2.0)],
        Shading::new(matte(Color::new(0.14, 0.45, 0.091))),
    )?);

    let lamp = Mesh::plane(p(0.0, 0.0, 1.98), 0.5, 0.5)
        .with_shading(Shading::glowing(matte(Color::black()), Color::gray(12.0)));
    scene.add_mesh(lamp);

    let mut block = Mesh::cube(p(0.0, 0.0, 0.0), 0.6).with_shading(white);
    block.scale(vec3(1.0, 1.0, 2.0), Point3::ORIGIN);
    block.rotate(Vec3::Z, PI / 8.0);
    block.translate(vec3(-0.4, 0.35, 0.6));
    scene.add_mesh(block);

    let glass: Arc<dyn Material> = Arc::new(mtl::Microfacet::dielectric(
        Color::white(),
        Color::white(),
        1.5,
        0.0,
    ));
    scene.add_shape(Arc::new(
        Sphere::new(p(0.45, -0.3, 0.35), 0.35).with_shading(Shading::new(glass)),
    ))?;

    let camera = PerspectiveCamera::new(p(0.0, -3.4, 1.0), Vec3::Y, 40f32.to_radians(), 1.0);
    finish(scene, Box::new(camera))
}

/// A unit white emitter floating above a large matte plane, half of which is shadowed by a box.
/// Seen from straight above.
pub fn sphere_over_plane() -> Result<Preset, SceneError> {
    let mut scene = Scene::new();
    let floor = Shading::new(matte(Color::gray(0.8)));
    scene.add_mesh(quad(
        [
            point3(-10.0, -10.0, 0.0),
            point3(10.0, -10.0, 0.0),
            point3(10.0, 10.0, 0.0),
            point3(-10.0, 10.0, 0.0),
        ],
        floor,
    )?);
    scene.add_shape(Arc::new(
        Sphere::new(point3(0.0, 0.0, 3.0), 0.5)
            .with_shading(Shading::glowing(matte(Color::black()), Color::white())),
    ))?;
    scene.add_mesh(
        Mesh::cube(point3(3.0, 0.0, 1.0), 1.0).with_shading(Shading::new(matte(Color::gray(0.5)))),
    );

    let camera = OrthoCamera::new(point3(0.0, 0.0, 10.0), -Vec3::Z, 0.1);
    finish(scene, Box::new(camera))
}

/// Gradient sky, zenith blue fading to white at the horizon and grey below it.
fn sky(width: usize, height: usize) -> Image {
    Image::from_fn(width, height, |_, y| {
        let v = (y as f32 + 0.5) / height as f32;
        if v < 0.5 {
            let t = v * 2.0;
            Color::new(0.5, 0.7, 1.0) * (1.0 - t) + Color::white() * t
        } else {
            Color::gray(0.3)
        }
    })
}

/// Spheres showing off the glossy, layered and mixed materials under a sky and a sun.
pub fn material_showcase() -> Result<Preset, SceneError> {
    let mut scene = Scene::new();
    let checker: Arc<dyn Texture> = Arc::new(Image::from_fn(64, 64, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Color::white()
        } else {
            Color::black()
        }
    }));
    let floor: Arc<dyn Material> = Arc::new(mtl::BlendMap::new(
        matte(Color::gray(0.2)),
        matte(Color::gray(0.8)),
        checker,
    ));
    let mut ground = Mesh::plane(Point3::ORIGIN, 12.0, 12.0).with_shading(Shading::new(floor));
    ground.flip_normals();
    scene.add_mesh(ground);

    let gold: Arc<dyn Material> = Arc::new(mtl::Microfacet::metal(
        Color::new(0.143, 0.374, 1.442),
        Color::new(3.983, 2.385, 1.603),
        0.2,
    ));
    let coated: Arc<dyn Material> = Arc::new(mtl::Layered::new(matte(Color::new(0.7, 0.1, 0.1)), 1.5));
    let frosted: Arc<dyn Material> = Arc::new(mtl::Microfacet::dielectric(
        Color::white(),
        Color::white(),
        1.5,
        0.3,
    ));
    let mixed: Arc<dyn Material> = match mtl::WeightedSum::new(
        vec![Arc::new(mtl::Mirror::new()) as Arc<dyn Material>, matte(Color::new(0.2, 0.3, 0.8))],
        vec![1.0, 3.0],
    ) {
        Some(m) => Arc::new(m),
        None => matte(Color::new(0.2, 0.3, 0.8)),
    };
    let rough: Arc<dyn Material> = Arc::new(mtl::Matte::solid(Color::gray(0.7), 0.8, false));

    for (i, material) in [gold, coated, frosted, mixed, rough].iter().enumerate() {
        let x = (i as f32 - 2.0) * 1.2;
        scene.add_shape(Arc::new(
            Sphere::new(point3(x, 0.0, 0.5), 0.5).with_shading(Shading::new(material.clone())),
        ))?;
    }

    scene.add_light(Box::new(InfiniteLight::new(sky(256, 128), 1.0)));
    if let Some(sun) = DirectionalLight::new(vec3(-1.0, 1.0, -2.0), Color::new(3.0, 2.8, 2.5)) {
        scene.add_light(Box::new(sun));
    }

    let camera = PerspectiveCamera::new(
        point3(0.0, -6.0, 2.0),
        vec3(0.0, 6.0, -1.5),
        35f32.to_radians(),
        1.0,
    );
    finish(scene, Box::new(camera))
}
