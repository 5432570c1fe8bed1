use std::fmt::{Debug, Formatter, Result};
use std::sync::Arc;

use geometry::bvh::{self, BBox};
use geometry::ray::Ray;
use math::hcm::Point3;
use partition::partition;
use shape::{intersect_all, Shape, ShapeHitPoint};

/// Nodes deeper than this become leaves regardless of their size.
pub const MAX_DEPTH: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot build a BVH over zero shapes")]
    Empty,
}

enum BvhNodeContent {
    Children([Box<BvhNode>; 2]),
    Leaf(Vec<Arc<dyn Shape>>),
}

/// Binary tree of bounding boxes. Every node owns its children; leaves own (shared handles to)
/// their shapes. Built once, never mutated.
pub struct BvhNode {
    bbox: BBox,
    content: BvhNodeContent,
}

impl Debug for BvhNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let content_string = match &self.content {
            BvhNodeContent::Children([l, r]) => {
                format!("\n{:?}\n{:?}", l, r)
            }
            BvhNodeContent::Leaf(shapes) => format!("leaf of {}", shapes.len()),
        };
        write!(
            f,
            "{{ bbox = {} {}\n }}",
            self.bbox,
            content_string.replace("\n", "\n  ")
        )
    }
}

struct ShapeInfo {
    shape: Arc<dyn Shape>,
    bbox: BBox,
    center: Point3,
}

impl BvhNode {
    fn new_leaf(infos: &[ShapeInfo]) -> BvhNode {
        BvhNode {
            bbox: infos
                .iter()
                .fold(BBox::empty(), |b, info| bvh::union(b, info.bbox)),
            content: BvhNodeContent::Leaf(infos.iter().map(|info| info.shape.clone()).collect()),
        }
    }
    fn new_internal(c0: BvhNode, c1: BvhNode) -> BvhNode {
        BvhNode {
            bbox: bvh::union(c0.bbox, c1.bbox),
            content: BvhNodeContent::Children([Box::new(c0), Box::new(c1)]),
        }
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// The shapes of a leaf node; `None` for internal nodes.
    pub fn leaf_shapes(&self) -> Option<&[Arc<dyn Shape>]> {
        match &self.content {
            BvhNodeContent::Leaf(shapes) => Some(shapes),
            BvhNodeContent::Children(_) => None,
        }
    }

    pub fn height(&self) -> usize {
        match &self.content {
            BvhNodeContent::Children([left, right]) => left.height().max(right.height()) + 1,
            BvhNodeContent::Leaf(_) => 1,
        }
    }

    pub fn shape_count(&self) -> usize {
        match &self.content {
            BvhNodeContent::Children([left, right]) => left.shape_count() + right.shape_count(),
            BvhNodeContent::Leaf(shapes) => shapes.len(),
        }
    }

    /// Checks that every box encloses the boxes below it.
    pub fn geometric_sound(&self) -> bool {
        match &self.content {
            BvhNodeContent::Children([left, right]) => {
                self.bbox.encloses(left.bbox)
                    && self.bbox.encloses(right.bbox)
                    && left.geometric_sound()
                    && right.geometric_sound()
            }
            BvhNodeContent::Leaf(shapes) => shapes.iter().all(|s| self.bbox.encloses(s.bbox())),
        }
    }

    /// Nearest hit in the subtree.
    pub fn intersect(&self, r: &Ray) -> Option<ShapeHitPoint> {
        if !self.bbox.intersect(r) {
            return None;
        }
        match &self.content {
            BvhNodeContent::Leaf(shapes) => intersect_all(shapes, r),
            BvhNodeContent::Children([left, right]) => {
                let left_hit = left.intersect(r);
                // The right subtree only needs to beat the left hit.
                let r = match &left_hit {
                    Some(hit) => r.with_extent(hit.ray_t),
                    None => *r,
                };
                match (left_hit, right.intersect(&r)) {
                    (None, right_hit) => right_hit,
                    (left_hit, None) => left_hit,
                    (Some(l), Some(r)) => {
                        if l.ray_t <= r.ray_t {
                            Some(l)
                        } else {
                            Some(r)
                        }
                    }
                }
            }
        }
    }
}

/// Builds the hierarchy by splitting at the midpoint of the widest axis of the shape centers.
/// Fails only on an empty shape list.
pub fn make_bvh(shapes: Vec<Arc<dyn Shape>>) -> std::result::Result<BvhNode, BuildError> {
    if shapes.is_empty() {
        return Err(BuildError::Empty);
    }
    let mut infos: Vec<_> = shapes
        .into_iter()
        .map(|shape| {
            let bbox = shape.bbox();
            ShapeInfo {
                shape,
                bbox,
                center: bbox.midpoint(),
            }
        })
        .collect();
    let root = recursive_build(&mut infos, 1);
    log::debug!(
        "BVH over {} shapes, height = {}",
        root.shape_count(),
        root.height()
    );
    Ok(root)
}

fn recursive_build(infos: &mut [ShapeInfo], depth: usize) -> BvhNode {
    if infos.len() <= 1 || depth >= MAX_DEPTH {
        return BvhNode::new_leaf(infos);
    }
    let centroid_bbox = infos
        .iter()
        .fold(BBox::empty(), |b, info| b.union(info.center));
    let axis = centroid_bbox.max_extent_axis();
    if centroid_bbox.diag()[axis] <= 0.0 {
        // All centers coincide: no split can separate them.
        return BvhNode::new_leaf(infos);
    }
    let pivot = centroid_bbox.midpoint()[axis];
    let (left, right) = partition(infos, |info| info.center[axis] <= pivot);
    if left.is_empty() || right.is_empty() {
        return BvhNode::new_leaf(if left.is_empty() { right } else { left });
    }
    let left_child = recursive_build(left, depth + 1);
    let right_child = recursive_build(right, depth + 1);
    BvhNode::new_internal(left_child, right_child)
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::{point3, Vec3};
    use shape::Sphere;

    #[test]
    fn test_empty_is_an_error() {
        assert!(matches!(make_bvh(vec![]), Err(BuildError::Empty)));
    }

    #[test]
    fn test_coincident_centers_make_one_leaf() {
        let shapes: Vec<Arc<dyn Shape>> = (1..6)
            .map(|i| Arc::new(Sphere::new(Point3::ORIGIN, i as f32)) as Arc<dyn Shape>)
            .collect();
        let root = make_bvh(shapes).unwrap();
        assert_eq!(root.leaf_shapes().map(|s| s.len()), Some(5));
        let hit = root
            .intersect(&Ray::new(point3(0.0, 0.0, -10.0), Vec3::Z))
            .unwrap();
        assert!((hit.ray_t - 5.0).abs() < 1e-4, "{}", hit.ray_t);
    }
}
