//! Seam to the rendering backend that owns scene graph objects.
//!
//! Entities only keep an opaque [`RenderHandle`]; the backend owns whatever
//! the handle refers to and outlives the entity set.

use glam::{Mat4, Vec3};

use crate::intake::DecodedImage;
use crate::particle::Category;
use crate::state::{Ray, Transform};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeometryDesc {
    Sphere { radius: f32 },
    Cube { size: f32 },
    Cane { length: f32, radius: f32 },
    Sprite,
    /// Unit-height plane with the photo's aspect ratio.
    Plane { aspect: f32 },
}

impl GeometryDesc {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Bauble => GeometryDesc::Sphere { radius: 1.0 },
            Category::GiftBox => GeometryDesc::Cube { size: 1.0 },
            Category::CandyCane => GeometryDesc::Cane {
                length: 1.6,
                radius: 0.12,
            },
            Category::Dust => GeometryDesc::Sprite,
            Category::Photo => GeometryDesc::Plane { aspect: 1.0 },
        }
    }

    /// Bounding radius at unit scale, used for CPU picking.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            GeometryDesc::Sphere { radius } => radius,
            GeometryDesc::Cube { size } => size * 0.87,
            GeometryDesc::Cane { length, .. } => length * 0.5,
            GeometryDesc::Sprite => 0.5,
            GeometryDesc::Plane { aspect } => 0.5 * (1.0 + aspect * aspect).sqrt(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum MaterialDesc<'a> {
    Ornament { color: [f32; 3], metallic: f32 },
    Glow { color: [f32; 3] },
    Photo { image: &'a DecodedImage },
}

/// Operations the core consumes from a renderer.
pub trait RenderBackend {
    fn create_renderable(&mut self, geometry: GeometryDesc, material: MaterialDesc<'_>)
        -> RenderHandle;

    /// `transform` is expressed in the orbiting parent group's local frame.
    fn set_transform(&mut self, handle: RenderHandle, transform: &Transform);

    /// World-space ray through the given viewport pixel.
    fn screen_ray(&self, x: f32, y: f32) -> Ray;

    /// Hits among `candidates` along a world-space ray, nearest first.
    fn raycast(&self, ray: &Ray, candidates: &[RenderHandle]) -> Vec<(RenderHandle, f32)>;

    fn camera_world_position(&self) -> Vec3;

    fn camera_world_direction(&self) -> Vec3 {
        -Vec3::Z
    }

    fn group_inverse_world_transform(&self) -> Mat4;
}
