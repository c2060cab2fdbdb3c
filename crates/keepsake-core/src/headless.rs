//! CPU-only rendering backend.
//!
//! Keeps transforms in memory, orbits the parent group around the vertical
//! axis and answers raycasts with bounding spheres. Used by the native
//! driver and by tests.

use fnv::FnvHashMap;
use glam::{Mat4, Vec3};

use crate::backend::{GeometryDesc, MaterialDesc, RenderBackend, RenderHandle};
use crate::constants::{GROUP_SPIN_RATE, PICK_SPHERE_RADIUS};
use crate::picking::{ray_sphere, sort_hits};
use crate::state::{Camera, InstanceRaw, Ray, Transform};

#[derive(Clone, Debug)]
struct Renderable {
    geometry: GeometryDesc,
    transform: Transform,
    textured: bool,
}

#[derive(Clone, Debug)]
pub struct HeadlessBackend {
    pub camera: Camera,
    pub viewport: (f32, f32),
    /// Orbit speed of the parent group in rad/s.
    pub group_spin: f32,
    group_angle: f32,
    renderables: Vec<Renderable>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl HeadlessBackend {
    pub fn new(width: f32, height: f32) -> Self {
        let camera = Camera {
            aspect: width / height.max(1.0),
            ..Camera::default()
        };
        Self {
            camera,
            viewport: (width, height),
            group_spin: GROUP_SPIN_RATE,
            group_angle: 0.0,
            renderables: Vec::new(),
        }
    }

    /// Advance the group orbit by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.group_angle = (self.group_angle + self.group_spin * dt) % std::f32::consts::TAU;
    }

    pub fn group_angle(&self) -> f32 {
        self.group_angle
    }

    pub fn group_world_transform(&self) -> Mat4 {
        Mat4::from_rotation_y(self.group_angle)
    }

    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }

    pub fn transform(&self, handle: RenderHandle) -> Option<&Transform> {
        self.renderables.get(handle.0 as usize).map(|r| &r.transform)
    }

    pub fn textured_count(&self) -> usize {
        self.renderables.iter().filter(|r| r.textured).count()
    }

    /// World-space position of a renderable.
    pub fn world_position(&self, handle: RenderHandle) -> Option<Vec3> {
        let t = self.transform(handle)?;
        Some(self.group_world_transform().transform_point3(t.position))
    }

    /// Viewport pixel a world-space point projects to.
    pub fn project(&self, world: Vec3) -> (f32, f32) {
        let clip = self.camera.projection_matrix() * self.camera.view_matrix() * world.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let (w, h) = self.viewport;
        ((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h)
    }

    /// Model matrices of all renderables, in world space, ready for upload.
    pub fn instances(&self, out: &mut Vec<InstanceRaw>) {
        let group = self.group_world_transform();
        out.clear();
        out.extend(self.renderables.iter().map(|r| InstanceRaw {
            model: (group * r.transform.matrix()).to_cols_array_2d(),
        }));
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_renderable(
        &mut self,
        geometry: GeometryDesc,
        material: MaterialDesc<'_>,
    ) -> RenderHandle {
        let handle = RenderHandle(self.renderables.len() as u32);
        self.renderables.push(Renderable {
            geometry,
            transform: Transform {
                scale: 0.0,
                ..Transform::default()
            },
            textured: matches!(material, MaterialDesc::Photo { .. }),
        });
        handle
    }

    fn set_transform(&mut self, handle: RenderHandle, transform: &Transform) {
        if let Some(r) = self.renderables.get_mut(handle.0 as usize) {
            r.transform = *transform;
        }
    }

    fn screen_ray(&self, x: f32, y: f32) -> Ray {
        self.camera.screen_ray(x, y, self.viewport.0, self.viewport.1)
    }

    fn raycast(&self, ray: &Ray, candidates: &[RenderHandle]) -> Vec<(RenderHandle, f32)> {
        let local = ray.transformed(&self.group_inverse_world_transform());
        let mut by_handle: FnvHashMap<RenderHandle, f32> = FnvHashMap::default();
        for &handle in candidates {
            let Some(r) = self.renderables.get(handle.0 as usize) else {
                continue;
            };
            let radius = r.geometry.bounding_radius() * r.transform.scale * PICK_SPHERE_RADIUS;
            if radius <= 0.0 {
                continue;
            }
            if let Some(t) = ray_sphere(local.origin, local.direction, r.transform.position, radius)
            {
                by_handle.insert(handle, t);
            }
        }
        let mut hits: Vec<(RenderHandle, f32)> = by_handle.into_iter().collect();
        sort_hits(&mut hits);
        hits
    }

    fn camera_world_position(&self) -> Vec3 {
        self.camera.eye
    }

    fn camera_world_direction(&self) -> Vec3 {
        self.camera.forward()
    }

    fn group_inverse_world_transform(&self) -> Mat4 {
        self.group_world_transform().inverse()
    }
}
