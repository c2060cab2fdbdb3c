use std::f32::consts::{PI, TAU};

use glam::{EulerRot, Mat3, Quat, Vec3};

use crate::backend::RenderHandle;
use crate::constants::*;
use crate::mode::Mode;
use crate::placement::Placement;
use crate::state::Transform;

/// Stable opaque identifier, compared by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The id for the entity at `index` in the append-only entity set, or
    /// `None` once the set has outgrown `u32`.
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(EntityId)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Bauble,
    GiftBox,
    CandyCane,
    Dust,
    Photo,
}

impl Category {
    pub const ORNAMENTS: [Category; 3] = [Category::Bauble, Category::GiftBox, Category::CandyCane];

    pub fn is_dust(self) -> bool {
        matches!(self, Category::Dust)
    }

    pub fn is_photo(self) -> bool {
        matches!(self, Category::Photo)
    }
}

/// Per-tick inputs shared by every entity.
///
/// `focus_point` and `camera_position` are already expressed in the parent
/// group's local frame for the current tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    pub mode: Mode,
    pub elapsed: f32,
    pub focus_point: Vec3,
    pub camera_position: Vec3,
}

/// Fold session time into one dust pulse period so `FrameContext::elapsed`
/// keeps full `f32` precision in long sessions.
pub fn pulse_time(elapsed: f64) -> f32 {
    let period = std::f64::consts::TAU / f64::from(DUST_PULSE_FREQUENCY);
    elapsed.rem_euclid(period) as f32
}

/// One displayed entity: static creation data plus its live transform.
#[derive(Clone, Debug)]
pub struct Particle {
    id: EntityId,
    handle: RenderHandle,
    category: Category,
    placement: Placement,
    base_scale: f32,
    spin_rate: Vec3,
    phase: f32,
    caption: Option<String>,
    transform: Transform,
}

impl Particle {
    pub fn new(
        id: EntityId,
        handle: RenderHandle,
        category: Category,
        placement: Placement,
        base_scale: f32,
        spin_rate: Vec3,
        caption: Option<String>,
    ) -> Self {
        // Golden-angle spacing keeps neighbouring ids out of phase.
        let phase = (id.0 as f32 * 2.399_963).rem_euclid(TAU);
        Self {
            id,
            handle,
            category,
            placement,
            base_scale,
            spin_rate,
            phase,
            caption,
            transform: Transform {
                position: placement.compact,
                rotation: Vec3::ZERO,
                scale: 0.0,
            },
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }
    pub fn handle(&self) -> RenderHandle {
        self.handle
    }
    pub fn category(&self) -> Category {
        self.category
    }
    pub fn is_dust(&self) -> bool {
        self.category.is_dust()
    }
    pub fn is_photo(&self) -> bool {
        self.category.is_photo()
    }
    pub fn compact_position(&self) -> Vec3 {
        self.placement.compact
    }
    pub fn dispersed_position(&self) -> Vec3 {
        self.placement.dispersed
    }
    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }
    pub fn spin_rate(&self) -> Vec3 {
        self.spin_rate
    }
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    fn is_focus_target(&self, mode: Mode) -> bool {
        mode.focus_target() == Some(self.id)
    }

    /// Position this entity is heading for under `ctx`.
    pub fn target_position(&self, ctx: &FrameContext) -> Vec3 {
        match ctx.mode {
            Mode::Compact => self.placement.compact,
            Mode::Dispersed => self.placement.dispersed,
            Mode::Focus(_) if self.is_focus_target(ctx.mode) => ctx.focus_point,
            Mode::Focus(_) => self.placement.dispersed,
        }
    }

    /// Scale this entity is heading for under `ctx`.
    pub fn target_scale(&self, ctx: &FrameContext) -> f32 {
        match ctx.mode {
            Mode::Compact if self.is_dust() => 0.0,
            Mode::Compact => self.base_scale,
            Mode::Dispersed => match self.category {
                Category::Photo => self.base_scale * PHOTO_DISPERSED_SCALE,
                Category::Dust => {
                    let wave = (DUST_PULSE_FREQUENCY * ctx.elapsed + self.phase).sin();
                    self.base_scale * (DUST_PULSE_BASE + DUST_PULSE_AMPLITUDE * wave)
                }
                _ => self.base_scale,
            },
            Mode::Focus(_) if self.is_focus_target(ctx.mode) => FOCUS_SCALE,
            Mode::Focus(_) => self.base_scale * FOCUS_BACKGROUND_SCALE,
        }
    }

    /// Advance one tick. Deterministic given `dt` and `ctx`.
    pub fn update(&mut self, dt: f32, ctx: &FrameContext) {
        let focused = self.is_focus_target(ctx.mode);

        let k = if focused {
            FOCUS_POSITION_RATE
        } else {
            POSITION_RATE
        };
        let target = self.target_position(ctx);
        self.transform.position = self.transform.position.lerp(target, approach(k, dt));

        let target_scale = self.target_scale(ctx);
        let s = self.transform.scale;
        self.transform.scale = s + (target_scale - s) * approach(SCALE_RATE, dt);

        let rot = &mut self.transform.rotation;
        match ctx.mode {
            Mode::Compact => {
                rot.y = wrap_angle(rot.y + COMPACT_SPIN_Y * dt);
                let a = approach(UNSPIN_RATE, dt);
                rot.x -= rot.x * a;
                rot.z -= rot.z * a;
            }
            Mode::Focus(_) if focused => {
                let facing = face_towards(ctx.camera_position - self.transform.position);
                let current = Quat::from_euler(EulerRot::XYZ, rot.x, rot.y, rot.z);
                let next = current.slerp(facing, approach(FACE_CAMERA_RATE, dt));
                let (x, y, z) = next.to_euler(EulerRot::XYZ);
                *rot = Vec3::new(x, y, z);
            }
            Mode::Dispersed | Mode::Focus(_) => {
                let spun = *rot + self.spin_rate * dt;
                *rot = Vec3::new(wrap_angle(spun.x), wrap_angle(spun.y), wrap_angle(spun.z));
            }
        }
    }
}

/// Fraction of the remaining distance covered this tick at rate `k`.
#[inline]
fn approach(k: f32, dt: f32) -> f32 {
    (k * dt).clamp(0.0, 1.0)
}

#[inline]
fn wrap_angle(a: f32) -> f32 {
    (a + PI).rem_euclid(TAU) - PI
}

/// Orientation whose local +Z points along `dir`, kept upright where possible.
fn face_towards(dir: Vec3) -> Quat {
    let z = dir.normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let x = Vec3::Y.cross(z);
    if x.length_squared() < 1e-6 {
        return Quat::from_rotation_arc(Vec3::Z, z);
    }
    let x = x.normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}
