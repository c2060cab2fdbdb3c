//! Procedural placement of entities in the two static formations.
//!
//! Both functions are pure apart from the random draws they take from the
//! caller's generator, and are called exactly once per entity at creation.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use crate::constants::*;

/// Point on the compact spiral of height `height` and base radius `radius`.
///
/// The height parameter is biased toward the base and the spiral makes many
/// overlapping turns with a random phase so no seam is visible. The result
/// satisfies `|y| <= height / 2` and a radial distance of at most
/// `1.2 * max(0.5, radius)`.
pub fn compact_position<R: Rng + ?Sized>(rng: &mut R, height: f32, radius: f32) -> Vec3 {
    let t: f32 = rng.gen();
    let t_biased = t.powf(HEIGHT_BIAS_EXPONENT);
    let y = t_biased * height - height / 2.0;
    let r_max = (radius * (1.0 - t_biased)).max(MIN_SPIRAL_RADIUS);
    let angle = t_biased * SPIRAL_TURNS_PI * PI + rng.gen_range(0.0..PI);
    let r = r_max * rng.gen_range(RADIUS_JITTER.0..=RADIUS_JITTER.1);
    Vec3::new(angle.cos() * r, y, angle.sin() * r)
}

/// Uniform point on a spherical shell; dust uses a wider, outer shell.
pub fn dispersed_position<R: Rng + ?Sized>(rng: &mut R, is_dust: bool) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let (lo, hi) = if is_dust {
        DUST_SHELL_RADIUS
    } else {
        SHELL_RADIUS
    };
    let r = rng.gen_range(lo..=hi);
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

/// Both formation targets for one entity, drawn together at creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub compact: Vec3,
    pub dispersed: Vec3,
}

impl Placement {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, height: f32, radius: f32, is_dust: bool) -> Self {
        Self {
            compact: compact_position(rng, height, radius),
            dispersed: dispersed_position(rng, is_dust),
        }
    }
}
