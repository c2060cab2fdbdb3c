use std::time::Duration;

use glam::Vec3;

// Shared tuning constants for placement, motion and interaction.

// Formation layout
pub const TREE_HEIGHT: f32 = 14.0; // compact spiral height H
pub const TREE_RADIUS: f32 = 5.5; // compact spiral base radius R
pub const SPIRAL_TURNS_PI: f32 = 50.0; // spiral angle spans t' * 50pi
pub const HEIGHT_BIAS_EXPONENT: f32 = 0.8; // t' = t^0.8, denser near the base
pub const MIN_SPIRAL_RADIUS: f32 = 0.5;
pub const RADIUS_JITTER: (f32, f32) = (0.8, 1.2);

// Dispersed shells
pub const SHELL_RADIUS: (f32, f32) = (8.0, 20.0);
pub const DUST_SHELL_RADIUS: (f32, f32) = (12.0, 32.0);

// Motion
pub const POSITION_RATE: f32 = 2.0; // exponential approach rate toward target position
pub const FOCUS_POSITION_RATE: f32 = 5.0; // faster snap for the focused photo
pub const SCALE_RATE: f32 = 4.0;
pub const COMPACT_SPIN_Y: f32 = 0.5; // rad/s around the vertical axis while compact
pub const UNSPIN_RATE: f32 = 2.0; // x/z rotation decay toward zero while compact
pub const FACE_CAMERA_RATE: f32 = 5.0;

// Scale rules
pub const PHOTO_DISPERSED_SCALE: f32 = 2.5; // multiplier for readability
pub const FOCUS_SCALE: f32 = 4.5; // absolute
pub const FOCUS_BACKGROUND_SCALE: f32 = 0.8; // multiplier for everything else in focus
pub const DUST_PULSE_BASE: f32 = 0.8;
pub const DUST_PULSE_AMPLITUDE: f32 = 0.4;
pub const DUST_PULSE_FREQUENCY: f32 = 4.0;

// Spin
pub const SPIN_RATE_MAX: f32 = 1.0; // per-axis magnitude for ornaments and dust
pub const PHOTO_SPIN_RATE_MAX: f32 = 0.3;

// Base scale ranges per category
pub const BAUBLE_SCALE: (f32, f32) = (0.35, 0.6);
pub const GIFT_BOX_SCALE: (f32, f32) = (0.4, 0.7);
pub const CANDY_CANE_SCALE: (f32, f32) = (0.45, 0.75);
pub const DUST_SCALE: (f32, f32) = (0.05, 0.14);
pub const PHOTO_SCALE: f32 = 1.0;

// Camera and focus
pub const CAMERA_EYE: [f32; 3] = [0.0, 2.0, 38.0];
pub const FOCUS_DISTANCE: f32 = 12.0; // world units in front of the camera
pub const GROUP_SPIN_RATE: f32 = 0.12; // rad/s orbit of the parent group (headless backend)

// Interaction
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(300);
pub const PICK_SPHERE_RADIUS: f32 = 0.6; // ray-sphere radius per unit of scale

// Population
pub const DEFAULT_ORNAMENT_COUNT: usize = 420;
pub const DEFAULT_DUST_COUNT: usize = 900;

#[inline]
pub fn camera_eye_vec3() -> Vec3 {
    Vec3::new(CAMERA_EYE[0], CAMERA_EYE[1], CAMERA_EYE[2])
}

// Palette
pub const ORNAMENT_PALETTE: [[f32; 3]; 5] = [
    [0.85, 0.12, 0.14], // cranberry
    [0.95, 0.75, 0.25], // gold
    [0.12, 0.45, 0.22], // pine
    [0.9, 0.9, 0.92],   // frost
    [0.55, 0.1, 0.45],  // plum
];
pub const DUST_COLOR: [f32; 3] = [1.0, 0.92, 0.7];
