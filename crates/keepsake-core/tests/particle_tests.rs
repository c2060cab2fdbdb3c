// Host-side tests for per-tick entity interpolation.

use glam::Vec3;
use keepsake_core::*;

const COMPACT: Vec3 = Vec3::new(1.0, -2.0, 0.5);
const DISPERSED: Vec3 = Vec3::new(10.0, 4.0, -6.0);

fn particle(id: u32, category: Category, base_scale: f32) -> Particle {
    Particle::new(
        EntityId(id),
        RenderHandle(id),
        category,
        Placement {
            compact: COMPACT,
            dispersed: DISPERSED,
        },
        base_scale,
        Vec3::new(0.4, -0.2, 0.1),
        category.is_photo().then(|| "caption".to_string()),
    )
}

fn ctx(mode: Mode) -> FrameContext {
    FrameContext {
        mode,
        elapsed: 0.0,
        focus_point: Vec3::new(0.0, 1.0, 18.0),
        camera_position: Vec3::new(6.0, 4.0, 26.0),
    }
}

fn run(p: &mut Particle, c: &FrameContext, ticks: usize, dt: f32) {
    for _ in 0..ticks {
        p.update(dt, c);
    }
}

#[test]
fn position_moves_a_rate_fraction_of_the_gap_per_tick() {
    let mut p = particle(0, Category::Bauble, 0.5);
    p.update(0.1, &ctx(Mode::Dispersed));
    let expected = COMPACT + (DISPERSED - COMPACT) * 0.2;
    assert!(p.transform().position.distance(expected) < 1e-5);

    // The focused photo snaps faster (k = 5).
    let mut photo = particle(1, Category::Photo, 1.0);
    let c = ctx(Mode::Focus(EntityId(1)));
    photo.update(0.1, &c);
    let expected = COMPACT + (c.focus_point - COMPACT) * 0.5;
    assert!(photo.transform().position.distance(expected) < 1e-5);
}

#[test]
fn large_steps_never_overshoot_the_target() {
    let mut p = particle(0, Category::GiftBox, 0.5);
    p.update(5.0, &ctx(Mode::Dispersed));
    assert!(p.transform().position.distance(DISPERSED) < 1e-5);
    assert!((p.transform().scale - 0.5).abs() < 1e-6);
}

#[test]
fn compact_hides_dust_and_shows_ornaments() {
    let c = ctx(Mode::Compact);
    let mut dust = particle(0, Category::Dust, 0.1);
    let mut bauble = particle(1, Category::Bauble, 0.5);
    run(&mut dust, &c, 300, 1.0 / 60.0);
    run(&mut bauble, &c, 300, 1.0 / 60.0);
    assert!(dust.transform().scale < 1e-4);
    assert!((bauble.transform().scale - 0.5).abs() < 1e-3);
    assert!(bauble.transform().position.distance(COMPACT) < 1e-3);
}

#[test]
fn compact_spins_around_the_vertical_axis_and_unspins_the_others() {
    let mut p = particle(0, Category::CandyCane, 0.5);
    run(&mut p, &ctx(Mode::Dispersed), 20, 0.05);
    let tumbled = p.transform().rotation;
    assert!(tumbled.x.abs() > 0.1 && tumbled.z.abs() > 0.01);

    let c = ctx(Mode::Compact);
    let before = p.transform().rotation;
    p.update(0.1, &c);
    let after = p.transform().rotation;
    let dy = (after.y - before.y).rem_euclid(std::f32::consts::TAU);
    assert!((dy - 0.05).abs() < 1e-4, "vertical spin step {dy}");
    assert!(after.x.abs() < before.x.abs());
    assert!(after.z.abs() < before.z.abs());

    run(&mut p, &c, 600, 1.0 / 60.0);
    assert!(p.transform().rotation.x.abs() < 1e-3);
    assert!(p.transform().rotation.z.abs() < 1e-3);
}

#[test]
fn dispersed_enlarges_photos_and_pulses_dust() {
    let mut photo = particle(0, Category::Photo, 1.0);
    run(&mut photo, &ctx(Mode::Dispersed), 300, 1.0 / 60.0);
    assert!((photo.transform().scale - 2.5).abs() < 1e-3);

    let dust = particle(7, Category::Dust, 0.1);
    let mut seen_lo = f32::MAX;
    let mut seen_hi = f32::MIN;
    for i in 0..400 {
        let c = FrameContext {
            elapsed: i as f32 * 0.01,
            ..ctx(Mode::Dispersed)
        };
        let s = dust.target_scale(&c);
        assert!((0.04 - 1e-6..=0.12 + 1e-6).contains(&s), "pulse {s}");
        seen_lo = seen_lo.min(s);
        seen_hi = seen_hi.max(s);
    }
    assert!(seen_lo < 0.05, "pulse low {seen_lo}");
    assert!(seen_hi > 0.11, "pulse high {seen_hi}");
}

#[test]
fn dust_pulses_are_out_of_phase_between_entities() {
    let c = FrameContext {
        elapsed: 1.0,
        ..ctx(Mode::Dispersed)
    };
    let a = particle(3, Category::Dust, 0.1).target_scale(&c);
    let b = particle(4, Category::Dust, 0.1).target_scale(&c);
    assert!((a - b).abs() > 1e-4);
}

#[test]
fn focus_enlarges_the_target_and_shrinks_everything_else() {
    let c = ctx(Mode::Focus(EntityId(1)));
    let mut target = particle(1, Category::Photo, 1.0);
    let mut other_photo = particle(2, Category::Photo, 1.0);
    let mut bauble = particle(3, Category::Bauble, 0.5);
    for p in [&mut target, &mut other_photo, &mut bauble] {
        run(p, &c, 400, 1.0 / 60.0);
    }
    assert!((target.transform().scale - 4.5).abs() < 1e-3);
    assert!(target.transform().position.distance(c.focus_point) < 1e-3);
    assert!((other_photo.transform().scale - 0.8).abs() < 1e-3);
    assert!(other_photo.transform().position.distance(DISPERSED) < 1e-3);
    assert!((bauble.transform().scale - 0.4).abs() < 1e-3);
}

#[test]
fn focused_photo_turns_to_face_the_camera() {
    let c = ctx(Mode::Focus(EntityId(1)));
    let mut target = particle(1, Category::Photo, 1.0);
    run(&mut target, &c, 400, 1.0 / 60.0);
    let t = target.transform();
    let facing = t.rotation_quat() * Vec3::Z;
    let to_camera = (c.camera_position - t.position).normalize();
    assert!(facing.dot(to_camera) > 0.999, "facing {facing:?} vs {to_camera:?}");
}

#[test]
fn update_is_deterministic() {
    let mut a = particle(5, Category::Dust, 0.1);
    let mut b = particle(5, Category::Dust, 0.1);
    for (i, mode) in [Mode::Dispersed, Mode::Focus(EntityId(9)), Mode::Compact]
        .into_iter()
        .enumerate()
    {
        let c = FrameContext {
            elapsed: i as f32,
            ..ctx(mode)
        };
        run(&mut a, &c, 50, 0.02);
        run(&mut b, &c, 50, 0.02);
    }
    assert_eq!(a.transform(), b.transform());
}

#[test]
fn mode_switch_mid_motion_blends_from_the_current_state() {
    let mut p = particle(0, Category::Bauble, 0.5);
    run(&mut p, &ctx(Mode::Dispersed), 10, 0.05);
    let mid = p.transform().position;
    p.update(0.01, &ctx(Mode::Compact));
    let step = p.transform().position.distance(mid);
    assert!(step < mid.distance(COMPACT) * 0.05, "jumped {step}");
}

#[test]
fn pulse_phase_survives_long_sessions() {
    let dust = particle(7, Category::Dust, 0.1);
    let period = std::f64::consts::TAU / f64::from(DUST_PULSE_FREQUENCY);
    // Ten hours in, the folded clock lands on the same pulse as the start.
    let late = 1.0 + 5729.0 * period;
    assert!(late > 36_000.0);
    let t = pulse_time(late);
    assert!((0.0..period as f32 + 1e-4).contains(&t), "folded {t}");

    let at = |elapsed: f32| {
        dust.target_scale(&FrameContext {
            elapsed,
            ..ctx(Mode::Dispersed)
        })
    };
    assert!((at(t) - at(pulse_time(1.0))).abs() < 1e-4);
}

#[test]
fn entity_ids_come_from_indices_until_u32_runs_out() {
    assert_eq!(EntityId::from_index(0), Some(EntityId(0)));
    assert_eq!(EntityId::from_index(u32::MAX as usize), Some(EntityId(u32::MAX)));
    #[cfg(target_pointer_width = "64")]
    assert_eq!(EntityId::from_index(u32::MAX as usize + 1), None);
}
