// Host-side tests for the formation mode state machine.

use keepsake_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rng() -> StdRng {
    StdRng::seed_from_u64(11)
}

#[test]
fn starts_compact_without_a_target() {
    let modes = ModeController::new();
    assert_eq!(modes.mode(), Mode::Compact);
    assert_eq!(modes.focus_target(), None);
}

#[test]
fn focus_without_photos_falls_back_to_compact_from_any_state() {
    let mut rng = rng();
    let photos = [EntityId(4)];
    for prior in [
        ModeRequest::Compact,
        ModeRequest::Dispersed,
        ModeRequest::Focus(Some(EntityId(4))),
    ] {
        let mut modes = ModeController::new();
        modes.request(prior, &photos, &mut rng);
        for request in [ModeRequest::Focus(None), ModeRequest::Focus(Some(EntityId(4)))] {
            let t = modes.request(request, &[], &mut rng);
            assert_eq!(t.to, Mode::Compact, "after {prior:?} then {request:?}");
            assert!(t.fell_back);
            assert_eq!(modes.focus_target(), None);
        }
    }
}

#[test]
fn explicit_photo_target_is_honoured() {
    let mut modes = ModeController::new();
    let photos = [EntityId(3), EntityId(8)];
    let t = modes.request(ModeRequest::Focus(Some(EntityId(8))), &photos, &mut rng());
    assert_eq!(t.to, Mode::Focus(EntityId(8)));
    assert!(!t.fell_back);
    assert!(t.changed());
}

#[test]
fn non_photo_target_is_replaced_by_a_photo() {
    let mut modes = ModeController::new();
    let photos = [EntityId(3), EntityId(8)];
    modes.request(ModeRequest::Focus(Some(EntityId(1))), &photos, &mut rng());
    let target = modes.focus_target().expect("focus target");
    assert!(photos.contains(&target));
}

#[test]
fn random_focus_always_targets_exactly_one_photo() {
    let photos = [EntityId(2), EntityId(5), EntityId(9)];
    let mut seen = std::collections::HashSet::new();
    for seed in 0..64 {
        let mut modes = ModeController::new();
        modes.request(ModeRequest::Dispersed, &photos, &mut StdRng::seed_from_u64(seed));
        modes.request(ModeRequest::Focus(None), &photos, &mut StdRng::seed_from_u64(seed));
        let target = modes.focus_target().expect("focus target");
        assert!(photos.contains(&target));
        seen.insert(target);
    }
    assert_eq!(seen.len(), photos.len(), "every photo should be reachable");
}

#[test]
fn leaving_focus_clears_the_target() {
    let mut rng = rng();
    let photos = [EntityId(0)];
    for exit in [ModeRequest::Compact, ModeRequest::Dispersed] {
        let mut modes = ModeController::new();
        modes.request(ModeRequest::Focus(None), &photos, &mut rng);
        assert!(modes.focus_target().is_some());
        let t = modes.request(exit, &photos, &mut rng);
        assert_eq!(modes.focus_target(), None);
        assert_eq!(t.from, Mode::Focus(EntityId(0)));
    }
}

#[test]
fn compact_while_compact_is_a_no_op() {
    let mut modes = ModeController::new();
    let t = modes.request(ModeRequest::Compact, &[], &mut rng());
    assert!(!t.changed());
    assert!(!t.fell_back);
    assert_eq!(modes.mode(), Mode::Compact);
}

#[test]
fn mode_ids_map_to_requests() {
    assert_eq!(ModeRequest::from(ModeId::Compact), ModeRequest::Compact);
    assert_eq!(ModeRequest::from(ModeId::Dispersed), ModeRequest::Dispersed);
    assert_eq!(ModeRequest::from(ModeId::Focus), ModeRequest::Focus(None));
    assert_eq!(Mode::Focus(EntityId(1)).id(), ModeId::Focus);
}
