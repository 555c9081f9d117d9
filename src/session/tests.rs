use super::*;
use crate::geometry::{OverlayParams, Rotation, SensorRect, SensorShape};
use crate::types::{PointerSample, TouchFrame};

fn engine() -> TouchSessionEngine {
    let mut engine = TouchSessionEngine::default();
    engine.set_geometry(SensorGeometry::new(OverlayParams {
        sensor_bounds: SensorRect::new(400, 1400, 600, 1600),
        sensor_shape: SensorShape::Rect,
        logical_display_width: 1080,
        logical_display_height: 2400,
        scale_factor: 1.0,
        rotation: Rotation::Rotation0,
    }));
    engine
}

fn down(t_ms: u64, x: f32, y: f32) -> TouchEvent {
    TouchEvent::Down(TouchFrame::single(t_ms, PointerSample::new(0, x, y).with_size(6.0, 9.0)))
}

fn moved(t_ms: u64, x: f32, y: f32) -> TouchEvent {
    TouchEvent::Move(TouchFrame::single(t_ms, PointerSample::new(0, x, y)))
}

fn up(t_ms: u64) -> TouchEvent {
    TouchEvent::Up(TouchFrame::single(t_ms, PointerSample::new(0, 0.0, 0.0)))
}

fn finger_downs(output: &SessionOutput) -> usize {
    output
        .actions
        .iter()
        .filter(|action| matches!(action, SessionAction::FingerDown(_)))
        .count()
}

fn finger_ups(output: &SessionOutput) -> usize {
    output
        .actions
        .iter()
        .filter(|action| {
            matches!(
                action,
                SessionAction::Release {
                    finger_was_down: true,
                    ..
                }
            )
        })
        .count()
}

#[test]
fn press_inside_emits_one_down_and_one_up() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(1);

    let out = engine.touch(1, &down(0, 500.0, 1500.0), gate);
    assert!(out.handled);
    assert_eq!(
        out.actions.first(),
        Some(&SessionAction::FingerDown(FingerDown {
            request_id: 1,
            point: NativePoint { x: 500, y: 1500 },
            minor: 6.0,
            major: 9.0,
            first_in_press: true,
        }))
    );
    assert_eq!(engine.phase(), SessionPhase::Illuminating);

    let out = engine.touch(1, &moved(250, 520.0, 1510.0), gate);
    assert_eq!(finger_downs(&out), 0);
    assert!(out.actions.is_empty());

    let out = engine.touch(1, &up(300), gate);
    assert_eq!(finger_ups(&out), 1);
    assert_eq!(engine.phase(), SessionPhase::ArmedNoPointer);
    assert!(engine.active_pointer().is_none());
}

#[test]
fn touches_before_open_are_rejected() {
    let mut engine = engine();
    let out = engine.touch(1, &down(0, 500.0, 1500.0), TouchGate::default());
    assert_eq!(out.rejection, Some(TouchRejection::NoActiveSession));
    assert!(out.actions.is_empty());
    assert_eq!(engine.phase(), SessionPhase::Idle);

    let out = engine.acquired(AcquiredInfo::Good);
    assert_eq!(out.rejection, Some(TouchRejection::NoActiveSession));
}

#[test]
fn stale_request_changes_nothing() {
    let mut engine = engine();
    engine.open(1);
    let out = engine.touch(7, &down(0, 500.0, 1500.0), TouchGate::default());
    assert_eq!(
        out.rejection,
        Some(TouchRejection::StaleEvent { event: 7, active: 1 })
    );
    assert!(out.actions.is_empty());
    assert_eq!(engine.phase(), SessionPhase::ArmedNoPointer);
    assert!(engine.active_pointer().is_none());
}

#[test]
fn slow_entry_from_outside_promotes_to_finger_down() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(3);

    let out = engine.touch(3, &down(0, 500.0, 1300.0), gate);
    assert!(out.actions.is_empty());
    assert!(!out.handled);
    assert_eq!(engine.phase(), SessionPhase::PointerDownOutside);

    // 110 px over 200 ms; the first sample falls out of the window.
    let out = engine.touch(3, &moved(200, 500.0, 1410.0), gate);
    assert_eq!(finger_downs(&out), 1);
    assert_eq!(engine.phase(), SessionPhase::Illuminating);
}

#[test]
fn swipe_across_sensor_never_illuminates() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(1);

    engine.touch(1, &down(0, 300.0, 1500.0), gate);
    let mut downs = 0;
    for step in 1..=6u64 {
        let x = 300.0 + 40.0 * step as f32;
        downs += finger_downs(&engine.touch(1, &moved(step * 10, x, 1500.0), gate));
    }
    assert_eq!(downs, 0);
    assert_eq!(engine.phase(), SessionPhase::PointerDownOutside);
}

#[test]
fn sliding_out_releases_and_reports_guidance() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), gate);

    let out = engine.touch(1, &moved(500, 500.0, 1700.0), gate);
    assert_eq!(finger_ups(&out), 1);
    let guidance = out.actions.iter().find_map(|action| match action {
        SessionAction::TouchOutsideSensor(guidance) => Some(*guidance),
        _ => None,
    });
    let guidance = guidance.expect("guidance emitted");
    assert_eq!((guidance.touch_x, guidance.touch_y), (500, 1700));
    assert!((guidance.distance - 200.0).abs() < 0.01);
    assert_eq!(engine.phase(), SessionPhase::PointerDownOutside);
    assert!(engine.active_pointer().is_some());

    // The final lift releases nothing more.
    let out = engine.touch(1, &up(900), gate);
    assert_eq!(finger_ups(&out), 0);
}

#[test]
fn slow_reentry_rearms_without_second_haptic() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), gate);
    engine.touch(1, &moved(500, 500.0, 1700.0), gate);

    let out = engine.touch(1, &moved(1_000, 500.0, 1500.0), gate);
    let Some(SessionAction::FingerDown(again)) = out.actions.first() else {
        panic!("expected re-arm, got {:?}", out.actions);
    };
    assert!(!again.first_in_press);
}

#[test]
fn acquisition_blocks_rearm_until_next_press() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), gate);

    let out = engine.acquired(AcquiredInfo::Partial);
    assert_eq!(out.actions.as_slice(), &[SessionAction::UnconfigureDisplay]);
    assert!(engine.acquired_received());
    assert_eq!(engine.phase(), SessionPhase::Illuminating);

    engine.touch(1, &moved(500, 500.0, 1700.0), gate);
    let out = engine.touch(1, &moved(1_000, 500.0, 1500.0), gate);
    assert_eq!(finger_downs(&out), 0);
    assert!(engine.acquired_received());

    engine.touch(1, &up(1_100), gate);
    let out = engine.touch(1, &down(2_000, 500.0, 1500.0), gate);
    assert_eq!(finger_downs(&out), 1);
    assert!(!engine.acquired_received());
}

#[test]
fn good_acquisition_notifies_overlay() {
    let mut engine = engine();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), TouchGate::default());
    let out = engine.acquired(AcquiredInfo::Good);
    assert_eq!(
        out.actions.as_slice(),
        &[SessionAction::UnconfigureDisplay, SessionAction::AcquiredGood]
    );
}

#[test]
fn start_and_vendor_codes_are_not_terminal() {
    let mut engine = engine();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), TouchGate::default());
    assert!(engine.acquired(AcquiredInfo::Start).actions.is_empty());
    assert!(engine.acquired(AcquiredInfo::Vendor).actions.is_empty());
    assert!(!engine.acquired_received());
}

#[test]
fn unknown_and_unlisted_codes_keep_illumination() {
    for code in [8, 11, 1_001] {
        let mut engine = engine();
        let gate = TouchGate::default();
        engine.open(1);
        engine.touch(1, &down(0, 500.0, 1500.0), gate);
        engine.touch(1, &moved(500, 500.0, 1700.0), gate);

        let out = engine.acquired(AcquiredInfo::from_code(code));
        assert!(out.actions.is_empty(), "code {code}: {:?}", out.actions);
        assert!(!engine.acquired_received(), "code {code}");

        let out = engine.touch(1, &moved(1_000, 500.0, 1500.0), gate);
        assert_eq!(finger_downs(&out), 1, "code {code}");
    }
}

#[test]
fn acquisition_codes_follow_platform_numbering() {
    assert_eq!(AcquiredInfo::from_code(7), AcquiredInfo::Start);
    assert_eq!(AcquiredInfo::from_code(8), AcquiredInfo::Unknown);
    assert_eq!(AcquiredInfo::from_code(9), AcquiredInfo::Immobile);
    assert_eq!(AcquiredInfo::from_code(10), AcquiredInfo::TooBright);
    assert_eq!(AcquiredInfo::from_code(11), AcquiredInfo::PowerPressed);
    assert_eq!(AcquiredInfo::from_code(1_001), AcquiredInfo::Other(1_001));
    assert!(AcquiredInfo::Immobile.is_terminal());
    assert!(AcquiredInfo::TooBright.is_terminal());
    assert!(!AcquiredInfo::PowerPressed.is_terminal());
}

#[test]
fn move_from_another_pointer_is_ignored() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), gate);

    let stranger = TouchEvent::Move(TouchFrame::single(10, PointerSample::new(4, 500.0, 1900.0)));
    let out = engine.touch(1, &stranger, gate);
    assert_eq!(out.rejection, Some(TouchRejection::UnknownPointer(4)));
    assert!(out.actions.is_empty());
    assert_eq!(engine.phase(), SessionPhase::Illuminating);

    let lift = TouchEvent::Up(TouchFrame::single(20, PointerSample::new(4, 0.0, 0.0)));
    let out = engine.touch(1, &lift, gate);
    assert_eq!(out.rejection, Some(TouchRejection::UnknownPointer(4)));
    assert_eq!(engine.phase(), SessionPhase::Illuminating);
}

#[test]
fn tracked_pointer_is_found_anywhere_in_the_frame() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), gate);

    let frame = TouchFrame::multi(
        500,
        0,
        &[PointerSample::new(2, 100.0, 100.0), PointerSample::new(0, 500.0, 1700.0)],
    );
    let out = engine.touch(1, &TouchEvent::Move(frame), gate);
    assert_eq!(finger_ups(&out), 1);
    assert_eq!(engine.phase(), SessionPhase::PointerDownOutside);
}

#[test]
fn paused_overlay_treats_sensor_as_outside() {
    let mut engine = engine();
    engine.open(1);
    let gate = TouchGate {
        pause_auth: true,
        can_dismiss_keyguard: false,
    };
    let out = engine.touch(1, &down(0, 500.0, 1500.0), gate);
    assert!(out.actions.is_empty());
    assert_eq!(engine.phase(), SessionPhase::PointerDownOutside);
}

#[test]
fn keyguard_dismiss_is_attempted_once_per_press() {
    let mut engine = engine();
    let gate = TouchGate {
        pause_auth: false,
        can_dismiss_keyguard: true,
    };
    engine.open(1);

    // The FingerDown already carries the press haptic.
    let quiet = SessionAction::DismissKeyguard {
        start_haptic: false,
    };
    let out = engine.touch(1, &down(0, 500.0, 1500.0), gate);
    assert_eq!(finger_downs(&out), 1);
    assert_eq!(out.actions.last(), Some(&quiet));

    let out = engine.touch(1, &moved(300, 505.0, 1500.0), gate);
    assert!(!out.actions.contains(&quiet));

    engine.touch(1, &up(400), gate);
    let out = engine.touch(1, &down(1_000, 500.0, 1500.0), gate);
    assert_eq!(out.actions.last(), Some(&quiet));
}

#[test]
fn dismiss_on_slide_in_plays_the_press_haptic_once() {
    let mut engine = engine();
    let gate = TouchGate {
        pause_auth: false,
        can_dismiss_keyguard: true,
    };
    engine.open(1);
    engine.touch(1, &down(0, 100.0, 1500.0), gate);

    let out = engine.touch(1, &moved(400, 500.0, 1500.0), gate);
    assert_eq!(
        out.actions.as_slice(),
        &[SessionAction::DismissKeyguard { start_haptic: true }]
    );
    assert_eq!(engine.phase(), SessionPhase::PointerDownOutside);

    // The FingerDown that follows in the same press stays silent.
    let out = engine.touch(1, &moved(800, 502.0, 1500.0), gate);
    let Some(SessionAction::FingerDown(down)) = out.actions.first() else {
        panic!("expected FingerDown, got {:?}", out.actions);
    };
    assert!(!down.first_in_press);
}

#[test]
fn cancel_and_hover_exit_end_the_press() {
    for lift in [TouchEvent::Cancel, TouchEvent::HoverExit] {
        let mut engine = engine();
        let gate = TouchGate::default();
        engine.open(1);
        engine.touch(1, &down(0, 500.0, 1500.0), gate);
        let out = engine.touch(1, &lift, gate);
        assert_eq!(finger_ups(&out), 1);
        assert_eq!(engine.phase(), SessionPhase::ArmedNoPointer);
    }
}

#[test]
fn hover_enter_inside_illuminates() {
    let mut engine = engine();
    engine.open(1);
    let hover = TouchEvent::HoverEnter(TouchFrame::single(0, PointerSample::new(0, 500.0, 1500.0)));
    let out = engine.touch(1, &hover, TouchGate::default());
    assert_eq!(finger_downs(&out), 1);
}

#[test]
fn second_down_while_illuminating_does_not_repeat_finger_down() {
    let mut engine = engine();
    let gate = TouchGate::default();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), gate);
    let out = engine.touch(1, &down(100, 510.0, 1500.0), gate);
    assert_eq!(finger_downs(&out), 0);
    assert_eq!(engine.phase(), SessionPhase::Illuminating);
}

#[test]
fn touch_outside_view_is_forwarded() {
    let mut engine = engine();
    engine.open(1);
    let out = engine.touch(1, &TouchEvent::Outside, TouchGate::default());
    assert_eq!(out.actions.as_slice(), &[SessionAction::TouchOutsideView]);
    assert!(out.handled);
}

#[test]
fn aod_finger_down_illuminates_without_pointer() {
    let mut engine = engine();
    engine.open(5);
    let out = engine.aod_finger_down(Some(5), NativePoint::default(), 0.0, 0.0);
    assert_eq!(finger_downs(&out), 1);
    assert_eq!(engine.phase(), SessionPhase::Illuminating);
    assert!(engine.active_pointer().is_none());

    // No pointer to lift; only a forced release ends it.
    let out = engine.touch(5, &up(10), TouchGate::default());
    assert!(matches!(out.rejection, Some(TouchRejection::UnknownPointer(_))));
    assert_eq!(engine.phase(), SessionPhase::Illuminating);

    let again = engine.aod_finger_down(None, NativePoint::default(), 0.0, 0.0);
    assert_eq!(finger_downs(&again), 0);

    let out = engine.release();
    assert_eq!(finger_ups(&out), 1);
    assert_eq!(engine.phase(), SessionPhase::ArmedNoPointer);
}

#[test]
fn close_forces_finger_up_and_clears_session() {
    let mut engine = engine();
    engine.open(1);
    engine.touch(1, &down(0, 500.0, 1500.0), TouchGate::default());
    engine.acquired(AcquiredInfo::Insufficient);

    let out = engine.close();
    assert_eq!(finger_ups(&out), 1);
    assert_eq!(engine.phase(), SessionPhase::Idle);
    assert_eq!(engine.request_id(), None);
    assert!(!engine.acquired_received());

    assert!(engine.close().actions.is_empty());
}

#[test]
fn release_when_not_illuminating_only_cleans_up() {
    let mut engine = engine();
    engine.open(1);
    let out = engine.release();
    assert_eq!(
        out.actions.as_slice(),
        &[SessionAction::Release {
            request_id: 1,
            finger_was_down: false,
        }]
    );
}
