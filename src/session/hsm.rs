use super::*;
use crate::pointer::PointerTracker;
use crate::types::{PointerSample, TouchFrame};
use statig::prelude::*;

mod core;

pub(super) struct TouchSession {
    pub(super) phase: SessionPhase,
    pub(super) request_id: Option<RequestId>,
    pub(super) tracker: PointerTracker,
    pub(super) acquired_received: bool,
    press_feedback_pending: bool,
    attempted_dismiss_keyguard: bool,
    last_touch_log_ms: Option<u64>,
    min_touch_log_interval_ms: u64,
}

#[state_machine(initial = "State::idle()")]
impl TouchSession {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Open { request_id } => {
                self.open(*request_id);
                self.enter(SessionPhase::ArmedNoPointer)
            }
            SessionEvent::Touch { .. }
            | SessionEvent::Acquired(_)
            | SessionEvent::AodFingerDown { .. } => {
                context.reject(TouchRejection::NoActiveSession);
                Handled
            }
            SessionEvent::Release | SessionEvent::Close => Handled,
        }
    }

    #[state]
    fn armed_no_pointer(
        &mut self,
        context: &mut DispatchContext,
        event: &SessionEvent,
    ) -> Outcome<State> {
        let SessionEvent::Touch {
            request_id,
            touch,
            gate,
        } = event
        else {
            return self.session_event(context, event);
        };
        if !self.accepts(context, *request_id) {
            return Handled;
        }
        match touch {
            TouchEvent::Down(frame) | TouchEvent::HoverEnter(frame) => {
                self.pointer_down(context, frame, *gate)
            }
            TouchEvent::Move(frame) | TouchEvent::HoverMove(frame) => {
                self.reject_untracked(context, frame);
                Handled
            }
            TouchEvent::Up(_) | TouchEvent::Cancel | TouchEvent::HoverExit => {
                self.finish_press(context)
            }
            TouchEvent::Outside => self.touch_outside_view(context),
        }
    }

    #[state]
    fn pointer_down_outside(
        &mut self,
        context: &mut DispatchContext,
        event: &SessionEvent,
    ) -> Outcome<State> {
        let SessionEvent::Touch {
            request_id,
            touch,
            gate,
        } = event
        else {
            return self.session_event(context, event);
        };
        if !self.accepts(context, *request_id) {
            return Handled;
        }
        match touch {
            TouchEvent::Down(frame) | TouchEvent::HoverEnter(frame) => {
                self.pointer_down(context, frame, *gate)
            }
            TouchEvent::Move(frame) | TouchEvent::HoverMove(frame) => {
                let Some(sample) = self.tracked_sample(context, frame) else {
                    return Handled;
                };
                if !self.enters_sensor(context, &sample, *gate) {
                    self.tracker.record(frame.t_ms, sample.point);
                    return Handled;
                }
                if self.try_dismiss_keyguard(context, *gate) {
                    return Handled;
                }
                self.tracker.record(frame.t_ms, sample.point);
                let speed = self.tracker.speed();
                let fast = self.tracker.exceeds_threshold(speed);
                context.handled = true;
                if self.acquired_received || fast {
                    self.log_touch_move(frame.t_ms, &sample, speed, fast);
                    return Handled;
                }
                self.emit_sample_down(context, frame.t_ms, &sample, speed);
                self.enter(SessionPhase::Illuminating)
            }
            TouchEvent::Up(frame) => self.pointer_up(context, frame),
            TouchEvent::Cancel | TouchEvent::HoverExit => self.finish_press(context),
            TouchEvent::Outside => self.touch_outside_view(context),
        }
    }

    #[state]
    fn illuminating(
        &mut self,
        context: &mut DispatchContext,
        event: &SessionEvent,
    ) -> Outcome<State> {
        let SessionEvent::Touch {
            request_id,
            touch,
            gate,
        } = event
        else {
            return self.session_event(context, event);
        };
        if !self.accepts(context, *request_id) {
            return Handled;
        }
        match touch {
            TouchEvent::Down(frame) | TouchEvent::HoverEnter(frame) => {
                self.pointer_down(context, frame, *gate)
            }
            TouchEvent::Move(frame) | TouchEvent::HoverMove(frame) => {
                let Some(sample) = self.tracked_sample(context, frame) else {
                    return Handled;
                };
                if self.enters_sensor(context, &sample, *gate) {
                    if self.try_dismiss_keyguard(context, *gate) {
                        return Handled;
                    }
                    self.tracker.record(frame.t_ms, sample.point);
                    let speed = self.tracker.speed();
                    let fast = self.tracker.exceeds_threshold(speed);
                    context.handled = true;
                    self.log_touch_move(frame.t_ms, &sample, speed, fast);
                    return Handled;
                }
                // Sliding off the sensor ends illumination but keeps the pointer.
                self.tracker.record(frame.t_ms, sample.point);
                let guidance = self.guidance(&context.geometry, &sample);
                self.emit_release(context, true);
                context.emit(SessionAction::TouchOutsideSensor(guidance));
                self.enter(SessionPhase::PointerDownOutside)
            }
            TouchEvent::Up(frame) => self.pointer_up(context, frame),
            TouchEvent::Cancel | TouchEvent::HoverExit => self.finish_press(context),
            TouchEvent::Outside => self.touch_outside_view(context),
        }
    }
}

impl TouchSession {
    /// Events that behave the same in every non-idle state.
    fn session_event(
        &mut self,
        context: &mut DispatchContext,
        event: &SessionEvent,
    ) -> Outcome<State> {
        match event {
            SessionEvent::Open { request_id } => {
                // A second open while active is refused upstream; only log here.
                log::warn!(
                    "udfps: open_ignored request_id={} active={:?}",
                    request_id,
                    self.request_id
                );
                Handled
            }
            SessionEvent::Touch { .. } => Handled,
            SessionEvent::Acquired(info) => {
                self.on_acquired(context, *info);
                Handled
            }
            SessionEvent::AodFingerDown {
                request_id,
                point,
                minor,
                major,
            } => {
                if let Some(request_id) = request_id {
                    if !self.accepts(context, *request_id) {
                        return Handled;
                    }
                }
                if self.phase == SessionPhase::Illuminating {
                    log::debug!("udfps: aod_finger_down skipped reason=already_illuminating");
                    return Handled;
                }
                self.press_feedback_pending = true;
                self.emit_finger_down(context, *point, *minor, *major);
                self.enter(SessionPhase::Illuminating)
            }
            SessionEvent::Release => self.force_release(context),
            SessionEvent::Close => {
                self.emit_release(context, self.phase == SessionPhase::Illuminating);
                self.close();
                self.enter(SessionPhase::Idle)
            }
        }
    }

    fn pointer_down(
        &mut self,
        context: &mut DispatchContext,
        frame: &TouchFrame,
        gate: TouchGate,
    ) -> Outcome<State> {
        let Some(sample) = frame.primary().copied() else {
            return Handled;
        };
        self.begin_press(frame.t_ms, &sample);

        if !self.enters_sensor(context, &sample, gate) {
            if self.phase == SessionPhase::Illuminating {
                self.emit_release(context, true);
            }
            return self.enter(SessionPhase::PointerDownOutside);
        }

        context.handled = true;
        if self.phase == SessionPhase::Illuminating {
            log::debug!("udfps: finger_down skipped reason=already_illuminating");
        } else {
            self.emit_sample_down(context, frame.t_ms, &sample, 0.0);
        }
        self.try_dismiss_keyguard(context, gate);
        self.enter(SessionPhase::Illuminating)
    }

    fn pointer_up(&mut self, context: &mut DispatchContext, frame: &TouchFrame) -> Outcome<State> {
        let lifted = frame.action_pointer().map(|sample| sample.id);
        match (self.tracker.active(), lifted) {
            (Some(active), Some(pointer_id)) if active.pointer_id != pointer_id => {
                context.reject(TouchRejection::UnknownPointer(pointer_id));
                Handled
            }
            // AOD-origin illumination has no pointer; only the watchdog or a cancel ends it.
            (None, lifted) if self.phase == SessionPhase::Illuminating => {
                context.reject(TouchRejection::UnknownPointer(lifted.unwrap_or(-1)));
                Handled
            }
            _ => self.finish_press(context),
        }
    }

    /// End of the physical press.
    fn finish_press(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.attempted_dismiss_keyguard = false;
        self.force_release(context)
    }

    fn force_release(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.emit_release(context, self.phase == SessionPhase::Illuminating);
        self.tracker.end();
        self.acquired_received = false;
        self.press_feedback_pending = false;
        self.enter(SessionPhase::ArmedNoPointer)
    }

    fn touch_outside_view(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        context.emit(SessionAction::TouchOutsideView);
        context.handled = true;
        Handled
    }

    /// Records the phase mirror alongside the statig transition.
    fn enter(&mut self, phase: SessionPhase) -> Outcome<State> {
        if self.phase != phase {
            log::debug!("udfps: phase from={:?} to={:?}", self.phase, phase);
        }
        self.phase = phase;
        Transition(match phase {
            SessionPhase::Idle => State::idle(),
            SessionPhase::ArmedNoPointer => State::armed_no_pointer(),
            SessionPhase::PointerDownOutside => State::pointer_down_outside(),
            SessionPhase::Illuminating => State::illuminating(),
        })
    }
}
