use super::*;

impl TouchSession {
    pub(crate) fn new(config: &UdfpsConfig) -> Self {
        Self {
            phase: SessionPhase::Idle,
            request_id: None,
            tracker: PointerTracker::new(config.velocity_horizon_ms, config.velocity_threshold),
            acquired_received: false,
            press_feedback_pending: false,
            attempted_dismiss_keyguard: false,
            last_touch_log_ms: None,
            min_touch_log_interval_ms: config.min_touch_log_interval_ms,
        }
    }

    pub(super) fn open(&mut self, request_id: RequestId) {
        self.request_id = Some(request_id);
        self.tracker.end();
        self.acquired_received = false;
        self.press_feedback_pending = false;
        self.attempted_dismiss_keyguard = false;
        self.last_touch_log_ms = None;
    }

    pub(super) fn close(&mut self) {
        self.request_id = None;
        self.tracker.end();
        self.acquired_received = false;
        self.press_feedback_pending = false;
        self.attempted_dismiss_keyguard = false;
    }

    /// A new physical press: the pointer from index 0 becomes the tracked one.
    pub(super) fn begin_press(&mut self, t_ms: u64, sample: &PointerSample) {
        self.tracker.begin(sample.id, t_ms);
        self.tracker.record(t_ms, sample.point);
        self.acquired_received = false;
        self.press_feedback_pending = true;
    }

    pub(super) fn accepts(&self, context: &mut DispatchContext, request_id: RequestId) -> bool {
        match self.request_id {
            Some(active) if active == request_id => true,
            Some(active) => {
                context.reject(TouchRejection::StaleEvent {
                    event: request_id,
                    active,
                });
                false
            }
            None => {
                context.reject(TouchRejection::NoActiveSession);
                false
            }
        }
    }

    /// The tracked pointer's sample in `frame`, wherever it sits in the pointer list.
    pub(super) fn tracked_sample(
        &self,
        context: &mut DispatchContext,
        frame: &TouchFrame,
    ) -> Option<PointerSample> {
        let found = frame
            .pointers
            .iter()
            .find(|sample| self.tracker.is_tracking(sample.id))
            .copied();
        if found.is_none() {
            self.reject_untracked(context, frame);
        }
        found
    }

    pub(super) fn reject_untracked(&self, context: &mut DispatchContext, frame: &TouchFrame) {
        let pointer_id = frame.action_pointer().map_or(-1, |sample| sample.id);
        context.reject(TouchRejection::UnknownPointer(pointer_id));
    }

    pub(super) fn enters_sensor(
        &self,
        context: &DispatchContext,
        sample: &PointerSample,
        gate: TouchGate,
    ) -> bool {
        !gate.pause_auth && context.geometry.contains(sample.point)
    }

    /// Asks the keyguard to dismiss once per press; true if it asked now.
    ///
    /// Without a FingerDown in this press the dismissal carries the press
    /// haptic, and a later FingerDown will not repeat it.
    pub(super) fn try_dismiss_keyguard(
        &mut self,
        context: &mut DispatchContext,
        gate: TouchGate,
    ) -> bool {
        if !gate.can_dismiss_keyguard || self.attempted_dismiss_keyguard {
            return false;
        }
        self.attempted_dismiss_keyguard = true;
        let start_haptic = self.phase != SessionPhase::Illuminating
            && std::mem::take(&mut self.press_feedback_pending);
        context.emit(SessionAction::DismissKeyguard { start_haptic });
        true
    }

    pub(super) fn emit_sample_down(
        &mut self,
        context: &mut DispatchContext,
        t_ms: u64,
        sample: &PointerSample,
        speed: f32,
    ) {
        let geometry = context.geometry;
        let point = geometry.to_native(sample.point);
        let minor = geometry.to_native_size(sample.touch_minor);
        let major = geometry.to_native_size(sample.touch_major);
        log::debug!(
            "udfps: finger_down x={} y={} minor={:.1} major={:.1} v={:.1}",
            point.x,
            point.y,
            minor,
            major,
            speed
        );
        self.last_touch_log_ms = Some(t_ms);
        self.emit_finger_down(context, point, minor, major);
    }

    pub(super) fn emit_finger_down(
        &mut self,
        context: &mut DispatchContext,
        point: NativePoint,
        minor: f32,
        major: f32,
    ) {
        let Some(request_id) = self.request_id else {
            return;
        };
        context.emit(SessionAction::FingerDown(FingerDown {
            request_id,
            point,
            minor,
            major,
            first_in_press: std::mem::take(&mut self.press_feedback_pending),
        }));
    }

    pub(super) fn emit_release(&mut self, context: &mut DispatchContext, finger_was_down: bool) {
        let Some(request_id) = self.request_id else {
            return;
        };
        if finger_was_down {
            log::debug!("udfps: finger_up request_id={}", request_id);
        }
        context.emit(SessionAction::Release {
            request_id,
            finger_was_down,
        });
    }

    pub(super) fn on_acquired(&mut self, context: &mut DispatchContext, info: AcquiredInfo) {
        if !info.is_terminal() {
            return;
        }
        self.acquired_received = true;
        context.emit(SessionAction::UnconfigureDisplay);
        if info.is_good() {
            context.emit(SessionAction::AcquiredGood);
        }
    }

    pub(super) fn guidance(&self, geometry: &SensorGeometry, sample: &PointerSample) -> SensorGuidance {
        let touch = geometry.to_native(sample.point);
        let (sensor_x, sensor_y) = geometry.native_sensor_center();
        let dx = touch.x as f32 - sensor_x;
        let dy = touch.y as f32 - sensor_y;
        SensorGuidance {
            touch_x: touch.x,
            touch_y: touch.y,
            sensor_x,
            sensor_y,
            distance: (dx * dx + dy * dy).sqrt(),
            rotation: geometry.params().rotation,
        }
    }

    pub(super) fn log_touch_move(&mut self, t_ms: u64, sample: &PointerSample, speed: f32, fast: bool) {
        let due = self.last_touch_log_ms.is_none_or(|last| {
            t_ms.saturating_sub(last) >= self.min_touch_log_interval_ms
        });
        if !due {
            return;
        }
        self.last_touch_log_ms = Some(t_ms);
        log::trace!(
            "udfps: finger_move minor={:.1} major={:.1} v={:.1} exceeds_velocity_threshold={} acquired_received={}",
            sample.touch_minor,
            sample.touch_major,
            speed,
            fast,
            self.acquired_received
        );
    }
}
