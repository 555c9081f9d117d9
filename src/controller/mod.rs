//! UI-domain owner of the touch session.
//!
//! Every public method that mutates state must be called on the thread that
//! built the controller; hardware callbacks reach it through [`HardwareInbox`].

use std::rc::Rc;
use std::sync::Arc;

use crate::collaborators::{HapticEffect, HapticUsage, Overlay, Platform, WakeReason};
use crate::config::UdfpsConfig;
use crate::dispatch::{DriverRoute, FingerObserver, ObserverHandle, SessionDispatcher};
use crate::error::{ConfigError, SessionError, TouchRejection};
use crate::geometry::{OverlayParams, SensorGeometry};
use crate::runtime::{Execution, HardwareInbox, HardwareSignal};
use crate::session::{SessionAction, SessionOutput, SessionPhase, TouchGate, TouchSessionEngine};
use crate::types::{AcquiredInfo, DisplayReady, NativePoint, RequestId, RequestReason, TouchEvent};
use crate::watchdog::{AodDecision, AodRequest, AodWatchdog, TimerTask, UiTimerQueue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayRequest {
    pub request_id: RequestId,
    pub reason: RequestReason,
}

struct ActiveOverlay {
    request: OverlayRequest,
    view: Box<dyn Overlay>,
}

pub struct UdfpsController {
    config: UdfpsConfig,
    execution: Execution,
    session: TouchSessionEngine,
    dispatcher: SessionDispatcher,
    watchdog: AodWatchdog,
    timers: UiTimerQueue,
    platform: Platform,
    hardware: Arc<HardwareInbox>,
    overlay: Option<ActiveOverlay>,
    overlay_params: OverlayParams,
    screen_off_udfps_enabled: bool,
}

impl UdfpsController {
    pub fn new(
        config: UdfpsConfig,
        route: DriverRoute,
        platform: Platform,
        hardware: Arc<HardwareInbox>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let dimming = config.dimming_table()?;
        let dispatcher = SessionDispatcher::new(config.sensor_id, route, dimming);
        let screen_on = platform.settings.is_screen_on();
        log::debug!("udfps: controller_init screen_on={}", screen_on);
        let mut controller = Self {
            execution: Execution::current(),
            session: TouchSessionEngine::new(&config),
            dispatcher,
            watchdog: AodWatchdog::with_screen_state(config.aod_interrupt_timeout_ms, screen_on),
            timers: UiTimerQueue::new(),
            platform,
            hardware,
            overlay: None,
            overlay_params: OverlayParams::default(),
            screen_off_udfps_enabled: false,
            config,
        };
        controller.refresh_screen_off_udfps();
        Ok(controller)
    }

    pub fn config(&self) -> &UdfpsConfig {
        &self.config
    }

    pub fn hardware_inbox(&self) -> Arc<HardwareInbox> {
        Arc::clone(&self.hardware)
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.session.request_id()
    }

    pub fn is_finger_down(&self) -> bool {
        self.session.is_finger_down()
    }

    pub fn is_overlay_showing(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn is_aod_interrupt_active(&self) -> bool {
        self.watchdog.is_active()
    }

    pub fn is_screen_off_udfps_enabled(&self) -> bool {
        self.screen_off_udfps_enabled
    }

    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn subscribe(&mut self, observer: Rc<dyn FingerObserver>) -> ObserverHandle {
        self.execution.assert_is_main_thread();
        self.dispatcher.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, handle: ObserverHandle) -> bool {
        self.execution.assert_is_main_thread();
        self.dispatcher.unsubscribe(handle)
    }

    pub fn observer_count(&self) -> usize {
        self.dispatcher.observer_count()
    }

    /// Re-reads the screen-off UDFPS user setting.
    pub fn refresh_screen_off_udfps(&mut self) {
        self.screen_off_udfps_enabled =
            self.config.supports_screen_off_udfps && self.platform.settings.screen_off_udfps_enabled();
    }

    /// Returns whether the params were applied; a showing overlay is redrawn.
    pub fn update_overlay_params(&mut self, now_ms: u64, sensor_id: i32, params: OverlayParams) -> bool {
        self.execution.assert_is_main_thread();
        if sensor_id != self.config.sensor_id {
            log::warn!(
                "udfps: overlay_params ignored sensor_id={} expected={}",
                sensor_id,
                self.config.sensor_id
            );
            return false;
        }
        if params == self.overlay_params {
            return false;
        }
        self.overlay_params = params;
        self.session.set_geometry(SensorGeometry::new(params));

        if self.overlay.is_some() {
            log::debug!("udfps: overlay_redraw rotation={:?}", params.rotation);
            let output = self.session.release();
            self.apply(now_ms, &output);
            if let Some(active) = self.overlay.as_mut() {
                active.view.hide();
                active.view.show(&params);
            }
        }
        true
    }

    pub fn show_overlay(
        &mut self,
        request: OverlayRequest,
        mut view: Box<dyn Overlay>,
    ) -> Result<(), SessionError> {
        self.execution.assert_is_main_thread();
        if let Some(active) = &self.overlay {
            return Err(SessionError::SessionActive {
                active: active.request.request_id,
                requested: request.request_id,
            });
        }
        if request.reason == RequestReason::AuthKeyguard
            && !self.platform.keyguard.is_fingerprint_detection_running()
        {
            return Err(SessionError::DetectionIdle(request.request_id));
        }

        if !view.show(&self.overlay_params) {
            log::warn!("udfps: overlay_show already_showing request_id={}", request.request_id);
        }
        log::debug!(
            "udfps: overlay_show request_id={} reason={:?}",
            request.request_id,
            request.reason
        );
        self.overlay = Some(ActiveOverlay { request, view });
        let output = self.session.open(request.request_id);
        self.apply(0, &output);
        Ok(())
    }

    /// Forces FingerUp, then removes the overlay. Returns false if none was showing.
    pub fn hide_overlay(&mut self, now_ms: u64) -> bool {
        self.execution.assert_is_main_thread();
        if self.overlay.is_none() {
            return false;
        }
        let output = self.session.close();
        self.apply(now_ms, &output);
        self.watchdog.on_cancel(&mut self.timers);

        let Some(mut active) = self.overlay.take() else {
            return false;
        };
        if self.platform.keyguard.is_showing_alternate_auth() {
            self.platform.keyguard.reset_alternate_auth();
        }
        if !active.view.hide() {
            log::warn!("udfps: overlay_hide not_showing request_id={}", active.request.request_id);
        }
        log::debug!("udfps: overlay_hide request_id={}", active.request.request_id);
        true
    }

    /// Returns whether the sensor consumed the touch.
    pub fn on_touch(
        &mut self,
        now_ms: u64,
        request_id: RequestId,
        event: &TouchEvent,
    ) -> Result<bool, TouchRejection> {
        self.execution.assert_is_main_thread();
        self.pump_hardware(now_ms);
        self.timers.set_now(now_ms);

        let gate = match &self.overlay {
            Some(active) => TouchGate {
                pause_auth: active.view.should_pause_auth(),
                can_dismiss_keyguard: active.view.is_keyguard_surface()
                    && self.platform.keyguard.can_dismiss_lock_screen(),
            },
            None => TouchGate::default(),
        };
        let output = self.session.touch(request_id, event, gate);
        self.apply(now_ms, &output);
        match output.rejection {
            Some(rejection) => Err(rejection),
            None => Ok(output.handled),
        }
    }

    pub fn on_display_ready(&mut self, now_ms: u64, ready: DisplayReady) {
        self.execution.assert_is_main_thread();
        if self.session.request_id() != Some(ready.request_id) || !self.session.is_finger_down() {
            log::debug!(
                "udfps: display_ready dropped request_id={} active={:?}",
                ready.request_id,
                self.session.request_id()
            );
            return;
        }
        self.dispatcher.display_ready(now_ms, ready);
    }

    /// Applies every queued hardware signal; returns how many were handled.
    pub fn pump_hardware(&mut self, now_ms: u64) -> usize {
        self.execution.assert_is_main_thread();
        let mut handled = 0;
        while let Some(signal) = self.hardware.try_receive() {
            self.on_hardware_signal(now_ms, signal);
            handled += 1;
        }
        handled
    }

    pub fn on_hardware_signal(&mut self, now_ms: u64, signal: HardwareSignal) {
        self.execution.assert_is_main_thread();
        if signal.sensor_id() != self.config.sensor_id {
            log::debug!(
                "udfps: hardware_signal ignored sensor_id={} expected={}",
                signal.sensor_id(),
                self.config.sensor_id
            );
            return;
        }
        match signal {
            HardwareSignal::Acquired {
                info, vendor_code, ..
            } => self.on_acquired(now_ms, info, vendor_code),
            HardwareSignal::EnrollmentProgress { remaining, .. } => {
                if let Some(view) = self.visible_overlay("enrollment_progress") {
                    view.on_enrollment_progress(remaining);
                }
            }
            HardwareSignal::EnrollmentHelp { .. } => {
                if let Some(view) = self.visible_overlay("enrollment_help") {
                    view.on_enrollment_help();
                }
            }
            HardwareSignal::DebugMessage { message, .. } => {
                if let Some(view) = self.visible_overlay("debug_message") {
                    view.set_debug_message(message.as_str());
                }
            }
        }
    }

    pub fn on_aod_interrupt(&mut self, now_ms: u64, request: AodRequest) -> AodDecision {
        self.execution.assert_is_main_thread();
        self.timers.set_now(now_ms);
        let decision = self.watchdog.on_interrupt(
            request,
            self.session.is_finger_down(),
            self.platform.keyguard.is_fingerprint_detection_running(),
            &mut self.timers,
        );
        match decision {
            AodDecision::LockIconLongPress => {
                log::debug!("udfps: aod_interrupt lock_icon_long_press");
                self.platform.keyguard.show_bouncer();
                self.platform
                    .haptics
                    .vibrate(HapticEffect::Click, HapticUsage::Touch);
            }
            AodDecision::Armed(request) => self.synthesize_aod_down(now_ms, request),
            AodDecision::Deferred | AodDecision::Ignored => {}
        }
        decision
    }

    /// Forces FingerUp for the active session and resolves any AOD interrupt.
    pub fn on_cancel_udfps(&mut self, now_ms: u64) {
        self.execution.assert_is_main_thread();
        if self.overlay.is_some() {
            let output = self.session.release();
            self.apply(now_ms, &output);
        }
        if self.watchdog.on_cancel(&mut self.timers) {
            log::debug!("udfps: aod_interrupt resolved");
        }
    }

    pub fn on_screen_turned_on(&mut self, now_ms: u64) {
        self.execution.assert_is_main_thread();
        self.timers.set_now(now_ms);
        if let Some(request) = self.watchdog.on_screen_turned_on(&mut self.timers) {
            self.synthesize_aod_down(now_ms, request);
        }
    }

    pub fn on_screen_turned_off(&mut self) {
        self.execution.assert_is_main_thread();
        self.watchdog.on_screen_turned_off();
    }

    /// Dialog dismissal cancels every overlay except the keyguard's.
    pub fn on_close_system_dialogs(&mut self, now_ms: u64, reason: &str) {
        self.execution.assert_is_main_thread();
        let Some(active) = self.overlay.as_mut() else {
            return;
        };
        if active.request.reason == RequestReason::AuthKeyguard {
            return;
        }
        log::debug!("udfps: close_system_dialogs reason={}", reason);
        active.view.cancel();
        self.hide_overlay(now_ms);
    }

    /// Fires due timers; returns how many ran.
    pub fn advance_clock(&mut self, now_ms: u64) -> usize {
        self.execution.assert_is_main_thread();
        let mut fired = 0;
        while let Some((token, task)) = self.timers.take_due(now_ms) {
            fired += 1;
            match task {
                TimerTask::AodTimeout => {
                    if self.watchdog.on_timer_fired(token) {
                        self.on_cancel_udfps(now_ms);
                    }
                }
            }
        }
        fired
    }

    fn on_acquired(&mut self, now_ms: u64, info: AcquiredInfo, vendor_code: i32) {
        if info == AcquiredInfo::Vendor {
            if vendor_code == self.config.udfps_vendor_code && self.vendor_wake_allowed() {
                self.vendor_wake(now_ms);
            }
            return;
        }
        if !info.is_terminal() {
            return;
        }
        log::debug!("udfps: acquired info={:?}", info);
        let output = self.session.acquired(info);
        self.apply(now_ms, &output);
    }

    fn vendor_wake_allowed(&self) -> bool {
        let screen_on = self.watchdog.is_screen_on();
        let keyguard = &self.platform.keyguard;
        (self.screen_off_udfps_enabled && (keyguard.is_dozing() || !screen_on))
            || (keyguard.is_dreaming() && screen_on)
    }

    fn vendor_wake(&mut self, now_ms: u64) {
        if self.config.pulse_on_finger_down {
            self.platform.power.pulse();
        } else {
            self.platform.power.wake_up(now_ms, WakeReason::Gesture);
        }
        self.on_aod_interrupt(now_ms, AodRequest::placeholder());
    }

    fn synthesize_aod_down(&mut self, now_ms: u64, request: AodRequest) {
        let point = NativePoint {
            x: request.screen_x,
            y: request.screen_y,
        };
        let output = self
            .session
            .aod_finger_down(None, point, request.minor, request.major);
        self.apply(now_ms, &output);
    }

    fn visible_overlay(&mut self, what: &str) -> Option<&mut Box<dyn Overlay>> {
        match self.overlay.as_mut() {
            Some(active) if !active.view.is_hiding() => Some(&mut active.view),
            _ => {
                log::debug!("udfps: {} dropped reason=no_overlay", what);
                None
            }
        }
    }

    fn apply(&mut self, now_ms: u64, output: &SessionOutput) {
        for action in output.actions.iter() {
            match *action {
                SessionAction::FingerDown(down) => {
                    if let Some(active) = self.overlay.as_mut() {
                        self.dispatcher
                            .finger_down(now_ms, &down, &mut self.platform, active.view.as_mut());
                    }
                }
                SessionAction::Release {
                    request_id,
                    finger_was_down,
                } => {
                    self.dispatcher
                        .release(request_id, finger_was_down, &mut self.platform);
                    if let Some(active) = self.overlay.as_mut() {
                        self.dispatcher.clear_display(active.view.as_mut());
                    }
                    self.watchdog.on_finger_up(&mut self.timers);
                }
                SessionAction::TouchOutsideSensor(guidance) => {
                    if let Some(active) = self.overlay.as_mut() {
                        active.view.on_touch_outside_sensor_area(guidance);
                    }
                }
                SessionAction::TouchOutsideView => {
                    if let Some(active) = self.overlay.as_mut() {
                        active.view.on_touch_outside_view();
                    }
                }
                SessionAction::UnconfigureDisplay => {
                    if let Some(active) = self.overlay.as_mut() {
                        if active.view.is_display_configured() {
                            active.view.unconfigure_display();
                        }
                    }
                }
                SessionAction::AcquiredGood => {
                    if let Some(active) = self.overlay.as_mut() {
                        active.view.on_acquired_good();
                    }
                }
                SessionAction::DismissKeyguard { start_haptic } => {
                    log::debug!("udfps: keyguard_dismiss start_haptic={}", start_haptic);
                    if start_haptic {
                        self.platform
                            .haptics
                            .vibrate(HapticEffect::Click, HapticUsage::CommunicationRequest);
                    }
                    self.platform.keyguard.notify_authenticated(false);
                }
            }
        }
    }
}
