//! Always-on-display wake handling.
//!
//! The AOD sensor reports a press but never a lift, so a synthesized
//! FingerDown is paired with a one-shot deadline that forces the release.

mod timer;

pub use timer::{CancelToken, Timer, TimerTask, UiTimerQueue};

use crate::config::AOD_INTERRUPT_TIMEOUT_MS;

/// Wake position and touch size reported with an AOD interrupt, in display pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AodRequest {
    pub screen_x: i32,
    pub screen_y: i32,
    pub major: f32,
    pub minor: f32,
}

impl AodRequest {
    pub const fn new(screen_x: i32, screen_y: i32, major: f32, minor: f32) -> Self {
        Self {
            screen_x,
            screen_y,
            major,
            minor,
        }
    }

    /// Vendor wake without coordinates.
    pub const fn placeholder() -> Self {
        Self::new(0, 0, 0.0, 0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AodDecision {
    /// Another interrupt is still being handled.
    Ignored,
    /// Detection is idle; show the bouncer instead of authenticating.
    LockIconLongPress,
    /// Screen is off; runs on the next screen-on.
    Deferred,
    /// Timeout armed; the caller synthesizes the FingerDown.
    Armed(AodRequest),
}

#[derive(Debug)]
pub struct AodWatchdog {
    active: bool,
    pending: Option<AodRequest>,
    cancel_token: Option<CancelToken>,
    screen_on: bool,
    timeout_ms: u64,
}

impl Default for AodWatchdog {
    fn default() -> Self {
        Self::new(AOD_INTERRUPT_TIMEOUT_MS)
    }
}

impl AodWatchdog {
    pub fn new(timeout_ms: u64) -> Self {
        Self::with_screen_state(timeout_ms, true)
    }

    pub fn with_screen_state(timeout_ms: u64, screen_on: bool) -> Self {
        Self {
            active: false,
            pending: None,
            cancel_token: None,
            screen_on,
            timeout_ms,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_deferred(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_screen_on(&self) -> bool {
        self.screen_on
    }

    pub fn on_interrupt(
        &mut self,
        request: AodRequest,
        illuminating: bool,
        detection_running: bool,
        timers: &mut impl Timer,
    ) -> AodDecision {
        if self.active {
            log::debug!("udfps: aod_interrupt ignored reason=active");
            return AodDecision::Ignored;
        }
        if !illuminating && !detection_running {
            return AodDecision::LockIconLongPress;
        }
        if !self.screen_on {
            log::debug!("udfps: aod_interrupt deferred reason=screen_off");
            self.pending = Some(request);
            return AodDecision::Deferred;
        }
        AodDecision::Armed(self.arm(request, timers))
    }

    /// Returns the deferred request, now armed, if one was waiting.
    pub fn on_screen_turned_on(&mut self, timers: &mut impl Timer) -> Option<AodRequest> {
        self.screen_on = true;
        let request = self.pending.take()?;
        if self.active {
            return None;
        }
        Some(self.arm(request, timers))
    }

    pub fn on_screen_turned_off(&mut self) {
        self.screen_on = false;
    }

    /// Any FingerUp resolves the running interrupt.
    pub fn on_finger_up(&mut self, timers: &mut impl Timer) {
        self.disarm(timers);
    }

    /// Returns whether an interrupt was active or waiting.
    pub fn on_cancel(&mut self, timers: &mut impl Timer) -> bool {
        let had_work = self.active || self.pending.is_some();
        self.pending = None;
        self.disarm(timers);
        had_work
    }

    /// True if `token` is this watchdog's live deadline; the caller then cancels
    /// the session.
    pub fn on_timer_fired(&mut self, token: CancelToken) -> bool {
        if self.cancel_token != Some(token) {
            return false;
        }
        self.cancel_token = None;
        log::warn!(
            "udfps: aod_watchdog_timeout timeout_ms={} action=force_finger_up",
            self.timeout_ms
        );
        true
    }

    fn arm(&mut self, request: AodRequest, timers: &mut impl Timer) -> AodRequest {
        self.active = true;
        if let Some(stale) = self.cancel_token.take() {
            timers.cancel(stale);
        }
        self.cancel_token = Some(timers.schedule(self.timeout_ms, TimerTask::AodTimeout));
        log::debug!(
            "udfps: aod_interrupt armed x={} y={} timeout_ms={}",
            request.screen_x,
            request.screen_y,
            self.timeout_ms
        );
        request
    }

    fn disarm(&mut self, timers: &mut impl Timer) {
        if let Some(token) = self.cancel_token.take() {
            timers.cancel(token);
        }
        self.active = false;
    }
}
