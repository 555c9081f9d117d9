use heapless::Vec;
use statig::blocking::IntoStateMachineExt as _;

mod hsm;
#[cfg(test)]
mod tests;

use hsm::TouchSession;

use crate::collaborators::SensorGuidance;
use crate::config::{UdfpsConfig, SESSION_ACTIONS_MAX};
use crate::error::TouchRejection;
use crate::geometry::SensorGeometry;
use crate::pointer::ActivePointer;
use crate::types::{AcquiredInfo, NativePoint, RequestId, TouchEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    ArmedNoPointer,
    PointerDownOutside,
    Illuminating,
}

/// Overlay and keyguard facts sampled by the controller right before a touch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchGate {
    pub pause_auth: bool,
    pub can_dismiss_keyguard: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FingerDown {
    pub request_id: RequestId,
    pub point: NativePoint,
    pub minor: f32,
    pub major: f32,
    /// First FingerDown of this physical press; gates the start haptic.
    pub first_in_press: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionAction {
    FingerDown(FingerDown),
    /// Drops illumination. Driver and observers only hear about it when
    /// `finger_was_down` is set.
    Release {
        request_id: RequestId,
        finger_was_down: bool,
    },
    TouchOutsideSensor(SensorGuidance),
    TouchOutsideView,
    UnconfigureDisplay,
    AcquiredGood,
    /// `start_haptic` is set when no FingerDown has played the press haptic yet.
    DismissKeyguard { start_haptic: bool },
}

#[derive(Clone, Debug)]
enum SessionEvent {
    Open {
        request_id: RequestId,
    },
    Touch {
        request_id: RequestId,
        touch: TouchEvent,
        gate: TouchGate,
    },
    Acquired(AcquiredInfo),
    AodFingerDown {
        request_id: Option<RequestId>,
        point: NativePoint,
        minor: f32,
        major: f32,
    },
    Release,
    Close,
}

impl SessionEvent {
    fn label(&self) -> &'static str {
        match self {
            SessionEvent::Open { .. } => "open",
            SessionEvent::Touch { touch, .. } => touch.label(),
            SessionEvent::Acquired(_) => "acquired",
            SessionEvent::AodFingerDown { .. } => "aod_finger_down",
            SessionEvent::Release => "release",
            SessionEvent::Close => "close",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionOutput {
    pub actions: Vec<SessionAction, SESSION_ACTIONS_MAX>,
    pub rejection: Option<TouchRejection>,
    /// The touch was consumed by the sensor (platform `onTouch` result).
    pub handled: bool,
}

struct DispatchContext {
    geometry: SensorGeometry,
    actions: Vec<SessionAction, SESSION_ACTIONS_MAX>,
    rejection: Option<TouchRejection>,
    handled: bool,
}

impl DispatchContext {
    fn new(geometry: SensorGeometry) -> Self {
        Self {
            geometry,
            actions: Vec::new(),
            rejection: None,
            handled: false,
        }
    }

    fn emit(&mut self, action: SessionAction) {
        if let Err(action) = self.actions.push(action) {
            log::warn!("udfps: action_overflow dropped={:?}", action);
        }
    }

    fn reject(&mut self, rejection: TouchRejection) {
        self.rejection = Some(rejection);
    }

    fn finish(self) -> SessionOutput {
        SessionOutput {
            actions: self.actions,
            rejection: self.rejection,
            handled: self.handled,
        }
    }
}

/// The touch-session state machine plus the geometry it tests touches against.
///
/// Every entry point returns the side effects to perform instead of performing
/// them, so the caller decides which thread each one runs on.
pub struct TouchSessionEngine {
    machine: statig::blocking::StateMachine<TouchSession>,
    geometry: SensorGeometry,
}

impl Default for TouchSessionEngine {
    fn default() -> Self {
        Self::new(&UdfpsConfig::default())
    }
}

impl TouchSessionEngine {
    pub fn new(config: &UdfpsConfig) -> Self {
        Self {
            machine: TouchSession::new(config).state_machine(),
            geometry: SensorGeometry::default(),
        }
    }

    pub fn set_geometry(&mut self, geometry: SensorGeometry) {
        self.geometry = geometry;
    }

    pub fn geometry(&self) -> &SensorGeometry {
        &self.geometry
    }

    pub fn phase(&self) -> SessionPhase {
        self.machine.inner().phase
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.machine.inner().request_id
    }

    pub fn is_finger_down(&self) -> bool {
        matches!(self.phase(), SessionPhase::Illuminating)
    }

    pub fn acquired_received(&self) -> bool {
        self.machine.inner().acquired_received
    }

    pub fn active_pointer(&self) -> Option<ActivePointer> {
        self.machine.inner().tracker.active()
    }

    pub fn open(&mut self, request_id: RequestId) -> SessionOutput {
        self.handle(SessionEvent::Open { request_id })
    }

    pub fn touch(&mut self, request_id: RequestId, touch: &TouchEvent, gate: TouchGate) -> SessionOutput {
        self.handle(SessionEvent::Touch {
            request_id,
            touch: touch.clone(),
            gate,
        })
    }

    pub fn acquired(&mut self, info: AcquiredInfo) -> SessionOutput {
        self.handle(SessionEvent::Acquired(info))
    }

    /// Synthesized press from the AOD sensor; `point` is already sensor-native.
    pub fn aod_finger_down(
        &mut self,
        request_id: Option<RequestId>,
        point: NativePoint,
        minor: f32,
        major: f32,
    ) -> SessionOutput {
        self.handle(SessionEvent::AodFingerDown {
            request_id,
            point,
            minor,
            major,
        })
    }

    /// Forced FingerUp for the current press (cancel, watchdog, redraw).
    pub fn release(&mut self) -> SessionOutput {
        self.handle(SessionEvent::Release)
    }

    pub fn close(&mut self) -> SessionOutput {
        self.handle(SessionEvent::Close)
    }

    fn handle(&mut self, event: SessionEvent) -> SessionOutput {
        let mut context = DispatchContext::new(self.geometry);
        self.machine.handle_with_context(&event, &mut context);
        let output = context.finish();
        if let Some(rejection) = output.rejection {
            log::warn!(
                "udfps: dropped event={} reason=\"{}\"",
                event.label(),
                rejection
            );
        }
        output
    }
}
