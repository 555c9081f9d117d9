//! Capabilities the session core calls into. Everything behind these traits
//! (windows, binder, vibrator, keyguard) lives outside this crate.

use crate::geometry::{OverlayParams, Rotation};
use crate::types::{DisplayReady, RequestId};

pub trait SensorDriver {
    fn on_pointer_down(
        &mut self,
        request_id: RequestId,
        sensor_id: i32,
        x: i32,
        y: i32,
        minor: f32,
        major: f32,
    );
    fn on_pointer_up(&mut self, request_id: RequestId, sensor_id: i32);
    fn on_ui_ready(&mut self, request_id: RequestId, sensor_id: i32);
}

/// Vendor touch channel that bypasses the fingerprint service; runs on the
/// biometric thread.
pub trait AlternateTouchProvider: Send {
    fn on_pointer_down(&mut self, request_id: RequestId, x: i32, y: i32, minor: f32, major: f32);
    fn on_pointer_up(&mut self, request_id: RequestId);
    fn on_ui_ready(&mut self, request_id: RequestId);
}

/// Guidance for a finger that slid off the sensor, in native pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorGuidance {
    pub touch_x: i32,
    pub touch_y: i32,
    pub sensor_x: f32,
    pub sensor_y: f32,
    pub distance: f32,
    pub rotation: Rotation,
}

pub trait Overlay {
    /// Adds the overlay window; returns false if it was already showing.
    fn show(&mut self, params: &OverlayParams) -> bool;
    /// Removes the overlay window; returns false if it was not showing.
    fn hide(&mut self) -> bool;
    /// Switches the panel into illumination mode. The overlay hands `ready`
    /// back to the controller once the frame is on screen.
    fn configure_display(&mut self, ready: DisplayReady);
    fn unconfigure_display(&mut self);
    fn is_display_configured(&self) -> bool;

    fn should_pause_auth(&self) -> bool {
        false
    }
    fn is_keyguard_surface(&self) -> bool {
        false
    }
    fn is_hiding(&self) -> bool {
        false
    }
    fn on_touch_outside_view(&mut self) {}
    fn on_touch_outside_sensor_area(&mut self, _guidance: SensorGuidance) {}
    fn on_acquired_good(&mut self) {}
    fn on_enrollment_progress(&mut self, _remaining: i32) {}
    fn on_enrollment_help(&mut self) {}
    fn set_debug_message(&mut self, _message: &str) {}
    fn update_dim_amount(&mut self, _amount: f32) {}
    fn cancel(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeReason {
    Gesture,
}

pub trait PowerSignal {
    fn user_activity(&mut self, now_ms: u64);
    fn wake_up(&mut self, now_ms: u64, reason: WakeReason);
    /// Ambient pulse instead of a full wake.
    fn pulse(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HapticEffect {
    Click,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HapticUsage {
    /// Bypasses battery saver; used for the sensor press.
    CommunicationRequest,
    Touch,
}

pub trait HapticSignal {
    fn vibrate(&mut self, effect: HapticEffect, usage: HapticUsage);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceAuthReason {
    UdfpsPointerDown,
}

pub trait FaceAuthTrigger {
    fn is_running(&self) -> bool;
    fn request(&mut self, reason: FaceAuthReason);
}

pub trait KeyguardSignal {
    fn is_fingerprint_detection_running(&self) -> bool;
    fn show_bouncer(&mut self);

    fn can_dismiss_lock_screen(&self) -> bool {
        false
    }
    fn notify_authenticated(&mut self, _strong_auth: bool) {}
    fn on_udfps_pointer_down(&mut self, _request_id: RequestId) {}
    fn on_udfps_pointer_up(&mut self, _request_id: RequestId) {}
    fn is_dozing(&self) -> bool {
        false
    }
    fn is_dreaming(&self) -> bool {
        false
    }
    fn is_showing_alternate_auth(&self) -> bool {
        false
    }
    fn reset_alternate_auth(&mut self) {}
}

pub trait SystemSettings {
    fn screen_brightness(&self) -> i32 {
        100
    }
    fn screen_off_udfps_enabled(&self) -> bool {
        false
    }
    /// Screen power at startup; later changes arrive as screen events.
    fn is_screen_on(&self) -> bool {
        true
    }
}

/// Everything the controller talks to besides the driver and the overlay.
pub struct Platform {
    pub power: Box<dyn PowerSignal>,
    pub haptics: Box<dyn HapticSignal>,
    pub face_auth: Box<dyn FaceAuthTrigger>,
    pub keyguard: Box<dyn KeyguardSignal>,
    pub settings: Box<dyn SystemSettings>,
}
