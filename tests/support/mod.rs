#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use udfps_session::collaborators::{
    FaceAuthReason, HapticEffect, HapticUsage, SensorGuidance, WakeReason,
};
use udfps_session::controller::OverlayRequest;
use udfps_session::{
    AlternateTouchProvider, DisplayReady, DriverRoute, FaceAuthTrigger, HapticSignal,
    HardwareInbox, KeyguardSignal, Overlay, OverlayParams, Platform, PointerSample, PowerSignal,
    RequestId, RequestReason, Rotation, SensorDriver, SensorRect, SensorShape, SystemSettings,
    TouchEvent, TouchFrame, UdfpsConfig, UdfpsController,
};

/// Everything the fakes observe, plus the knobs tests flip.
#[derive(Default)]
pub struct World {
    log: RefCell<Vec<String>>,
    pub detection_running: Cell<bool>,
    pub face_running: Cell<bool>,
    pub dozing: Cell<bool>,
    pub dreaming: Cell<bool>,
    pub can_dismiss: Cell<bool>,
    pub screen_off_udfps: Cell<bool>,
    pub brightness: Cell<i32>,
    pub pause_auth: Cell<bool>,
    pub keyguard_surface: Cell<bool>,
    pub display_configured: Cell<bool>,
    pub screen_on: Cell<bool>,
}

impl World {
    pub fn new() -> Rc<Self> {
        let world = Self::default();
        world.brightness.set(100);
        world.screen_on.set(true);
        Rc::new(world)
    }

    pub fn push(&self, line: impl Into<String>) {
        self.log.borrow_mut().push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    pub fn has(&self, line: &str) -> bool {
        self.log.borrow().iter().any(|known| known == line)
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

pub struct Fake(pub Rc<World>);

impl SensorDriver for Fake {
    fn on_pointer_down(
        &mut self,
        request_id: RequestId,
        sensor_id: i32,
        x: i32,
        y: i32,
        minor: f32,
        major: f32,
    ) {
        self.0
            .push(format!("driver.down {request_id} {sensor_id} {x} {y} {minor:.1} {major:.1}"));
    }
    fn on_pointer_up(&mut self, request_id: RequestId, sensor_id: i32) {
        self.0.push(format!("driver.up {request_id} {sensor_id}"));
    }
    fn on_ui_ready(&mut self, request_id: RequestId, sensor_id: i32) {
        self.0.push(format!("driver.ui_ready {request_id} {sensor_id}"));
    }
}

impl PowerSignal for Fake {
    fn user_activity(&mut self, _now_ms: u64) {
        self.0.push("power.activity");
    }
    fn wake_up(&mut self, _now_ms: u64, reason: WakeReason) {
        self.0.push(format!("power.wake {reason:?}"));
    }
    fn pulse(&mut self) {
        self.0.push("power.pulse");
    }
}

impl HapticSignal for Fake {
    fn vibrate(&mut self, effect: HapticEffect, usage: HapticUsage) {
        self.0.push(format!("haptic {effect:?} {usage:?}"));
    }
}

impl FaceAuthTrigger for Fake {
    fn is_running(&self) -> bool {
        self.0.face_running.get()
    }
    fn request(&mut self, reason: FaceAuthReason) {
        self.0.push(format!("face {reason:?}"));
    }
}

impl KeyguardSignal for Fake {
    fn is_fingerprint_detection_running(&self) -> bool {
        self.0.detection_running.get()
    }
    fn show_bouncer(&mut self) {
        self.0.push("keyguard.bouncer");
    }
    fn can_dismiss_lock_screen(&self) -> bool {
        self.0.can_dismiss.get()
    }
    fn notify_authenticated(&mut self, strong_auth: bool) {
        self.0.push(format!("keyguard.authenticated {strong_auth}"));
    }
    fn on_udfps_pointer_down(&mut self, request_id: RequestId) {
        self.0.push(format!("keyguard.pointer_down {request_id}"));
    }
    fn on_udfps_pointer_up(&mut self, request_id: RequestId) {
        self.0.push(format!("keyguard.pointer_up {request_id}"));
    }
    fn is_dozing(&self) -> bool {
        self.0.dozing.get()
    }
    fn is_dreaming(&self) -> bool {
        self.0.dreaming.get()
    }
}

impl SystemSettings for Fake {
    fn screen_brightness(&self) -> i32 {
        self.0.brightness.get()
    }
    fn screen_off_udfps_enabled(&self) -> bool {
        self.0.screen_off_udfps.get()
    }
    fn is_screen_on(&self) -> bool {
        self.0.screen_on.get()
    }
}

impl Overlay for Fake {
    fn show(&mut self, _params: &OverlayParams) -> bool {
        self.0.push("overlay.show");
        true
    }
    fn hide(&mut self) -> bool {
        self.0.push("overlay.hide");
        true
    }
    fn configure_display(&mut self, ready: DisplayReady) {
        self.0.display_configured.set(true);
        self.0.push(format!("overlay.configure {}", ready.request_id));
    }
    fn unconfigure_display(&mut self) {
        self.0.display_configured.set(false);
        self.0.push("overlay.unconfigure");
    }
    fn is_display_configured(&self) -> bool {
        self.0.display_configured.get()
    }
    fn should_pause_auth(&self) -> bool {
        self.0.pause_auth.get()
    }
    fn is_keyguard_surface(&self) -> bool {
        self.0.keyguard_surface.get()
    }
    fn on_touch_outside_view(&mut self) {
        self.0.push("overlay.outside_view");
    }
    fn on_touch_outside_sensor_area(&mut self, guidance: SensorGuidance) {
        self.0.push(format!("overlay.outside_sensor {:.0}", guidance.distance));
    }
    fn on_acquired_good(&mut self) {
        self.0.push("overlay.acquired_good");
    }
    fn on_enrollment_progress(&mut self, remaining: i32) {
        self.0.push(format!("overlay.enroll_progress {remaining}"));
    }
    fn on_enrollment_help(&mut self) {
        self.0.push("overlay.enroll_help");
    }
    fn set_debug_message(&mut self, message: &str) {
        self.0.push(format!("overlay.debug {message}"));
    }
    fn update_dim_amount(&mut self, amount: f32) {
        self.0.push(format!("overlay.dim {amount:.3}"));
    }
    fn cancel(&mut self) {
        self.0.push("overlay.cancel");
    }
}

/// Alternate provider; lives on the biometric thread, so it records into a mutex.
#[derive(Clone, Default)]
pub struct ProviderLog(pub Arc<Mutex<Vec<String>>>);

impl ProviderLog {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.0.lock() {
            lines.push(line);
        }
    }
}

impl AlternateTouchProvider for ProviderLog {
    fn on_pointer_down(&mut self, request_id: RequestId, x: i32, y: i32, _minor: f32, _major: f32) {
        self.push(format!("alt.down {request_id} {x} {y}"));
    }
    fn on_pointer_up(&mut self, request_id: RequestId) {
        self.push(format!("alt.up {request_id}"));
    }
    fn on_ui_ready(&mut self, request_id: RequestId) {
        self.push(format!("alt.ui_ready {request_id}"));
    }
}

pub fn platform(world: &Rc<World>) -> Platform {
    Platform {
        power: Box::new(Fake(world.clone())),
        haptics: Box::new(Fake(world.clone())),
        face_auth: Box::new(Fake(world.clone())),
        keyguard: Box::new(Fake(world.clone())),
        settings: Box::new(Fake(world.clone())),
    }
}

/// 1080x2400 portrait panel, 200 px square sensor centred on (500, 1500).
pub fn params() -> OverlayParams {
    OverlayParams {
        sensor_bounds: SensorRect::new(400, 1400, 600, 1600),
        sensor_shape: SensorShape::Rect,
        logical_display_width: 1080,
        logical_display_height: 2400,
        scale_factor: 1.0,
        rotation: Rotation::Rotation0,
    }
}

pub struct Rig {
    pub world: Rc<World>,
    pub controller: UdfpsController,
    pub hardware: Arc<HardwareInbox>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(UdfpsConfig::default())
    }

    pub fn with_config(config: UdfpsConfig) -> Self {
        let world = World::new();
        let route = DriverRoute::Direct(Box::new(Fake(world.clone())));
        Self::build(world, config, route)
    }

    pub fn build(world: Rc<World>, config: UdfpsConfig, route: DriverRoute) -> Self {
        let hardware = Arc::new(HardwareInbox::new());
        let mut controller =
            UdfpsController::new(config, route, platform(&world), hardware.clone())
                .expect("valid config");
        controller.update_overlay_params(0, 0, params());
        Self {
            world,
            controller,
            hardware,
        }
    }

    pub fn show(&mut self, request_id: RequestId, reason: RequestReason) {
        self.controller
            .show_overlay(
                OverlayRequest { request_id, reason },
                Box::new(Fake(self.world.clone())),
            )
            .expect("overlay shown");
    }
}

pub fn down(t_ms: u64, x: f32, y: f32) -> TouchEvent {
    TouchEvent::Down(TouchFrame::single(t_ms, PointerSample::new(0, x, y).with_size(4.0, 6.0)))
}

pub fn moved(t_ms: u64, x: f32, y: f32) -> TouchEvent {
    TouchEvent::Move(TouchFrame::single(t_ms, PointerSample::new(0, x, y).with_size(4.0, 6.0)))
}

pub fn up(t_ms: u64, x: f32, y: f32) -> TouchEvent {
    TouchEvent::Up(TouchFrame::single(t_ms, PointerSample::new(0, x, y)))
}
