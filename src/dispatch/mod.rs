use std::rc::Rc;
use std::sync::Arc;

mod driver_channel;
mod observers;

pub use driver_channel::{DriverChannel, DriverCommand};
pub use observers::{FingerObserver, ObserverHandle};

use observers::ObserverSet;

use crate::collaborators::{FaceAuthReason, HapticEffect, HapticUsage, Overlay, Platform, SensorDriver};
use crate::dimming::DimmingTable;
use crate::session::FingerDown;
use crate::types::{DisplayReady, RequestId};

/// Where sensor-driver calls go.
pub enum DriverRoute {
    /// Fingerprint service, called synchronously on the UI domain.
    Direct(Box<dyn SensorDriver>),
    /// Vendor channel drained on the biometric thread.
    Alternate(Arc<DriverChannel>),
}

impl DriverRoute {
    fn label(&self) -> &'static str {
        match self {
            DriverRoute::Direct(_) => "direct",
            DriverRoute::Alternate(_) => "alternate",
        }
    }
}

/// Fans FingerDown/FingerUp out to the driver, the overlay and observers.
pub(crate) struct SessionDispatcher {
    sensor_id: i32,
    route: DriverRoute,
    observers: ObserverSet,
    dimming: Option<DimmingTable>,
    illumination_started_ms: Option<u64>,
}

impl SessionDispatcher {
    pub(crate) fn new(sensor_id: i32, route: DriverRoute, dimming: Option<DimmingTable>) -> Self {
        log::debug!(
            "udfps: dispatcher_init sensor_id={} route={} framework_dimming={}",
            sensor_id,
            route.label(),
            dimming.is_some()
        );
        Self {
            sensor_id,
            route,
            observers: ObserverSet::default(),
            dimming,
            illumination_started_ms: None,
        }
    }

    pub(crate) fn subscribe(&mut self, observer: Rc<dyn FingerObserver>) -> ObserverHandle {
        self.observers.subscribe(observer)
    }

    pub(crate) fn unsubscribe(&mut self, handle: ObserverHandle) -> bool {
        self.observers.unsubscribe(handle)
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn finger_down(
        &mut self,
        now_ms: u64,
        down: &FingerDown,
        platform: &mut Platform,
        overlay: &mut dyn Overlay,
    ) {
        platform.power.user_activity(now_ms);
        if down.first_in_press {
            platform
                .haptics
                .vibrate(HapticEffect::Click, HapticUsage::CommunicationRequest);
        }
        if !platform.face_auth.is_running() {
            platform.face_auth.request(FaceAuthReason::UdfpsPointerDown);
        }

        let point = down.point;
        match &mut self.route {
            DriverRoute::Direct(driver) => driver.on_pointer_down(
                down.request_id,
                self.sensor_id,
                point.x,
                point.y,
                down.minor,
                down.major,
            ),
            DriverRoute::Alternate(channel) => {
                channel.post(DriverCommand::PointerDown {
                    request_id: down.request_id,
                    x: point.x,
                    y: point.y,
                    minor: down.minor,
                    major: down.major,
                });
                if platform.keyguard.is_fingerprint_detection_running() {
                    platform.keyguard.on_udfps_pointer_down(down.request_id);
                }
            }
        }

        self.illumination_started_ms = Some(now_ms);
        overlay.configure_display(DisplayReady {
            request_id: down.request_id,
        });
        if let Some(table) = &self.dimming {
            overlay.update_dim_amount(table.dim_amount(platform.settings.screen_brightness()));
        }
        self.observers.notify_finger_down();
    }

    /// Driver and observers hear about the lift only if a FingerDown preceded it.
    pub(crate) fn release(
        &mut self,
        request_id: RequestId,
        finger_was_down: bool,
        platform: &mut Platform,
    ) {
        if finger_was_down {
            match &mut self.route {
                DriverRoute::Direct(driver) => driver.on_pointer_up(request_id, self.sensor_id),
                DriverRoute::Alternate(channel) => {
                    channel.post(DriverCommand::PointerUp { request_id });
                    if platform.keyguard.is_fingerprint_detection_running() {
                        platform.keyguard.on_udfps_pointer_up(request_id);
                    }
                }
            }
            self.observers.notify_finger_up();
        }
        self.illumination_started_ms = None;
    }

    /// Runs after every release, whether or not a FingerDown preceded it.
    pub(crate) fn clear_display(&self, overlay: &mut dyn Overlay) {
        if overlay.is_display_configured() {
            overlay.unconfigure_display();
        }
        if self.dimming.is_some() {
            overlay.update_dim_amount(0.0);
        }
    }

    /// The illuminated frame is on screen; the sensor may now capture.
    pub(crate) fn display_ready(&mut self, now_ms: u64, ready: DisplayReady) {
        match &mut self.route {
            DriverRoute::Direct(driver) => driver.on_ui_ready(ready.request_id, self.sensor_id),
            DriverRoute::Alternate(channel) => {
                channel.post(DriverCommand::UiReady {
                    request_id: ready.request_id,
                });
            }
        }
        if let Some(started_ms) = self.illumination_started_ms.take() {
            log::debug!(
                "udfps: illumination_ready request_id={} latency_ms={}",
                ready.request_id,
                now_ms.saturating_sub(started_ms)
            );
        }
    }
}
