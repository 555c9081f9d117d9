//! Touch-session core for an under-display fingerprint sensor (UDFPS).
//!
//! Raw multi-pointer touch input, asynchronous acquisition callbacks from the
//! sensor HAL and the always-on-display watchdog are folded into one ordered
//! FingerDown/FingerUp stream that drives the sensor driver, the illumination
//! overlay and registered observers.

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod dimming;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod pointer;
pub mod runtime;
pub mod session;
pub mod types;
pub mod watchdog;

pub use collaborators::{
    AlternateTouchProvider, FaceAuthTrigger, HapticSignal, KeyguardSignal, Overlay, Platform,
    PowerSignal, SensorDriver, SystemSettings,
};
pub use config::UdfpsConfig;
pub use controller::{OverlayRequest, UdfpsController};
pub use dispatch::{DriverChannel, DriverCommand, DriverRoute, FingerObserver, ObserverHandle};
pub use error::{ConfigError, SessionError, TouchRejection};
pub use geometry::{OverlayParams, Rotation, SensorGeometry, SensorRect, SensorShape};
pub use runtime::{run_ui_loop, HardwareInbox, HardwareSignal, UiInbox, UiSignal};
pub use session::{SessionAction, SessionPhase, TouchGate, TouchSessionEngine};
pub use types::{
    AcquiredInfo, DisplayReady, NativePoint, PointerId, PointerSample, RequestId, RequestReason,
    TouchEvent, TouchFrame, TouchPoint,
};
pub use watchdog::{AodDecision, AodRequest};
