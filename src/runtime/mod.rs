use std::thread::{self, ThreadId};

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, TrySendError},
};
use heapless::String;

mod ui_loop;

pub use ui_loop::{dispatch_ui_signal, run_ui_loop};

use crate::config::{DEBUG_MESSAGE_MAX, HARDWARE_INBOX_DEPTH, UI_INBOX_DEPTH};
use crate::types::{AcquiredInfo, DisplayReady, RequestId, TouchEvent};
use crate::watchdog::AodRequest;

/// The UI-affinity thread, captured when the controller is built.
#[derive(Clone, Copy, Debug)]
pub struct Execution {
    thread: ThreadId,
}

impl Execution {
    pub fn current() -> Self {
        Self {
            thread: thread::current().id(),
        }
    }

    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.thread
    }

    pub fn assert_is_main_thread(&self) {
        assert!(
            self.is_main_thread(),
            "udfps: session state touched off the UI thread"
        );
    }
}

/// Callbacks from the fingerprint HAL, produced on the biometric thread.
#[derive(Clone, Debug, PartialEq)]
pub enum HardwareSignal {
    Acquired {
        sensor_id: i32,
        info: AcquiredInfo,
        vendor_code: i32,
    },
    EnrollmentProgress {
        sensor_id: i32,
        remaining: i32,
    },
    EnrollmentHelp {
        sensor_id: i32,
    },
    DebugMessage {
        sensor_id: i32,
        message: String<DEBUG_MESSAGE_MAX>,
    },
}

impl HardwareSignal {
    pub fn acquired(sensor_id: i32, code: i32, vendor_code: i32) -> Self {
        HardwareSignal::Acquired {
            sensor_id,
            info: AcquiredInfo::from_code(code),
            vendor_code,
        }
    }

    /// Longer messages are cut at the last character that fits.
    pub fn debug_message(sensor_id: i32, text: &str) -> Self {
        let mut message = String::new();
        for ch in text.chars() {
            if message.push(ch).is_err() {
                break;
            }
        }
        HardwareSignal::DebugMessage { sensor_id, message }
    }

    pub fn sensor_id(&self) -> i32 {
        match self {
            HardwareSignal::Acquired { sensor_id, .. }
            | HardwareSignal::EnrollmentProgress { sensor_id, .. }
            | HardwareSignal::EnrollmentHelp { sensor_id }
            | HardwareSignal::DebugMessage { sensor_id, .. } => *sensor_id,
        }
    }
}

/// Single-producer hand-off from the biometric thread to the UI domain.
pub struct HardwareInbox {
    signals: Channel<CriticalSectionRawMutex, HardwareSignal, HARDWARE_INBOX_DEPTH>,
}

impl Default for HardwareInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareInbox {
    pub const fn new() -> Self {
        Self {
            signals: Channel::new(),
        }
    }

    /// Never blocks the HAL callback; a full inbox drops the newest signal.
    pub fn post(&self, signal: HardwareSignal) -> bool {
        match self.signals.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(signal)) => {
                log::warn!("udfps: hardware_inbox_full dropped={:?}", signal);
                false
            }
        }
    }

    pub fn try_receive(&self) -> Option<HardwareSignal> {
        self.signals.try_receive().ok()
    }

    pub async fn receive(&self) -> HardwareSignal {
        self.signals.receive().await
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Work delivered to the UI domain by the platform.
#[derive(Clone, Debug, PartialEq)]
pub enum UiSignal {
    Touch {
        request_id: RequestId,
        event: TouchEvent,
    },
    DisplayReady(DisplayReady),
    AodInterrupt(AodRequest),
    ScreenTurnedOn,
    ScreenTurnedOff,
    CancelUdfps,
    HideOverlay,
    Shutdown,
}

pub struct UiInbox {
    signals: Channel<CriticalSectionRawMutex, UiSignal, UI_INBOX_DEPTH>,
}

impl Default for UiInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl UiInbox {
    pub const fn new() -> Self {
        Self {
            signals: Channel::new(),
        }
    }

    pub fn post(&self, signal: UiSignal) -> bool {
        match self.signals.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(signal)) => {
                log::warn!("udfps: ui_inbox_full dropped={:?}", signal);
                false
            }
        }
    }

    pub fn try_receive(&self) -> Option<UiSignal> {
        self.signals.try_receive().ok()
    }

    pub async fn receive(&self) -> UiSignal {
        self.signals.receive().await
    }
}
