use heapless::Vec;

pub type RequestId = i64;
pub type PointerId = i32;

pub const MAX_POINTERS: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Point in sensor-native pixels, truncated the way the HAL expects it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NativePoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub id: PointerId,
    pub point: TouchPoint,
    pub touch_minor: f32,
    pub touch_major: f32,
}

impl PointerSample {
    pub const fn new(id: PointerId, x: f32, y: f32) -> Self {
        Self {
            id,
            point: TouchPoint::new(x, y),
            touch_minor: 0.0,
            touch_major: 0.0,
        }
    }

    pub const fn with_size(mut self, touch_minor: f32, touch_major: f32) -> Self {
        self.touch_minor = touch_minor;
        self.touch_major = touch_major;
        self
    }
}

/// All pointers reported by one platform motion event, in display coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchFrame {
    pub t_ms: u64,
    pub action_index: usize,
    pub pointers: Vec<PointerSample, MAX_POINTERS>,
}

impl TouchFrame {
    pub fn single(t_ms: u64, pointer: PointerSample) -> Self {
        let mut pointers = Vec::new();
        let _ = pointers.push(pointer);
        Self {
            t_ms,
            action_index: 0,
            pointers,
        }
    }

    /// Builds a frame from up to [`MAX_POINTERS`] pointers; extra pointers are dropped.
    pub fn multi(t_ms: u64, action_index: usize, samples: &[PointerSample]) -> Self {
        let mut pointers = Vec::new();
        for sample in samples.iter().take(MAX_POINTERS) {
            let _ = pointers.push(*sample);
        }
        Self {
            t_ms,
            action_index,
            pointers,
        }
    }

    /// Pointer at index 0; platform down events always put the new pointer there.
    pub fn primary(&self) -> Option<&PointerSample> {
        self.pointers.first()
    }

    pub fn action_pointer(&self) -> Option<&PointerSample> {
        self.pointers.get(self.action_index)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TouchEvent {
    Down(TouchFrame),
    Move(TouchFrame),
    Up(TouchFrame),
    Cancel,
    HoverEnter(TouchFrame),
    HoverMove(TouchFrame),
    HoverExit,
    Outside,
}

impl TouchEvent {
    pub fn label(&self) -> &'static str {
        match self {
            TouchEvent::Down(_) => "down",
            TouchEvent::Move(_) => "move",
            TouchEvent::Up(_) => "up",
            TouchEvent::Cancel => "cancel",
            TouchEvent::HoverEnter(_) => "hover_enter",
            TouchEvent::HoverMove(_) => "hover_move",
            TouchEvent::HoverExit => "hover_exit",
            TouchEvent::Outside => "outside",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestReason {
    EnrollFind,
    EnrollEnrolling,
    AuthBiometricPrompt,
    AuthKeyguard,
    AuthSettings,
    AuthOther,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquiredInfo {
    Good,
    Partial,
    Insufficient,
    ImagerDirty,
    TooSlow,
    TooFast,
    Vendor,
    Start,
    /// The HAL's own "unknown" report (code 8).
    Unknown,
    Immobile,
    TooBright,
    PowerPressed,
    /// Codes outside the platform table, including vendor-base codes.
    Other(i32),
}

impl AcquiredInfo {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Good,
            1 => Self::Partial,
            2 => Self::Insufficient,
            3 => Self::ImagerDirty,
            4 => Self::TooSlow,
            5 => Self::TooFast,
            6 => Self::Vendor,
            7 => Self::Start,
            8 => Self::Unknown,
            9 => Self::Immobile,
            10 => Self::TooBright,
            11 => Self::PowerPressed,
            other => Self::Other(other),
        }
    }

    /// Whether this report ends the current read, so illumination can be dropped.
    /// Anything not listed keeps the display in illumination mode.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Good
                | Self::Partial
                | Self::Insufficient
                | Self::ImagerDirty
                | Self::TooSlow
                | Self::TooFast
                | Self::Immobile
                | Self::TooBright
        )
    }

    pub fn is_good(self) -> bool {
        matches!(self, Self::Good)
    }
}

/// Handed to [`crate::Overlay::configure_display`]; the overlay returns it to
/// the controller once the illumination frame is on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayReady {
    pub request_id: RequestId,
}
