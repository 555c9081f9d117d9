use std::{
    cell::{Cell, RefCell},
    env,
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process,
    rc::Rc,
    sync::Arc,
};

use udfps_session::collaborators::{FaceAuthReason, HapticEffect, HapticUsage, WakeReason};
use udfps_session::{
    AodRequest, DisplayReady, DriverRoute, FaceAuthTrigger, HapticSignal, HardwareInbox,
    HardwareSignal, KeyguardSignal, Overlay, OverlayParams, OverlayRequest, Platform,
    PointerSample, PowerSignal, RequestId, RequestReason, Rotation, SensorDriver, SensorRect,
    SensorShape, SystemSettings, TouchEvent, TouchFrame, UdfpsConfig, UdfpsController,
};

const TRACE_HEADER: &str = "udfps_trace,ms,kind,args";
// Lets a trailing AOD press reach its watchdog deadline.
const TAIL_MS: u64 = 5_000;

#[derive(Clone, Debug)]
enum Record {
    Params(OverlayParams),
    Show { request_id: RequestId, reason: RequestReason },
    Hide,
    Touch { request_id: RequestId, event: TouchEvent },
    Acquired { code: i32, vendor_code: i32 },
    Aod(AodRequest),
    DisplayReady,
    ScreenOn,
    ScreenOff,
    Cancel,
    Tick,
}

#[derive(Clone, Debug)]
struct ReplayLine {
    ms: u64,
    record: Record,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EventKind {
    FingerDown,
    FingerUp,
    UiReady,
}

#[derive(Clone, Copy, Debug)]
struct ReplayEvent {
    ms: u64,
    kind: EventKind,
    request_id: RequestId,
    x: i32,
    y: i32,
}

/// What the replayed controller did, stamped with the trace clock.
#[derive(Default)]
struct Recorder {
    now_ms: Cell<u64>,
    events: RefCell<Vec<ReplayEvent>>,
    configured: Cell<bool>,
    detection_running: Cell<bool>,
}

impl Recorder {
    fn push(&self, kind: EventKind, request_id: RequestId, x: i32, y: i32) {
        self.events.borrow_mut().push(ReplayEvent {
            ms: self.now_ms.get(),
            kind,
            request_id,
            x,
            y,
        });
    }
}

struct Stub(Rc<Recorder>);

impl SensorDriver for Stub {
    fn on_pointer_down(
        &mut self,
        request_id: RequestId,
        _sensor_id: i32,
        x: i32,
        y: i32,
        _minor: f32,
        _major: f32,
    ) {
        self.0.push(EventKind::FingerDown, request_id, x, y);
    }
    fn on_pointer_up(&mut self, request_id: RequestId, _sensor_id: i32) {
        self.0.push(EventKind::FingerUp, request_id, 0, 0);
    }
    fn on_ui_ready(&mut self, request_id: RequestId, _sensor_id: i32) {
        self.0.push(EventKind::UiReady, request_id, 0, 0);
    }
}

impl Overlay for Stub {
    fn show(&mut self, _params: &OverlayParams) -> bool {
        true
    }
    fn hide(&mut self) -> bool {
        true
    }
    fn configure_display(&mut self, _ready: DisplayReady) {
        self.0.configured.set(true);
    }
    fn unconfigure_display(&mut self) {
        self.0.configured.set(false);
    }
    fn is_display_configured(&self) -> bool {
        self.0.configured.get()
    }
}

impl PowerSignal for Stub {
    fn user_activity(&mut self, _now_ms: u64) {}
    fn wake_up(&mut self, _now_ms: u64, _reason: WakeReason) {}
}

impl HapticSignal for Stub {
    fn vibrate(&mut self, _effect: HapticEffect, _usage: HapticUsage) {}
}

impl FaceAuthTrigger for Stub {
    fn is_running(&self) -> bool {
        true
    }
    fn request(&mut self, _reason: FaceAuthReason) {}
}

impl KeyguardSignal for Stub {
    fn is_fingerprint_detection_running(&self) -> bool {
        self.0.detection_running.get()
    }
    fn show_bouncer(&mut self) {}
}

impl SystemSettings for Stub {}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let mut trace_path: Option<PathBuf> = None;
    let mut expect_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut detection_running = true;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--expect" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err("missing path after --expect".into());
                };
                expect_path = Some(PathBuf::from(path));
            }
            "--config" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err("missing path after --config".into());
                };
                config_path = Some(PathBuf::from(path));
            }
            "--no-detection" => detection_running = false,
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            value if value.starts_with('-') => {
                return Err(format!("unknown argument: {value}"));
            }
            value => {
                if trace_path.is_some() {
                    return Err("multiple trace paths provided".into());
                }
                trace_path = Some(PathBuf::from(value));
            }
        }
        idx += 1;
    }

    let trace_path = trace_path.ok_or_else(usage)?;
    let config = match &config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            UdfpsConfig::from_toml_str(&raw).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => UdfpsConfig::default(),
    };
    let lines = parse_trace(&trace_path)?;

    let recorder = Rc::new(Recorder::default());
    recorder.detection_running.set(detection_running);
    let events = replay(config, &recorder, &lines)?;

    println!("event,ms,kind,request_id,x,y");
    for event in &events {
        println!(
            "event,{},{},{},{},{}",
            event.ms,
            kind_label(event.kind),
            event.request_id,
            event.x,
            event.y
        );
    }

    if let Some(expect_path) = expect_path {
        let expected = parse_expected_kinds(&expect_path)?;
        let actual: Vec<&'static str> = events.iter().map(|e| kind_label(e.kind)).collect();
        if actual != expected {
            eprintln!("expected kinds: {}", expected.join(","));
            eprintln!("actual kinds:   {}", actual.join(","));
            return Err("event sequence mismatch".into());
        }
    }

    Ok(())
}

fn replay(
    config: UdfpsConfig,
    recorder: &Rc<Recorder>,
    lines: &[ReplayLine],
) -> Result<Vec<ReplayEvent>, String> {
    let sensor_id = config.sensor_id;
    let hardware = Arc::new(HardwareInbox::new());
    let platform = Platform {
        power: Box::new(Stub(recorder.clone())),
        haptics: Box::new(Stub(recorder.clone())),
        face_auth: Box::new(Stub(recorder.clone())),
        keyguard: Box::new(Stub(recorder.clone())),
        settings: Box::new(Stub(recorder.clone())),
    };
    let route = DriverRoute::Direct(Box::new(Stub(recorder.clone())));
    let mut controller = UdfpsController::new(config, route, platform, hardware.clone())
        .map_err(|e| format!("invalid config: {e}"))?;
    controller.update_overlay_params(0, sensor_id, default_params());

    let mut active: Option<RequestId> = None;
    let mut last_ms = 0u64;
    for line in lines {
        let ms = line.ms;
        last_ms = last_ms.max(ms);
        recorder.now_ms.set(ms);
        controller.advance_clock(ms);

        match &line.record {
            Record::Params(params) => {
                controller.update_overlay_params(ms, sensor_id, *params);
            }
            Record::Show { request_id, reason } => {
                let request = OverlayRequest {
                    request_id: *request_id,
                    reason: *reason,
                };
                match controller.show_overlay(request, Box::new(Stub(recorder.clone()))) {
                    Ok(()) => active = Some(*request_id),
                    Err(err) => eprintln!("replay: show skipped at {ms}: {err}"),
                }
            }
            Record::Hide => {
                controller.hide_overlay(ms);
                active = None;
            }
            Record::Touch { request_id, event } => {
                if let Err(rejection) = controller.on_touch(ms, *request_id, event) {
                    eprintln!("replay: touch dropped at {ms}: {rejection}");
                }
            }
            Record::Acquired { code, vendor_code } => {
                // Delivered the way the HAL does it: through the inbox.
                hardware.post(HardwareSignal::acquired(sensor_id, *code, *vendor_code));
                controller.pump_hardware(ms);
            }
            Record::Aod(request) => {
                controller.on_aod_interrupt(ms, *request);
            }
            Record::DisplayReady => {
                if let Some(request_id) = active {
                    controller.on_display_ready(ms, DisplayReady { request_id });
                }
            }
            Record::ScreenOn => controller.on_screen_turned_on(ms),
            Record::ScreenOff => controller.on_screen_turned_off(),
            Record::Cancel => controller.on_cancel_udfps(ms),
            Record::Tick => {}
        }
    }

    let tail_ms = last_ms.saturating_add(TAIL_MS);
    recorder.now_ms.set(tail_ms);
    controller.advance_clock(tail_ms);

    let events = recorder.events.borrow().clone();
    Ok(events)
}

fn default_params() -> OverlayParams {
    OverlayParams {
        sensor_bounds: SensorRect::new(400, 1400, 600, 1600),
        sensor_shape: SensorShape::Ellipse,
        logical_display_width: 1080,
        logical_display_height: 2400,
        scale_factor: 1.0,
        rotation: Rotation::Rotation0,
    }
}

fn usage() -> String {
    "usage: touch_replay <trace.csv> [--config udfps.toml] [--no-detection] [--expect expected_kinds.txt]"
        .to_string()
}

fn parse_trace(path: &Path) -> Result<Vec<ReplayLine>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out: Vec<ReplayLine> = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == TRACE_HEADER {
            continue;
        }

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if parts.len() < 3 {
            return Err(format!(
                "{}:{} invalid trace line, expected at least 3 columns",
                path.display(),
                line_no
            ));
        }
        if parts[0] != "udfps_trace" {
            continue;
        }

        let at = Cursor {
            parts: &parts,
            path,
            line_no,
        };
        let ms = at.u64(1, "ms")?;
        let record = match parts[2] {
            "params" => Record::Params(OverlayParams {
                sensor_bounds: SensorRect::new(
                    at.i32(3, "left")?,
                    at.i32(4, "top")?,
                    at.i32(5, "right")?,
                    at.i32(6, "bottom")?,
                ),
                sensor_shape: SensorShape::Ellipse,
                logical_display_width: at.i32(7, "width")?,
                logical_display_height: at.i32(8, "height")?,
                scale_factor: at.f32(9, "scale")?,
                rotation: Rotation::from_quarter_turns(at.u8(10, "rotation")?),
            }),
            "show" => Record::Show {
                request_id: at.i64(3, "request_id")?,
                reason: parse_reason(at.field(4, "reason")?)
                    .ok_or_else(|| at.invalid("reason", parts[4]))?,
            },
            "hide" => Record::Hide,
            "touch" => Record::Touch {
                request_id: at.i64(3, "request_id")?,
                event: parse_touch(&at, ms)?,
            },
            "acquired" => Record::Acquired {
                code: at.i32(3, "code")?,
                vendor_code: if parts.len() > 4 { at.i32(4, "vendor_code")? } else { 0 },
            },
            "aod" => Record::Aod(AodRequest::new(
                at.i32(3, "x")?,
                at.i32(4, "y")?,
                at.f32(5, "major")?,
                at.f32(6, "minor")?,
            )),
            "display_ready" => Record::DisplayReady,
            "screen_on" => Record::ScreenOn,
            "screen_off" => Record::ScreenOff,
            "cancel" => Record::Cancel,
            "tick" => Record::Tick,
            other => return Err(at.invalid("kind", other)),
        };
        out.push(ReplayLine { ms, record });
    }

    Ok(out)
}

/// `touch` columns: request_id, action, pointer_id, x, y, minor, major.
fn parse_touch(at: &Cursor<'_>, ms: u64) -> Result<TouchEvent, String> {
    let action = at.field(4, "action")?;
    let frame = || -> Result<TouchFrame, String> {
        let sample = PointerSample::new(at.i32(5, "pointer_id")?, at.f32(6, "x")?, at.f32(7, "y")?)
            .with_size(at.f32_or(8, 0.0)?, at.f32_or(9, 0.0)?);
        Ok(TouchFrame::single(ms, sample))
    };
    Ok(match action {
        "down" => TouchEvent::Down(frame()?),
        "move" => TouchEvent::Move(frame()?),
        "up" => TouchEvent::Up(frame()?),
        "hover_enter" => TouchEvent::HoverEnter(frame()?),
        "hover_move" => TouchEvent::HoverMove(frame()?),
        "hover_exit" => TouchEvent::HoverExit,
        "cancel" => TouchEvent::Cancel,
        "outside" => TouchEvent::Outside,
        other => return Err(at.invalid("action", other)),
    })
}

fn parse_reason(raw: &str) -> Option<RequestReason> {
    match raw.to_ascii_lowercase().as_str() {
        "enroll_find" => Some(RequestReason::EnrollFind),
        "enroll_enrolling" => Some(RequestReason::EnrollEnrolling),
        "bp" | "biometric_prompt" => Some(RequestReason::AuthBiometricPrompt),
        "keyguard" => Some(RequestReason::AuthKeyguard),
        "settings" => Some(RequestReason::AuthSettings),
        "other" => Some(RequestReason::AuthOther),
        _ => None,
    }
}

fn parse_expected_kinds(path: &Path) -> Result<Vec<&'static str>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut kinds = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }

        let normalized = normalize_kind(token).ok_or_else(|| {
            format!(
                "{}:{} invalid expected event kind: {}",
                path.display(),
                line_no,
                token
            )
        })?;
        kinds.push(normalized);
    }

    Ok(kinds)
}

fn normalize_kind(kind: &str) -> Option<&'static str> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "finger_down" | "down" => Some("finger_down"),
        "finger_up" | "up" => Some("finger_up"),
        "ui_ready" => Some("ui_ready"),
        _ => None,
    }
}

fn kind_label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::FingerDown => "finger_down",
        EventKind::FingerUp => "finger_up",
        EventKind::UiReady => "ui_ready",
    }
}

struct Cursor<'a> {
    parts: &'a [&'a str],
    path: &'a Path,
    line_no: usize,
}

impl Cursor<'_> {
    fn field(&self, idx: usize, name: &str) -> Result<&str, String> {
        self.parts.get(idx).copied().ok_or_else(|| {
            format!(
                "{}:{} missing column {} ({})",
                self.path.display(),
                self.line_no,
                idx,
                name
            )
        })
    }

    fn invalid(&self, name: &str, raw: &str) -> String {
        format!(
            "{}:{} invalid {} '{}'",
            self.path.display(),
            self.line_no,
            name,
            raw
        )
    }

    fn parse<T>(&self, idx: usize, name: &str) -> Result<T, String>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.field(idx, name)?;
        raw.parse::<T>()
            .map_err(|e| format!("{}: {e}", self.invalid(name, raw)))
    }

    fn u64(&self, idx: usize, name: &str) -> Result<u64, String> {
        self.parse(idx, name)
    }

    fn i64(&self, idx: usize, name: &str) -> Result<i64, String> {
        self.parse(idx, name)
    }

    fn i32(&self, idx: usize, name: &str) -> Result<i32, String> {
        self.parse(idx, name)
    }

    fn u8(&self, idx: usize, name: &str) -> Result<u8, String> {
        self.parse(idx, name)
    }

    fn f32(&self, idx: usize, name: &str) -> Result<f32, String> {
        self.parse(idx, name)
    }

    fn f32_or(&self, idx: usize, fallback: f32) -> Result<f32, String> {
        if idx < self.parts.len() {
            self.parse(idx, "size")
        } else {
            Ok(fallback)
        }
    }
}
