use embassy_futures::select::{select3, Either3};
use embassy_time::{Instant, Timer};

use super::UiSignal;
use super::UiInbox;
use crate::controller::UdfpsController;

/// Drives the controller from the UI inbox, the hardware inbox and its own
/// timer queue until `UiSignal::Shutdown` arrives.
pub async fn run_ui_loop(controller: &mut UdfpsController, ui: &UiInbox) {
    let hardware = controller.hardware_inbox();
    log::debug!("udfps: ui_loop start");

    loop {
        controller.advance_clock(now_ms());
        let deadline = controller.next_deadline_ms();
        let wake = async move {
            match deadline {
                Some(deadline_ms) => Timer::at(Instant::from_millis(deadline_ms)).await,
                None => core::future::pending::<()>().await,
            }
        };

        match select3(ui.receive(), hardware.receive(), wake).await {
            Either3::First(signal) => {
                if !dispatch_ui_signal(controller, now_ms(), signal) {
                    break;
                }
            }
            Either3::Second(signal) => controller.on_hardware_signal(now_ms(), signal),
            Either3::Third(()) => {}
        }
    }

    log::debug!("udfps: ui_loop stop");
}

/// Applies one UI signal; returns false on shutdown.
pub fn dispatch_ui_signal(controller: &mut UdfpsController, now_ms: u64, signal: UiSignal) -> bool {
    match signal {
        UiSignal::Touch { request_id, event } => {
            // Rejections are logged by the session; nothing to report upstream.
            let _ = controller.on_touch(now_ms, request_id, &event);
        }
        UiSignal::DisplayReady(ready) => controller.on_display_ready(now_ms, ready),
        UiSignal::AodInterrupt(request) => {
            controller.on_aod_interrupt(now_ms, request);
        }
        UiSignal::ScreenTurnedOn => controller.on_screen_turned_on(now_ms),
        UiSignal::ScreenTurnedOff => controller.on_screen_turned_off(),
        UiSignal::CancelUdfps => controller.on_cancel_udfps(now_ms),
        UiSignal::HideOverlay => {
            controller.hide_overlay(now_ms);
        }
        UiSignal::Shutdown => return false,
    }
    true
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}
