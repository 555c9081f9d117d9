use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, TrySendError},
};

use crate::collaborators::AlternateTouchProvider;
use crate::config::DRIVER_CHANNEL_DEPTH;
use crate::types::RequestId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DriverCommand {
    PointerDown {
        request_id: RequestId,
        x: i32,
        y: i32,
        minor: f32,
        major: f32,
    },
    PointerUp {
        request_id: RequestId,
    },
    UiReady {
        request_id: RequestId,
    },
}

/// Hand-off from the UI domain to the biometric thread that owns the
/// alternate touch provider. Posting never blocks.
pub struct DriverChannel {
    commands: Channel<CriticalSectionRawMutex, DriverCommand, DRIVER_CHANNEL_DEPTH>,
}

impl Default for DriverChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverChannel {
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
        }
    }

    pub fn post(&self, command: DriverCommand) -> bool {
        match self.commands.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                log::warn!("udfps: driver_channel_full dropped={:?}", command);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drains queued commands into `provider` without waiting; returns how many ran.
    pub fn pump(&self, provider: &mut dyn AlternateTouchProvider) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands.try_receive() {
            apply(provider, command);
            applied += 1;
        }
        applied
    }

    /// Worker loop for the biometric executor.
    pub async fn run_alternate_touch(&self, provider: &mut dyn AlternateTouchProvider) {
        loop {
            let command = self.commands.receive().await;
            apply(provider, command);
        }
    }
}

fn apply(provider: &mut dyn AlternateTouchProvider, command: DriverCommand) {
    match command {
        DriverCommand::PointerDown {
            request_id,
            x,
            y,
            minor,
            major,
        } => provider.on_pointer_down(request_id, x, y, minor, major),
        DriverCommand::PointerUp { request_id } => provider.on_pointer_up(request_id),
        DriverCommand::UiReady { request_id } => provider.on_ui_ready(request_id),
    }
}
