use heapless::Vec;

use crate::config::UI_TIMER_SLOTS;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CancelToken(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTask {
    AodTimeout,
}

/// Delayed work on the UI domain. Firing and cancelling happen on the same
/// thread as touch processing, so a cancelled task never fires.
pub trait Timer {
    fn schedule(&mut self, delay_ms: u64, task: TimerTask) -> CancelToken;
    fn cancel(&mut self, token: CancelToken);
}

#[derive(Clone, Copy, Debug)]
struct Scheduled {
    token: CancelToken,
    deadline_ms: u64,
    task: TimerTask,
}

/// Deadline list polled by the UI loop; the loop sleeps until `next_deadline`.
#[derive(Debug, Default)]
pub struct UiTimerQueue {
    now_ms: u64,
    next_token: u32,
    entries: Vec<Scheduled, UI_TIMER_SLOTS>,
}

impl UiTimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock used as the base for new deadlines. Never moves backwards.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|entry| entry.deadline_ms).min()
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Removes and returns the earliest task due at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> Option<(CancelToken, TimerTask)> {
        self.set_now(now_ms);
        let (index, _) = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline_ms <= now_ms)
            .min_by_key(|(_, entry)| entry.deadline_ms)?;
        let entry = self.entries.swap_remove(index);
        Some((entry.token, entry.task))
    }
}

impl Timer for UiTimerQueue {
    fn schedule(&mut self, delay_ms: u64, task: TimerTask) -> CancelToken {
        let token = CancelToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        let entry = Scheduled {
            token,
            deadline_ms: self.now_ms.saturating_add(delay_ms),
            task,
        };
        if let Err(entry) = self.entries.push(entry) {
            // Full: the earliest deadline is the one most likely already stale.
            if let Some((index, _)) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, scheduled)| scheduled.deadline_ms)
            {
                let dropped = self.entries[index];
                log::warn!(
                    "udfps: timer_queue_full dropped_task={:?} deadline_ms={}",
                    dropped.task,
                    dropped.deadline_ms
                );
                self.entries[index] = entry;
            }
        }
        token
    }

    fn cancel(&mut self, token: CancelToken) {
        self.entries.retain(|entry| entry.token != token);
    }
}
