use std::rc::Rc;

/// Notified once per physical FingerDown/FingerUp transition.
pub trait FingerObserver {
    fn on_finger_down(&self);
    fn on_finger_up(&self);
}

/// Subscription ticket. Handles are never reused, so a stale one cannot remove
/// a later observer; subscribing the same `Rc` twice yields the same handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

#[derive(Default)]
pub(crate) struct ObserverSet {
    entries: Vec<(ObserverHandle, Rc<dyn FingerObserver>)>,
    next_handle: u64,
}

impl ObserverSet {
    pub(crate) fn subscribe(&mut self, observer: Rc<dyn FingerObserver>) -> ObserverHandle {
        if let Some((known, _)) = self
            .entries
            .iter()
            .find(|(_, existing)| Rc::ptr_eq(existing, &observer))
        {
            return *known;
        }
        let handle = ObserverHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push((handle, observer));
        handle
    }

    pub(crate) fn unsubscribe(&mut self, handle: ObserverHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(known, _)| *known != handle);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn notify_finger_down(&self) {
        for observer in self.snapshot() {
            observer.on_finger_down();
        }
    }

    pub(crate) fn notify_finger_up(&self) {
        for observer in self.snapshot() {
            observer.on_finger_up();
        }
    }

    // Callbacks run against a copy so the set is not borrowed while they execute.
    fn snapshot(&self) -> Vec<Rc<dyn FingerObserver>> {
        self.entries.iter().map(|(_, observer)| Rc::clone(observer)).collect()
    }
}
