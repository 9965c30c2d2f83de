use crate::io::storage::Collection;

/// What changed in a [`super::Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// One or more collections were mutated
    Changed(Vec<Collection>),
    /// Focus session state changed (opened, closed, paused, extended...)
    Focus,
    /// The focus countdown reached zero
    FocusFinished,
    /// View or search query changed
    View,
}

/// Handle returned by [`Subscribers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&StoreEvent) + Send>;

/// Callback list notified after every store change, in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Returns true if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sid, _)| *sid != id);
        self.callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn emit(&mut self, event: &StoreEvent) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(event);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_reaches_live_subscribers_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::new();

        let log = Arc::clone(&seen);
        let first = subs.subscribe(move |e| log.lock().unwrap().push(("first", e.clone())));
        let log = Arc::clone(&seen);
        subs.subscribe(move |e| log.lock().unwrap().push(("second", e.clone())));

        subs.emit(&StoreEvent::View);
        assert!(subs.unsubscribe(first));
        assert!(!subs.unsubscribe(first));
        subs.emit(&StoreEvent::Focus);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("first", StoreEvent::View),
                ("second", StoreEvent::View),
                ("second", StoreEvent::Focus),
            ]
        );
        assert_eq!(subs.len(), 1);
    }
}
