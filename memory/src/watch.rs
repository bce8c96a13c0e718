use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver};
use parking_lot::Mutex;

/// What a listener wants after being called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerStatus {
    /// Keep calling this listener on later changes.
    Keep,
    /// Unsubscribe this listener.
    Done,
}

/// Identifies a subscription, see [`Watchers::unsubscribe()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn() -> ListenerStatus + Send + Sync>;

/// A registry of callbacks that run whenever the board changes.
///
/// Listeners get no arguments, they look at the board themselves. They are
/// called on the thread that changed the board, after it has let go of every
/// board lock, so they must return quickly. Subscribing from inside a
/// listener is fine.
#[derive(Default)]
pub struct Watchers {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
}

impl Watchers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() -> ListenerStatus + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the listener was not (or no longer) subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let len_before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != len_before
    }

    /// A one-shot subscription: the receiver gets a single message on the
    /// next change.
    ///
    /// A waiter that gives up should pass the id to [`Self::unsubscribe()`].
    /// Otherwise the listener stays until the next change, however long the
    /// board stays quiet.
    pub fn watch(&self) -> (ListenerId, Receiver<()>) {
        let (tx, rx) = bounded(1);
        let id = self.subscribe(move || {
            // Full or disconnected both mean nobody needs another message
            let _ = tx.try_send(());
            ListenerStatus::Done
        });
        (id, rx)
    }

    /// Calls every listener. Returns how many were called.
    pub fn notify(&self) -> usize {
        // Snapshot, so that listeners run without the lock held
        let snapshot: Vec<(ListenerId, Listener)> = self.listeners.lock().clone();
        let mut finished = Vec::new();
        for (id, listener) in &snapshot {
            if listener() == ListenerStatus::Done {
                finished.push(*id);
            }
        }
        if !finished.is_empty() {
            self.listeners
                .lock()
                .retain(|(id, _)| !finished.contains(id));
        }
        snapshot.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Watchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchers")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn persistent_listener_sees_every_change() {
        let watchers = Watchers::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        watchers.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ListenerStatus::Keep
        });
        assert_eq!(watchers.notify(), 1);
        assert_eq!(watchers.notify(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(watchers.len(), 1);
    }

    #[test]
    fn watch_fires_once() {
        let watchers = Watchers::new();
        let (_, rx) = watchers.watch();
        assert!(rx.try_recv().is_err());
        watchers.notify();
        assert_eq!(rx.try_recv(), Ok(()));
        assert!(watchers.is_empty());
        watchers.notify();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_watch_is_cleaned_up() {
        let watchers = Watchers::new();
        drop(watchers.watch());
        assert_eq!(watchers.len(), 1);
        watchers.notify();
        assert!(watchers.is_empty());
    }

    #[test]
    fn timed_out_watches_do_not_pile_up() {
        let watchers = Watchers::new();
        for _ in 0..500 {
            let (id, rx) = watchers.watch();
            assert!(rx.recv_timeout(std::time::Duration::from_millis(1)).is_err());
            assert!(watchers.unsubscribe(id));
        }
        assert!(watchers.is_empty());
        assert_eq!(watchers.notify(), 0);
    }

    #[test]
    fn unsubscribe() {
        let watchers = Watchers::new();
        let id = watchers.subscribe(|| ListenerStatus::Keep);
        assert!(watchers.unsubscribe(id));
        assert!(!watchers.unsubscribe(id));
        assert_eq!(watchers.notify(), 0);
    }

    #[test]
    fn listener_can_resubscribe_while_notified() {
        let watchers = Arc::new(Watchers::new());
        let inner = Arc::clone(&watchers);
        let rx_slot: Arc<Mutex<Option<Receiver<()>>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&rx_slot);
        watchers.subscribe(move || {
            *slot.lock() = Some(inner.watch().1);
            ListenerStatus::Done
        });
        watchers.notify();
        let rx = rx_slot.lock().take().expect("listener subscribed again");
        watchers.notify();
        assert_eq!(rx.try_recv(), Ok(()));
    }

    #[test]
    fn concurrent_subscribe_and_notify() {
        let watchers = Watchers::new();
        let receivers: Vec<Receiver<()>> = std::thread::scope(|s| {
            let notifier = s.spawn(|| {
                for _ in 0..100 {
                    watchers.notify();
                }
            });
            let subscriber = s.spawn(|| (0..100).map(|_| watchers.watch().1).collect::<Vec<_>>());
            notifier.join().unwrap();
            subscriber.join().unwrap()
        });
        watchers.notify();
        assert!(receivers.iter().all(|rx| rx.try_recv() == Ok(())));
    }
}
