use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{bounded, Receiver, Sender};

/// Single-shot broadcast that ends a session.
///
/// Clones share the same state. Raising drops the only sender of a
/// zero-capacity channel, so every `listener()` becomes ready and stays
/// ready for the rest of the process.
#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

struct Inner {
    raised: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    listener: Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (trigger, listener) = bounded(0);
        let inner = Inner {
            raised: AtomicBool::new(false),
            trigger: Mutex::new(Some(trigger)),
            listener,
        };
        Shutdown { inner: Arc::new(inner) }
    }

    /// Returns `true` only for the call that actually raised the signal.
    pub fn raise(&self) -> bool {
        if self.inner.raised.swap(true, Ordering::SeqCst) {
            return false;
        }

        let mut trigger = self.inner.trigger.lock().unwrap_or_else(PoisonError::into_inner);
        drop(trigger.take());
        true
    }

    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::SeqCst)
    }

    /// Channel that becomes ready (disconnected) once the signal is raised.
    /// Meant for `select!`; nothing is ever sent on it.
    pub fn listener(&self) -> &Receiver<()> {
        &self.inner.listener
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::RecvTimeoutError;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn starts_lowered() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_raised());
        let waited = shutdown.listener().recv_timeout(Duration::from_millis(5));
        assert_eq!(waited, Err(RecvTimeoutError::Timeout));
    }

    #[test]
    fn raising_twice_is_harmless() {
        let shutdown = Shutdown::new();
        assert!(shutdown.raise());
        assert!(!shutdown.raise());
        assert!(shutdown.is_raised());
    }

    #[test]
    fn listener_wakes_every_clone() {
        let shutdown = Shutdown::new();
        let other = shutdown.clone();

        let waiter = thread::spawn(move || other.listener().recv().is_err());
        shutdown.raise();

        assert!(waiter.join().unwrap());
        // Stays ready after the first wake-up.
        assert!(shutdown.listener().recv().is_err());
        assert!(shutdown.listener().recv().is_err());
    }
}
