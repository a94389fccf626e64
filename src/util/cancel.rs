use std::{
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

/// A cooperative cancellation signal.
///
/// Clones share the same signal. A token created with [`CancelToken::child`]
/// is cancelled whenever its parent is, but cancelling the child leaves the
/// parent untouched.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    cond: Condvar,
}

#[derive(Default)]
struct State {
    cancelled: bool,
    children: Vec<Weak<Inner>>,
}

impl Inner {
    fn cancel(&self) {
        let children = {
            let mut state = self.state.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            std::mem::take(&mut state.children)
        };
        self.cond.notify_all();

        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Create a token that is cancelled together with `self`.
    pub fn child(&self) -> CancelToken {
        let child = CancelToken::new();
        let mut state = self.inner.state.lock();
        if state.cancelled {
            child.inner.state.lock().cancelled = true;
        } else {
            state.children.retain(|w| w.strong_count() > 0);
            state.children.push(Arc::downgrade(&child.inner));
        }
        child
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.state.lock().cancelled
    }

    /// Block until the token is cancelled.
    pub fn wait(&self) {
        let mut state = self.inner.state.lock();
        while !state.cancelled {
            self.inner.cond.wait(&mut state);
        }
    }

    /// Block until the token is cancelled or `timeout` elapses.
    ///
    /// Returns true if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        // A deadline past what `Instant` can represent never expires.
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut state = self.inner.state.lock();
        while !state.cancelled {
            if self.inner.cond.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.cancelled
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
