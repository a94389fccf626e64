use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::{Condvar, Mutex};

use crate::{
    feed::Feed,
    options::OnClose,
    statistics::Statistics,
    util::{CancelToken, Result, Status},
};

/// State reachable from every thread that may close the iterator.
///
/// # Locking
///
/// `feed` is held for the whole duration of `Feed::next`. `close` flips
/// `closed` and cancels `token` before taking that lock, so a blocking feed
/// that watches its token is released first.
pub(crate) struct Shared {
    closed: AtomicBool,
    last_error: Mutex<Option<Status>>,
    closing: Mutex<Closing>,
    /// Signalled once `Feed::close` has returned.
    closing_done: Condvar,
    pub(crate) feed: Mutex<Box<dyn Feed>>,
    pub(crate) token: CancelToken,
    /// External cancellation source `token` was derived from.
    pub(crate) parent: Option<CancelToken>,
    pub(crate) statistics: Option<Arc<Statistics>>,
    on_close: Option<OnClose>,
}

#[derive(Default)]
struct Closing {
    done: bool,
    /// Feed close failure from an implicit close, handed to the next caller.
    error: Option<Status>,
}

impl Shared {
    pub(crate) fn new(
        feed: Box<dyn Feed>,
        parent: Option<CancelToken>,
        statistics: Option<Arc<Statistics>>,
        on_close: Option<OnClose>,
    ) -> Self {
        let token = parent.as_ref().map(CancelToken::child).unwrap_or_default();
        Shared {
            closed: AtomicBool::new(false),
            last_error: Mutex::new(None),
            closing: Mutex::new(Closing::default()),
            closing_done: Condvar::new(),
            feed: Mutex::new(feed),
            token,
            parent,
            statistics,
            on_close,
        }
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The error to record when the external source has been cancelled.
    pub(crate) fn cancellation(&self) -> Option<Status> {
        self.parent
            .as_ref()
            .filter(|p| p.is_cancelled())
            .map(|_| Status::aborted("context canceled"))
    }

    pub(crate) fn last_error(&self) -> Option<Status> {
        self.last_error.lock().clone()
    }

    /// Close on behalf of a caller that will see the result.
    ///
    /// Only the call that performs the transition reaches the feed. Any
    /// other call waits until the feed has been released, then returns a
    /// close failure left behind by an implicit close, at most once, and
    /// otherwise `Ok(())`.
    pub(crate) fn close(&self) -> Result<()> {
        if let Some(result) = self.transition(None, false) {
            return result;
        }

        let mut closing = self.closing.lock();
        while !closing.done {
            self.closing_done.wait(&mut closing);
        }
        match closing.error.take() {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    /// Close without a caller to report to: end of stream, stream failure,
    /// cancellation or drop. `cause` becomes the last error.
    ///
    /// Returns true if this call closed the iterator.
    pub(crate) fn close_quietly(&self, cause: Option<Status>) -> bool {
        self.transition(cause, true).is_some()
    }

    /// Close with the cancellation error if the external source has fired.
    ///
    /// Returns false if it has not. The cancellation is counted only by the
    /// call that closes the iterator.
    pub(crate) fn close_if_cancelled(&self) -> bool {
        let Some(cause) = self.cancellation() else {
            return false;
        };
        if self.close_quietly(Some(cause)) {
            if let Some(stats) = &self.statistics {
                stats.record_cancellation();
            }
        }
        true
    }

    /// Run the closed transition. Returns `None` if it already happened.
    fn transition(&self, cause: Option<Status>, stash_error: bool) -> Option<Result<()>> {
        {
            // Held across the swap so that anyone who sees `closed` also
            // sees the recorded cause.
            let mut last = self.last_error.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                return None;
            }
            *last = cause;
        }

        self.token.cancel();
        let result = self.feed.lock().close();

        match &result {
            Ok(()) => tracing::debug!("rows iterator closed"),
            Err(e) => tracing::warn!(error = %e, "feed close failed"),
        }
        if let Some(stats) = &self.statistics {
            stats.record_close(result.is_err());
        }

        {
            let mut closing = self.closing.lock();
            closing.done = true;
            if stash_error {
                closing.error = result.as_ref().err().cloned();
            }
        }
        self.closing_done.notify_all();

        if let Some(hook) = &self.on_close {
            hook();
        }

        Some(result)
    }
}

/// Closes an iterator from any thread.
///
/// Obtained from [`Iter::close_handle`](crate::iterator::Iter::close_handle).
/// Closing through the handle has exactly the effect of calling `close` on
/// the iterator itself.
#[derive(Clone)]
pub struct CloseHandle {
    pub(crate) shared: Arc<Shared>,
}

impl CloseHandle {
    pub fn close(&self) -> Result<()> {
        self.shared.close()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl std::fmt::Debug for CloseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}
