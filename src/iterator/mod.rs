/// Iterator module for docrows
///
/// Drives a [`Feed`] one row at a time and owns the iterator lifecycle:
///
/// ```text
///   New ──next()=true──→ Ready ──next()=true──→ Ready
///    │                     │
///    └──────── end of stream / feed failure / close ─────→ Closed
/// ```
///
/// `Closed` is terminal. Every later `next()` returns false without touching
/// the feed, and the feed is closed exactly once.
///
/// # Error channels
///
/// - `err()` reports a stream failure recorded when iteration stopped. End
///   of stream and explicit close leave it empty.
/// - `close()` reports the feed's own close failure. It never overwrites the
///   stream failure.
/// - A per-row failure travels inside the [`Row`] and is the façade's
///   concern, not the iterator's.
///
/// # Threading
///
/// One consumer drives `next()`. Closing may come from anywhere: a
/// [`CloseHandle`] or the cancellation watcher may close the iterator while
/// `next()` is blocked inside the feed.
use std::sync::Arc;

use crate::{
    feed::{Feed, Row},
    options::RowsOptions,
    statistics::Statistics,
    util::{Result, Status},
};

mod shared;
mod watcher;

pub use shared::CloseHandle;
use shared::Shared;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    New,
    Ready,
    Closed,
}

/// Iterator core over a boxed feed
pub struct Iter {
    shared: Arc<Shared>,
    state: State,
    current: Row,
}

impl Iter {
    /// Wrap `feed` with default options.
    pub fn new(feed: Box<dyn Feed>) -> Self {
        Self::build(feed, RowsOptions::default())
    }

    /// Wrap `feed`. With `options.cancel` set, a watcher thread closes the
    /// iterator when that token is cancelled.
    pub fn with_options(feed: Box<dyn Feed>, options: RowsOptions) -> Result<Self> {
        let iter = Self::build(feed, options);
        if iter.shared.parent.is_some() {
            watcher::spawn(&iter.shared)?;
        }
        Ok(iter)
    }

    fn build(feed: Box<dyn Feed>, options: RowsOptions) -> Self {
        let RowsOptions {
            cancel,
            statistics,
            on_close,
        } = options;

        let shared = Arc::new(Shared::new(feed, cancel, statistics, on_close));
        shared.feed.lock().bind_cancel(shared.token.clone());
        if let Some(stats) = &shared.statistics {
            stats.record_open();
        }

        Iter {
            shared,
            state: State::New,
            current: Row::default(),
        }
    }

    /// Advance to the next row
    ///
    /// Returns true if a row is now current. Returns false at end of stream,
    /// on a feed failure (see [`Iter::err`]) and on every call after the
    /// iterator closed.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.state == State::Closed || self.shared.is_closed() {
            self.mark_closed();
            return false;
        }

        let produced = {
            let mut feed = self.shared.feed.lock();
            if self.shared.is_closed() {
                drop(feed);
                self.mark_closed();
                return false;
            }
            // No rows leave a cancelled context, even before the watcher runs.
            if self.shared.cancellation().is_some() {
                drop(feed);
                self.mark_closed();
                self.shared.close_if_cancelled();
                return false;
            }
            self.current.reset();
            feed.next(&mut self.current)
        };

        // A row that raced with close is discarded.
        if self.shared.is_closed() {
            self.mark_closed();
            return false;
        }

        match produced {
            Ok(true) => {
                tracing::trace!(id = %self.current.id, "row produced");
                if let Some(stats) = &self.shared.statistics {
                    stats.record_row();
                }
                self.state = State::Ready;
                true
            }
            Ok(false) => {
                tracing::debug!("end of stream");
                if let Some(stats) = &self.shared.statistics {
                    stats.record_end_of_stream();
                }
                self.mark_closed();
                if !self.shared.close_if_cancelled() {
                    self.shared.close_quietly(None);
                }
                false
            }
            Err(status) => {
                tracing::warn!(error = %status, "feed failed, closing rows iterator");
                if let Some(stats) = &self.shared.statistics {
                    stats.record_iterator_error();
                }
                self.mark_closed();
                if !self.shared.close_if_cancelled() {
                    self.shared.close_quietly(Some(status));
                }
                false
            }
        }
    }

    /// Stream failure that ended iteration, if any.
    pub fn err(&self) -> Option<Status> {
        self.shared.last_error()
    }

    /// Close the iterator and its feed
    ///
    /// Returns the feed's close failure. Calling again returns `Ok(())`
    /// without reaching the feed.
    pub fn close(&self) -> Result<()> {
        self.shared.close()
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> State {
        if self.shared.is_closed() {
            State::Closed
        } else {
            self.state
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == State::Ready
    }

    pub fn is_closed(&self) -> bool {
        self.state() == State::Closed
    }

    /// The current row, or `None` unless the iterator is ready.
    pub fn current(&self) -> Option<&Row> {
        self.is_ready().then_some(&self.current)
    }

    /// The current row for decoding, or a closed status.
    pub(crate) fn current_mut(&mut self) -> Result<&mut Row> {
        if self.is_ready() {
            Ok(&mut self.current)
        } else {
            Err(Status::closed())
        }
    }

    /// Run `f` against the feed. Used by the capability probe.
    pub(crate) fn with_feed<T>(&self, f: impl FnOnce(&dyn Feed) -> T) -> T {
        let feed = self.shared.feed.lock();
        f(&**feed)
    }

    pub(crate) fn statistics(&self) -> Option<&Arc<Statistics>> {
        self.shared.statistics.as_ref()
    }

    fn mark_closed(&mut self) {
        if self.state != State::Closed {
            self.state = State::Closed;
            self.current.reset();
        }
    }
}

impl Drop for Iter {
    fn drop(&mut self) {
        self.shared.close_quietly(None);
    }
}
