/// Feed module for docrows
///
/// A feed is the backend-supplied source of result rows. The iterator core
/// depends on nothing else: network drivers, in-memory stores and test
/// doubles all plug in by implementing [`Feed`].
///
/// # Optional metadata
///
/// Some backends report extra, result-set level information (warnings,
/// continuation bookmarks, pagination counters, the index of the current
/// query in a batch). Rather than forcing every feed to implement all of it,
/// each piece lives in its own small trait and the feed advertises support
/// through the `as_*` probe methods:
///
/// ```ignore
/// impl Feed for MyFeed {
///     // ...
///     fn as_bookmarker(&self) -> Option<&dyn Bookmarker> {
///         Some(self)
///     }
/// }
/// ```
///
/// The probes are consulted once, when the feed is wrapped, so a feed's
/// capability set must not change while it is being iterated.
use crate::util::{CancelToken, Result};

/// Backend source of rows
///
/// # Contract
///
/// - `next` fills `row` and returns `Ok(true)`, returns `Ok(false)` at the end
///   of the stream, or returns `Err` when the stream itself has failed. The
///   container is reset by the caller before every call.
/// - A failure that only affects one result is reported by setting
///   `row.error` and returning `Ok(true)`.
/// - `close` releases backend resources. The iterator calls it exactly once.
pub trait Feed: Send {
    fn next(&mut self, row: &mut Row) -> Result<bool>;

    fn close(&mut self) -> Result<()>;

    /// Receive the token the iterator cancels when it is closed.
    ///
    /// A feed whose `next` may block should watch this token so that a close
    /// issued from another thread can unblock it.
    fn bind_cancel(&mut self, _token: CancelToken) {}

    fn as_warner(&self) -> Option<&dyn Warner> {
        None
    }

    fn as_bookmarker(&self) -> Option<&dyn Bookmarker> {
        None
    }

    fn as_summary(&self) -> Option<&dyn ResultSummary> {
        None
    }

    fn as_query_indexer(&self) -> Option<&dyn QueryIndexer> {
        None
    }
}

/// Warning text attached to a result set.
pub trait Warner {
    fn warning(&self) -> String;
}

/// Continuation token for paginated queries.
pub trait Bookmarker {
    fn bookmark(&self) -> String;
}

/// View-style pagination counters.
pub trait ResultSummary {
    fn offset(&self) -> i64;
    fn total_rows(&self) -> i64;
    fn update_seq(&self) -> String;
}

/// Position of the current query within a multi-query batch.
pub trait QueryIndexer {
    fn query_index(&self) -> usize;
}

impl<F: Feed + ?Sized> Feed for Box<F> {
    fn next(&mut self, row: &mut Row) -> Result<bool> {
        (**self).next(row)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn bind_cancel(&mut self, token: CancelToken) {
        (**self).bind_cancel(token)
    }

    fn as_warner(&self) -> Option<&dyn Warner> {
        (**self).as_warner()
    }

    fn as_bookmarker(&self) -> Option<&dyn Bookmarker> {
        (**self).as_bookmarker()
    }

    fn as_summary(&self) -> Option<&dyn ResultSummary> {
        (**self).as_summary()
    }

    fn as_query_indexer(&self) -> Option<&dyn QueryIndexer> {
        (**self).as_query_indexer()
    }
}

mod memory;
mod row;

pub use memory::MemoryFeed;
pub use row::{Payload, Row};
