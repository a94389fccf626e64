use std::collections::VecDeque;

use crate::{
    feed::{Bookmarker, Feed, QueryIndexer, ResultSummary, Row, Warner},
    util::{Result, Status},
};

enum Entry {
    Row(Row),
    Fail(Status),
}

#[derive(Clone)]
struct Summary {
    offset: i64,
    total_rows: i64,
    update_seq: String,
}

/// Feed over rows held in memory
///
/// Rows and stream failures are replayed in the order they were pushed.
/// Each metadata capability is advertised only if it was configured, so one
/// type can stand in for backends with different capability sets.
///
/// # Implementation Notes
///
/// Entries are moved out of the queue as they are produced, so a row's
/// streaming payload is handed to the iterator unread.
#[derive(Default)]
pub struct MemoryFeed {
    entries: VecDeque<Entry>,
    warning: Option<String>,
    bookmark: Option<String>,
    summary: Option<Summary>,
    query_index: Option<usize>,
    close_error: Option<Status>,
    closed: bool,
}

impl MemoryFeed {
    pub fn new() -> Self {
        MemoryFeed::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let mut feed = MemoryFeed::new();
        for row in rows {
            feed.push_row(row);
        }
        feed
    }

    pub fn push_row(&mut self, row: Row) -> &mut Self {
        self.entries.push_back(Entry::Row(row));
        self
    }

    /// Queue a stream failure; `next` returns it when reached.
    pub fn push_error(&mut self, status: Status) -> &mut Self {
        self.entries.push_back(Entry::Fail(status));
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn with_bookmark(mut self, bookmark: impl Into<String>) -> Self {
        self.bookmark = Some(bookmark.into());
        self
    }

    pub fn with_summary(mut self, offset: i64, total_rows: i64, update_seq: impl Into<String>) -> Self {
        self.summary = Some(Summary {
            offset,
            total_rows,
            update_seq: update_seq.into(),
        });
        self
    }

    pub fn with_query_index(mut self, index: usize) -> Self {
        self.query_index = Some(index);
        self
    }

    /// Make `close` fail with `status`.
    pub fn with_close_error(mut self, status: Status) -> Self {
        self.close_error = Some(status);
        self
    }

    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Feed for MemoryFeed {
    fn next(&mut self, row: &mut Row) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        match self.entries.pop_front() {
            Some(Entry::Row(next)) => {
                *row = next;
                Ok(true)
            }
            Some(Entry::Fail(status)) => Err(status),
            None => Ok(false),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.entries.clear();
        match self.close_error.take() {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn as_warner(&self) -> Option<&dyn Warner> {
        self.warning.as_ref().map(|_| self as &dyn Warner)
    }

    fn as_bookmarker(&self) -> Option<&dyn Bookmarker> {
        self.bookmark.as_ref().map(|_| self as &dyn Bookmarker)
    }

    fn as_summary(&self) -> Option<&dyn ResultSummary> {
        self.summary.as_ref().map(|_| self as &dyn ResultSummary)
    }

    fn as_query_indexer(&self) -> Option<&dyn QueryIndexer> {
        self.query_index.map(|_| self as &dyn QueryIndexer)
    }
}

impl Warner for MemoryFeed {
    fn warning(&self) -> String {
        self.warning.clone().unwrap_or_default()
    }
}

impl Bookmarker for MemoryFeed {
    fn bookmark(&self) -> String {
        self.bookmark.clone().unwrap_or_default()
    }
}

impl ResultSummary for MemoryFeed {
    fn offset(&self) -> i64 {
        self.summary.as_ref().map_or(0, |s| s.offset)
    }

    fn total_rows(&self) -> i64 {
        self.summary.as_ref().map_or(0, |s| s.total_rows)
    }

    fn update_seq(&self) -> String {
        self.summary
            .as_ref()
            .map(|s| s.update_seq.clone())
            .unwrap_or_default()
    }
}

impl QueryIndexer for MemoryFeed {
    fn query_index(&self) -> usize {
        self.query_index.unwrap_or_default()
    }
}
