/// Rows module for docrows
///
/// [`Rows`] is the typed façade consumers iterate over. It layers on top of
/// the iterator core:
///
/// - lazy JSON decoding of the current row's value, document and key
/// - defensive accessors for the row id and key that degrade to `""`
/// - result-set metadata served by the capability probe
///
/// ```ignore
/// let mut rows = Rows::new(feed);
/// while rows.next() {
///     let doc: MyDoc = rows.scan_doc()?;
/// }
/// if let Some(err) = rows.err() {
///     return Err(err);
/// }
/// rows.close()?;
/// ```
///
/// # Row errors
///
/// A row carrying an error is a failed result inside a healthy stream. Every
/// scan of that row returns the row's error, ahead of any payload it may
/// also carry. Stream failures are reported by [`Rows::err`] instead.
use serde::de::DeserializeOwned;

use crate::{
    feed::{Feed, Row},
    iterator::{CloseHandle, Iter},
    options::RowsOptions,
    util::{Result, Status},
};

mod capabilities;
mod metadata;

pub use capabilities::CapabilitySet;
pub use metadata::ResultMetadata;

use capabilities::Capabilities;

pub struct Rows {
    iter: Iter,
    caps: Capabilities,
}

impl Rows {
    pub fn new(feed: impl Feed + 'static) -> Self {
        Self::wrap(Iter::new(Box::new(feed)))
    }

    pub fn with_options(feed: impl Feed + 'static, options: RowsOptions) -> Result<Self> {
        Ok(Self::wrap(Iter::with_options(
            Box::new(feed),
            options,
        )?))
    }

    fn wrap(iter: Iter) -> Self {
        let caps = iter.with_feed(Capabilities::probe);
        Rows { iter, caps }
    }

    /// Advance to the next row. See [`Iter::next`].
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        self.iter.next()
    }

    pub fn err(&self) -> Option<Status> {
        self.iter.err()
    }

    pub fn close(&self) -> Result<()> {
        self.iter.close()
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.iter.close_handle()
    }

    pub fn is_ready(&self) -> bool {
        self.iter.is_ready()
    }

    pub fn is_closed(&self) -> bool {
        self.iter.is_closed()
    }

    /// The current row, or `None` unless ready.
    pub fn row(&self) -> Option<&Row> {
        self.iter.current()
    }

    /// Decode the current row's value
    ///
    /// A streaming value can be decoded once; later calls for the same row
    /// fail with a corruption status.
    pub fn scan_value<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.scan(|row| match row.value.as_mut() {
            Some(payload) => payload.decode(),
            None => Ok(serde_json::from_slice(&[])?),
        })
    }

    /// Decode the current row's embedded document
    ///
    /// Fails with [`Code::MissingDoc`](crate::util::Code::MissingDoc) when
    /// the row has no document, typically because the query did not ask for
    /// one.
    pub fn scan_doc<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.scan(|row| match row.doc.as_mut() {
            Some(payload) => payload.decode(),
            None => Err(Status::missing_doc()),
        })
    }

    /// Decode the current row's key
    pub fn scan_key<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.scan(|row| Ok(serde_json::from_slice(&row.key)?))
    }

    fn scan<T>(&mut self, decode: impl FnOnce(&mut Row) -> Result<T>) -> Result<T> {
        let stats = self.iter.statistics().cloned();
        let row = self.iter.current_mut()?;

        if let Some(err) = &row.error {
            if let Some(stats) = &stats {
                stats.record_row_error();
            }
            return Err(err.clone());
        }

        let result = decode(row);
        if let Some(stats) = &stats {
            if !matches!(&result, Err(e) if e.is_missing_doc()) {
                stats.record_decode(result.is_ok());
            }
        }
        result
    }

    /// Current row id, or `""` unless ready.
    pub fn id(&self) -> &str {
        self.row().map_or("", |row| row.id.as_str())
    }

    /// Current row key as raw JSON text, or `""` unless ready.
    pub fn key(&self) -> String {
        self.row().map(Row::key_str).unwrap_or_default()
    }

    pub fn warning(&self) -> String {
        self.iter.with_feed(|feed| self.caps.warning(feed))
    }

    pub fn bookmark(&self) -> String {
        self.iter.with_feed(|feed| self.caps.bookmark(feed))
    }

    pub fn query_index(&self) -> usize {
        self.iter.with_feed(|feed| self.caps.query_index(feed))
    }

    pub fn offset(&self) -> i64 {
        self.iter.with_feed(|feed| self.caps.offset(feed))
    }

    pub fn total_rows(&self) -> i64 {
        self.iter.with_feed(|feed| self.caps.total_rows(feed))
    }

    pub fn update_seq(&self) -> String {
        self.iter.with_feed(|feed| self.caps.update_seq(feed))
    }

    /// All result-set metadata in one read of the feed.
    pub fn metadata(&self) -> ResultMetadata {
        let caps = &self.caps;
        self.iter.with_feed(|feed| ResultMetadata {
            offset: caps.offset(feed),
            total_rows: caps.total_rows(feed),
            update_seq: caps.update_seq(feed),
            warning: caps.warning(feed),
            bookmark: caps.bookmark(feed),
        })
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.caps.set()
    }

    /// Decode the document of every remaining row
    ///
    /// Stops at the first failing row and returns its error. On success the
    /// iterator is closed and its close result is returned.
    pub fn scan_all_docs<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        self.scan_all(|rows| rows.scan_doc())
    }

    /// Decode the value of every remaining row. See [`Rows::scan_all_docs`].
    pub fn scan_all_values<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        self.scan_all(|rows| rows.scan_value())
    }

    fn scan_all<T>(&mut self, mut scan: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let mut out = Vec::new();
        while self.next() {
            match scan(self) {
                Ok(item) => out.push(item),
                Err(err) => {
                    if let Err(close_err) = self.close() {
                        tracing::warn!(error = %close_err, "close after failed scan");
                    }
                    return Err(err);
                }
            }
        }
        if let Some(err) = self.err() {
            return Err(err);
        }
        self.close()?;
        Ok(out)
    }
}
