pub mod feed;
pub mod iterator;
pub mod options;
pub mod rows;
pub mod statistics;
pub mod util;

pub use feed::{Bookmarker, Feed, MemoryFeed, Payload, QueryIndexer, ResultSummary, Row, Warner};
pub use iterator::{CloseHandle, Iter, State};
pub use options::RowsOptions;
pub use rows::{CapabilitySet, ResultMetadata, Rows};
pub use statistics::{Statistics, StatisticsSnapshot};
pub use util::{CancelToken, Code, Result, Status};
