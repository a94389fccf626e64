use crate::feed::Feed;

/// Which optional metadata a feed provides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pub warning: bool,
    pub bookmark: bool,
    pub summary: bool,
    pub query_index: bool,
}

/// Metadata accessors resolved once against a feed
///
/// Each accessor is either a forwarder to the feed's capability or a
/// constant returning the zero value, so no per-call probing is needed.
#[derive(Clone, Copy)]
pub(crate) struct Capabilities {
    set: CapabilitySet,
    warning: fn(&dyn Feed) -> String,
    bookmark: fn(&dyn Feed) -> String,
    offset: fn(&dyn Feed) -> i64,
    total_rows: fn(&dyn Feed) -> i64,
    update_seq: fn(&dyn Feed) -> String,
    query_index: fn(&dyn Feed) -> usize,
}

impl Capabilities {
    pub(crate) fn probe(feed: &dyn Feed) -> Self {
        let set = CapabilitySet {
            warning: feed.as_warner().is_some(),
            bookmark: feed.as_bookmarker().is_some(),
            summary: feed.as_summary().is_some(),
            query_index: feed.as_query_indexer().is_some(),
        };

        Capabilities {
            set,
            warning: if set.warning { warning } else { empty },
            bookmark: if set.bookmark { bookmark } else { empty },
            offset: if set.summary { offset } else { zero },
            total_rows: if set.summary { total_rows } else { zero },
            update_seq: if set.summary { update_seq } else { empty },
            query_index: if set.query_index { query_index } else { zero_index },
        }
    }

    pub(crate) fn set(&self) -> CapabilitySet {
        self.set
    }

    pub(crate) fn warning(&self, feed: &dyn Feed) -> String {
        (self.warning)(feed)
    }

    pub(crate) fn bookmark(&self, feed: &dyn Feed) -> String {
        (self.bookmark)(feed)
    }

    pub(crate) fn offset(&self, feed: &dyn Feed) -> i64 {
        (self.offset)(feed)
    }

    pub(crate) fn total_rows(&self, feed: &dyn Feed) -> i64 {
        (self.total_rows)(feed)
    }

    pub(crate) fn update_seq(&self, feed: &dyn Feed) -> String {
        (self.update_seq)(feed)
    }

    pub(crate) fn query_index(&self, feed: &dyn Feed) -> usize {
        (self.query_index)(feed)
    }
}

fn warning(feed: &dyn Feed) -> String {
    feed.as_warner().map(|w| w.warning()).unwrap_or_default()
}

fn bookmark(feed: &dyn Feed) -> String {
    feed.as_bookmarker().map(|b| b.bookmark()).unwrap_or_default()
}

fn offset(feed: &dyn Feed) -> i64 {
    feed.as_summary().map_or(0, |s| s.offset())
}

fn total_rows(feed: &dyn Feed) -> i64 {
    feed.as_summary().map_or(0, |s| s.total_rows())
}

fn update_seq(feed: &dyn Feed) -> String {
    feed.as_summary().map(|s| s.update_seq()).unwrap_or_default()
}

fn query_index(feed: &dyn Feed) -> usize {
    feed.as_query_indexer().map_or(0, |q| q.query_index())
}

fn empty(_: &dyn Feed) -> String {
    String::new()
}

fn zero(_: &dyn Feed) -> i64 {
    0
}

fn zero_index(_: &dyn Feed) -> usize {
    0
}
