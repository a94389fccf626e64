use std::sync::atomic::{AtomicU64, Ordering};

/// Iteration statistics
///
/// Thread-safe counters shared by any number of iterators.
/// Uses atomic counters for lock-free updates.
#[derive(Debug, Default)]
pub struct Statistics {
    // Iterator lifecycle
    pub num_iterators_opened: AtomicU64,
    pub num_iterators_closed: AtomicU64,
    pub num_cancellations: AtomicU64,

    // Row production
    pub num_rows_produced: AtomicU64,
    pub num_end_of_stream: AtomicU64,

    // Decoding
    pub num_decodes: AtomicU64,
    pub num_decode_failures: AtomicU64,

    // Error counts
    pub num_row_errors: AtomicU64,
    pub num_iterator_errors: AtomicU64,
    pub num_close_errors: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_open(&self) {
        self.num_iterators_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_close(&self, failed: bool) {
        self.num_iterators_closed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.num_close_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_cancellation(&self) {
        self.num_cancellations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_row(&self) {
        self.num_rows_produced.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_end_of_stream(&self) {
        self.num_end_of_stream.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decode(&self, ok: bool) {
        self.num_decodes.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.num_decode_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_row_error(&self) {
        self.num_row_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_iterator_error(&self) {
        self.num_iterator_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a consistent snapshot of all statistics
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            num_iterators_opened: self.num_iterators_opened.load(Ordering::Relaxed),
            num_iterators_closed: self.num_iterators_closed.load(Ordering::Relaxed),
            num_cancellations: self.num_cancellations.load(Ordering::Relaxed),
            num_rows_produced: self.num_rows_produced.load(Ordering::Relaxed),
            num_end_of_stream: self.num_end_of_stream.load(Ordering::Relaxed),
            num_decodes: self.num_decodes.load(Ordering::Relaxed),
            num_decode_failures: self.num_decode_failures.load(Ordering::Relaxed),
            num_row_errors: self.num_row_errors.load(Ordering::Relaxed),
            num_iterator_errors: self.num_iterator_errors.load(Ordering::Relaxed),
            num_close_errors: self.num_close_errors.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics to zero
    pub fn reset(&self) {
        self.num_iterators_opened.store(0, Ordering::Relaxed);
        self.num_iterators_closed.store(0, Ordering::Relaxed);
        self.num_cancellations.store(0, Ordering::Relaxed);
        self.num_rows_produced.store(0, Ordering::Relaxed);
        self.num_end_of_stream.store(0, Ordering::Relaxed);
        self.num_decodes.store(0, Ordering::Relaxed);
        self.num_decode_failures.store(0, Ordering::Relaxed);
        self.num_row_errors.store(0, Ordering::Relaxed);
        self.num_iterator_errors.store(0, Ordering::Relaxed);
        self.num_close_errors.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of statistics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatisticsSnapshot {
    pub num_iterators_opened: u64,
    pub num_iterators_closed: u64,
    pub num_cancellations: u64,
    pub num_rows_produced: u64,
    pub num_end_of_stream: u64,
    pub num_decodes: u64,
    pub num_decode_failures: u64,
    pub num_row_errors: u64,
    pub num_iterator_errors: u64,
    pub num_close_errors: u64,
}

impl StatisticsSnapshot {
    /// Iterators opened but not yet closed
    pub fn open_iterators(&self) -> u64 {
        self.num_iterators_opened
            .saturating_sub(self.num_iterators_closed)
    }

    /// Fraction of decodes that failed
    pub fn decode_failure_rate(&self) -> f64 {
        if self.num_decodes == 0 {
            0.0
        } else {
            self.num_decode_failures as f64 / self.num_decodes as f64
        }
    }
}

impl std::fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Iterators:")?;
        writeln!(f, "  Opened: {}", self.num_iterators_opened)?;
        writeln!(f, "  Closed: {}", self.num_iterators_closed)?;
        writeln!(f, "  Cancelled: {}", self.num_cancellations)?;
        writeln!(f, "Rows:")?;
        writeln!(f, "  Produced: {}", self.num_rows_produced)?;
        writeln!(f, "  End of stream: {}", self.num_end_of_stream)?;
        writeln!(f, "Decoding:")?;
        writeln!(f, "  Decodes: {}", self.num_decodes)?;
        writeln!(
            f,
            "  Failures: {} ({:.2}%)",
            self.num_decode_failures,
            self.decode_failure_rate() * 100.0
        )?;
        writeln!(f, "Errors:")?;
        writeln!(f, "  Row: {}", self.num_row_errors)?;
        writeln!(f, "  Iterator: {}", self.num_iterator_errors)?;
        write!(f, "  Close: {}", self.num_close_errors)
    }
}
