use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use docrows::{CancelToken, Feed, Result, Row, Rows, RowsOptions, Statistics, Status};

fn wait_until(cond: impl Fn() -> bool) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Feed whose `next` blocks until the iterator's token is cancelled.
struct BlockingFeed {
    token: Option<CancelToken>,
    entered: Arc<Barrier>,
    closes: Arc<AtomicUsize>,
    /// Fill the row and report success once released, instead of failing.
    yields_row: bool,
}

impl BlockingFeed {
    fn new(entered: Arc<Barrier>, closes: Arc<AtomicUsize>) -> Self {
        BlockingFeed {
            token: None,
            entered,
            closes,
            yields_row: false,
        }
    }

    fn yielding_row(mut self) -> Self {
        self.yields_row = true;
        self
    }
}

impl Feed for BlockingFeed {
    fn next(&mut self, row: &mut Row) -> Result<bool> {
        self.entered.wait();
        let Some(token) = &self.token else {
            return Err(Status::internal("no cancel token bound"));
        };
        token.wait();
        row.id = "late".to_string();
        if self.yields_row {
            return Ok(true);
        }
        Err(Status::aborted("request interrupted"))
    }

    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn bind_cancel(&mut self, token: CancelToken) {
        self.token = Some(token);
    }
}

#[test]
fn test_close_unblocks_in_flight_next() {
    let entered = Arc::new(Barrier::new(2));
    let closes = Arc::new(AtomicUsize::new(0));
    let mut rows = Rows::new(BlockingFeed::new(Arc::clone(&entered), Arc::clone(&closes)));
    let handle = rows.close_handle();

    let consumer = thread::spawn(move || {
        let advanced = rows.next();
        (advanced, rows.err(), rows.is_closed())
    });

    entered.wait();
    assert!(handle.close().is_ok());

    let (advanced, err, closed) = consumer.join().unwrap();
    assert!(!advanced);
    // An explicit close is not a stream failure.
    assert!(err.is_none());
    assert!(closed);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_row_produced_during_close_is_discarded() {
    let entered = Arc::new(Barrier::new(2));
    let closes = Arc::new(AtomicUsize::new(0));
    let mut rows = Rows::new(
        BlockingFeed::new(Arc::clone(&entered), Arc::clone(&closes)).yielding_row(),
    );
    let handle = rows.close_handle();

    let consumer = thread::spawn(move || {
        let advanced = rows.next();
        (advanced, rows.err(), rows.row().is_none(), rows.id().to_string())
    });

    entered.wait();
    assert!(handle.close().is_ok());

    let (advanced, err, no_row, id) = consumer.join().unwrap();
    assert!(!advanced);
    assert!(err.is_none());
    assert!(no_row);
    assert_eq!(id, "");
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_close_reaches_feed_once() {
    let closes = Arc::new(AtomicUsize::new(0));
    let entered = Arc::new(Barrier::new(1));
    let rows = Rows::new(BlockingFeed::new(entered, Arc::clone(&closes)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let handle = rows.close_handle();
            thread::spawn(move || handle.close())
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap().is_ok());
    }
    assert!(rows.close().is_ok());
    drop(rows);

    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancellation_closes_iterator() {
    let entered = Arc::new(Barrier::new(2));
    let closes = Arc::new(AtomicUsize::new(0));
    let cancel = CancelToken::new();
    let stats = Arc::new(Statistics::new());
    let options = RowsOptions::default()
        .with_cancel(cancel.clone())
        .with_statistics(Arc::clone(&stats));
    let mut rows = Rows::with_options(
        BlockingFeed::new(Arc::clone(&entered), Arc::clone(&closes)),
        options,
    )
    .unwrap();

    let consumer = thread::spawn(move || {
        let advanced = rows.next();
        (advanced, rows.err(), rows)
    });

    entered.wait();
    cancel.cancel();

    let (advanced, err, rows) = consumer.join().unwrap();
    assert!(!advanced);
    let err = err.unwrap();
    assert!(err.is_aborted());
    assert_eq!(err.message(), "context canceled");
    assert!(rows.close().is_ok());
    // The watcher may still be releasing the feed.
    assert!(wait_until(|| stats.snapshot().num_iterators_closed == 1));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(wait_until(|| stats.snapshot().num_cancellations == 1));
}

#[test]
fn test_cancellation_while_idle() {
    let cancel = CancelToken::new();
    let closed = Arc::new(AtomicUsize::new(0));
    let options = RowsOptions::default()
        .with_cancel(cancel.clone())
        .with_on_close({
            let closed = Arc::clone(&closed);
            move || {
                closed.fetch_add(1, Ordering::SeqCst);
            }
        });
    let rows = Rows::with_options(docrows::MemoryFeed::new(), options).unwrap();

    cancel.cancel();
    assert!(wait_until(|| rows.is_closed()));
    // Close hooks run after the closed flag flips.
    assert!(wait_until(|| closed.load(Ordering::SeqCst) == 1));
    assert_eq!(rows.err().unwrap().message(), "context canceled");
}

#[test]
fn test_close_before_cancellation_leaves_no_error() {
    let cancel = CancelToken::new();
    let rows = Rows::with_options(
        docrows::MemoryFeed::new(),
        RowsOptions::default().with_cancel(cancel.clone()),
    )
    .unwrap();

    assert!(rows.close().is_ok());
    cancel.cancel();
    thread::sleep(Duration::from_millis(20));
    assert!(rows.err().is_none());
}

#[test]
fn test_already_cancelled_token() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut rows = Rows::with_options(
        docrows::MemoryFeed::from_rows(vec![Row::new("a")]),
        RowsOptions::default().with_cancel(cancel),
    )
    .unwrap();

    assert!(!rows.next());
    assert!(rows.row().is_none());
    assert_eq!(rows.err().unwrap().message(), "context canceled");
}

#[test]
fn test_cancellation_after_close_is_not_counted() {
    let cancel = CancelToken::new();
    let stats = Arc::new(Statistics::new());
    let mut rows = Rows::with_options(
        docrows::MemoryFeed::from_rows(vec![Row::new("a")]),
        RowsOptions::default()
            .with_cancel(cancel.clone())
            .with_statistics(Arc::clone(&stats)),
    )
    .unwrap();

    assert!(rows.next());
    assert!(!rows.next());
    cancel.cancel();
    thread::sleep(Duration::from_millis(20));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.num_end_of_stream, 1);
    assert_eq!(snapshot.num_cancellations, 0);
    assert!(rows.err().is_none());
}

/// Feed whose close blocks until released, then fails.
struct SlowCloseFeed {
    entered: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl Feed for SlowCloseFeed {
    fn next(&mut self, _row: &mut Row) -> Result<bool> {
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.entered.wait();
        self.release.wait();
        Err(Status::io_error("close error"))
    }
}

#[test]
fn test_close_waits_for_implicit_close() {
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let mut rows = Rows::new(SlowCloseFeed {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    });
    let handle = rows.close_handle();

    // End of stream closes the feed on the consumer thread.
    let consumer = thread::spawn(move || {
        let advanced = rows.next();
        (advanced, rows)
    });
    entered.wait();

    let closer = thread::spawn(move || handle.close());
    thread::sleep(Duration::from_millis(20));
    release.wait();

    let err = closer.join().unwrap().unwrap_err();
    assert_eq!(err.message(), "close error");

    let (advanced, rows) = consumer.join().unwrap();
    assert!(!advanced);
    assert!(rows.close().is_ok());
    assert!(rows.err().is_none());
}
