#![no_main]

use docrows::{MemoryFeed, Row, Rows};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use std::io::Cursor;

// Fuzz target for lazy row decoding.
// Arbitrary key/value/doc bytes must produce Ok or Err, never a panic, and
// a materialized payload must decode the same way twice.
fuzz_target!(|data: &[u8]| {
    if data.len() > 65535 {
        return;
    }

    let third = data.len() / 3;
    let key = data[..third].to_vec();
    let value = data[third..2 * third].to_vec();
    let doc = data[2 * third..].to_vec();

    let mut rows = Rows::new(MemoryFeed::from_rows(vec![
        Row::new("fuzz")
            .with_key(key)
            .with_value(value)
            .with_doc_reader(Cursor::new(doc)),
    ]));
    assert!(rows.next());

    let _ = rows.key();
    let _ = rows.scan_key::<Value>();

    let first = rows.scan_value::<Value>().ok();
    let second = rows.scan_value::<Value>().ok();
    assert_eq!(first, second, "bytes payload decoded differently on rescan");

    let _ = rows.scan_doc::<Value>();
    assert!(!rows.next());
    assert!(rows.err().is_none());
});
