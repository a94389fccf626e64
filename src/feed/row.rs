use std::{fmt, io::Read};

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::util::{Result, Status};

/// Lazily decoded row payload.
///
/// `Bytes` payloads may be decoded any number of times. A `Reader` payload is
/// a one-shot stream: the first decode consumes it and later decodes fail
/// with a corruption status (unexpected end of input).
pub enum Payload {
    Bytes(Bytes),
    Reader(Box<dyn Read + Send>),
}

impl Payload {
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Payload::Reader(Box::new(reader))
    }

    /// Parse the payload as JSON into `T`.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T> {
        match self {
            Payload::Bytes(data) => Ok(serde_json::from_slice(data)?),
            Payload::Reader(reader) => Ok(serde_json::from_reader(&mut **reader)?),
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Payload::Reader(_))
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Payload::Bytes(data)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(data))
    }
}

impl From<&'static str> for Payload {
    fn from(data: &'static str) -> Self {
        Payload::Bytes(Bytes::from_static(data.as_bytes()))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Bytes(data) => f.debug_tuple("Bytes").field(data).finish(),
            Payload::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// One query result unit, filled in by a [`Feed`](crate::feed::Feed).
///
/// A row carrying `error` is a partial failure: the stream reached this
/// position but this particular result could not be produced.
#[derive(Debug, Default)]
pub struct Row {
    pub id: String,
    /// Raw JSON-encoded key.
    pub key: Bytes,
    pub value: Option<Payload>,
    /// Embedded document, present only when the query asked for docs.
    pub doc: Option<Payload>,
    pub error: Option<Status>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Row {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<Payload>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_value_reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.value = Some(Payload::from_reader(reader));
        self
    }

    pub fn with_doc(mut self, doc: impl Into<Payload>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_doc_reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.doc = Some(Payload::from_reader(reader));
        self
    }

    pub fn with_error(mut self, error: Status) -> Self {
        self.error = Some(error);
        self
    }

    /// Clear every field so the container can be reused for the next row.
    pub fn reset(&mut self) {
        *self = Row::default();
    }

    /// Key rendered as text. Invalid UTF-8 is replaced, never rejected.
    pub fn key_str(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}
