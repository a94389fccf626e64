use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    NotFound,
    Corruption,
    NotSupported,
    InvalidArgument,
    IOError,
    Aborted,
    TimedOut,
    Closed,
    MissingDoc,
    Internal,
}

impl Code {
    /// HTTP-style status class for errors carrying this code.
    pub fn http_status(&self) -> u16 {
        match self {
            Code::Closed | Code::MissingDoc | Code::InvalidArgument => 400,
            Code::NotFound => 404,
            Code::TimedOut => 504,
            _ => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    pub fn new(code: Code, msg: impl Into<String>) -> Self {
        Status {
            code,
            message: msg.into(),
        }
    }

    /// Usage error: the iterator holds no current row.
    pub fn closed() -> Self {
        Status::new(Code::Closed, "iterator is closed")
    }

    /// Usage error: the row has no embedded document.
    pub fn missing_doc() -> Self {
        Status::new(Code::MissingDoc, "doc is nil; does the query include docs?")
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Status::new(Code::NotFound, msg)
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Status::new(Code::Corruption, msg)
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Status::new(Code::NotSupported, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Status::new(Code::InvalidArgument, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Status::new(Code::IOError, msg)
    }

    pub fn aborted(msg: impl Into<String>) -> Self {
        Status::new(Code::Aborted, msg)
    }

    pub fn timed_out(msg: impl Into<String>) -> Self {
        Status::new(Code::TimedOut, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Status::new(Code::Internal, msg)
    }

    pub fn is_closed(&self) -> bool {
        self.code == Code::Closed
    }

    pub fn is_missing_doc(&self) -> bool {
        self.code == Code::MissingDoc
    }

    pub fn is_corruption(&self) -> bool {
        self.code == Code::Corruption
    }

    pub fn is_io_error(&self) -> bool {
        self.code == Code::IOError
    }

    pub fn is_aborted(&self) -> bool {
        self.code == Code::Aborted
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.code)
        } else {
            write!(f, "{:?}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Status {}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        Status::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::corruption(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Status>;
