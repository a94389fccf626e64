pub mod cancel;
pub mod status;

pub use cancel::CancelToken;
pub use status::{Code, Result, Status};
