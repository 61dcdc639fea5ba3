//! All error types, re-exported in one place.

pub use crate::app::{AppError, PoolError};
pub use crate::client::{ClientError, FetchError};
pub use crate::export::{ExportError, PdfError, QrError};
pub use rootrpc::{Error as RpcResponseError, UriError};
