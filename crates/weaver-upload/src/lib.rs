//! Upload pipeline for weaver rich-text documents.
//!
//! Files from a drop, paste or picker gesture are filtered by content type,
//! uploaded concurrently through a [`Transport`], and inserted as media
//! nodes at the position captured when the gesture happened.

pub mod error;
pub mod file;
pub mod notify;
pub mod pipeline;
pub mod transport;

pub use error::TransportError;
pub use file::{PendingFile, UploadProgress, UploadedFile};
pub use notify::{Notifier, TracingNotifier};
pub use pipeline::{Batch, BatchReport, UploadPipeline, UploadTask};
pub use transport::{HttpTransport, Transport};
