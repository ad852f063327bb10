use miette::Diagnostic;
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Error, Diagnostic, Debug)]
#[non_exhaustive]
pub enum TransportError {
    #[error("no upload endpoint configured")]
    #[diagnostic(
        code(weaver::upload::endpoint),
        help("set `upload.endpoint` in the configuration file")
    )]
    MissingEndpoint,

    #[error("upload request failed: {0}")]
    #[diagnostic(code(weaver::upload::http))]
    Http(#[from] reqwest::Error),

    #[error("upload rejected with status {status}: {body}")]
    #[diagnostic(code(weaver::upload::status))]
    Status { status: u16, body: String },

    #[error("invalid upload response: {0}")]
    #[diagnostic(code(weaver::upload::response))]
    InvalidResponse(#[from] serde_json::Error),

    /// Refusal reported by a transport that does not speak HTTP, such as
    /// an embedder's own storage backend.
    #[error("upload rejected: {0}")]
    #[diagnostic(code(weaver::upload::rejected))]
    Rejected(String),
}
