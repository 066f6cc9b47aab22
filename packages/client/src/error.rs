use thiserror::Error;

/// Errors surfaced by the API client and the form flow.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure: connection refused, timeout, TLS.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a structured `{code, message}` error.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The operation is not valid in the form's current state.
    #[error("operation not valid in the current form state")]
    State,
}
