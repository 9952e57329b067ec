//! Error types for the serp-acquire crate.
//!
//! All errors carry stable string messages suitable for audit records
//! and logs. The API credential never appears in an error message.

/// Errors that can occur while acquiring search results.
#[derive(Debug, thiserror::Error)]
pub enum SerpError {
    /// The HTTP request failed at the transport level (connection,
    /// timeout, non-success status, undecodable body).
    #[error("transport error: {0}")]
    Transport(String),

    /// The call succeeded at the transport level but the response
    /// carried an engine-reported error field.
    #[error("engine error: {0}")]
    Api(String),

    /// The retry budget was exhausted without a usable response.
    #[error("retries exhausted after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// Invalid acquisition configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for serp-acquire results.
pub type Result<T> = std::result::Result<T, SerpError>;
