use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failed for {path}: {message}")]
    Transport { path: String, message: String },

    #[error("request to {path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("request to {path} timed out after {seconds}s")]
    Timeout { path: String, seconds: u64 },

    #[error("could not decode response from {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A newer request for the same path was issued while this one was in flight.
    #[error("response for {path} was superseded by a newer request")]
    Superseded { path: String },
}

impl FetchError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}
