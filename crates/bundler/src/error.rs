use thiserror::Error;

/// Bundler client errors
#[derive(Debug, Error)]
pub enum BundlerClientError {
    /// The bundler rejected the request
    #[error("bundler rpc error: {inner}")]
    Rpc {
        /// The inner error message
        inner: String,
    },

    /// The bundler endpoint could not be reached
    #[error("bundler transport error: {inner}")]
    Transport {
        /// The inner error message
        inner: String,
    },
}

impl From<jsonrpsee::core::ClientError> for BundlerClientError {
    fn from(err: jsonrpsee::core::ClientError) -> Self {
        match err {
            jsonrpsee::core::ClientError::Call(err) => Self::Rpc { inner: err.to_string() },
            err => Self::Transport { inner: err.to_string() },
        }
    }
}
