use thiserror::Error;
use tutela_contracts::EntryPointError;

/// Account errors
#[derive(Debug, Error)]
pub enum AccountError {
    /// The account is not deployed and no factory is configured to deploy it
    #[error("account requires deployment but no factory is configured")]
    NoFactory,

    /// No account is registered under the requested id
    #[error("unknown account: {id}")]
    UnknownAccount {
        /// The requested account id
        id: String,
    },

    /// The signing backend could not produce a signature
    #[error("signer unavailable: {inner}")]
    SignerUnavailable {
        /// The inner error message
        inner: String,
    },

    /// Provider error
    #[error("provider error: {inner}")]
    Provider {
        /// The inner error message
        inner: String,
    },

    /// Entry point error
    #[error(transparent)]
    EntryPoint(#[from] EntryPointError),
}
