use crate::authorizer::AuthorizerError;
use ethers::types::U256;
use thiserror::Error;
use tutela_accounts::AccountError;
use tutela_paymaster::PaymasterError;
use tutela_pool::PoolError;
use tutela_primitives::NetworkError;

/// Errors of the user operation pipeline
#[derive(Debug, Error)]
pub enum SendError {
    /// Node or bundler fee/gas estimation failed; nothing was submitted
    #[error("estimation failed: {inner}")]
    EstimationFailed {
        /// The inner error message
        inner: String,
    },

    /// The bundler rejected the signed operation; no pool entry was created
    #[error("submission failed: {inner}")]
    SubmissionFailed {
        /// The inner error message
        inner: String,
    },

    /// The user declined the operation; a normal terminal outcome, not a system error
    #[error("user operation declined")]
    Rejected,

    /// The approval surface went away without a decision
    #[error("authorization aborted")]
    AuthorizationAborted,

    /// An authorization round is already active for the request's correlation id
    #[error("authorization already in progress")]
    AuthorizationBusy,

    /// The account's nonce advanced underneath the in-flight operation
    #[error("account nonce advanced from {expected} to {actual} while in flight")]
    NonceConflict { expected: U256, actual: U256 },

    /// Account error
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Paymaster error
    #[error(transparent)]
    Paymaster(#[from] PaymasterError),

    /// Network lookup error
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Pool error
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl From<AuthorizerError> for SendError {
    fn from(err: AuthorizerError) -> Self {
        match err {
            AuthorizerError::Busy { .. } => SendError::AuthorizationBusy,
            // a surface that cannot open is indistinguishable from one closed without a decision
            AuthorizerError::Aborted | AuthorizerError::Surface { .. } => {
                SendError::AuthorizationAborted
            }
        }
    }
}
