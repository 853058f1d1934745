use ethers::types::Address;
use thiserror::Error;

/// Paymaster errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymasterError {
    /// The paymaster does not sponsor operations quoted in this token
    #[error("unsupported quote token: {token:?}")]
    UnsupportedToken {
        /// The requested quote token
        token: Address,
    },

    /// The sponsorship signer could not produce a signature
    #[error("paymaster signer error: {inner}")]
    Signer {
        /// The inner error message
        inner: String,
    },
}
