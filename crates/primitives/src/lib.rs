//! Smart account (ERC-4337) primitive types
//!
//! This crate contains the primitive types of the tutela wallet engine and
//! helper functions shared by the other crates.

pub mod call;
pub mod constants;
pub mod fee;
pub mod network;
pub mod pending;
pub mod provider;
mod user_operation;
mod utils;

pub use call::Call;
pub use fee::{FeeData, FeeQuote};
pub use network::{Network, NetworkError, NetworkManager};
pub use pending::{OperationReceipt, PendingStatus, PendingSubmission, PendingUserOperation};
pub use user_operation::{
    UserOperation, UserOperationByHash, UserOperationGasEstimation, UserOperationHash,
    UserOperationReceipt, UserOperationRequest,
};
pub use utils::get_address;
