use thiserror::Error;
use tutela_primitives::OperationReceipt;
use uuid::Uuid;

/// Pool errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No entry exists under the requested id
    #[error("unknown user operation: {id}")]
    UnknownOperation {
        /// The requested pool entry id
        id: Uuid,
    },

    /// A terminal status was written to an already-terminal entry
    #[error("user operation {id} already reached a terminal status")]
    TerminalTransition {
        /// The pool entry id
        id: Uuid,
    },

    /// The operation reached the `Failed` terminal status
    #[error("user operation failed: {}", receipt.reason)]
    OperationFailed {
        /// Receipt of the failed operation
        receipt: OperationReceipt,
    },

    /// The store backing the pool went away while waiting
    #[error("pool subscription closed")]
    SubscriptionClosed,
}
