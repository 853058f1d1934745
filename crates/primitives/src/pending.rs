//! Records of in-flight user operations

use crate::{user_operation::UserOperationHash, utils::as_checksum_addr, UserOperation};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Terminal outcome of a user operation, derived from the entry point's finalization event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReceipt {
    #[serde(rename = "userOpHash")]
    pub user_operation_hash: UserOperationHash,
    pub success: bool,
    pub actual_gas_cost: U256,
    pub actual_gas_used: U256,
    /// Revert context if the execution failed and one could be recovered
    #[serde(default)]
    pub reason: String,
}

/// Status of a pooled user operation
///
/// Transitions are monotonic and terminal: `Pending -> {Succeeded, Failed}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "receipt")]
pub enum PendingStatus {
    Pending,
    Succeeded(OperationReceipt),
    Failed(OperationReceipt),
}

impl PendingStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PendingStatus::Pending)
    }
}

/// Data handed to the pool when a signed user operation was accepted by the bundler
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmission {
    pub user_operation: UserOperation,
    pub user_operation_hash: UserOperationHash,
    pub sender_id: String,
    pub network_id: String,
    #[serde(serialize_with = "as_checksum_addr")]
    pub entry_point: Address,
}

/// Durable record of an in-flight user operation
///
/// Created only after user approval and successful bundler submission. The id is assigned by the
/// pool, never by the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUserOperation {
    pub id: Uuid,
    /// Creation time, unix seconds
    pub created_at: u64,
    pub user_operation: UserOperation,
    pub user_operation_hash: UserOperationHash,
    pub sender_id: String,
    pub network_id: String,
    #[serde(serialize_with = "as_checksum_addr")]
    pub entry_point: Address,
    pub status: PendingStatus,
}

impl PendingUserOperation {
    /// Creates a pending record from an accepted submission, stamped with the current time
    pub fn create(id: Uuid, submission: PendingSubmission) -> Self {
        Self {
            id,
            created_at: unix_timestamp(),
            user_operation: submission.user_operation,
            user_operation_hash: submission.user_operation_hash,
            sender_id: submission.sender_id,
            network_id: submission.network_id,
            entry_point: submission.entry_point,
            status: PendingStatus::Pending,
        }
    }

    /// Receipt of the operation if it reached a terminal status
    pub fn receipt(&self) -> Option<&OperationReceipt> {
        match &self.status {
            PendingStatus::Pending => None,
            PendingStatus::Succeeded(receipt) | PendingStatus::Failed(receipt) => Some(receipt),
        }
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}
