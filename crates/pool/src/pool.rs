use crate::{
    error::PoolError,
    store::{StatePath, StateStore},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use tutela_primitives::{
    OperationReceipt, PendingStatus, PendingSubmission, PendingUserOperation,
};
use uuid::Uuid;

/// Persisted state backing the pool
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub user_operations: HashMap<Uuid, PendingUserOperation>,
}

/// Durable, observable record of in-flight user operations
///
/// Entries are keyed by a pool-assigned id. Enqueueing never blocks on chain confirmation;
/// terminal statuses arrive later through [finalize](UserOperationPool::finalize) and are
/// observed through [wait](UserOperationPool::wait).
pub struct UserOperationPool<S> {
    store: S,
}

impl<S> Clone for UserOperationPool<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: StateStore<State = PoolState>> UserOperationPool<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a submitted user operation with status `Pending` and returns its fresh id
    pub fn enqueue(&self, submission: PendingSubmission) -> Uuid {
        let id = Uuid::new_v4();
        let entry = PendingUserOperation::create(id, submission);

        info!(
            %id,
            hash = %entry.user_operation_hash,
            sender = ?entry.user_operation.sender,
            "user operation pooled"
        );

        self.store.update(StatePath::PoolEntry(id), |state| {
            state.user_operations.insert(id, entry);
        });
        id
    }

    /// Looks up a pool entry
    pub fn get(&self, id: &Uuid) -> Result<PendingUserOperation, PoolError> {
        self.store.with(|state| {
            state.user_operations.get(id).cloned().ok_or(PoolError::UnknownOperation { id: *id })
        })
    }

    /// All pool entries, in no particular order
    pub fn all(&self) -> Vec<PendingUserOperation> {
        self.store.with(|state| state.user_operations.values().cloned().collect())
    }

    /// Number of pool entries
    pub fn len(&self) -> usize {
        self.store.with(|state| state.user_operations.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the terminal status derived from the given receipt
    ///
    /// Statuses are monotonic: a second terminal write to the same entry is rejected with
    /// [TerminalTransition](PoolError::TerminalTransition).
    pub fn finalize(&self, id: &Uuid, receipt: OperationReceipt) -> Result<(), PoolError> {
        let success = receipt.success;
        let result = self.store.update(StatePath::PoolEntry(*id), |state| {
            let entry = state
                .user_operations
                .get_mut(id)
                .ok_or(PoolError::UnknownOperation { id: *id })?;
            if entry.status.is_terminal() {
                return Err(PoolError::TerminalTransition { id: *id });
            }
            entry.status = if receipt.success {
                PendingStatus::Succeeded(receipt)
            } else {
                PendingStatus::Failed(receipt)
            };
            Ok(())
        });

        if result.is_ok() {
            info!(%id, success, "user operation finalized");
        }
        result
    }

    /// Waits for the entry to leave `Pending`
    ///
    /// Resolves exactly once: with the receipt on `Succeeded`, with
    /// [OperationFailed](PoolError::OperationFailed) on `Failed`. If the entry is already
    /// terminal at subscribe time the result is returned immediately. Abandoning the future
    /// tears the subscription down without touching pool state.
    pub async fn wait(&self, id: &Uuid) -> Result<OperationReceipt, PoolError> {
        // subscribe before the status check, so a transition between the check and the first
        // poll of the subscription cannot be missed
        let mut subscription = self.store.subscribe(StatePath::PoolEntry(*id));

        loop {
            match self.get(id)?.status {
                PendingStatus::Succeeded(receipt) => return Ok(receipt),
                PendingStatus::Failed(receipt) => {
                    return Err(PoolError::OperationFailed { receipt })
                }
                PendingStatus::Pending => {}
            }

            debug!(%id, "awaiting user operation finality");
            if subscription.changed().await.is_none() {
                return Err(PoolError::SubscriptionClosed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use ethers::types::Address;
    use std::time::Duration;
    use tutela_primitives::{UserOperation, UserOperationHash};

    fn pool() -> UserOperationPool<MemoryStore<PoolState>> {
        UserOperationPool::new(MemoryStore::new())
    }

    fn submission() -> PendingSubmission {
        PendingSubmission {
            user_operation: UserOperation::random(),
            user_operation_hash: UserOperationHash::repeat_byte(0xab),
            sender_id: "account-0".into(),
            network_id: "sepolia".into(),
            entry_point: Address::random(),
        }
    }

    fn receipt(success: bool, reason: &str) -> OperationReceipt {
        OperationReceipt {
            user_operation_hash: UserOperationHash::repeat_byte(0xab),
            success,
            actual_gas_cost: 40_000.into(),
            actual_gas_used: 35_000.into(),
            reason: reason.into(),
        }
    }

    #[tokio::test]
    async fn enqueue_persists_pending_entry() {
        let pool = pool();
        let id = pool.enqueue(submission());
        let entry = pool.get(&id).unwrap();
        assert_eq!(entry.status, PendingStatus::Pending);
        assert!(entry.created_at > 0);
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn wait_resolves_on_success_transition() {
        let pool = pool();
        let id = pool.enqueue(submission());

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.wait(&id).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        pool.finalize(&id, receipt(true, "")).unwrap();
        let resolved = waiter.await.unwrap().unwrap();
        assert!(resolved.success);
    }

    #[tokio::test]
    async fn wait_rejects_with_receipt_reason_on_failure() {
        let pool = pool();
        let id = pool.enqueue(submission());

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.wait(&id).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        pool.finalize(&id, receipt(false, "AA21 didn't pay prefund")).unwrap();
        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("AA21 didn't pay prefund"));
    }

    #[tokio::test]
    async fn wait_never_resolves_while_pending() {
        let pool = pool();
        let id = pool.enqueue(submission());
        let res = tokio::time::timeout(Duration::from_millis(50), pool.wait(&id)).await;
        assert!(res.is_err(), "wait resolved without a status transition");
    }

    #[tokio::test]
    async fn concurrent_waits_on_terminal_entry_resolve_identically() {
        let pool = pool();
        let id = pool.enqueue(submission());
        pool.finalize(&id, receipt(true, "")).unwrap();

        let (a, b) = tokio::join!(pool.wait(&id), pool.wait(&id));
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn second_terminal_write_is_rejected() {
        let pool = pool();
        let id = pool.enqueue(submission());
        pool.finalize(&id, receipt(false, "reverted")).unwrap();
        assert_eq!(
            pool.finalize(&id, receipt(true, "")),
            Err(PoolError::TerminalTransition { id })
        );
        // the recorded status is unchanged
        assert!(matches!(pool.get(&id).unwrap().status, PendingStatus::Failed(_)));
    }

    #[tokio::test]
    async fn abandoned_wait_leaves_pool_state_intact() {
        let pool = pool();
        let id = pool.enqueue(submission());

        let res = tokio::time::timeout(Duration::from_millis(10), pool.wait(&id)).await;
        assert!(res.is_err());

        // the operation is still pending and can still be finalized and observed
        assert_eq!(pool.get(&id).unwrap().status, PendingStatus::Pending);
        pool.finalize(&id, receipt(true, "")).unwrap();
        assert!(pool.wait(&id).await.unwrap().success);
    }

    #[tokio::test]
    async fn unknown_operation_fails() {
        let pool = pool();
        let id = Uuid::new_v4();
        assert_eq!(pool.wait(&id).await, Err(PoolError::UnknownOperation { id }));
        assert_eq!(
            pool.finalize(&id, receipt(true, "")),
            Err(PoolError::UnknownOperation { id })
        );
    }
}
