//! Entry point event bridge
//!
//! Feeds on-chain finalization events back into the pool. One watcher task runs per user
//! operation hash; registering a watcher for an already-watched hash replaces (and detaches)
//! the prior one, so an event is never delivered twice.

use crate::{
    error::PoolError,
    pool::{PoolState, UserOperationPool},
    store::StateStore,
};
use ethers::providers::Middleware;
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use tutela_contracts::{
    decode_revert_string, EntryPoint, UserOperationEventFilter,
};
use tutela_primitives::{OperationReceipt, UserOperationHash};
use uuid::Uuid;

/// Maps the entry point's finalization event to an operation receipt
pub fn receipt_from_event(
    user_operation_hash: UserOperationHash,
    event: &UserOperationEventFilter,
    revert_reason: Option<String>,
) -> OperationReceipt {
    let reason = if event.success {
        String::new()
    } else {
        revert_reason.unwrap_or_else(|| "user operation reverted".into())
    };
    OperationReceipt {
        user_operation_hash,
        success: event.success,
        actual_gas_cost: event.actual_gas_cost,
        actual_gas_used: event.actual_gas_used,
        reason,
    }
}

/// Watches entry point finalization events and records terminal statuses in the pool
pub struct EntryPointBridge<M: Middleware + 'static, S> {
    entry_point: EntryPoint<M>,
    pool: UserOperationPool<S>,
    watchers: Mutex<HashMap<UserOperationHash, JoinHandle<()>>>,
}

impl<M, S> EntryPointBridge<M, S>
where
    M: Middleware + 'static,
    S: StateStore<State = PoolState> + Clone + Send + Sync + 'static,
{
    pub fn new(entry_point: EntryPoint<M>, pool: UserOperationPool<S>) -> Self {
        Self { entry_point, pool, watchers: Mutex::new(HashMap::new()) }
    }

    /// Registers a watcher for the given hash, replacing any prior one
    pub fn attach(&self, user_operation_hash: UserOperationHash, id: Uuid) {
        let mut watchers = self.watchers.lock();
        // explicit detach before attach; a replaced watcher must not deliver
        if let Some(prior) = watchers.remove(&user_operation_hash) {
            prior.abort();
        }

        let entry_point = self.entry_point.clone();
        let pool = self.pool.clone();
        let handle = tokio::spawn(async move {
            watch_finalization(entry_point, pool, user_operation_hash, id).await;
        });
        watchers.insert(user_operation_hash, handle);
    }

    /// Detaches the watcher for the given hash, if any
    pub fn detach(&self, user_operation_hash: &UserOperationHash) -> bool {
        match self.watchers.lock().remove(user_operation_hash) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of registered watchers
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().len()
    }
}

async fn watch_finalization<M, S>(
    entry_point: EntryPoint<M>,
    pool: UserOperationPool<S>,
    user_operation_hash: UserOperationHash,
    id: Uuid,
) where
    M: Middleware + 'static,
    S: StateStore<State = PoolState>,
{
    let start_block = entry_point.eth_client().get_block_number().await.ok();

    let event = entry_point.user_operation_event(user_operation_hash);
    let mut stream = match event.stream().await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(hash = %user_operation_hash, %err, "finalization event stream failed");
            return;
        }
    };

    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                warn!(hash = %user_operation_hash, %err, "finalization event decode failed");
                continue;
            }
        };

        let revert_reason = if event.success {
            None
        } else {
            query_revert_reason(&entry_point, user_operation_hash, start_block).await
        };

        let receipt = receipt_from_event(user_operation_hash, &event, revert_reason);
        match pool.finalize(&id, receipt) {
            Ok(()) => {}
            // terminal already; a repeated event for the same hash has no further effect
            Err(PoolError::TerminalTransition { .. }) => {
                debug!(hash = %user_operation_hash, "ignoring repeated finalization event")
            }
            Err(err) => warn!(hash = %user_operation_hash, %err, "finalization write failed"),
        }
        break;
    }
}

/// Looks for a `UserOperationRevertReason` event emitted alongside the failed operation
async fn query_revert_reason<M: Middleware + 'static>(
    entry_point: &EntryPoint<M>,
    user_operation_hash: UserOperationHash,
    start_block: Option<ethers::types::U64>,
) -> Option<String> {
    let mut event = entry_point.user_operation_revert_reason(user_operation_hash);
    if let Some(block) = start_block {
        event = event.from_block(block);
    }

    let reverts = event.query().await.ok()?;
    reverts
        .last()
        .map(|revert| {
            decode_revert_string(revert.revert_reason.clone())
                .unwrap_or_else(|| format!("{:?}", revert.revert_reason))
        })
}
