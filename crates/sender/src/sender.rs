use crate::{
    authorizer::{AuthorizationContext, AuthorizationRequest, Decision, UserOperationAuthorizer},
    error::SendError,
};
use alloy_chains::Chain;
use ethers::providers::Middleware;
use std::sync::Arc;
use tracing::{debug, info, trace};
use tutela_accounts::AccountRegistry;
use tutela_bundler::{BundlerRelay, GasPriceEstimator};
use tutela_contracts::EntryPoint;
use tutela_paymaster::{Paymaster, NATIVE_TOKEN};
use tutela_pool::{EntryPointBridge, PoolState, StateStore, UserOperationPool};
use tutela_primitives::{
    constants::gas::{GAS_LIMIT_MULTIPLIER, PRE_VERIFICATION_SAFE_RESERVE},
    Call, OperationReceipt, PendingSubmission, UserOperationHash,
};
use uuid::Uuid;

/// Handle to a submitted user operation
#[derive(Clone, Copy, Debug)]
pub struct SentUserOperation {
    /// Pool entry id
    pub id: Uuid,
    /// Hash the bundler accepted the operation under
    pub user_operation_hash: UserOperationHash,
}

/// Sequences the user operation pipeline
///
/// Stages run strictly in order within one invocation: skeleton construction, fee estimation,
/// sponsorship, gas estimation, user authorization, final sponsorship and signing, bundler
/// submission, pool registration. Rejection and abort during authorization are terminal with no
/// pool entry; failures before submission leave no state behind.
///
/// The context is assembled once at process start and threaded through explicitly; there are no
/// ambient singletons.
pub struct UserOperationSender<M, S>
where
    M: Middleware + 'static,
    S: StateStore<State = PoolState> + Clone + 'static,
{
    eth_client: Arc<M>,
    entry_point: EntryPoint<M>,
    chain: Chain,
    network_id: String,
    accounts: Arc<AccountRegistry>,
    bundler: Arc<dyn BundlerRelay>,
    paymaster: Arc<dyn Paymaster>,
    authorizer: Arc<dyn UserOperationAuthorizer>,
    estimator: GasPriceEstimator,
    pool: UserOperationPool<S>,
    bridge: Arc<EntryPointBridge<M, S>>,
}

impl<M, S> UserOperationSender<M, S>
where
    M: Middleware + 'static,
    S: StateStore<State = PoolState> + Clone + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eth_client: Arc<M>,
        entry_point: EntryPoint<M>,
        chain: Chain,
        network_id: impl Into<String>,
        accounts: Arc<AccountRegistry>,
        bundler: Arc<dyn BundlerRelay>,
        paymaster: Arc<dyn Paymaster>,
        authorizer: Arc<dyn UserOperationAuthorizer>,
        pool: UserOperationPool<S>,
        bridge: Arc<EntryPointBridge<M, S>>,
    ) -> Self {
        Self {
            eth_client,
            entry_point,
            chain,
            network_id: network_id.into(),
            accounts,
            bundler,
            paymaster,
            authorizer,
            estimator: GasPriceEstimator::default(),
            pool,
            bridge,
        }
    }

    pub fn pool(&self) -> &UserOperationPool<S> {
        &self.pool
    }

    /// Runs the pipeline for one execution call
    ///
    /// Returns once the operation is accepted by the bundler and registered in the pool; use
    /// [wait](UserOperationSender::wait) to observe finality. The caller owns the timeout
    /// policy around `wait`.
    pub async fn send_user_operation(
        &self,
        sender_id: &str,
        call: Option<Call>,
        context: AuthorizationContext,
    ) -> Result<SentUserOperation, SendError> {
        let entry_point = self.entry_point.address();

        // Building
        let account = self.accounts.get(sender_id)?;
        let user_operation = account.create_user_operation(call).await?;
        trace!(sender = ?user_operation.sender, "pipeline: built skeleton");

        // Estimating
        let quote = self
            .estimator
            .estimate(&*self.eth_client, &*self.bundler)
            .await
            .map_err(|err| SendError::EstimationFailed { inner: err.to_string() })?;
        let user_operation = user_operation.fees(&quote);

        // Sponsoring; the first paymaster pass only needs to be structurally valid so the
        // bundler's estimation accounts for paymaster gas
        let sponsorship = self.paymaster.paymaster_and_data(&user_operation, true).await?;
        let user_operation = user_operation.paymaster_and_data(sponsorship);

        let estimation = self
            .bundler
            .estimate_user_operation_gas(user_operation.clone().into(), entry_point)
            .await
            .map_err(|err| SendError::EstimationFailed { inner: err.to_string() })?;
        let user_operation = user_operation
            .call_gas_limit(estimation.call_gas_limit * GAS_LIMIT_MULTIPLIER)
            .verification_gas_limit(estimation.verification_gas_limit * GAS_LIMIT_MULTIPLIER)
            .pre_verification_gas(
                estimation.pre_verification_gas + PRE_VERIFICATION_SAFE_RESERVE,
            );

        let max_cost = (user_operation.call_gas_limit
            + user_operation.verification_gas_limit
            + user_operation.pre_verification_gas)
            * user_operation.max_fee_per_gas;
        let quoted_cost = self.paymaster.quote_fee(max_cost, NATIVE_TOKEN).await?;
        debug!(sender = ?user_operation.sender, ?estimation, %quoted_cost, "pipeline: priced");

        // AwaitingAuthorization
        let request = AuthorizationRequest {
            id: Uuid::new_v4(),
            user_operation: user_operation.clone(),
            context,
        };
        let approval = match self.authorizer.authorize(request).await? {
            Decision::Approved { paymaster_and_data } => paymaster_and_data,
            Decision::Rejected => {
                info!(sender = ?user_operation.sender, "pipeline: declined by user");
                return Err(SendError::Rejected);
            }
        };

        // Signing; the surface may have negotiated sponsorship itself, otherwise ask the
        // paymaster for the final payload
        let sponsorship = match approval {
            Some(data) => data,
            None => self.paymaster.paymaster_and_data(&user_operation, false).await?,
        };
        let user_operation = user_operation.paymaster_and_data(sponsorship);

        let current_nonce = account.nonce().await?;
        if current_nonce > user_operation.nonce {
            return Err(SendError::NonceConflict {
                expected: user_operation.nonce,
                actual: current_nonce,
            });
        }

        let user_operation = account
            .sign_user_operation(user_operation, &entry_point, self.chain.id())
            .await?;

        // Submitting; no automatic retry, resubmission without nonce/fee adjustment is unsafe
        let user_operation_hash = self
            .bundler
            .send_user_operation(user_operation.clone(), entry_point)
            .await
            .map_err(|err| SendError::SubmissionFailed { inner: err.to_string() })?;

        // Pooled
        let id = self.pool.enqueue(PendingSubmission {
            user_operation,
            user_operation_hash,
            sender_id: sender_id.into(),
            network_id: self.network_id.clone(),
            entry_point,
        });
        self.bridge.attach(user_operation_hash, id);

        info!(%id, hash = %user_operation_hash, "pipeline: submitted and pooled");
        Ok(SentUserOperation { id, user_operation_hash })
    }

    /// Waits for the pooled operation's terminal outcome
    pub async fn wait(&self, id: &Uuid) -> Result<OperationReceipt, SendError> {
        Ok(self.pool.wait(id).await?)
    }
}
