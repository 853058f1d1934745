use crate::{
    api::{BundlerEthApiClient, BundlerFeeApiClient},
    error::BundlerClientError,
};
use async_trait::async_trait;
use ethers::types::{Address, U256};
use jsonrpsee::{
    http_client::{HttpClient, HttpClientBuilder},
    types::error::ErrorCode,
};
use tracing::{debug, trace};
use tutela_primitives::{
    UserOperation, UserOperationByHash, UserOperationGasEstimation, UserOperationHash,
    UserOperationReceipt, UserOperationRequest,
};

/// The bundler operations the pipeline depends on
///
/// [BundlerClient](BundlerClient) implements this against a remote bundler endpoint; tests
/// provide in-process fakes.
#[async_trait]
pub trait BundlerRelay: Send + Sync {
    /// Asks the bundler to size the gas limits of the given (unpriced) user operation
    async fn estimate_user_operation_gas(
        &self,
        user_operation: UserOperationRequest,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimation, BundlerClientError>;

    /// Submits a fully-signed user operation, returning its hash
    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationHash, BundlerClientError>;

    /// Looks up a submitted user operation
    async fn get_user_operation_by_hash(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> Result<Option<UserOperationByHash>, BundlerClientError>;

    /// Fetches the receipt of an included user operation
    async fn get_user_operation_receipt(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, BundlerClientError>;

    /// Entry points the bundler accepts operations for
    async fn supported_entry_points(&self) -> Result<Vec<Address>, BundlerClientError>;

    /// The bundler's priority fee recommendation, None if the bundler does not expose one
    async fn max_priority_fee_per_gas(&self) -> Result<Option<U256>, BundlerClientError>;
}

/// JSON-RPC client for a remote bundler endpoint
#[derive(Clone, Debug)]
pub struct BundlerClient {
    http_client: HttpClient,
    endpoint: String,
}

impl BundlerClient {
    pub fn new(endpoint: &str) -> Result<Self, BundlerClientError> {
        let http_client = HttpClientBuilder::default()
            .build(endpoint)
            .map_err(|err| BundlerClientError::Transport { inner: err.to_string() })?;
        Ok(Self { http_client, endpoint: endpoint.into() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BundlerRelay for BundlerClient {
    async fn estimate_user_operation_gas(
        &self,
        user_operation: UserOperationRequest,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimation, BundlerClientError> {
        trace!(sender = ?user_operation.sender, "estimating user operation gas");
        Ok(self.http_client.estimate_user_operation_gas(user_operation, entry_point).await?)
    }

    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationHash, BundlerClientError> {
        debug!(sender = ?user_operation.sender, bundler = %self.endpoint, "sending user operation");
        Ok(self.http_client.send_user_operation(user_operation, entry_point).await?)
    }

    async fn get_user_operation_by_hash(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> Result<Option<UserOperationByHash>, BundlerClientError> {
        Ok(self.http_client.get_user_operation_by_hash(user_operation_hash).await?)
    }

    async fn get_user_operation_receipt(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, BundlerClientError> {
        Ok(self.http_client.get_user_operation_receipt(user_operation_hash).await?)
    }

    async fn supported_entry_points(&self) -> Result<Vec<Address>, BundlerClientError> {
        Ok(self.http_client.supported_entry_points().await?)
    }

    async fn max_priority_fee_per_gas(&self) -> Result<Option<U256>, BundlerClientError> {
        // the tip recommendation is an optional vendor extension
        match self.http_client.max_priority_fee_per_gas().await {
            Ok(tip) => Ok(Some(tip)),
            Err(jsonrpsee::core::ClientError::Call(err))
                if err.code() == ErrorCode::MethodNotFound.code() =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
