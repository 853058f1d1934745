//! The bundler's RPC surface, as consumed by the wallet engine

use ethers::types::{Address, U256, U64};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use tutela_primitives::{
    UserOperation, UserOperationByHash, UserOperationGasEstimation, UserOperationHash,
    UserOperationReceipt, UserOperationRequest,
};

/// The ERC-4337 `eth` namespace RPC methods of the bundler
#[rpc(client, namespace = "eth")]
pub trait BundlerEthApi {
    /// Retrieve the current [EIP-155](https://eips.ethereum.org/EIPS/eip-155) chain ID.
    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<U64>;

    /// Get the entry point addresses supported by the bundler.
    #[method(name = "supportedEntryPoints")]
    async fn supported_entry_points(&self) -> RpcResult<Vec<Address>>;

    /// Send a [UserOperation](UserOperation) to the bundler.
    ///
    /// # Returns
    /// * `RpcResult<UserOperationHash>` - The hash of the sent [UserOperation](UserOperation).
    #[method(name = "sendUserOperation")]
    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash>;

    /// Estimate the gas required for a [UserOperation](UserOperation).
    ///
    /// # Returns
    /// * `RpcResult<UserOperationGasEstimation>` - The estimated gas limits.
    #[method(name = "estimateUserOperationGas")]
    async fn estimate_user_operation_gas(
        &self,
        user_operation: UserOperationRequest,
        entry_point: Address,
    ) -> RpcResult<UserOperationGasEstimation>;

    /// Retrieve a [UserOperation](UserOperation) by its hash, or None if it is not known to the
    /// bundler.
    #[method(name = "getUserOperationByHash")]
    async fn get_user_operation_by_hash(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<UserOperationByHash>>;

    /// Retrieve the receipt of a [UserOperation](UserOperation), or None while it is not
    /// included on chain.
    #[method(name = "getUserOperationReceipt")]
    async fn get_user_operation_receipt(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<UserOperationReceipt>>;
}

/// Vendor extension exposing the bundler's priority fee recommendation
#[rpc(client, namespace = "tutela")]
pub trait BundlerFeeApi {
    /// The priority fee the bundler recommends for timely inclusion.
    #[method(name = "maxPriorityFeePerGas")]
    async fn max_priority_fee_per_gas(&self) -> RpcResult<U256>;
}
