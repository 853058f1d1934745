pub use super::{
    error::EntryPointError,
    gen::{
        EntryPointAPI, EntryPointAPIEvents, UserOperationEventFilter,
        UserOperationRevertReasonFilter,
    },
};
use super::gen::entry_point_api::EntryPointAPIErrors;
use ethers::{
    prelude::{ContractError, Event},
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use std::sync::Arc;
use tutela_primitives::UserOperationHash;

/// Thin typed wrapper around the entry point smart contract
pub struct EntryPoint<M: Middleware + 'static> {
    eth_client: Arc<M>,
    address: Address,
    entry_point_api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> Clone for EntryPoint<M> {
    fn clone(&self) -> Self {
        Self {
            eth_client: self.eth_client.clone(),
            address: self.address,
            entry_point_api: self.entry_point_api.clone(),
        }
    }
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        let entry_point_api = EntryPointAPI::new(address, eth_client.clone());
        Self { eth_client, address, entry_point_api }
    }

    pub fn entry_point_api(&self) -> &EntryPointAPI<M> {
        &self.entry_point_api
    }

    pub fn events(&self) -> Event<Arc<M>, M, EntryPointAPIEvents> {
        self.entry_point_api.events()
    }

    /// Event builder for the finalization event of a single user operation
    pub fn user_operation_event(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> Event<Arc<M>, M, UserOperationEventFilter> {
        self.entry_point_api
            .user_operation_event_filter()
            .topic1(user_operation_hash.0)
    }

    /// Event builder for the revert reason of a single user operation
    pub fn user_operation_revert_reason(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> Event<Arc<M>, M, UserOperationRevertReasonFilter> {
        self.entry_point_api
            .user_operation_revert_reason_filter()
            .topic1(user_operation_hash.0)
    }

    pub fn eth_client(&self) -> Arc<M> {
        self.eth_client.clone()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn deserialize_error_msg(
        err: ContractError<M>,
    ) -> Result<EntryPointAPIErrors, EntryPointError> {
        match err {
            ContractError::DecodingError(e) => {
                Err(EntryPointError::Decode { inner: e.to_string() })
            }
            ContractError::AbiError(e) => Err(EntryPointError::Decode { inner: e.to_string() }),
            ContractError::MiddlewareError { e } => EntryPointError::from_middleware_error::<M>(e),
            ContractError::ProviderError { e } => EntryPointError::from_provider_error(&e),
            ContractError::Revert(data) => super::error::decode_revert_error(data),
            _ => Err(EntryPointError::Other { inner: err.to_string() }),
        }
    }

    /// Queries the account's nonce from the entry point's nonce manager
    pub async fn get_nonce(&self, address: &Address, key: U256) -> Result<U256, EntryPointError> {
        let res = self.entry_point_api.get_nonce(*address, key).call().await;

        match res {
            Ok(nonce) => Ok(nonce),
            Err(err) => Err(EntryPointError::Other { inner: format!("get nonce error: {err:?}") }),
        }
    }

    /// Queries the entry point deposit of the given address
    pub async fn balance_of(&self, addr: &Address) -> Result<U256, EntryPointError> {
        let res = self.entry_point_api.balance_of(*addr).call().await;

        match res {
            Ok(balance) => Ok(balance),
            Err(err) => Err(EntryPointError::Other { inner: format!("balance of error: {err:?}") }),
        }
    }

    /// Derives the counterfactual sender address for the given init code
    ///
    /// The entry point reports the address by reverting with `SenderAddressResult`.
    pub async fn get_sender_address(&self, init_code: Bytes) -> Result<Address, EntryPointError> {
        let res = self.entry_point_api.get_sender_address(init_code).call().await;

        match res {
            Ok(_) => Err(EntryPointError::NoRevert { function: "get_sender_address".into() }),
            Err(e) => Self::deserialize_error_msg(e).and_then(|op| match op {
                EntryPointAPIErrors::SenderAddressResult(res) => Ok(res.sender),
                EntryPointAPIErrors::FailedOp(err) => Err(EntryPointError::FailedOp(err)),
                _ => Err(EntryPointError::Other {
                    inner: format!("get sender address error: {op:?}"),
                }),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{Http, Provider};

    #[tokio::test]
    #[ignore]
    async fn get_nonce_against_local_node() {
        let eth_client = Arc::new(Provider::try_from("http://127.0.0.1:8545").unwrap());
        let ep = EntryPoint::<Provider<Http>>::new(
            eth_client,
            "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".parse().unwrap(),
        );

        let nonce = ep
            .get_nonce(&"0xBBe6a3230Ef8abC44EF61B3fBf93Cd0394D1d21f".parse().unwrap(), U256::zero())
            .await
            .unwrap();
        assert_eq!(nonce, U256::zero());
    }
}
