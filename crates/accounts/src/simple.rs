//! Account controlled by a single ECDSA key

use crate::{account::SmartAccount, error::AccountError};
use async_trait::async_trait;
use ethers::{
    abi::AbiEncode,
    providers::Middleware,
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, U256},
};
use std::{str::FromStr, sync::Arc};
use tutela_contracts::{
    simple_account_factory_api::CreateAccountCall, EntryPoint, SimpleAccountFactoryAPI,
};
use tutela_primitives::constants::dummy_signature::ECDSA;

/// Smart account whose verification scheme is a single ECDSA owner key
///
/// Signing is synchronous; the skeleton and nonce queries go through the entry point and the
/// account factory.
pub struct SimpleKeyAccount<M: Middleware + 'static> {
    eth_client: Arc<M>,
    entry_point: EntryPoint<M>,
    owner: LocalWallet,
    factory: Option<Address>,
    salt: U256,
    address: Address,
}

impl<M: Middleware + 'static> SimpleKeyAccount<M> {
    /// Creates the account, deriving the counterfactual address through the factory unless an
    /// explicit address is given
    pub async fn new(
        eth_client: Arc<M>,
        entry_point: Address,
        owner: LocalWallet,
        factory: Option<Address>,
        salt: U256,
        address: Option<Address>,
    ) -> Result<Self, AccountError> {
        let address = match address {
            Some(address) => address,
            None => {
                let factory = factory.ok_or(AccountError::NoFactory)?;
                SimpleAccountFactoryAPI::new(factory, eth_client.clone())
                    .get_address(owner.address(), salt)
                    .call()
                    .await
                    .map_err(|err| AccountError::Provider { inner: err.to_string() })?
            }
        };

        let entry_point = EntryPoint::new(eth_client.clone(), entry_point);
        Ok(Self { eth_client, entry_point, owner, factory, salt, address })
    }
}

#[async_trait]
impl<M: Middleware + 'static> SmartAccount for SimpleKeyAccount<M> {
    fn address(&self) -> Address {
        self.address
    }

    fn dummy_signature(&self) -> Bytes {
        Bytes::from_str(ECDSA).expect("dummy signature is valid hex")
    }

    async fn is_deployed(&self) -> Result<bool, AccountError> {
        let code = self
            .eth_client
            .get_code(self.address, None)
            .await
            .map_err(|err| AccountError::Provider { inner: err.to_string() })?;
        Ok(!code.is_empty())
    }

    async fn nonce(&self) -> Result<U256, AccountError> {
        Ok(self.entry_point.get_nonce(&self.address, U256::zero()).await?)
    }

    async fn init_code(&self) -> Result<Bytes, AccountError> {
        let factory = self.factory.ok_or(AccountError::NoFactory)?;
        let call = CreateAccountCall { owner: self.owner.address(), salt: self.salt };
        Ok([factory.as_bytes(), call.encode().as_slice()].concat().into())
    }

    async fn sign(&self, message: &[u8]) -> Result<Bytes, AccountError> {
        let signature = self
            .owner
            .sign_message(message)
            .await
            .map_err(|err| AccountError::SignerUnavailable { inner: err.to_string() })?;
        Ok(signature.to_vec().into())
    }
}
