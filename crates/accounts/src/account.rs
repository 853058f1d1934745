use crate::{
    error::AccountError,
    passkey::{PasskeyAccount, PasskeyConnector, PasskeyCredential},
    simple::SimpleKeyAccount,
};
use async_trait::async_trait;
use ethers::{
    abi::AbiEncode,
    providers::Middleware,
    signers::LocalWallet,
    types::{Address, Bytes, U256},
};
use std::sync::Arc;
use tracing::trace;
use tutela_contracts::simple_account_api::ExecuteCall;
use tutela_primitives::{Call, UserOperation};

/// Capability contract of a smart account
///
/// An account can report its (counterfactual) address and deployment state, produce a user
/// operation skeleton for an execution call, and sign arbitrary bytes. Signing is the only
/// operation that may suspend on user interaction.
#[async_trait]
pub trait SmartAccount: Send + Sync {
    /// Address of the account, derivable before deployment
    fn address(&self) -> Address;

    /// Fixed-shape, non-verifying signature sized to match the real scheme, so gas estimation
    /// against an unsigned operation is representative
    fn dummy_signature(&self) -> Bytes;

    /// Whether the account contract exists on chain
    async fn is_deployed(&self) -> Result<bool, AccountError>;

    /// The account's nonce as tracked by the entry point
    async fn nonce(&self) -> Result<U256, AccountError>;

    /// Deployment init code, queried only while the account is undeployed
    ///
    /// Fails with [NoFactory](AccountError::NoFactory) if no factory is configured.
    async fn init_code(&self) -> Result<Bytes, AccountError>;

    /// Signs the given bytes with the account's scheme
    async fn sign(&self, message: &[u8]) -> Result<Bytes, AccountError>;

    /// Builds a user operation skeleton for the given execution call
    ///
    /// The skeleton carries the sender, nonce (0 while undeployed), init code (empty once
    /// deployed), the account's execute call data (empty if `call` is absent), and the dummy
    /// signature. Gas and fee fields are left for the estimation stage.
    async fn create_user_operation(
        &self,
        call: Option<Call>,
    ) -> Result<UserOperation, AccountError> {
        let deployed = self.is_deployed().await?;

        let nonce = match call.as_ref().and_then(|c| c.nonce) {
            Some(nonce) => nonce,
            None if deployed => self.nonce().await?,
            None => U256::zero(),
        };

        let init_code = if deployed { Bytes::default() } else { self.init_code().await? };
        let call_data = call.map(execute_call_data).unwrap_or_default();

        trace!(
            sender = ?self.address(),
            ?nonce,
            deployed,
            "built user operation skeleton"
        );

        Ok(UserOperation::default()
            .sender(self.address())
            .nonce(nonce)
            .init_code(init_code)
            .call_data(call_data)
            .signature(self.dummy_signature()))
    }

    /// Signs the hash of the given user operation
    async fn sign_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: &Address,
        chain_id: u64,
    ) -> Result<UserOperation, AccountError> {
        let hash = user_operation.hash(entry_point, chain_id);
        let signature = self.sign(hash.as_fixed_bytes()).await?;
        Ok(user_operation.signature(signature))
    }
}

/// ABI-encodes the account's execute call wrapping the given call
pub fn execute_call_data(call: Call) -> Bytes {
    ExecuteCall { dest: call.to, value: call.value, func: call.data }.encode().into()
}

/// Type tag selecting a smart account variant
///
/// Construction goes through [build_account](build_account); callers hold the accounts behind
/// the [SmartAccount](SmartAccount) interface and never branch on the variant.
pub enum AccountKind {
    /// Account controlled by a single ECDSA key
    SimpleKey {
        owner: LocalWallet,
        factory: Option<Address>,
        salt: U256,
        /// Explicit account address; derived through the factory when absent
        address: Option<Address>,
    },
    /// Account controlled by a WebAuthn (P-256) credential
    Passkey {
        credential: PasskeyCredential,
        connector: Arc<dyn PasskeyConnector>,
        factory: Option<Address>,
        salt: U256,
        /// Explicit account address; derived through the factory when absent
        address: Option<Address>,
    },
}

/// Builds a smart account of the given kind
pub async fn build_account<M: Middleware + 'static>(
    kind: AccountKind,
    eth_client: Arc<M>,
    entry_point: Address,
) -> Result<Arc<dyn SmartAccount>, AccountError> {
    match kind {
        AccountKind::SimpleKey { owner, factory, salt, address } => Ok(Arc::new(
            SimpleKeyAccount::new(eth_client, entry_point, owner, factory, salt, address).await?,
        )),
        AccountKind::Passkey { credential, connector, factory, salt, address } => {
            Ok(Arc::new(
                PasskeyAccount::new(
                    eth_client,
                    entry_point,
                    credential,
                    connector,
                    factory,
                    salt,
                    address,
                )
                .await?,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_call_data_carries_selector() {
        let call = Call::new(
            "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap(),
            100_000_000_000_000_u64.into(),
            Bytes::default(),
        );
        let data = execute_call_data(call);
        // selector of execute(address,uint256,bytes)
        assert_eq!(&data[0..4], [0xb6, 0x1d, 0x27, 0xf6]);
    }
}
