//! Account controlled by a WebAuthn (P-256) credential
//!
//! Signing suspends on an out-of-process WebAuthn ceremony: the account posts an assertion
//! request over the connector channel and resumes when the authenticator's response arrives.

use crate::{account::SmartAccount, error::AccountError};
use async_trait::async_trait;
use ethers::{
    abi::{encode, AbiEncode, Token},
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use tutela_contracts::{
    passkey_account_factory_api::CreateAccountCall, EntryPoint, PasskeyAccountFactoryAPI,
};
use uuid::Uuid;

/// WebAuthn credential backing a passkey account
#[derive(Clone, Debug)]
pub struct PasskeyCredential {
    /// Authenticator credential id
    pub credential_id: Bytes,
    /// P-256 public key, x coordinate
    pub public_key_x: U256,
    /// P-256 public key, y coordinate
    pub public_key_y: U256,
}

/// A signing challenge forwarded to the authenticator
#[derive(Clone, Debug)]
pub struct AssertionRequest {
    /// Correlation id of the ceremony
    pub id: Uuid,
    /// Credential expected to answer the challenge
    pub credential_id: Bytes,
    /// The bytes to be signed
    pub challenge: Bytes,
}

/// The authenticator's response to an assertion request
#[derive(Clone, Debug)]
pub struct PasskeyAssertion {
    pub authenticator_data: Bytes,
    pub client_data_json: String,
    pub r: U256,
    pub s: U256,
}

/// Boundary to the out-of-process WebAuthn ceremony
#[async_trait]
pub trait PasskeyConnector: Send + Sync {
    /// Requests an assertion for the given challenge, suspending until the user completes or
    /// dismisses the ceremony
    async fn request_assertion(
        &self,
        request: AssertionRequest,
    ) -> Result<PasskeyAssertion, AccountError>;
}

/// Connector that forwards assertion requests over a channel to the ceremony host
///
/// Each request carries a oneshot reply slot; a closed channel or a dropped reply slot means
/// the ceremony was dismissed.
pub struct ChannelPasskeyConnector {
    requests: mpsc::UnboundedSender<(AssertionRequest, oneshot::Sender<PasskeyAssertion>)>,
}

impl ChannelPasskeyConnector {
    pub fn new(
        requests: mpsc::UnboundedSender<(AssertionRequest, oneshot::Sender<PasskeyAssertion>)>,
    ) -> Self {
        Self { requests }
    }
}

#[async_trait]
impl PasskeyConnector for ChannelPasskeyConnector {
    async fn request_assertion(
        &self,
        request: AssertionRequest,
    ) -> Result<PasskeyAssertion, AccountError> {
        let id = request.id;
        let (reply, response) = oneshot::channel();

        self.requests.send((request, reply)).map_err(|_| AccountError::SignerUnavailable {
            inner: "authenticator channel closed".into(),
        })?;

        debug!(ceremony = %id, "awaiting webauthn assertion");

        response.await.map_err(|_| AccountError::SignerUnavailable {
            inner: "webauthn ceremony dismissed".into(),
        })
    }
}

// Representative sizes for gas estimation: 37 bytes of authenticator data and a typical
// client data JSON payload.
const DUMMY_AUTHENTICATOR_DATA: [u8; 37] = [0xfe; 37];
const DUMMY_CLIENT_DATA_JSON: &str = "{\"type\":\"webauthn.get\",\"challenge\":\"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\",\"origin\":\"https://example.com\"}";

/// Smart account whose verification scheme is a WebAuthn P-256 assertion
pub struct PasskeyAccount<M: Middleware + 'static> {
    eth_client: Arc<M>,
    entry_point: EntryPoint<M>,
    credential: PasskeyCredential,
    connector: Arc<dyn PasskeyConnector>,
    factory: Option<Address>,
    salt: U256,
    address: Address,
}

impl<M: Middleware + 'static> PasskeyAccount<M> {
    /// Creates the account, deriving the counterfactual address through the factory unless an
    /// explicit address is given
    pub async fn new(
        eth_client: Arc<M>,
        entry_point: Address,
        credential: PasskeyCredential,
        connector: Arc<dyn PasskeyConnector>,
        factory: Option<Address>,
        salt: U256,
        address: Option<Address>,
    ) -> Result<Self, AccountError> {
        let address = match address {
            Some(address) => address,
            None => {
                let factory = factory.ok_or(AccountError::NoFactory)?;
                PasskeyAccountFactoryAPI::new(factory, eth_client.clone())
                    .get_address(credential.public_key_x, credential.public_key_y, salt)
                    .call()
                    .await
                    .map_err(|err| AccountError::Provider { inner: err.to_string() })?
            }
        };

        let entry_point = EntryPoint::new(eth_client.clone(), entry_point);
        Ok(Self { eth_client, entry_point, credential, connector, factory, salt, address })
    }

    /// Encodes a WebAuthn assertion into the account's signature layout
    fn encode_assertion(assertion: &PasskeyAssertion) -> Bytes {
        encode(&[
            Token::Bytes(assertion.authenticator_data.to_vec()),
            Token::String(assertion.client_data_json.clone()),
            Token::Uint(assertion.r),
            Token::Uint(assertion.s),
        ])
        .into()
    }
}

#[async_trait]
impl<M: Middleware + 'static> SmartAccount for PasskeyAccount<M> {
    fn address(&self) -> Address {
        self.address
    }

    fn dummy_signature(&self) -> Bytes {
        Self::encode_assertion(&PasskeyAssertion {
            authenticator_data: Bytes::from(DUMMY_AUTHENTICATOR_DATA.to_vec()),
            client_data_json: DUMMY_CLIENT_DATA_JSON.into(),
            r: U256::MAX,
            s: U256::MAX,
        })
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
        let call = CreateAccountCall {
            x: self.credential.public_key_x,
            y: self.credential.public_key_y,
            salt: self.salt,
        };
        Ok([factory.as_bytes(), call.encode().as_slice()].concat().into())
    }

    async fn sign(&self, message: &[u8]) -> Result<Bytes, AccountError> {
        let request = AssertionRequest {
            id: Uuid::new_v4(),
            credential_id: self.credential.credential_id.clone(),
            challenge: Bytes::from(message.to_vec()),
        };
        let assertion = self.connector.request_assertion(request).await?;
        Ok(Self::encode_assertion(&assertion))
    }
}
