//! Shared fixtures: scripted account, scripted bundler relay, approval surfaces, and a fully
//! wired pipeline over a mocked node provider

use alloy_chains::Chain;
use async_trait::async_trait;
use ethers::{
    providers::{MockProvider, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, U256},
};
use parking_lot::Mutex;
use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::mpsc;
use tutela_accounts::{AccountError, AccountRegistry, SmartAccount};
use tutela_bundler::{BundlerClientError, BundlerRelay};
use tutela_contracts::EntryPoint;
use tutela_paymaster::{build_paymaster, PaymasterKind};
use tutela_pool::{EntryPointBridge, MemoryStore, PoolState, UserOperationPool};
use tutela_primitives::{
    constants::{dummy_signature::ECDSA, entry_point, factory::SIMPLE_ACCOUNT_FACTORY},
    UserOperation, UserOperationByHash, UserOperationGasEstimation, UserOperationHash,
    UserOperationReceipt, UserOperationRequest,
};
use tutela_sender::{
    ApprovalSurface, AuthorizationRequest, AuthorizerError, AuthorizerMessage, Decision,
    SurfaceAuthorizer, SurfaceChannel, SurfaceMessage, UserOperationSender,
};

pub const CHAIN_ID: u64 = 11155111;
pub const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe51296170827936ea5cce4b76994b0f";

pub fn entry_point_address() -> Address {
    entry_point::ADDRESS.parse().unwrap()
}

pub fn test_wallet() -> LocalWallet {
    TEST_KEY.parse().unwrap()
}

/// Scripted smart account with controllable deployment state and nonce
pub struct FakeAccount {
    address: Address,
    deployed: bool,
    has_factory: bool,
    nonce: Mutex<U256>,
    signer: LocalWallet,
}

impl FakeAccount {
    pub fn undeployed() -> Self {
        let signer = test_wallet();
        Self {
            address: signer.address(),
            deployed: false,
            has_factory: true,
            nonce: Mutex::new(U256::zero()),
            signer,
        }
    }

    pub fn deployed(nonce: u64) -> Self {
        let signer = test_wallet();
        Self {
            address: signer.address(),
            deployed: true,
            has_factory: true,
            nonce: Mutex::new(nonce.into()),
            signer,
        }
    }

    pub fn without_factory() -> Self {
        Self { has_factory: false, ..Self::undeployed() }
    }

    pub fn bump_nonce(&self) {
        *self.nonce.lock() += U256::one();
    }
}

#[async_trait]
impl SmartAccount for FakeAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn dummy_signature(&self) -> Bytes {
        Bytes::from_str(ECDSA).unwrap()
    }

    async fn is_deployed(&self) -> Result<bool, AccountError> {
        Ok(self.deployed)
    }

    async fn nonce(&self) -> Result<U256, AccountError> {
        Ok(*self.nonce.lock())
    }

    async fn init_code(&self) -> Result<Bytes, AccountError> {
        if !self.has_factory {
            return Err(AccountError::NoFactory);
        }
        let factory: Address = SIMPLE_ACCOUNT_FACTORY.parse().unwrap();
        let create_account = [&[0x5f, 0xbf, 0xb9, 0xcf][..], &[0u8; 64][..]].concat();
        Ok([factory.as_bytes(), create_account.as_slice()].concat().into())
    }

    async fn sign(&self, message: &[u8]) -> Result<Bytes, AccountError> {
        let signature = self
            .signer
            .sign_message(message)
            .await
            .map_err(|err| AccountError::SignerUnavailable { inner: err.to_string() })?;
        Ok(signature.to_vec().into())
    }
}

/// Scripted bundler relay recording submissions
pub struct FakeBundler {
    pub estimation: UserOperationGasEstimation,
    pub tip: Option<U256>,
    pub fail_submission: AtomicBool,
    pub submissions: Mutex<Vec<UserOperation>>,
}

impl Default for FakeBundler {
    fn default() -> Self {
        Self {
            estimation: UserOperationGasEstimation {
                pre_verification_gas: 44_056.into(),
                verification_gas_limit: 60_624.into(),
                call_gas_limit: 33_100.into(),
            },
            tip: None,
            fail_submission: AtomicBool::new(false),
            submissions: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBundler {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BundlerRelay for FakeBundler {
    async fn estimate_user_operation_gas(
        &self,
        _user_operation: UserOperationRequest,
        _entry_point: Address,
    ) -> Result<UserOperationGasEstimation, BundlerClientError> {
        Ok(self.estimation.clone())
    }

    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> Result<UserOperationHash, BundlerClientError> {
        if self.fail_submission.load(Ordering::SeqCst) {
            return Err(BundlerClientError::Rpc {
                inner: "replacement underpriced".into(),
            });
        }
        let hash = user_operation.hash(&entry_point, CHAIN_ID);
        self.submissions.lock().push(user_operation);
        Ok(hash)
    }

    async fn get_user_operation_by_hash(
        &self,
        _user_operation_hash: UserOperationHash,
    ) -> Result<Option<UserOperationByHash>, BundlerClientError> {
        Ok(None)
    }

    async fn get_user_operation_receipt(
        &self,
        _user_operation_hash: UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, BundlerClientError> {
        Ok(None)
    }

    async fn supported_entry_points(&self) -> Result<Vec<Address>, BundlerClientError> {
        Ok(vec![entry_point_address()])
    }

    async fn max_priority_fee_per_gas(&self) -> Result<Option<U256>, BundlerClientError> {
        Ok(self.tip)
    }
}

/// Surface that runs the full channel protocol and answers with a fixed decision
pub struct AutoSurface {
    decision: Decision,
    on_pending: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl AutoSurface {
    pub fn approving() -> Self {
        Self { decision: Decision::Approved { paymaster_and_data: None }, on_pending: None }
    }

    pub fn approving_with_sponsorship(paymaster_and_data: Bytes) -> Self {
        Self {
            decision: Decision::Approved { paymaster_and_data: Some(paymaster_and_data) },
            on_pending: None,
        }
    }

    pub fn rejecting() -> Self {
        Self { decision: Decision::Rejected, on_pending: None }
    }

    /// Runs the hook after the surface received the pending operation, before deciding
    pub fn with_hook(mut self, hook: Arc<dyn Fn() + Send + Sync>) -> Self {
        self.on_pending = Some(hook);
        self
    }
}

#[async_trait]
impl ApprovalSurface for AutoSurface {
    async fn open(
        &self,
        _request: &AuthorizationRequest,
    ) -> Result<SurfaceChannel, AuthorizerError> {
        let (outgoing, mut surface_incoming) = mpsc::unbounded_channel();
        let (surface_outgoing, incoming) = mpsc::unbounded_channel();
        let decision = self.decision.clone();
        let hook = self.on_pending.clone();

        tokio::spawn(async move {
            while let Some(message) = surface_incoming.recv().await {
                match message {
                    AuthorizerMessage::Init { id } => {
                        if surface_outgoing
                            .send(SurfaceMessage::GetPendingUserOperation { id })
                            .is_err()
                        {
                            break;
                        }
                    }
                    AuthorizerMessage::PendingUserOperation { request } => {
                        if let Some(hook) = &hook {
                            hook();
                        }
                        surface_outgoing
                            .send(SurfaceMessage::Decision {
                                id: request.id,
                                decision: decision.clone(),
                            })
                            .ok();
                        break;
                    }
                }
            }
        });

        Ok(SurfaceChannel { outgoing, incoming })
    }
}

/// Surface whose context is gone by the time the round starts
pub struct ClosedSurface;

#[async_trait]
impl ApprovalSurface for ClosedSurface {
    async fn open(
        &self,
        _request: &AuthorizationRequest,
    ) -> Result<SurfaceChannel, AuthorizerError> {
        let (outgoing, surface_incoming) = mpsc::unbounded_channel();
        let (surface_outgoing, incoming) = mpsc::unbounded_channel::<SurfaceMessage>();
        // the window was closed: nothing holds the surface's channel ends
        drop(surface_incoming);
        drop(surface_outgoing);
        Ok(SurfaceChannel { outgoing, incoming })
    }
}

type TestStore = MemoryStore<PoolState>;
type TestSender = UserOperationSender<Provider<MockProvider>, TestStore>;

/// A fully wired pipeline over in-process fakes
pub struct TestPipeline {
    pub node: MockProvider,
    pub account: Arc<FakeAccount>,
    pub bundler: Arc<FakeBundler>,
    pub pool: UserOperationPool<TestStore>,
    pub sender: TestSender,
}

/// Wires a sender around the given account and approval surface
///
/// The event bridge runs against its own mocked provider, so its watcher tasks never consume
/// responses queued for the pipeline's node.
pub fn pipeline(
    account: Arc<FakeAccount>,
    surface: impl ApprovalSurface + 'static,
) -> TestPipeline {
    let (provider, node) = Provider::mocked();
    let eth_client = Arc::new(provider);
    let entry_point = EntryPoint::new(eth_client.clone(), entry_point_address());

    let (bridge_provider, _) = Provider::mocked();
    let bridge_entry_point = EntryPoint::new(Arc::new(bridge_provider), entry_point_address());

    let accounts = Arc::new(AccountRegistry::new());
    accounts.activate("primary", account.clone());

    let bundler = Arc::new(FakeBundler::new());
    let pool = UserOperationPool::new(TestStore::new());
    let bridge = Arc::new(EntryPointBridge::new(bridge_entry_point, pool.clone()));

    let sender = UserOperationSender::new(
        eth_client,
        entry_point,
        Chain::from_id(CHAIN_ID),
        "sepolia",
        accounts,
        bundler.clone(),
        build_paymaster(PaymasterKind::Null),
        Arc::new(SurfaceAuthorizer::new(surface)),
        pool.clone(),
        bridge,
    );

    TestPipeline { node, account, bundler, pool, sender }
}

/// Queues node responses for one legacy-chain fee estimation round
///
/// Responses pop in reverse push order: the gas price query comes first, then the EIP-1559
/// base fee probe, which is answered with no block and fails the 1559 path over to legacy.
pub fn push_legacy_fee_data(node: &MockProvider, gas_price: u64) {
    node.push::<serde_json::Value, _>(serde_json::Value::Null).unwrap();
    node.push(U256::from(gas_price)).unwrap();
}
