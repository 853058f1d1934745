use crate::{
    cli::args::{AccountArgs, NetworkArgs},
    utils::{parse_address, parse_bytes, parse_u256, TerminalSurface},
};
use alloy_chains::Chain;
use clap::Parser;
use ethers::types::{Address, Bytes, U256};
use eyre::eyre;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use tutela_accounts::{build_account, AccountKind, AccountRegistry};
use tutela_bundler::{BundlerClient, BundlerRelay};
use tutela_contracts::EntryPoint;
use tutela_paymaster::{build_paymaster, PaymasterKind};
use tutela_pool::{EntryPointBridge, MemoryStore, PoolState, UserOperationPool};
use tutela_primitives::{
    provider::create_http_provider, Call, Network, NetworkManager, UserOperationHash,
};
use tutela_sender::{AuthorizationContext, SurfaceAuthorizer, UserOperationSender};

/// Send command CLI args
#[derive(Debug, Parser)]
pub struct SendCommand {
    #[clap(flatten)]
    pub network: NetworkArgs,

    #[clap(flatten)]
    pub account: AccountArgs,

    /// Call target.
    #[clap(long, value_parser = parse_address)]
    pub to: Address,

    /// Native value forwarded with the call, in wei.
    #[clap(long, default_value = "0", value_parser = parse_u256)]
    pub value: U256,

    /// Calldata forwarded to the target.
    #[clap(long, default_value = "0x", value_parser = parse_bytes)]
    pub data: Bytes,

    /// Approve without prompting.
    #[clap(long, short)]
    pub yes: bool,

    /// Seconds to wait for on-chain finality before giving up observation.
    #[clap(long, default_value_t = 120)]
    pub timeout: u64,
}

impl SendCommand {
    pub async fn execute(self) -> eyre::Result<()> {
        let networks = NetworkManager::new(
            vec![Network::new(
                self.network.network_id.clone(),
                Chain::from_id(self.network.chain_id),
                self.network.node_endpoint.clone(),
                self.network.bundler_endpoint.clone(),
            )],
            self.network.network_id.clone(),
        );
        let network = networks.get_active()?;

        let eth_client = Arc::new(network.node_client().await?);
        let entry_point = EntryPoint::new(eth_client.clone(), self.network.entry_point);

        let owner = self
            .account
            .private_key
            .parse()
            .map_err(|_| eyre!("invalid owner private key"))?;
        let account = build_account(
            AccountKind::SimpleKey {
                owner,
                factory: Some(self.account.factory),
                salt: self.account.salt.into(),
                address: self.account.account_address,
            },
            eth_client.clone(),
            self.network.entry_point,
        )
        .await?;
        info!(address = ?account.address(), "account resolved");

        let accounts = Arc::new(AccountRegistry::new());
        accounts.activate("default", account);

        let bundler = Arc::new(BundlerClient::new(&network.bundler_endpoint)?);
        match bundler.supported_entry_points().await {
            Ok(supported) if !supported.contains(&self.network.entry_point) => {
                warn!(entry_point = ?self.network.entry_point, "entry point not advertised by the bundler");
            }
            Err(err) => warn!(%err, "could not query the bundler's supported entry points"),
            Ok(_) => {}
        }

        let pool = UserOperationPool::new(MemoryStore::<PoolState>::new());
        let bridge = Arc::new(EntryPointBridge::new(entry_point.clone(), pool.clone()));
        let authorizer = Arc::new(SurfaceAuthorizer::new(TerminalSurface::new(self.yes)));

        let sender = UserOperationSender::new(
            eth_client,
            entry_point,
            network.chain,
            network.id.clone(),
            accounts,
            bundler,
            build_paymaster(PaymasterKind::Null),
            authorizer,
            pool,
            bridge,
        );

        let call = Call::new(self.to, self.value, self.data.clone());
        let sent = sender
            .send_user_operation(
                "default",
                Some(call),
                AuthorizationContext { origin: "tutela-cli".into(), tab: None },
            )
            .await?;
        println!("user operation {} pooled as {}", sent.user_operation_hash, sent.id);

        match tokio::time::timeout(Duration::from_secs(self.timeout), sender.wait(&sent.id)).await
        {
            Ok(Ok(receipt)) => {
                println!(
                    "succeeded: gas cost {}, gas used {}",
                    receipt.actual_gas_cost, receipt.actual_gas_used
                );
                Ok(())
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                // observation timed out; the operation itself cannot be recalled
                println!("still pending after {}s, check later with `tutela status`", self.timeout);
                Ok(())
            }
        }
    }
}

/// Status command CLI args
#[derive(Debug, Parser)]
pub struct StatusCommand {
    #[clap(flatten)]
    pub network: NetworkArgs,

    /// Hash of the user operation.
    #[clap(long)]
    pub hash: UserOperationHash,
}

impl StatusCommand {
    pub async fn execute(self) -> eyre::Result<()> {
        let bundler = BundlerClient::new(&self.network.bundler_endpoint)?;

        let operation = bundler.get_user_operation_by_hash(self.hash).await?;

        match bundler.get_user_operation_receipt(self.hash).await? {
            Some(receipt) => {
                println!(
                    "{}: success={} gas cost {} gas used {}",
                    self.hash, receipt.success, receipt.actual_gas_cost, receipt.actual_gas_used
                );
                if !receipt.reason.is_empty() {
                    println!("reason: {}", receipt.reason);
                }
            }
            None if operation.is_some() => {
                println!("{}: known to the bundler, not yet included", self.hash)
            }
            None => println!("{}: unknown to the bundler", self.hash),
        }

        if let Some(op) = operation {
            let eth_client = Arc::new(create_http_provider(&self.network.node_endpoint).await?);
            let entry_point = EntryPoint::new(eth_client, self.network.entry_point);
            let deposit = entry_point.balance_of(&op.user_operation.sender).await?;
            println!("sender entry point deposit: {deposit} wei");
        }

        Ok(())
    }
}
