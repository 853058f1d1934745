use crate::utils::parse_address;
use clap::Parser;
use ethers::types::Address;
use tutela_primitives::constants::entry_point;

/// Network connection args
#[derive(Debug, Clone, Parser)]
pub struct NetworkArgs {
    /// Execution node JSON-RPC endpoint.
    #[clap(long, default_value = "http://127.0.0.1:8545")]
    pub node_endpoint: String,

    /// Bundler JSON-RPC endpoint.
    #[clap(long, default_value = "http://127.0.0.1:3000")]
    pub bundler_endpoint: String,

    /// EIP-155 chain id.
    #[clap(long, default_value_t = 11155111)]
    pub chain_id: u64,

    /// Entry point contract address.
    #[clap(long, default_value = entry_point::ADDRESS, value_parser = parse_address)]
    pub entry_point: Address,

    /// Identifier the network is registered under.
    #[clap(long, default_value = "sepolia")]
    pub network_id: String,
}

/// Smart account args
#[derive(Debug, Clone, Parser)]
pub struct AccountArgs {
    /// Private key of the account owner.
    #[clap(long, env = "TUTELA_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Account factory used to derive and deploy the account.
    #[clap(long, default_value = tutela_primitives::constants::factory::SIMPLE_ACCOUNT_FACTORY, value_parser = parse_address)]
    pub factory: Address,

    /// Factory salt of the account.
    #[clap(long, default_value_t = 0)]
    pub salt: u64,

    /// Explicit account address, skipping factory derivation.
    #[clap(long, value_parser = parse_address)]
    pub account_address: Option<Address>,
}
