//! Networks and network lookup

use crate::provider::create_http_provider;
use alloy_chains::Chain;
use ethers::providers::{Http, Provider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A network the wallet engine can operate on
///
/// Immutable after creation. Entries are replaced as a whole, never mutated in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Identifier the network is looked up by
    pub id: String,
    /// EIP-155 chain
    #[serde(with = "chain_id_serde")]
    pub chain: Chain,
    /// JSON-RPC endpoint of the execution node
    pub node_endpoint: String,
    /// JSON-RPC endpoint of the bundler
    pub bundler_endpoint: String,
}

mod chain_id_serde {
    use alloy_chains::Chain;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(chain: &Chain, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(chain.id())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Chain, D::Error> {
        Ok(Chain::from_id(u64::deserialize(d)?))
    }
}

impl Network {
    pub fn new(
        id: impl Into<String>,
        chain: Chain,
        node_endpoint: impl Into<String>,
        bundler_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            chain,
            node_endpoint: node_endpoint.into(),
            bundler_endpoint: bundler_endpoint.into(),
        }
    }

    /// Creates a fresh node provider for this network
    pub async fn node_client(&self) -> eyre::Result<Provider<Http>> {
        create_http_provider(&self.node_endpoint).await
    }
}

/// Network lookup error
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// No network is registered under the requested id
    #[error("unknown network: {id}")]
    UnknownNetwork { id: String },
}

/// Resolves network identifiers to endpoints and chain ids
///
/// Pure lookup with no side effects; resolved entries are returned by value and derived RPC
/// clients are created fresh per resolution.
#[derive(Clone, Debug)]
pub struct NetworkManager {
    networks: HashMap<String, Network>,
    active: String,
}

impl NetworkManager {
    pub fn new(networks: Vec<Network>, active: impl Into<String>) -> Self {
        let networks = networks.into_iter().map(|n| (n.id.clone(), n)).collect();
        Self { networks, active: active.into() }
    }

    /// Looks up a network by id
    pub fn get(&self, id: &str) -> Result<Network, NetworkError> {
        self.networks
            .get(id)
            .cloned()
            .ok_or_else(|| NetworkError::UnknownNetwork { id: id.into() })
    }

    /// Returns the active network
    pub fn get_active(&self) -> Result<Network, NetworkError> {
        self.get(&self.active)
    }

    /// Replaces the entry under the network's id, returning the previous entry if any
    pub fn upsert(&mut self, network: Network) -> Option<Network> {
        self.networks.insert(network.id.clone(), network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_chains::NamedChain;

    fn manager() -> NetworkManager {
        NetworkManager::new(
            vec![Network::new(
                "sepolia",
                NamedChain::Sepolia.into(),
                "http://127.0.0.1:8545",
                "http://127.0.0.1:3000",
            )],
            "sepolia",
        )
    }

    #[test]
    fn resolves_known_network() {
        let network = manager().get("sepolia").unwrap();
        assert_eq!(network.chain.id(), 11155111);
        assert_eq!(network.bundler_endpoint, "http://127.0.0.1:3000");
    }

    #[test]
    fn active_network_is_resolved_by_id() {
        assert_eq!(manager().get_active().unwrap().id, "sepolia");
    }

    #[test]
    fn unknown_network_fails() {
        assert_eq!(
            manager().get("goerli").unwrap_err(),
            NetworkError::UnknownNetwork { id: "goerli".into() }
        );
    }

    #[test]
    fn upsert_replaces_whole_entry() {
        let mut manager = manager();
        let replaced = manager.upsert(Network::new(
            "sepolia",
            NamedChain::Sepolia.into(),
            "http://10.0.0.1:8545",
            "http://10.0.0.1:3000",
        ));
        assert!(replaced.is_some());
        assert_eq!(manager.get("sepolia").unwrap().node_endpoint, "http://10.0.0.1:8545");
    }
}
