//! Execution call requested through a smart account

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A single execution call, created per request and wrapped into the account's execute call data
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// Target contract or recipient
    pub to: Address,
    /// Native value forwarded with the call
    pub value: U256,
    /// Calldata forwarded to the target
    pub data: Bytes,
    /// Explicit account nonce override, queried from the entry point when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
}

impl Call {
    pub fn new(to: Address, value: U256, data: Bytes) -> Self {
        Self { to, value, data, nonce: None }
    }

    /// Sets an explicit nonce override
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }
}
