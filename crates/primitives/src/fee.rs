//! Fee data and fee quotes

use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// Fee data as reported by the node
///
/// The EIP-1559 fields are `None` on legacy chains.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeData {
    pub gas_price: U256,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

/// Fee fields of a priced user operation
///
/// Transient, recomputed per request and never cached across operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl FeeQuote {
    pub fn new(max_fee_per_gas: U256, max_priority_fee_per_gas: U256) -> Self {
        Self { max_fee_per_gas, max_priority_fee_per_gas }
    }
}
