//! Gas price estimation

use crate::client::BundlerRelay;
use ethers::providers::Middleware;
use eyre::format_err;
use tracing::debug;
use tutela_primitives::{
    constants::fee::{FEE_BUFFER_DENOMINATOR, FEE_BUFFER_NUMERATOR},
    FeeData, FeeQuote,
};

/// Computes the fee fields of a user operation from node fee data and the bundler's priority
/// fee recommendation, with a safety buffer against underpriced rejection
#[derive(Clone, Copy, Debug)]
pub struct GasPriceEstimator {
    buffer_numerator: u64,
    buffer_denominator: u64,
}

impl Default for GasPriceEstimator {
    fn default() -> Self {
        Self {
            buffer_numerator: FEE_BUFFER_NUMERATOR,
            buffer_denominator: FEE_BUFFER_DENOMINATOR,
        }
    }
}

impl GasPriceEstimator {
    pub fn new(buffer_numerator: u64, buffer_denominator: u64) -> Self {
        Self { buffer_numerator, buffer_denominator }
    }

    /// Fetches fee data and the bundler's tip recommendation and computes a fee quote
    pub async fn estimate<M: Middleware, B: BundlerRelay + ?Sized>(
        &self,
        eth_client: &M,
        bundler: &B,
    ) -> eyre::Result<FeeQuote> {
        let fee_data = fetch_fee_data(eth_client).await?;

        // the tip recommendation only matters on EIP-1559 chains
        let bundler_tip = if fee_data.max_fee_per_gas.is_some() {
            bundler
                .max_priority_fee_per_gas()
                .await
                .map_err(|err| format_err!("bundler tip recommendation failed: {err}"))?
        } else {
            None
        };

        let quote = self.quote(&fee_data, bundler_tip);
        debug!(?fee_data, ?bundler_tip, ?quote, "estimated gas price");
        Ok(quote)
    }

    /// Computes the fee quote from already-fetched inputs
    ///
    /// On legacy chains (no EIP-1559 fee data) the gas price is used for both fields. If the
    /// bundler recommends a higher tip than the node, the max fee is raised by the same delta so
    /// the tip is honored without reducing the base fee margin. Both fields are then scaled by
    /// the buffer with integer (floor) semantics.
    pub fn quote(
        &self,
        fee_data: &FeeData,
        bundler_tip: Option<ethers::types::U256>,
    ) -> FeeQuote {
        let (mut max_fee, mut max_priority_fee) =
            match (fee_data.max_fee_per_gas, fee_data.max_priority_fee_per_gas) {
                (Some(max_fee), Some(max_priority_fee)) => (max_fee, max_priority_fee),
                _ => (fee_data.gas_price, fee_data.gas_price),
            };

        if let Some(tip) = bundler_tip {
            if tip > max_priority_fee {
                max_fee += tip - max_priority_fee;
                max_priority_fee = tip;
            }
        }

        FeeQuote::new(
            max_fee * self.buffer_numerator / self.buffer_denominator,
            max_priority_fee * self.buffer_numerator / self.buffer_denominator,
        )
    }
}

/// Fetches the node's fee data
///
/// The EIP-1559 fields are None when the node cannot serve an EIP-1559 fee estimate (legacy
/// chain).
pub async fn fetch_fee_data<M: Middleware>(eth_client: &M) -> eyre::Result<FeeData> {
    let gas_price = eth_client
        .get_gas_price()
        .await
        .map_err(|err| format_err!("gas price query failed: {err}"))?;

    match eth_client.estimate_eip1559_fees(None).await {
        Ok((max_fee_per_gas, max_priority_fee_per_gas)) => Ok(FeeData {
            gas_price,
            max_fee_per_gas: Some(max_fee_per_gas),
            max_priority_fee_per_gas: Some(max_priority_fee_per_gas),
        }),
        Err(_) => Ok(FeeData { gas_price, max_fee_per_gas: None, max_priority_fee_per_gas: None }),
    }
}
