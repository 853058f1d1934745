//! Gas sponsorship (ERC-4337 paymaster) variants
//!
//! A paymaster can quote the fee of a user operation in a given token and produce the
//! `paymasterAndData` payload sponsoring it. Variants live behind one capability trait and are
//! constructed through [build_paymaster](build_paymaster); callers never branch on the variant.

mod error;
mod null;
mod verifying;

use async_trait::async_trait;
use ethers::{
    signers::LocalWallet,
    types::{Address, Bytes, U256},
};
use std::{collections::HashMap, sync::Arc};

pub use error::PaymasterError;
pub use null::NullPaymaster;
pub use verifying::VerifyingPaymaster;

/// The chain's native asset, used as the quote token of unsponsored operations
pub const NATIVE_TOKEN: Address = ethers::types::H160([0u8; 20]);

/// Capability contract of a paymaster
#[async_trait]
pub trait Paymaster: Send + Sync {
    /// Quotes the given fee amount in the requested token
    ///
    /// Fails with [UnsupportedToken](PaymasterError::UnsupportedToken) if the paymaster does not
    /// sponsor operations in that token.
    async fn quote_fee(&self, fee: U256, quote_token: Address) -> Result<U256, PaymasterError>;

    /// Produces the `paymasterAndData` payload for the given user operation
    ///
    /// The paymaster is asked twice per operation: once with `for_gas_estimation` set, where the
    /// returned payload only needs to be structurally valid (a dummy signature of the right
    /// shape), and once for the final, verifying payload.
    async fn paymaster_and_data(
        &self,
        user_operation: &tutela_primitives::UserOperation,
        for_gas_estimation: bool,
    ) -> Result<Bytes, PaymasterError>;
}

/// Type tag selecting a paymaster variant
pub enum PaymasterKind {
    /// No sponsorship; operations are self-funded in the native asset
    Null,
    /// Off-chain verifying sponsor signing time-boxed quotes
    Verifying {
        signer: LocalWallet,
        address: Address,
        /// Validity window of issued sponsorships, seconds
        valid_duration: u64,
        /// Exchange rates per supported quote token, as (numerator, denominator)
        rates: HashMap<Address, (U256, U256)>,
    },
}

/// Builds a paymaster of the given kind
pub fn build_paymaster(kind: PaymasterKind) -> Arc<dyn Paymaster> {
    match kind {
        PaymasterKind::Null => Arc::new(NullPaymaster::new()),
        PaymasterKind::Verifying { signer, address, valid_duration, rates } => {
            Arc::new(VerifyingPaymaster::new(signer, address, valid_duration, rates))
        }
    }
}
