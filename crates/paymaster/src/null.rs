//! No-op sponsorship

use crate::{error::PaymasterError, Paymaster, NATIVE_TOKEN};
use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256};
use tutela_primitives::UserOperation;

/// Paymaster variant that sponsors nothing
///
/// Operations are self-funded: fee quotes are only valid in the chain's native asset and the
/// sponsorship payload is always empty.
#[derive(Clone, Debug, Default)]
pub struct NullPaymaster;

impl NullPaymaster {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Paymaster for NullPaymaster {
    async fn quote_fee(&self, fee: U256, quote_token: Address) -> Result<U256, PaymasterError> {
        if quote_token != NATIVE_TOKEN {
            return Err(PaymasterError::UnsupportedToken { token: quote_token });
        }
        Ok(fee)
    }

    async fn paymaster_and_data(
        &self,
        _user_operation: &UserOperation,
        _for_gas_estimation: bool,
    ) -> Result<Bytes, PaymasterError> {
        Ok(Bytes::default())
    }
}
