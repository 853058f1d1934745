//! Off-chain verifying sponsorship

use crate::{error::PaymasterError, Paymaster, NATIVE_TOKEN};
use async_trait::async_trait;
use ethers::{
    abi::{encode, Token},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, U256},
    utils::keccak256,
};
use std::{
    collections::HashMap,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::debug;
use tutela_primitives::{constants::dummy_signature::ECDSA, UserOperation};

/// Paymaster variant that sponsors operations with a signed, time-boxed off-chain quote
///
/// The sponsorship payload is `paymaster address || abi(validUntil, validAfter) || signature`,
/// where the signature commits to the user operation (without its signature field) and the
/// validity window.
pub struct VerifyingPaymaster {
    signer: LocalWallet,
    address: Address,
    valid_duration: u64,
    rates: HashMap<Address, (U256, U256)>,
}

impl VerifyingPaymaster {
    pub fn new(
        signer: LocalWallet,
        address: Address,
        valid_duration: u64,
        rates: HashMap<Address, (U256, U256)>,
    ) -> Self {
        Self { signer, address, valid_duration, rates }
    }

    fn validity_window(&self) -> (u64, u64) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        (now + self.valid_duration, now)
    }

    /// Hash the sponsorship signature commits to
    fn sponsorship_hash(
        user_operation: &UserOperation,
        valid_until: u64,
        valid_after: u64,
    ) -> [u8; 32] {
        let window =
            encode(&[Token::Uint(valid_until.into()), Token::Uint(valid_after.into())]);
        keccak256([user_operation.pack_without_signature().to_vec(), window].concat())
    }

    fn encode_payload(
        &self,
        valid_until: u64,
        valid_after: u64,
        signature: Bytes,
    ) -> Bytes {
        let window =
            encode(&[Token::Uint(valid_until.into()), Token::Uint(valid_after.into())]);
        [self.address.as_bytes(), window.as_slice(), signature.as_ref()].concat().into()
    }
}

#[async_trait]
impl Paymaster for VerifyingPaymaster {
    async fn quote_fee(&self, fee: U256, quote_token: Address) -> Result<U256, PaymasterError> {
        if quote_token == NATIVE_TOKEN {
            return Ok(fee);
        }
        let (numerator, denominator) = self
            .rates
            .get(&quote_token)
            .copied()
            .ok_or(PaymasterError::UnsupportedToken { token: quote_token })?;
        Ok(fee * numerator / denominator)
    }

    async fn paymaster_and_data(
        &self,
        user_operation: &UserOperation,
        for_gas_estimation: bool,
    ) -> Result<Bytes, PaymasterError> {
        let (valid_until, valid_after) = self.validity_window();

        let signature = if for_gas_estimation {
            // structurally valid only; sized like the real signature
            Bytes::from_str(ECDSA).expect("dummy signature is valid hex")
        } else {
            let hash = Self::sponsorship_hash(user_operation, valid_until, valid_after);
            let signature = self
                .signer
                .sign_message(hash)
                .await
                .map_err(|err| PaymasterError::Signer { inner: err.to_string() })?;
            signature.to_vec().into()
        };

        debug!(
            sender = ?user_operation.sender,
            valid_until,
            for_gas_estimation,
            "issued sponsorship payload"
        );

        Ok(self.encode_payload(valid_until, valid_after, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paymaster() -> VerifyingPaymaster {
        let signer = "0x4c0883a69102937d6231471b5dbb6204fe51296170827936ea5cce4b76994b0f"
            .parse::<LocalWallet>()
            .unwrap();
        let token: Address = "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap();
        let mut rates = HashMap::new();
        rates.insert(token, (U256::from(2_000), U256::from(1)));
        VerifyingPaymaster::new(
            signer,
            "0x42b7eB9CA0e87b3e915E0C56F7a668d28a317fBd".parse().unwrap(),
            3_600,
            rates,
        )
    }

    #[tokio::test]
    async fn quotes_configured_token_rate() {
        let token: Address = "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap();
        assert_eq!(paymaster().quote_fee(3.into(), token).await.unwrap(), 6_000.into());
    }

    #[tokio::test]
    async fn rejects_unknown_token() {
        let token: Address = "0x0000000000000000000000000000000000000001".parse().unwrap();
        assert_eq!(
            paymaster().quote_fee(3.into(), token).await,
            Err(PaymasterError::UnsupportedToken { token })
        );
    }

    #[tokio::test]
    async fn estimation_payload_is_structurally_valid() {
        let pm = paymaster();
        let uo = UserOperation::default();
        let payload = pm.paymaster_and_data(&uo, true).await.unwrap();
        // paymaster address, two abi words, 65-byte signature
        assert_eq!(payload.len(), 20 + 64 + 65);
        assert_eq!(&payload[0..20], pm.address.as_bytes());
    }

    #[tokio::test]
    async fn final_payload_carries_real_signature() {
        let pm = paymaster();
        let uo = UserOperation::default();
        let estimation = pm.paymaster_and_data(&uo, true).await.unwrap();
        let payload = pm.paymaster_and_data(&uo, false).await.unwrap();
        assert_eq!(payload.len(), estimation.len());
        assert_ne!(payload[84..], estimation[84..]);
    }
}
