//! Typed JSON-RPC client for ERC-4337 bundlers and gas price estimation

mod api;
mod client;
mod error;
mod gas;

pub use api::{BundlerEthApiClient, BundlerFeeApiClient};
pub use client::{BundlerClient, BundlerRelay};
pub use error::BundlerClientError;
pub use gas::{fetch_fee_data, GasPriceEstimator};
