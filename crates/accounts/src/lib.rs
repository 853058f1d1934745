//! Smart account variants of the tutela wallet engine
//!
//! Every account satisfies the same [SmartAccount](crate::SmartAccount) capability contract:
//! it can report its (counterfactual) address and deployment state, produce a user operation
//! skeleton for an execution call, and sign arbitrary bytes. Variants differ in init code and
//! signature scheme only; callers never branch on the concrete variant.

mod account;
mod error;
mod passkey;
mod registry;
mod simple;

pub use account::{build_account, AccountKind, SmartAccount};
pub use error::AccountError;
pub use passkey::{
    AssertionRequest, ChannelPasskeyConnector, PasskeyAccount, PasskeyAssertion, PasskeyConnector,
    PasskeyCredential,
};
pub use registry::AccountRegistry;
pub use simple::SimpleKeyAccount;
