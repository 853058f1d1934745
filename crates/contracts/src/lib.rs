//! Smart contract interfaces of the tutela wallet engine

pub mod entry_point;
mod error;
mod gen;

pub use entry_point::EntryPoint;
pub use error::{decode_revert_string, EntryPointError, FailedOp};
pub use gen::{
    entry_point_api, passkey_account_factory_api, simple_account_api, simple_account_factory_api,
    EntryPointAPI, PasskeyAccountFactoryAPI, SimpleAccountAPI, SimpleAccountFactoryAPI,
    UserOperationEventFilter, UserOperationRevertReasonFilter,
};
