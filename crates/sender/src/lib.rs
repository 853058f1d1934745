//! The user operation pipeline of the tutela wallet engine
//!
//! [UserOperationSender](crate::UserOperationSender) sequences skeleton construction, fee
//! estimation, paymaster sponsorship, out-of-process user authorization, bundler submission,
//! and pool registration, producing one consistent terminal outcome per request.

mod authorizer;
mod error;
mod sender;

pub use authorizer::{
    ApprovalSurface, AuthorizationContext, AuthorizationRequest, AuthorizerError,
    AuthorizerMessage, Decision, SurfaceAuthorizer, SurfaceChannel, SurfaceMessage,
    UserOperationAuthorizer,
};
pub use error::SendError;
pub use sender::{SentUserOperation, UserOperationSender};
