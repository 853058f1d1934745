//! Out-of-process user authorization
//!
//! A fully-priced, unsigned user operation must be approved by the user before signing and
//! submission. The approval surface is a disconnected execution context (a separate window);
//! the engine talks to it over a bidirectional message channel keyed by a per-request
//! correlation id, and every round ends in a terminal outcome: an approval, a rejection, or an
//! abort when the context goes away without deciding.

use async_trait::async_trait;
use ethers::types::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tutela_primitives::UserOperation;
use uuid::Uuid;

/// Where the request originated, shown to the user on the approval surface
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationContext {
    /// Origin of the requesting dApp
    pub origin: String,
    /// Identifier of the requesting tab, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<u64>,
}

/// One authorization round
///
/// Lives only for the duration of the round and is destroyed on decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// Correlation id of the round
    pub id: Uuid,
    /// The priced, unsigned user operation awaiting approval
    pub user_operation: UserOperation,
    pub context: AuthorizationContext,
}

/// Messages sent from the engine to the approval surface
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthorizerMessage {
    /// The channel is established; the surface may request the pending operation
    Init { id: Uuid },
    /// The pending operation, sent in response to a surface request
    PendingUserOperation { request: AuthorizationRequest },
}

/// Messages sent from the approval surface to the engine
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceMessage {
    /// The surface asks for the operation it should render
    GetPendingUserOperation { id: Uuid },
    /// The user decided
    Decision { id: Uuid, decision: Decision },
}

/// The user's decision on a pending operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    /// The user approved; the surface may supply sponsorship data it negotiated
    Approved {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        paymaster_and_data: Option<Bytes>,
    },
    /// The user declined
    Rejected,
}

/// Authorizer errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizerError {
    /// The approval surface went away without a decision
    #[error("authorization aborted")]
    Aborted,

    /// An authorization round is already active for this correlation id
    #[error("authorization already active for {id}")]
    Busy {
        /// The correlation id
        id: Uuid,
    },

    /// The approval surface could not be opened
    #[error("approval surface error: {inner}")]
    Surface {
        /// The inner error message
        inner: String,
    },
}

/// Bidirectional message channel to one approval surface context
pub struct SurfaceChannel {
    /// Engine-to-surface messages
    pub outgoing: mpsc::UnboundedSender<AuthorizerMessage>,
    /// Surface-to-engine messages; the surface closing its end without a decision aborts the
    /// round
    pub incoming: mpsc::UnboundedReceiver<SurfaceMessage>,
}

/// The disconnected browsing context presenting operations for approval
#[async_trait]
pub trait ApprovalSurface: Send + Sync {
    /// Opens a new top-level context for the given round and connects a channel to it
    async fn open(&self, request: &AuthorizationRequest) -> Result<SurfaceChannel, AuthorizerError>;
}

/// Obtains the user's decision on a pending user operation
#[async_trait]
pub trait UserOperationAuthorizer: Send + Sync {
    /// Presents the operation on the approval surface and awaits the user's decision
    async fn authorize(&self, request: AuthorizationRequest) -> Result<Decision, AuthorizerError>;
}

/// Authorizer driving the channel protocol against an [ApprovalSurface](ApprovalSurface)
pub struct SurfaceAuthorizer<F> {
    surface: F,
    active: Mutex<HashSet<Uuid>>,
}

impl<F: ApprovalSurface> SurfaceAuthorizer<F> {
    pub fn new(surface: F) -> Self {
        Self { surface, active: Mutex::new(HashSet::new()) }
    }
}

/// Marks a correlation id active for the duration of one round
struct RoundGuard<'a> {
    active: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl<'a> RoundGuard<'a> {
    fn begin(active: &'a Mutex<HashSet<Uuid>>, id: Uuid) -> Result<Self, AuthorizerError> {
        if !active.lock().insert(id) {
            return Err(AuthorizerError::Busy { id });
        }
        Ok(Self { active, id })
    }
}

impl Drop for RoundGuard<'_> {
    fn drop(&mut self) {
        self.active.lock().remove(&self.id);
    }
}

#[async_trait]
impl<F: ApprovalSurface> UserOperationAuthorizer for SurfaceAuthorizer<F> {
    async fn authorize(&self, request: AuthorizationRequest) -> Result<Decision, AuthorizerError> {
        let id = request.id;
        let _round = RoundGuard::begin(&self.active, id)?;

        let mut channel = self.surface.open(&request).await?;

        channel
            .outgoing
            .send(AuthorizerMessage::Init { id })
            .map_err(|_| AuthorizerError::Aborted)?;

        debug!(round = %id, origin = %request.context.origin, "authorization round opened");

        loop {
            match channel.incoming.recv().await {
                Some(SurfaceMessage::GetPendingUserOperation { id: round }) if round == id => {
                    channel
                        .outgoing
                        .send(AuthorizerMessage::PendingUserOperation {
                            request: request.clone(),
                        })
                        .map_err(|_| AuthorizerError::Aborted)?;
                }
                Some(SurfaceMessage::Decision { id: round, decision }) if round == id => {
                    debug!(round = %id, ?decision, "authorization round decided");
                    return Ok(decision);
                }
                // a message for another round must not be delivered into this one
                Some(message) => {
                    warn!(round = %id, ?message, "dropping cross-round surface message")
                }
                None => return Err(AuthorizerError::Aborted),
            }
        }
    }
}
