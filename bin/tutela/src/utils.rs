use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256};
use std::{
    io::Write,
    str::FromStr,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tutela_sender::{
    ApprovalSurface, AuthorizationRequest, AuthorizerError, AuthorizerMessage, Decision,
    SurfaceChannel, SurfaceMessage,
};

/// Parses address from string
pub fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|_| format!("String {s} is not a valid address"))
}

/// Parses U256 from string
pub fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_str_radix(s, 10).map_err(|_| format!("String {s} is not a valid U256"))
}

/// Parses hex bytes from string
pub fn parse_bytes(s: &str) -> Result<Bytes, String> {
    Bytes::from_str(s).map_err(|_| format!("String {s} is not valid hex data"))
}

/// Approval surface backed by the terminal
///
/// The pipeline treats the prompt like any other disconnected approval context: it receives
/// the pending operation over the channel and posts back the user's decision.
pub struct TerminalSurface {
    auto_approve: bool,
}

impl TerminalSurface {
    pub fn new(auto_approve: bool) -> Self {
        Self { auto_approve }
    }
}

#[async_trait]
impl ApprovalSurface for TerminalSurface {
    async fn open(
        &self,
        _request: &AuthorizationRequest,
    ) -> Result<SurfaceChannel, AuthorizerError> {
        let (outgoing, mut surface_incoming) = mpsc::unbounded_channel();
        let (surface_outgoing, incoming) = mpsc::unbounded_channel();
        let auto_approve = self.auto_approve;

        tokio::spawn(async move {
            while let Some(message) = surface_incoming.recv().await {
                match message {
                    AuthorizerMessage::Init { id } => {
                        if surface_outgoing
                            .send(SurfaceMessage::GetPendingUserOperation { id })
                            .is_err()
                        {
                            break;
                        }
                    }
                    AuthorizerMessage::PendingUserOperation { request } => {
                        let uo = &request.user_operation;
                        println!(
                            "pending user operation: sender {:?}, nonce {}, max fee {} wei, call gas limit {}",
                            uo.sender, uo.nonce, uo.max_fee_per_gas, uo.call_gas_limit
                        );

                        let approved = auto_approve || confirm().await;
                        let decision = if approved {
                            Decision::Approved { paymaster_and_data: None }
                        } else {
                            Decision::Rejected
                        };
                        surface_outgoing
                            .send(SurfaceMessage::Decision { id: request.id, decision })
                            .ok();
                        break;
                    }
                }
            }
        });

        Ok(SurfaceChannel { outgoing, incoming })
    }
}

async fn confirm() -> bool {
    print!("approve? [y/N] ");
    std::io::stdout().flush().ok();

    let mut line = String::new();
    if BufReader::new(tokio::io::stdin()).read_line(&mut line).await.is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}
