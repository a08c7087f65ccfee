// W3S gateway module
// One async call per backend capability, no retries

pub mod client;
pub mod types;

pub use client::HttpGateway;
pub use types::*;

use async_trait::async_trait;

use crate::error::GatewayError;

/// Credentials attached to outgoing requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Auth {
    pub api_key: String,
    /// Sent as `X-User-Token` on calls that act for the user
    pub user_token: String,
}

impl Auth {
    pub fn new(api_key: &str, user_token: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            user_token: user_token.to_string(),
        }
    }
}

/// Fresh idempotency key for a mutating call
pub fn new_idempotency_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn create_user(&self, auth: &Auth, user_id: &str) -> Result<(), GatewayError>;

    async fn create_session(&self, auth: &Auth, user_id: &str) -> Result<SessionToken, GatewayError>;

    async fn initialize_user(
        &self,
        auth: &Auth,
        idempotency_key: String,
        blockchains: &[String],
    ) -> Result<ChallengeId, GatewayError>;

    async fn list_wallets(
        &self,
        auth: &Auth,
        blockchain: &str,
        page_size: u32,
    ) -> Result<Vec<Wallet>, GatewayError>;

    async fn get_balances(&self, auth: &Auth, wallet_id: &str) -> Result<Vec<TokenBalance>, GatewayError>;

    async fn create_transfer(&self, auth: &Auth, request: &TransferRequest) -> Result<ChallengeId, GatewayError>;

    async fn list_transactions(
        &self,
        auth: &Auth,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, GatewayError>;
}
