//! Session state
//!
//! Ephemeral credentials plus the cached wallet, balance and transaction
//! snapshot. Everything here is owned by the orchestrator and cleared on
//! logout; snapshots are replaced as a whole, never patched.

use crate::gateway::{Auth, TokenBalance, Transaction, Wallet};
use crate::tokens::TrackedToken;

/// Why a challenge was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeKind {
    RegistrationInit,
    Transfer,
}

/// Challenge waiting for the vendor SDK; consumed exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChallenge {
    pub challenge_id: String,
    pub kind: ChallengeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub api_key: String,
    pub user_token: String,
    pub encryption_key: String,
    pub pending_challenge: Option<PendingChallenge>,
}

impl Session {
    /// Credentials for calls made before a session token exists
    pub fn api_auth(&self) -> Auth {
        Auth::new(&self.api_key, "")
    }

    pub fn user_auth(&self) -> Auth {
        Auth::new(&self.api_key, &self.user_token)
    }

    /// Token and key are stored together or not at all
    pub fn set_credentials(&mut self, user_token: String, encryption_key: String) {
        debug_assert!(user_token.is_empty() == encryption_key.is_empty());
        self.user_token = user_token;
        self.encryption_key = encryption_key;
    }

    pub fn is_authenticated(&self) -> bool {
        !self.user_token.is_empty() && !self.encryption_key.is_empty()
    }
}

/// Balances of the two tracked tokens as decimal strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balances {
    pub eth_sepolia: String,
    pub usdc: String,
}

impl Default for Balances {
    fn default() -> Self {
        Self {
            eth_sepolia: "0".to_string(),
            usdc: "0".to_string(),
        }
    }
}

impl Balances {
    /// Build a fresh snapshot from backend balances; tokens the backend omits read as zero
    pub fn from_token_balances(token_balances: &[TokenBalance]) -> Self {
        let mut balances = Self::default();
        for balance in token_balances {
            match balance.tracked() {
                Some(TrackedToken::EthSepolia) => balances.eth_sepolia = balance.amount.clone(),
                Some(TrackedToken::Usdc) => balances.usdc = balance.amount.clone(),
                None => log::debug!("Ignoring untracked token {}", balance.token.name),
            }
        }
        balances
    }

    pub fn get(&self, token: TrackedToken) -> &str {
        match token {
            TrackedToken::EthSepolia => &self.eth_sepolia,
            TrackedToken::Usdc => &self.usdc,
        }
    }
}

/// Data fetched for the authenticated screens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletSnapshot {
    pub wallet: Option<Wallet>,
    pub balances: Balances,
    pub transactions: Vec<Transaction>,
    pub selected_transaction: Option<Transaction>,
}
