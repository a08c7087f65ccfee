//! W3S Sample Wallet: session orchestration for a programmable-wallet client
//!
//! This crate is the UI-independent core of a sample wallet app built on a
//! custodial wallet backend. It sequences the backend calls for login,
//! registration, balance refresh, token transfer and transaction history,
//! and hands PIN/signing challenges to the vendor SDK through an injected
//! bridge.
//!
//! # Architecture
//!
//! - **Gateway**: one async call per backend endpoint ([`gateway::HttpGateway`])
//! - **Session**: credentials plus the wallet/balance/transaction snapshot
//! - **Orchestrator**: the state machine driving every flow
//! - **Challenge bridge**: [`ChallengeExecutor`], implemented by the host around the SDK
//! - **Notifier**: [`Notifier`], implemented by the presentation layer
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use w3s_sample_wallet::{AppConfig, LogNotifier, Orchestrator};
//!
//! let config = AppConfig::from_env();
//! let orchestrator = Orchestrator::from_config(&config, Arc::new(sdk_bridge), Arc::new(LogNotifier));
//!
//! orchestrator.set_user_id("user-1");
//! orchestrator.login().await?;
//! println!("{:?}", orchestrator.balances());
//! ```

// Public modules
pub mod challenge;
pub mod config;
pub mod error;
pub mod gateway;
pub mod notifier;
pub mod orchestrator;
pub mod session;
pub mod state;
pub mod store;
pub mod tokens;
pub mod transfer;

// Re-exports for convenience
pub use challenge::{
    ChallengeCallback, ChallengeErrorCode, ChallengeExecutor, ChallengeOutcome, ChallengeRequest,
    SdkConfiguration, UiChallenge,
};
pub use config::{AppConfig, OrchestratorConfig};
pub use error::{GatewayError, OrchestratorError, StoreError, ValidationError};
pub use gateway::{Auth, Gateway, HttpGateway};
pub use notifier::{Event, LogNotifier, Notifier, ToastKind};
pub use orchestrator::Orchestrator;
pub use session::{Balances, ChallengeKind, PendingChallenge, Session, WalletSnapshot};
pub use state::{AppState, Screen};
pub use store::AppIdStore;
pub use tokens::TrackedToken;
pub use transfer::{validate_transfer, TransferForm};

// Common result type
pub type Result<T> = std::result::Result<T, OrchestratorError>;
