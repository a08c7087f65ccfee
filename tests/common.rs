//! Common test utilities for orchestrator integration tests
//!
//! This module provides scripted stand-ins for the three collaborators:
//! - `FakeGateway`: canned backend answers, call log, per-operation holds
//! - `RecordingNotifier`: every presentation event in order
//! - `ScriptedExecutor`: records challenges, completes them now or on demand

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use w3s_sample_wallet::gateway::{
    Auth, ChallengeId, Gateway, SessionToken, Token, TokenBalance, Transaction, TransactionQuery,
    TransferRequest, Wallet,
};
use w3s_sample_wallet::{
    ChallengeCallback, ChallengeErrorCode, ChallengeExecutor, ChallengeOutcome, ChallengeRequest,
    Event, GatewayError, Notifier, Orchestrator, OrchestratorConfig, Screen, SdkConfiguration,
    Session, ToastKind, TrackedToken,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Gateway
// ============================================================================

/// Canned answers; `*_error` fields turn the call into a network failure
#[derive(Debug, Clone)]
pub struct Script {
    pub create_user_error: Option<String>,
    pub session: SessionToken,
    pub session_error: Option<String>,
    pub challenge_id: String,
    pub wallets: Vec<Wallet>,
    pub wallets_error: Option<String>,
    pub balances: Vec<TokenBalance>,
    pub transactions: Vec<Transaction>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            create_user_error: None,
            session: SessionToken {
                user_token: "t1".to_string(),
                encryption_key: "e1".to_string(),
            },
            session_error: None,
            challenge_id: "c1".to_string(),
            wallets: vec![wallet("w1", "0xabc")],
            wallets_error: None,
            balances: vec![
                balance(TrackedToken::EthSepolia, "9"),
                balance(TrackedToken::Usdc, "40"),
            ],
            transactions: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub script: Mutex<Script>,
    calls: Mutex<Vec<&'static str>>,
    auths: Mutex<Vec<(&'static str, Auth)>>,
    transfers: Mutex<Vec<TransferRequest>>,
    initialized: Mutex<Vec<Vec<String>>>,
    holds: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl FakeGateway {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            ..Default::default()
        })
    }

    pub fn edit(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().unwrap());
    }

    /// Make calls to `operation` wait until the returned handle is notified
    pub fn hold(&self, operation: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds.lock().unwrap().insert(operation, notify.clone());
        notify
    }

    async fn wait_if_held(&self, operation: &'static str) {
        let hold = self.holds.lock().unwrap().get(operation).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }
    }

    /// Yield until `operation` has been called `times` times
    pub async fn wait_for_call(&self, operation: &str, times: usize) {
        for _ in 0..1000 {
            if self.count(operation) >= times {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{} was not called {} times", operation, times);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| **c == operation).count()
    }

    pub fn auth_for(&self, operation: &str) -> Option<Auth> {
        self.auths
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(op, _)| *op == operation)
            .map(|(_, auth)| auth.clone())
    }

    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn initialized_blockchains(&self) -> Vec<Vec<String>> {
        self.initialized.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str, auth: &Auth) -> Script {
        self.calls.lock().unwrap().push(operation);
        self.auths.lock().unwrap().push((operation, auth.clone()));
        self.script.lock().unwrap().clone()
    }
}

fn network(message: Option<String>) -> Result<(), GatewayError> {
    match message {
        Some(message) => Err(GatewayError::Network(message)),
        None => Ok(()),
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn create_user(&self, auth: &Auth, _user_id: &str) -> Result<(), GatewayError> {
        let script = self.record("create_user", auth);
        network(script.create_user_error)
    }

    async fn create_session(&self, auth: &Auth, _user_id: &str) -> Result<SessionToken, GatewayError> {
        let script = self.record("create_session", auth);
        self.wait_if_held("create_session").await;
        network(script.session_error)?;
        Ok(script.session)
    }

    async fn initialize_user(
        &self,
        auth: &Auth,
        _idempotency_key: String,
        blockchains: &[String],
    ) -> Result<ChallengeId, GatewayError> {
        let script = self.record("initialize_user", auth);
        self.initialized.lock().unwrap().push(blockchains.to_vec());
        Ok(ChallengeId {
            challenge_id: script.challenge_id,
        })
    }

    async fn list_wallets(
        &self,
        auth: &Auth,
        _blockchain: &str,
        _page_size: u32,
    ) -> Result<Vec<Wallet>, GatewayError> {
        let script = self.record("list_wallets", auth);
        self.wait_if_held("list_wallets").await;
        network(script.wallets_error)?;
        Ok(script.wallets)
    }

    async fn get_balances(&self, auth: &Auth, _wallet_id: &str) -> Result<Vec<TokenBalance>, GatewayError> {
        Ok(self.record("get_balances", auth).balances)
    }

    async fn create_transfer(&self, auth: &Auth, request: &TransferRequest) -> Result<ChallengeId, GatewayError> {
        let script = self.record("create_transfer", auth);
        self.transfers.lock().unwrap().push(request.clone());
        Ok(ChallengeId {
            challenge_id: script.challenge_id,
        })
    }

    async fn list_transactions(
        &self,
        auth: &Auth,
        _query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, GatewayError> {
        Ok(self.record("list_transactions", auth).transactions)
    }
}

pub fn wallet(id: &str, address: &str) -> Wallet {
    Wallet {
        id: id.to_string(),
        state: "LIVE".to_string(),
        wallet_set_id: "set-1".to_string(),
        custody_type: "ENDUSER".to_string(),
        user_id: "user-1".to_string(),
        address: address.to_string(),
        blockchain: "ETH-SEPOLIA".to_string(),
        account_type: "SCA".to_string(),
        create_date: "2023-09-01T16:30:05Z".to_string(),
        update_date: "2023-09-01T16:30:05Z".to_string(),
    }
}

pub fn balance(token: TrackedToken, amount: &str) -> TokenBalance {
    TokenBalance {
        amount: amount.to_string(),
        update_date: String::new(),
        token: Token {
            id: token.token_id().to_string(),
            blockchain: "ETH-SEPOLIA".to_string(),
            name: token.backend_name().to_string(),
            symbol: String::new(),
            decimals: 6,
            is_native: token.is_native(),
            update_date: String::new(),
            create_date: String::new(),
        },
    }
}

pub fn transaction(id: &str, amount: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        amounts: vec![amount.to_string()],
        source_address: "0xabc".to_string(),
        destination_address: "0xdef".to_string(),
        state: "COMPLETE".to_string(),
        transaction_type: "OUTBOUND".to_string(),
        network_fee: "0.0001".to_string(),
        token_id: TrackedToken::Usdc.token_id().to_string(),
        blockchain: "ETH-SEPOLIA".to_string(),
        create_date: "2023-09-01T16:30:05Z".to_string(),
        update_date: "2023-09-01T16:31:00Z".to_string(),
    }
}

// ============================================================================
// Notifier
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Event>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn toasts(&self) -> Vec<(ToastKind, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Toast(kind, message) => Some((kind, message)),
                _ => None,
            })
            .collect()
    }

    pub fn has_toast(&self, kind: ToastKind, message: &str) -> bool {
        self.toasts().iter().any(|(k, m)| *k == kind && m == message)
    }

    pub fn screens(&self) -> Vec<Screen> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::ScreenChanged(screen) => Some(screen),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

// ============================================================================
// Challenge executor
// ============================================================================

/// Completes every challenge with `auto_outcome` when set, otherwise parks the callback
#[derive(Default)]
pub struct ScriptedExecutor {
    pub auto_outcome: Mutex<Option<ChallengeOutcome>>,
    /// Deliver `auto_outcome` from a plain OS thread, the way a native SDK does
    off_runtime: bool,
    requests: Mutex<Vec<ChallengeRequest>>,
    parked: Mutex<Vec<ChallengeCallback>>,
    configurations: Mutex<Vec<SdkConfiguration>>,
    dismissals: Mutex<usize>,
}

impl ScriptedExecutor {
    pub fn succeeding() -> Arc<Self> {
        let executor = Self::default();
        *executor.auto_outcome.lock().unwrap() = Some(success());
        Arc::new(executor)
    }

    pub fn succeeding_off_runtime() -> Arc<Self> {
        let executor = Self {
            off_runtime: true,
            ..Self::default()
        };
        *executor.auto_outcome.lock().unwrap() = Some(success());
        Arc::new(executor)
    }

    pub fn parking() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<ChallengeRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn configurations(&self) -> Vec<SdkConfiguration> {
        self.configurations.lock().unwrap().clone()
    }

    pub fn dismissals(&self) -> usize {
        *self.dismissals.lock().unwrap()
    }

    /// Complete the oldest parked challenge
    pub fn complete(&self, outcome: ChallengeOutcome) {
        let callback = {
            let mut parked = self.parked.lock().unwrap();
            assert!(!parked.is_empty(), "no parked challenge");
            parked.remove(0)
        };
        callback(outcome);
    }
}

impl ChallengeExecutor for ScriptedExecutor {
    fn configure(&self, configuration: &SdkConfiguration) {
        self.configurations.lock().unwrap().push(configuration.clone());
    }

    fn execute(&self, request: ChallengeRequest, on_complete: ChallengeCallback) {
        self.requests.lock().unwrap().push(request);
        let outcome = self.auto_outcome.lock().unwrap().clone();
        match outcome {
            Some(outcome) if self.off_runtime => {
                std::thread::spawn(move || on_complete(outcome));
            }
            Some(outcome) => on_complete(outcome),
            None => self.parked.lock().unwrap().push(on_complete),
        }
    }

    fn dismiss(&self) {
        *self.dismissals.lock().unwrap() += 1;
    }
}

pub fn success() -> ChallengeOutcome {
    ChallengeOutcome::Success {
        status: "COMPLETE".to_string(),
        result_type: "INITIALIZE".to_string(),
    }
}

pub fn failure(code: i64, message: &str) -> ChallengeOutcome {
    ChallengeOutcome::Failure {
        error_code: ChallengeErrorCode::from(code),
        display_message: message.to_string(),
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub gateway: Arc<FakeGateway>,
    pub executor: Arc<ScriptedExecutor>,
    pub notifier: Arc<RecordingNotifier>,
}

/// What logout leaves behind for the harness user
pub fn logged_out_session() -> Session {
    Session {
        api_key: "api-key".to_string(),
        ..Session::default()
    }
}

pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig {
        home_redirect_delay: Duration::from_secs(3),
        ..Default::default()
    }
}

impl Harness {
    pub fn new(script: Script, executor: Arc<ScriptedExecutor>) -> Self {
        Self::with_config(script, executor, test_config())
    }

    pub fn with_config(script: Script, executor: Arc<ScriptedExecutor>, config: OrchestratorConfig) -> Self {
        init_logging();
        let gateway = FakeGateway::new(script);
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = Orchestrator::new(gateway.clone(), executor.clone(), notifier.clone(), config);
        orchestrator.set_api_key("api-key");
        orchestrator.set_user_id("user-1");
        Self {
            orchestrator,
            gateway,
            executor,
            notifier,
        }
    }

    /// Logged in on Home with the default script
    pub async fn logged_in(script: Script, executor: Arc<ScriptedExecutor>) -> Self {
        let harness = Self::new(script, executor);
        harness.orchestrator.login().await.expect("login");
        harness.notifier.clear();
        harness
    }
}
