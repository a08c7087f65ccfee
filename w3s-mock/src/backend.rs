/// In-memory custodial wallet backend
///
/// Keeps users, session tokens, wallets, challenges and transactions in one
/// mutex-protected state. Challenges stay pending until
/// [`MockBackend::complete_challenge`] is called, standing in for the
/// vendor SDK finishing its PIN flow.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::types::*;

pub const USDC_TOKEN_ID: &str = "5797fbd6-3795-519d-84ca-ec4c5f80c3b1";
pub const ETH_SEPOLIA_TOKEN_ID: &str = "979869da-9115-5f7d-917d-12d434e56ae7";

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MockError {
    #[error("Invalid credentials.")]
    Unauthorized,

    #[error("Existing user already created with the provided userId: {0}")]
    UserExists(String),

    #[error("Cannot find the user: {0}")]
    UserNotFound(String),

    #[error("Invalid userToken.")]
    InvalidUserToken,

    #[error("The user is already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Cannot find the wallet: {0}")]
    WalletNotFound(String),

    #[error("Cannot find the challenge: {0}")]
    ChallengeNotFound(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl MockError {
    pub fn status(&self) -> u16 {
        match self {
            MockError::Unauthorized | MockError::InvalidUserToken => 401,
            MockError::UserExists(_) | MockError::AlreadyInitialized(_) => 409,
            MockError::UserNotFound(_)
            | MockError::WalletNotFound(_)
            | MockError::ChallengeNotFound(_) => 404,
            MockError::InsufficientFunds(_) | MockError::BadRequest(_) => 400,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            MockError::Unauthorized => 401,
            MockError::UserExists(_) => 155101,
            MockError::UserNotFound(_) => 155102,
            MockError::InvalidUserToken => 155104,
            MockError::AlreadyInitialized(_) => 155106,
            MockError::WalletNotFound(_) => 156001,
            MockError::ChallengeNotFound(_) => 155601,
            MockError::InsufficientFunds(_) => 155201,
            MockError::BadRequest(_) => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct MockWallet {
    id: String,
    user_id: String,
    address: String,
    blockchain: String,
    create_date: String,
    balances: HashMap<String, f64>,
}

impl MockWallet {
    fn to_response(&self) -> WalletResponse {
        WalletResponse {
            id: self.id.clone(),
            state: "LIVE".to_string(),
            wallet_set_id: format!("set-{}", self.user_id),
            custody_type: "ENDUSER".to_string(),
            user_id: self.user_id.clone(),
            address: self.address.clone(),
            blockchain: self.blockchain.clone(),
            account_type: "SCA".to_string(),
            create_date: self.create_date.clone(),
            update_date: self.create_date.clone(),
        }
    }
}

#[derive(Debug, Clone)]
enum ChallengeAction {
    Initialize {
        user_id: String,
        blockchains: Vec<String>,
    },
    Transfer {
        user_id: String,
        wallet_id: String,
        token_id: String,
        amount: f64,
        destination_address: String,
    },
}

#[derive(Debug, Clone)]
struct Challenge {
    action: ChallengeAction,
    completed: bool,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, bool>,
    /// user token -> user id
    sessions: HashMap<String, String>,
    wallets: Vec<MockWallet>,
    challenges: HashMap<String, Challenge>,
    /// idempotency key -> challenge id
    idempotency: HashMap<String, String>,
    transactions: Vec<(String, TransactionResponse)>,
    calls: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct MockBackend {
    /// Required bearer key; any non-empty key is accepted when `None`
    api_key: Option<String>,
    state: Mutex<State>,
}

fn now() -> String {
    Utc::now().format(DATE_FORMAT).to_string()
}

fn new_address() -> String {
    let tail = Uuid::new_v4().simple().to_string();
    format!("0x{}{}", Uuid::new_v4().simple(), &tail[..8])
}

fn format_amount(amount: f64) -> String {
    format!("{}", amount)
}

fn token_info(token_id: &str, blockchain: &str) -> TokenResponse {
    let (name, symbol, decimals, is_native) = match token_id {
        ETH_SEPOLIA_TOKEN_ID => ("Ethereum-Sepolia", "ETH-SEPOLIA", 18, true),
        USDC_TOKEN_ID => ("USDC", "USDC", 6, false),
        _ => ("Unknown", "UNKNOWN", 18, false),
    };
    let created = "2023-01-01T00:00:00Z".to_string();
    TokenResponse {
        id: token_id.to_string(),
        blockchain: blockchain.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals,
        is_native,
        update_date: created.clone(),
        create_date: created,
    }
}

impl MockBackend {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, state: &mut State, operation: &str) {
        *state.calls.entry(operation.to_string()).or_insert(0) += 1;
    }

    /// Number of requests received for `operation` (e.g. `"create_transfer"`)
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn check_api_key(&self, bearer: Option<&str>) -> Result<(), MockError> {
        match (bearer, &self.api_key) {
            (None, _) | (Some(""), _) => Err(MockError::Unauthorized),
            (Some(given), Some(expected)) if given != expected => Err(MockError::Unauthorized),
            _ => Ok(()),
        }
    }

    /// Resolve an `X-User-Token` to its user id
    pub fn user_for_token(&self, user_token: Option<&str>) -> Result<String, MockError> {
        let token = user_token.ok_or(MockError::InvalidUserToken)?;
        self.lock()
            .sessions
            .get(token)
            .cloned()
            .ok_or(MockError::InvalidUserToken)
    }

    pub fn create_user(&self, user_id: &str) -> Result<(), MockError> {
        let mut state = self.lock();
        self.record(&mut state, "create_user");
        if user_id.is_empty() {
            return Err(MockError::BadRequest("userId is required".to_string()));
        }
        if state.users.contains_key(user_id) {
            return Err(MockError::UserExists(user_id.to_string()));
        }
        state.users.insert(user_id.to_string(), true);
        log::info!("Created user {}", user_id);
        Ok(())
    }

    pub fn create_session(&self, user_id: &str) -> Result<SessionTokenResponse, MockError> {
        let mut state = self.lock();
        self.record(&mut state, "create_session");
        if !state.users.contains_key(user_id) {
            return Err(MockError::UserNotFound(user_id.to_string()));
        }
        let user_token = format!("tok-{}", Uuid::new_v4().simple());
        state.sessions.insert(user_token.clone(), user_id.to_string());
        Ok(SessionTokenResponse {
            user_token,
            encryption_key: format!("key-{}", Uuid::new_v4().simple()),
        })
    }

    pub fn initialize(
        &self,
        user_id: &str,
        request: InitializeRequest,
    ) -> Result<ChallengeIdResponse, MockError> {
        let mut state = self.lock();
        self.record(&mut state, "initialize_user");

        if let Some(existing) = state.idempotency.get(&request.idempotency_key) {
            return Ok(ChallengeIdResponse {
                challenge_id: existing.clone(),
            });
        }
        if state.wallets.iter().any(|w| w.user_id == user_id) {
            return Err(MockError::AlreadyInitialized(user_id.to_string()));
        }
        if request.blockchains.is_empty() {
            return Err(MockError::BadRequest("blockchains is required".to_string()));
        }

        let challenge_id = Uuid::new_v4().to_string();
        state.challenges.insert(
            challenge_id.clone(),
            Challenge {
                action: ChallengeAction::Initialize {
                    user_id: user_id.to_string(),
                    blockchains: request.blockchains,
                },
                completed: false,
            },
        );
        state
            .idempotency
            .insert(request.idempotency_key, challenge_id.clone());
        Ok(ChallengeIdResponse { challenge_id })
    }

    pub fn list_wallets(&self, user_id: &str, query: &WalletQuery) -> WalletsResponse {
        let mut state = self.lock();
        self.record(&mut state, "list_wallets");
        let page_size = query.page_size.unwrap_or(10);
        let wallets = state
            .wallets
            .iter()
            .filter(|w| w.user_id == user_id)
            .filter(|w| query.blockchain.as_deref().map_or(true, |b| w.blockchain == b))
            .take(page_size)
            .map(MockWallet::to_response)
            .collect();
        WalletsResponse { wallets }
    }

    pub fn balances(&self, wallet_id: &str) -> Result<BalancesResponse, MockError> {
        let mut state = self.lock();
        self.record(&mut state, "get_balances");
        let wallet = state
            .wallets
            .iter()
            .find(|w| w.id == wallet_id)
            .ok_or_else(|| MockError::WalletNotFound(wallet_id.to_string()))?;

        let mut token_balances: Vec<TokenBalanceResponse> = wallet
            .balances
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .map(|(token_id, amount)| TokenBalanceResponse {
                amount: format_amount(*amount),
                update_date: wallet.create_date.clone(),
                token: token_info(token_id, &wallet.blockchain),
            })
            .collect();
        token_balances.sort_by(|a, b| a.token.name.cmp(&b.token.name));
        Ok(BalancesResponse { token_balances })
    }

    pub fn create_transfer(
        &self,
        user_id: &str,
        request: TransferRequest,
    ) -> Result<ChallengeIdResponse, MockError> {
        let mut state = self.lock();
        self.record(&mut state, "create_transfer");

        if let Some(existing) = state.idempotency.get(&request.idempotency_key) {
            return Ok(ChallengeIdResponse {
                challenge_id: existing.clone(),
            });
        }

        let wallet = state
            .wallets
            .iter()
            .find(|w| w.id == request.wallet_id && w.user_id == user_id)
            .ok_or_else(|| MockError::WalletNotFound(request.wallet_id.clone()))?;

        let amount: f64 = request
            .amounts
            .first()
            .and_then(|a| a.parse().ok())
            .ok_or_else(|| MockError::BadRequest("amounts must hold one number".to_string()))?;
        let available = wallet.balances.get(&request.token_id).copied().unwrap_or(0.0);
        if amount > available {
            return Err(MockError::InsufficientFunds(format!(
                "{} requested, {} available",
                amount, available
            )));
        }

        let challenge_id = Uuid::new_v4().to_string();
        state.challenges.insert(
            challenge_id.clone(),
            Challenge {
                action: ChallengeAction::Transfer {
                    user_id: user_id.to_string(),
                    wallet_id: request.wallet_id,
                    token_id: request.token_id,
                    amount,
                    destination_address: request.destination_address,
                },
                completed: false,
            },
        );
        state
            .idempotency
            .insert(request.idempotency_key, challenge_id.clone());
        Ok(ChallengeIdResponse { challenge_id })
    }

    pub fn list_transactions(&self, user_id: &str, query: &TransactionQuery) -> TransactionsResponse {
        let mut state = self.lock();
        self.record(&mut state, "list_transactions");
        let page_size = query.page_size.unwrap_or(10);
        let transactions = state
            .transactions
            .iter()
            .rev()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, tx)| tx)
            .filter(|tx| query.blockchain.as_deref().map_or(true, |b| tx.blockchain == b))
            .take(page_size)
            .cloned()
            .collect();
        TransactionsResponse { transactions }
    }

    /// Finish a pending challenge as if the user completed it in the SDK
    pub fn complete_challenge(&self, challenge_id: &str) -> Result<(), MockError> {
        let mut state = self.lock();
        let challenge = state
            .challenges
            .get_mut(challenge_id)
            .filter(|c| !c.completed)
            .ok_or_else(|| MockError::ChallengeNotFound(challenge_id.to_string()))?;
        challenge.completed = true;
        let action = challenge.action.clone();

        match action {
            ChallengeAction::Initialize {
                user_id,
                blockchains,
            } => {
                for blockchain in blockchains {
                    let wallet = MockWallet {
                        id: Uuid::new_v4().to_string(),
                        user_id: user_id.clone(),
                        address: new_address(),
                        blockchain,
                        create_date: now(),
                        balances: HashMap::new(),
                    };
                    log::info!("Created wallet {} for {}", wallet.id, user_id);
                    state.wallets.push(wallet);
                }
            }
            ChallengeAction::Transfer {
                user_id,
                wallet_id,
                token_id,
                amount,
                destination_address,
            } => {
                let wallet = state
                    .wallets
                    .iter_mut()
                    .find(|w| w.id == wallet_id)
                    .ok_or_else(|| MockError::WalletNotFound(wallet_id.clone()))?;
                let balance = wallet.balances.entry(token_id.clone()).or_insert(0.0);
                *balance = (*balance - amount).max(0.0);

                let date = now();
                let transaction = TransactionResponse {
                    id: Uuid::new_v4().to_string(),
                    amounts: vec![format_amount(amount)],
                    source_address: wallet.address.clone(),
                    destination_address,
                    state: "COMPLETE".to_string(),
                    transaction_type: "OUTBOUND".to_string(),
                    network_fee: "0.0000315".to_string(),
                    token_id,
                    blockchain: wallet.blockchain.clone(),
                    create_date: date.clone(),
                    update_date: date,
                };
                state.transactions.push((user_id, transaction));
            }
        }
        Ok(())
    }

    /// Credit a wallet (test faucet)
    pub fn fund_wallet(&self, wallet_id: &str, token_id: &str, amount: f64) -> Result<(), MockError> {
        let mut state = self.lock();
        let wallet = state
            .wallets
            .iter_mut()
            .find(|w| w.id == wallet_id)
            .ok_or_else(|| MockError::WalletNotFound(wallet_id.to_string()))?;
        *wallet.balances.entry(token_id.to_string()).or_insert(0.0) += amount;
        Ok(())
    }

    pub fn wallets_of(&self, user_id: &str) -> Vec<WalletResponse> {
        self.lock()
            .wallets
            .iter()
            .filter(|w| w.user_id == user_id)
            .map(MockWallet::to_response)
            .collect()
    }

    /// Ids of challenges not yet completed, oldest first is not guaranteed
    pub fn pending_challenges(&self) -> Vec<String> {
        self.lock()
            .challenges
            .iter()
            .filter(|(_, c)| !c.completed)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
