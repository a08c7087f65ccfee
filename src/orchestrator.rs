//! Wallet session orchestrator
//!
//! Sequences the registration, login, refresh, transfer and history flows
//! over the [`Gateway`], hands pending challenges to the
//! [`ChallengeExecutor`] and reports every visible change to the
//! [`Notifier`].
//!
//! The orchestrator is a cheap cloneable handle. Flows are cooperative: the
//! inner lock is never held across an await, and the [`AppState`] guard is
//! the only mutual exclusion. Each flow remembers the session generation it
//! started under; a response that arrives after a logout is dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{FixedOffset, Offset, Utc};
use tokio::runtime::Handle;

use crate::challenge::{
    ChallengeErrorCode, ChallengeExecutor, ChallengeOutcome, ChallengeRequest, SdkConfiguration,
    UiChallenge,
};
use crate::config::{AppConfig, OrchestratorConfig};
use crate::error::{OrchestratorError, StoreError, ValidationError};
use crate::gateway::{
    new_idempotency_key, FeeLevel, Gateway, HttpGateway, TransactionQuery, TransferRequest,
};
use crate::notifier::{Event, Notifier, ToastKind};
use crate::session::{Balances, ChallengeKind, PendingChallenge, Session, WalletSnapshot};
use crate::state::{AppState, Screen};
use crate::store::AppIdStore;
use crate::tokens::TrackedToken;
use crate::transfer::{validate_transfer, TransferForm};

#[derive(Debug, Default)]
struct Inner {
    state: AppState,
    screen: Screen,
    session: Session,
    snapshot: WalletSnapshot,
    form: TransferForm,
    /// Bumped on logout; flows started under an older value are stale
    generation: u64,
    sdk: SdkConfiguration,
}

#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Mutex<Inner>>,
    gateway: Arc<dyn Gateway>,
    executor: Arc<dyn ChallengeExecutor>,
    notifier: Arc<dyn Notifier>,
    config: Arc<OrchestratorConfig>,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        executor: Arc<dyn ChallengeExecutor>,
        notifier: Arc<dyn Notifier>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            gateway,
            executor,
            notifier,
            config: Arc::new(config),
        }
    }

    /// Orchestrator talking HTTP to `config.api_base_url`, with the API key prefilled
    pub fn from_config(
        config: &AppConfig,
        executor: Arc<dyn ChallengeExecutor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let gateway = Arc::new(HttpGateway::new(&config.api_base_url));
        let orchestrator = Self::new(gateway, executor, notifier, config.orchestrator.clone());
        orchestrator.set_api_key(&config.api_key);
        orchestrator
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn state(&self) -> AppState {
        self.lock().state
    }

    pub fn screen(&self) -> Screen {
        self.lock().screen
    }

    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        self.lock().snapshot.clone()
    }

    pub fn balances(&self) -> Balances {
        self.lock().snapshot.balances.clone()
    }

    pub fn form(&self) -> TransferForm {
        self.lock().form.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn sdk_configuration(&self) -> SdkConfiguration {
        self.lock().sdk.clone()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Offset used for the transaction date helpers
    pub fn display_offset(&self) -> FixedOffset {
        self.config
            .display_utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    pub fn set_user_id(&self, user_id: &str) {
        self.lock().session.user_id = user_id.to_string();
    }

    pub fn set_api_key(&self, api_key: &str) {
        self.lock().session.api_key = api_key.to_string();
    }

    pub fn set_amount(&self, amount: &str) {
        self.lock().form.amount = amount.to_string();
    }

    pub fn set_destination(&self, destination_address: &str) {
        self.lock().form.destination_address = destination_address.to_string();
    }

    pub fn select_token(&self, token: TrackedToken) {
        self.lock().form.token = token;
    }

    // ------------------------------------------------------------------
    // SDK configuration
    // ------------------------------------------------------------------

    /// Configure the SDK once at startup; a stored app id takes precedence
    pub fn init_sdk(&self, endpoint: &str, app_id: &str, store: Option<&AppIdStore>) {
        let stored = match store.map(AppIdStore::load) {
            Some(Ok(stored)) => stored,
            Some(Err(e)) => {
                log::warn!("Could not read stored app id: {}", e);
                None
            }
            None => None,
        };

        let configuration = SdkConfiguration {
            endpoint: endpoint.to_string(),
            app_id: stored.unwrap_or_else(|| app_id.to_string()),
        };
        log::info!("Configuring SDK for {}", configuration.endpoint);
        self.executor.configure(&configuration);
        self.lock().sdk = configuration;
    }

    /// Change the app id, persist it and reconfigure the SDK
    pub fn update_app_id(&self, app_id: &str, store: Option<&AppIdStore>) -> Result<(), StoreError> {
        if let Some(store) = store {
            store.save(app_id)?;
        }
        let configuration = {
            let mut inner = self.lock();
            inner.sdk.app_id = app_id.to_string();
            inner.sdk.clone()
        };
        self.executor.configure(&configuration);
        Ok(())
    }

    // ------------------------------------------------------------------
    // State guard
    // ------------------------------------------------------------------

    fn notify(&self, event: Event) {
        self.notifier.notify(event);
    }

    fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        self.notify(Event::Toast(kind, message.into()));
    }

    /// Enter `next`; rejected with a notice while another flow runs
    fn begin(&self, next: AppState) -> Result<u64, OrchestratorError> {
        let entered = {
            let mut inner = self.lock();
            if inner.state.is_idle() {
                inner.state = next;
                Ok(inner.generation)
            } else {
                Err(inner.state)
            }
        };

        match entered {
            Ok(generation) => Ok(generation),
            Err(current) => {
                log::debug!("Rejecting {} while {}", next, current);
                self.toast(ToastKind::General, format!("Please wait, {} in progress", current));
                Err(OrchestratorError::Busy(current.to_string()))
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    fn ensure_current(&self, generation: u64) -> Result<(), OrchestratorError> {
        if self.is_current(generation) {
            Ok(())
        } else {
            log::debug!("Discarding response from session generation {}", generation);
            Err(OrchestratorError::StaleSession)
        }
    }

    /// Back to Idle, unless a logout already replaced the session
    fn finish(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation {
            inner.state = AppState::Idle;
        }
    }

    /// Toast the failure, return to Idle and hand the error back
    fn fail<T>(
        &self,
        generation: u64,
        kind: ToastKind,
        message: &str,
        err: OrchestratorError,
    ) -> Result<T, OrchestratorError> {
        log::error!("{}", err);
        self.toast(kind, message);
        self.finish(generation);
        Err(err)
    }

    fn fail_gateway<T>(&self, generation: u64, err: OrchestratorError) -> Result<T, OrchestratorError> {
        let message = format!("Error: {}", err);
        self.fail(generation, ToastKind::Failure, &message, err)
    }

    fn reject(&self, err: ValidationError) -> OrchestratorError {
        let kind = match err {
            ValidationError::InsufficientBalance => ToastKind::Failure,
            _ => ToastKind::General,
        };
        self.toast(kind, err.to_string());
        err.into()
    }

    // ------------------------------------------------------------------
    // Navigation and refresh
    // ------------------------------------------------------------------

    /// Switch screens; entering any authenticated screen refreshes wallet and balances
    pub async fn navigate(&self, screen: Screen) -> Result<(), OrchestratorError> {
        let (changed, generation, authenticated) = {
            let mut inner = self.lock();
            if screen.is_authenticated() && !inner.session.is_authenticated() {
                drop(inner);
                log::warn!("Refusing {:?} without an active session", screen);
                return Err(OrchestratorError::EmptyCredential(
                    "no active session".to_string(),
                ));
            }
            let changed = inner.screen != screen;
            inner.screen = screen;
            (changed, inner.generation, screen.is_authenticated())
        };

        if changed {
            self.notify(Event::ScreenChanged(screen));
        }
        if !authenticated {
            return Ok(());
        }

        match self.refresh_wallet(generation).await {
            Ok(()) | Err(OrchestratorError::StaleSession) => Ok(()),
            Err(e) => {
                self.toast(ToastKind::Failure, format!("Error: {}", e));
                Err(e)
            }
        }
    }

    pub async fn go_home(&self) -> Result<(), OrchestratorError> {
        self.navigate(Screen::Home).await
    }

    pub async fn open_send(&self) -> Result<(), OrchestratorError> {
        self.navigate(Screen::SendToken).await
    }

    /// Force the Login screen without touching the session
    fn show_login(&self) {
        let changed = {
            let mut inner = self.lock();
            let changed = inner.screen != Screen::Login;
            inner.screen = Screen::Login;
            changed
        };
        if changed {
            self.notify(Event::ScreenChanged(Screen::Login));
        }
    }

    /// List wallets, keep the first, then load its balances
    async fn refresh_wallet(&self, generation: u64) -> Result<(), OrchestratorError> {
        let auth = self.lock().session.user_auth();

        let wallets = self
            .gateway
            .list_wallets(&auth, &self.config.blockchain, self.config.page_size)
            .await;
        self.ensure_current(generation)?;

        let wallet = match wallets?.into_iter().next() {
            Some(wallet) => wallet,
            None => {
                log::warn!("No wallet on {}, returning to login", self.config.blockchain);
                self.show_login();
                return Ok(());
            }
        };
        log::debug!("Tracking wallet {} ({})", wallet.id, wallet.address);
        let wallet_id = wallet.id.clone();
        self.lock().snapshot.wallet = Some(wallet);

        let token_balances = self.gateway.get_balances(&auth, &wallet_id).await;
        self.ensure_current(generation)?;

        let balances = Balances::from_token_balances(&token_balances?);
        log::info!(
            "Balances: {} ETH-SEPOLIA, {} USDC",
            balances.eth_sepolia,
            balances.usdc
        );
        self.lock().snapshot.balances = balances;
        Ok(())
    }

    /// Pull-to-refresh on Home; honoured only while Idle
    pub async fn refresh_balances(&self) -> Result<(), OrchestratorError> {
        if self.screen() != Screen::Home {
            log::debug!("Ignoring refresh outside Home");
            return Ok(());
        }
        let generation = self.begin(AppState::RefreshingBalance)?;
        self.toast(ToastKind::General, "Updating Wallet Balances");

        match self.refresh_wallet(generation).await {
            Ok(()) => {
                self.toast(ToastKind::Success, "Balance Updated");
                self.finish(generation);
                Ok(())
            }
            Err(OrchestratorError::StaleSession) => Err(OrchestratorError::StaleSession),
            Err(e) => self.fail_gateway(generation, e),
        }
    }

    // ------------------------------------------------------------------
    // Login and registration
    // ------------------------------------------------------------------

    fn require_user_id(&self) -> Result<String, OrchestratorError> {
        let user_id = self.lock().session.user_id.clone();
        if user_id.is_empty() {
            Err(self.reject(ValidationError::EmptyUserId))
        } else {
            Ok(user_id)
        }
    }

    pub async fn login(&self) -> Result<(), OrchestratorError> {
        let user_id = self.require_user_id()?;
        let generation = self.begin(AppState::LoggingIn)?;
        log::info!("Logging in {}", user_id);

        let auth = self.lock().session.api_auth();
        let result = self.gateway.create_session(&auth, &user_id).await;
        self.ensure_current(generation)?;

        let token = match result {
            Ok(token) => token,
            Err(e) => return self.fail_gateway(generation, e.into()),
        };
        if token.user_token.is_empty() {
            return self.fail(
                generation,
                ToastKind::Failure,
                "User Token is Empty. Please register for an account",
                OrchestratorError::EmptyCredential("user token".to_string()),
            );
        }
        if token.encryption_key.is_empty() {
            return self.fail(
                generation,
                ToastKind::Failure,
                "Encryption Key is Empty",
                OrchestratorError::EmptyCredential("encryption key".to_string()),
            );
        }

        {
            let mut inner = self.lock();
            inner.session.set_credentials(token.user_token, token.encryption_key);
            inner.state = AppState::Idle;
        }
        log::info!("Logged in {}", user_id);

        // A failed refresh is already toasted; the login itself stands
        if let Err(e) = self.navigate(Screen::Home).await {
            log::warn!("Refresh after login: {}", e);
        }
        Ok(())
    }

    pub async fn register(&self) -> Result<(), OrchestratorError> {
        let user_id = self.require_user_id()?;
        let generation = self.begin(AppState::Registering)?;
        log::info!("Registering {}", user_id);

        let auth = self.lock().session.api_auth();
        let created = self.gateway.create_user(&auth, &user_id).await;
        self.ensure_current(generation)?;
        match created {
            Ok(()) => log::debug!("Created user {}", user_id),
            Err(e) if self.config.require_user_creation => {
                return self.fail_gateway(generation, e.into());
            }
            Err(e) => log::warn!("User creation failed, continuing: {}", e),
        }

        let token = self.gateway.create_session(&auth, &user_id).await;
        self.ensure_current(generation)?;
        let token = match token {
            Ok(token) => token,
            Err(e) => return self.fail_gateway(generation, e.into()),
        };
        if token.user_token.is_empty() || token.encryption_key.is_empty() {
            let missing = if token.user_token.is_empty() {
                "User Token is Empty"
            } else {
                "Encryption Key is Empty"
            };
            return self.fail(
                generation,
                ToastKind::General,
                missing,
                OrchestratorError::IncompleteRegistration(missing.to_string()),
            );
        }

        let user_auth = {
            let mut inner = self.lock();
            inner.session.set_credentials(token.user_token, token.encryption_key);
            inner.session.user_auth()
        };

        let blockchains = [self.config.blockchain.clone()];
        let challenge = self
            .gateway
            .initialize_user(&user_auth, new_idempotency_key(), &blockchains)
            .await;
        self.ensure_current(generation)?;
        let challenge = match challenge {
            Ok(challenge) => challenge,
            Err(e) => return self.fail_gateway(generation, e.into()),
        };
        if challenge.challenge_id.is_empty() {
            return self.fail(
                generation,
                ToastKind::General,
                "Challenge ID is Empty",
                OrchestratorError::IncompleteRegistration("Challenge ID is Empty".to_string()),
            );
        }

        self.start_challenge(
            generation,
            PendingChallenge {
                challenge_id: challenge.challenge_id,
                kind: ChallengeKind::RegistrationInit,
            },
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transfers and history
    // ------------------------------------------------------------------

    pub async fn send_tokens(&self) -> Result<(), OrchestratorError> {
        let (form, balances, wallet_id) = {
            let inner = self.lock();
            (
                inner.form.clone(),
                inner.snapshot.balances.clone(),
                inner.snapshot.wallet.as_ref().map(|w| w.id.clone()),
            )
        };

        validate_transfer(&form, &balances).map_err(|e| self.reject(e))?;

        let wallet_id = match wallet_id {
            Some(id) => id,
            None => {
                self.toast(ToastKind::Failure, "No wallet loaded");
                return Err(OrchestratorError::EmptyCredential("wallet id".to_string()));
            }
        };

        let generation = self.begin(AppState::SendingTokens)?;
        log::info!(
            "Sending {} {} to {}",
            form.amount,
            form.token,
            form.destination_address
        );

        let request = TransferRequest {
            idempotency_key: new_idempotency_key(),
            destination_address: form.destination_address,
            amounts: vec![form.amount],
            token_id: form.token.token_id().to_string(),
            wallet_id,
            fee_level: FeeLevel::Low,
        };
        let auth = self.lock().session.user_auth();
        let challenge = self.gateway.create_transfer(&auth, &request).await;
        self.ensure_current(generation)?;

        let challenge = match challenge {
            Ok(challenge) => challenge,
            Err(e) => return self.fail_gateway(generation, e.into()),
        };
        if challenge.challenge_id.is_empty() {
            return self.fail(
                generation,
                ToastKind::General,
                "Challenge ID is Empty",
                OrchestratorError::EmptyCredential("challenge id".to_string()),
            );
        }

        self.start_challenge(
            generation,
            PendingChallenge {
                challenge_id: challenge.challenge_id,
                kind: ChallengeKind::Transfer,
            },
        );
        Ok(())
    }

    /// Show the history screen and reload the transfer list
    pub async fn open_transactions(&self) -> Result<(), OrchestratorError> {
        self.navigate(Screen::Transactions).await?;
        if self.screen() != Screen::Transactions {
            // Refresh found no wallet and sent us back to Login
            return Ok(());
        }

        let (auth, generation) = {
            let inner = self.lock();
            (inner.session.user_auth(), inner.generation)
        };
        let query = TransactionQuery::transfers(&self.config.blockchain, self.config.page_size);
        let transactions = self.gateway.list_transactions(&auth, &query).await;
        self.ensure_current(generation)?;

        match transactions {
            Ok(transactions) => {
                log::debug!("Loaded {} transactions", transactions.len());
                self.lock().snapshot.transactions = transactions;
                Ok(())
            }
            Err(e) => {
                let err: OrchestratorError = e.into();
                self.toast(ToastKind::Failure, format!("Error: {}", err));
                Err(err)
            }
        }
    }

    pub async fn select_transaction(&self, transaction_id: &str) -> Result<(), OrchestratorError> {
        let found = {
            let mut inner = self.lock();
            let found = inner
                .snapshot
                .transactions
                .iter()
                .find(|tx| tx.id == transaction_id)
                .cloned();
            if found.is_some() {
                inner.snapshot.selected_transaction = found.clone();
            }
            found
        };

        if found.is_none() {
            log::warn!("Unknown transaction {}", transaction_id);
            return Ok(());
        }
        self.navigate(Screen::TransactionDetail).await
    }

    pub async fn back_to_transactions(&self) -> Result<(), OrchestratorError> {
        self.lock().snapshot.selected_transaction = None;
        self.navigate(Screen::Transactions).await
    }

    /// Address of the tracked wallet, for the clipboard
    pub fn copy_wallet_address(&self) -> String {
        let address = self
            .lock()
            .snapshot
            .wallet
            .as_ref()
            .map(|w| w.address.clone())
            .unwrap_or_else(|| "No Address".to_string());
        self.toast(ToastKind::Success, "Address Copied");
        address
    }

    // ------------------------------------------------------------------
    // Challenges
    // ------------------------------------------------------------------

    fn start_challenge(&self, generation: u64, pending: PendingChallenge) {
        let request = {
            let mut inner = self.lock();
            inner.session.pending_challenge = Some(pending.clone());
            ChallengeRequest {
                user_token: inner.session.user_token.clone(),
                encryption_key: inner.session.encryption_key.clone(),
                challenge_id: pending.challenge_id.clone(),
            }
        };
        log::info!("Executing {:?} challenge {}", pending.kind, pending.challenge_id);

        // The SDK may call back on its own thread, outside any runtime
        let runtime = Handle::try_current().ok();
        let this = self.clone();
        self.executor.execute(
            request,
            Box::new(move |outcome| {
                if let Err(e) = this.complete_challenge(generation, outcome, runtime) {
                    log::warn!("Challenge completion: {}", e);
                }
            }),
        );
    }

    /// Apply the SDK's terminal result for a challenge started under `generation`
    fn complete_challenge(
        &self,
        generation: u64,
        outcome: ChallengeOutcome,
        runtime: Option<Handle>,
    ) -> Result<(), OrchestratorError> {
        self.ensure_current(generation)?;
        let completed_on_send = {
            let mut inner = self.lock();
            inner.session.pending_challenge = None;
            inner.screen == Screen::SendToken
        };

        match outcome {
            ChallengeOutcome::Success { status, result_type } => {
                log::info!("Challenge {} finished: {}", result_type, status);
                self.toast(ToastKind::Success, format!("{} - {}", result_type, status));
                self.schedule_home_redirect(generation, completed_on_send, runtime);
                Ok(())
            }
            ChallengeOutcome::Failure {
                error_code,
                display_message,
            } => {
                self.toast(ToastKind::Failure, format!("Error: {}", display_message));
                if error_code == ChallengeErrorCode::UserHasSetPin {
                    self.executor.dismiss();
                }
                self.finish(generation);
                Err(OrchestratorError::ChallengeFailure {
                    code: error_code.code(),
                    message: display_message,
                })
            }
        }
    }

    /// Spawn the delayed Home redirect on the runtime the flow started on
    fn schedule_home_redirect(&self, generation: u64, clear_form: bool, runtime: Option<Handle>) {
        let this = self.clone();
        let delay = self.config.home_redirect_delay;
        match runtime.or_else(|| Handle::try_current().ok()) {
            Some(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = this.redirect_home(generation, clear_form).await {
                        log::warn!("Redirect after challenge: {}", e);
                    }
                });
            }
            None => {
                log::error!("No tokio runtime for the home redirect; settling without refresh");
                this.settle_after_challenge(generation, clear_form);
            }
        }
    }

    /// Idle again, with the send-form inputs cleared if the challenge finished on SendToken
    fn settle_after_challenge(&self, generation: u64, clear_form: bool) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        if clear_form {
            inner.form.clear_inputs();
        }
        inner.state = AppState::Idle;
        true
    }

    async fn redirect_home(
        &self,
        generation: u64,
        clear_form: bool,
    ) -> Result<(), OrchestratorError> {
        if !self.settle_after_challenge(generation, clear_form) {
            return Err(OrchestratorError::StaleSession);
        }
        self.navigate(Screen::Home).await
    }

    /// Open one of the SDK's built-in PIN screens
    pub fn run_ui_challenge(&self, challenge: UiChallenge) {
        log::info!("Opening {}", challenge.challenge_id());
        self.executor.execute(
            challenge.request(),
            Box::new(move |outcome| log::info!("{:?} finished: {:?}", challenge, outcome)),
        );
    }

    // ------------------------------------------------------------------
    // Logout
    // ------------------------------------------------------------------

    /// Drop the session from any state; in-flight responses become stale
    ///
    /// The API key is login-screen configuration and survives.
    pub fn logout(&self) {
        {
            let mut inner = self.lock();
            let api_key = std::mem::take(&mut inner.session.api_key);
            inner.session = Session {
                api_key,
                ..Session::default()
            };
            inner.snapshot = WalletSnapshot::default();
            inner.form = TransferForm::default();
            inner.generation += 1;
            inner.state = AppState::Idle;
            inner.screen = Screen::Login;
        }
        log::info!("Logged out");
        self.notify(Event::SessionCleared);
        self.notify(Event::ScreenChanged(Screen::Login));
    }
}
