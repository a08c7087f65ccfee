//! Challenge executor bridge
//!
//! The vendor SDK runs challenges (PIN setup, transfer signing) in its own
//! modal UI. The host hands the core an implementation of
//! [`ChallengeExecutor`]; the core never looks inside it.

/// Vendor error code for "user already has a PIN set"
pub const USER_HAS_SET_PIN: i64 = 155704;

/// Endpoint and app id the SDK is configured with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkConfiguration {
    pub endpoint: String,
    pub app_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeRequest {
    pub user_token: String,
    pub encryption_key: String,
    pub challenge_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeErrorCode {
    UserHasSetPin,
    Other(i64),
}

impl From<i64> for ChallengeErrorCode {
    fn from(code: i64) -> Self {
        match code {
            USER_HAS_SET_PIN => ChallengeErrorCode::UserHasSetPin,
            other => ChallengeErrorCode::Other(other),
        }
    }
}

impl ChallengeErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            ChallengeErrorCode::UserHasSetPin => USER_HAS_SET_PIN,
            ChallengeErrorCode::Other(code) => *code,
        }
    }
}

/// Terminal result reported by the SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Success {
        status: String,
        result_type: String,
    },
    Failure {
        error_code: ChallengeErrorCode,
        display_message: String,
    },
}

/// One-shot completion handed to the executor
pub type ChallengeCallback = Box<dyn FnOnce(ChallengeOutcome) + Send + 'static>;

pub trait ChallengeExecutor: Send + Sync {
    /// Point the SDK at an endpoint/app id; called before the first challenge and on change
    fn configure(&self, configuration: &SdkConfiguration);

    /// Run the challenge and call `on_complete` exactly once
    fn execute(&self, request: ChallengeRequest, on_complete: ChallengeCallback);

    /// Close the SDK's own modal
    fn dismiss(&self);
}

/// Built-in SDK screens reachable without a backend challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiChallenge {
    NewPin,
    EnterPin,
    ChangePin,
    RestorePin,
}

impl UiChallenge {
    pub fn challenge_id(&self) -> &'static str {
        match self {
            UiChallenge::NewPin => "ui_new_pin",
            UiChallenge::EnterPin => "ui_enter_pin",
            UiChallenge::ChangePin => "ui_change_pin",
            UiChallenge::RestorePin => "ui_restore_pin",
        }
    }

    /// Request with empty credentials; the SDK only renders its UI
    pub fn request(&self) -> ChallengeRequest {
        ChallengeRequest {
            challenge_id: self.challenge_id().to_string(),
            ..Default::default()
        }
    }
}
