use std::fmt;

/// Activity of the orchestrator; only one flow runs at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Idle,
    LoggingIn,
    Registering,
    SendingTokens,
    RefreshingBalance,
}

impl AppState {
    pub fn is_idle(&self) -> bool {
        matches!(self, AppState::Idle)
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppState::Idle => "idle",
            AppState::LoggingIn => "logging in",
            AppState::Registering => "registering",
            AppState::SendingTokens => "sending tokens",
            AppState::RefreshingBalance => "refreshing balance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Home,
    SendToken,
    Transactions,
    TransactionDetail,
}

impl Screen {
    /// Every screen except Login needs a session
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Screen::Login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_login_is_unauthenticated() {
        assert!(!Screen::Login.is_authenticated());
        assert!(Screen::Home.is_authenticated());
        assert!(Screen::TransactionDetail.is_authenticated());
    }
}
