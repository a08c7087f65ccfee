//! Tracked tokens
//!
//! The client follows exactly two tokens on the configured chain: the native
//! gas token and one stablecoin. Backend balances are matched by token name.

use std::fmt;

pub const USDC_TOKEN_ID: &str = "5797fbd6-3795-519d-84ca-ec4c5f80c3b1";
pub const ETH_SEPOLIA_TOKEN_ID: &str = "979869da-9115-5f7d-917d-12d434e56ae7";

/// Share of the native balance that may be transferred; the rest covers fees
pub const NATIVE_TRANSFER_CEILING: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedToken {
    EthSepolia,
    Usdc,
}

impl TrackedToken {
    pub const ALL: [TrackedToken; 2] = [TrackedToken::EthSepolia, TrackedToken::Usdc];

    pub fn token_id(&self) -> &'static str {
        match self {
            TrackedToken::EthSepolia => ETH_SEPOLIA_TOKEN_ID,
            TrackedToken::Usdc => USDC_TOKEN_ID,
        }
    }

    /// Name the backend reports in `token.name`
    pub fn backend_name(&self) -> &'static str {
        match self {
            TrackedToken::EthSepolia => "Ethereum-Sepolia",
            TrackedToken::Usdc => "USDC",
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, TrackedToken::EthSepolia)
    }

    pub fn from_backend_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.backend_name() == name)
    }

    pub fn from_token_id(token_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.token_id() == token_id)
    }
}

impl fmt::Display for TrackedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackedToken::EthSepolia => write!(f, "ETH-Sepolia"),
            TrackedToken::Usdc => write!(f, "USDC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name_lookup() {
        assert_eq!(
            TrackedToken::from_backend_name("Ethereum-Sepolia"),
            Some(TrackedToken::EthSepolia)
        );
        assert_eq!(TrackedToken::from_backend_name("USDC"), Some(TrackedToken::Usdc));
        assert_eq!(TrackedToken::from_backend_name("EURC"), None);
    }

    #[test]
    fn test_token_id_lookup() {
        assert_eq!(
            TrackedToken::from_token_id(ETH_SEPOLIA_TOKEN_ID),
            Some(TrackedToken::EthSepolia)
        );
        assert!(TrackedToken::Usdc.to_string() == "USDC");
        assert!(TrackedToken::EthSepolia.is_native());
    }
}
