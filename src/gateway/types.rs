// W3S API request/response types

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::tokens::TrackedToken;

/// Source timestamp format of transaction dates
pub const SOURCE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
/// Display format used by the transaction screens
pub const DISPLAY_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// Every W3S response wraps its payload in `data`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest<'a> {
    pub user_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub user_token: String,
    pub encryption_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeUserRequest<'a> {
    pub idempotency_key: String,
    pub blockchains: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeId {
    pub challenge_id: String,
}

/// Custodial wallet snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub wallet_set_id: String,
    #[serde(default)]
    pub custody_type: String,
    #[serde(default)]
    pub user_id: String,
    pub address: String,
    pub blockchain: String,
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub create_date: String,
    #[serde(default)]
    pub update_date: String,
}

#[derive(Debug, Deserialize)]
pub struct WalletList {
    pub wallets: Vec<Wallet>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub blockchain: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default)]
    pub is_native: bool,
    #[serde(default)]
    pub update_date: String,
    #[serde(default)]
    pub create_date: String,
}

/// One token balance as reported by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub amount: String,
    #[serde(default)]
    pub update_date: String,
    pub token: Token,
}

impl TokenBalance {
    /// Tracked token this balance belongs to, if any
    pub fn tracked(&self) -> Option<TrackedToken> {
        TrackedToken::from_backend_name(&self.token.name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceList {
    pub token_balances: Vec<TokenBalance>,
}

/// Body of `POST /v1/w3s/user/transactions/transfer`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub idempotency_key: String,
    pub destination_address: String,
    pub amounts: Vec<String>,
    pub token_id: String,
    pub wallet_id: String,
    pub fee_level: FeeLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeeLevel {
    Low,
    Medium,
    High,
}

/// Query of `GET /v1/w3s/transactions`
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    pub blockchain: String,
    pub custody_type: String,
    pub operation: String,
    pub page_size: u32,
}

impl TransactionQuery {
    /// End-user custodied transfers on one chain
    pub fn transfers(blockchain: &str, page_size: u32) -> Self {
        Self {
            blockchain: blockchain.to_string(),
            custody_type: "ENDUSER".to_string(),
            operation: "TRANSFER".to_string(),
            page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amounts: Vec<String>,
    #[serde(default)]
    pub source_address: String,
    pub destination_address: String,
    pub state: String,
    pub transaction_type: String,
    #[serde(default)]
    pub network_fee: String,
    #[serde(default)]
    pub token_id: String,
    pub blockchain: String,
    pub create_date: String,
    pub update_date: String,
}

impl Transaction {
    /// First amount; the only one the client displays
    pub fn amount(&self) -> &str {
        self.amounts.first().map(String::as_str).unwrap_or("")
    }

    /// `ETH-Sepolia` for the native token id, `USDC` for anything else
    pub fn token_label(&self) -> String {
        match TrackedToken::from_token_id(&self.token_id) {
            Some(TrackedToken::EthSepolia) => TrackedToken::EthSepolia.to_string(),
            _ => TrackedToken::Usdc.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == "COMPLETE"
    }

    pub fn display_create_date(&self, offset: FixedOffset) -> String {
        format_display_date(&self.create_date, offset)
    }

    pub fn display_update_date(&self, offset: FixedOffset) -> String {
        format_display_date(&self.update_date, offset)
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
}

/// Render a backend timestamp for display; empty when it does not parse
pub fn format_display_date(raw: &str, offset: FixedOffset) -> String {
    match NaiveDateTime::parse_from_str(raw, SOURCE_DATE_FORMAT) {
        Ok(naive) => {
            let local: DateTime<FixedOffset> =
                DateTime::from_naive_utc_and_offset(naive, offset);
            local.format(DISPLAY_DATE_FORMAT).to_string()
        }
        Err(e) => {
            log::debug!("Unparseable date '{}': {}", raw, e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singapore() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn test_display_date_shifts_to_offset() {
        assert_eq!(
            format_display_date("2023-09-01T16:30:05Z", singapore()),
            "02 Sep 2023 00:30:05"
        );
    }

    #[test]
    fn test_display_date_empty_on_garbage() {
        assert_eq!(format_display_date("yesterday", singapore()), "");
        assert_eq!(format_display_date("", singapore()), "");
    }

    #[test]
    fn test_transfer_request_wire_shape() {
        let req = TransferRequest {
            idempotency_key: "k".into(),
            destination_address: "0xabc".into(),
            amounts: vec!["1.5".into()],
            token_id: "t".into(),
            wallet_id: "w".into(),
            fee_level: FeeLevel::Low,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["feeLevel"], "LOW");
        assert_eq!(json["destinationAddress"], "0xabc");
        assert_eq!(json["amounts"][0], "1.5");
        assert_eq!(json["idempotencyKey"], "k");
    }

    #[test]
    fn test_balance_list_ignores_extra_fields() {
        let body = r#"{"data":{"tokenBalances":[{"amount":"12.5","updateDate":"x",
            "token":{"id":"t1","blockchain":"ETH-SEPOLIA","name":"USDC","symbol":"USDC",
            "decimals":6,"isNative":false,"standard":"ERC20"}}]}}"#;
        let parsed: Envelope<BalanceList> = serde_json::from_str(body).unwrap();
        let balance = &parsed.data.token_balances[0];
        assert_eq!(balance.amount, "12.5");
        assert_eq!(balance.tracked(), Some(TrackedToken::Usdc));
    }

    #[test]
    fn test_transaction_token_label_defaults_to_stablecoin() {
        let tx = Transaction {
            id: "tx".into(),
            amounts: vec![],
            source_address: String::new(),
            destination_address: "0x1".into(),
            state: "FAILED".into(),
            transaction_type: "OUTBOUND".into(),
            network_fee: String::new(),
            token_id: "unknown".into(),
            blockchain: "ETH-SEPOLIA".into(),
            create_date: String::new(),
            update_date: String::new(),
        };
        assert_eq!(tx.token_label(), "USDC");
        assert_eq!(tx.amount(), "");
        assert!(!tx.is_complete());
    }
}
