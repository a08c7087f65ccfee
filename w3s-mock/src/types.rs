/// W3S API wire types
///
/// These match the backend's JSON format so the real client can consume
/// them unchanged.
use serde::{Deserialize, Serialize};

/// Every success body is wrapped in `data`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Error body of non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokenResponse {
    pub user_token: String,
    pub encryption_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    pub idempotency_key: String,
    pub blockchains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeIdResponse {
    pub challenge_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub id: String,
    pub state: String,
    pub wallet_set_id: String,
    pub custody_type: String,
    pub user_id: String,
    pub address: String,
    pub blockchain: String,
    pub account_type: String,
    pub create_date: String,
    pub update_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletsResponse {
    pub wallets: Vec<WalletResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletQuery {
    pub blockchain: Option<String>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub id: String,
    pub blockchain: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub is_native: bool,
    pub update_date: String,
    pub create_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceResponse {
    pub amount: String,
    pub update_date: String,
    pub token: TokenResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub token_balances: Vec<TokenBalanceResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub idempotency_key: String,
    pub destination_address: String,
    pub amounts: Vec<String>,
    pub token_id: String,
    pub wallet_id: String,
    pub fee_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub amounts: Vec<String>,
    pub source_address: String,
    pub destination_address: String,
    pub state: String,
    pub transaction_type: String,
    pub network_fee: String,
    pub token_id: String,
    pub blockchain: String,
    pub create_date: String,
    pub update_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub blockchain: Option<String>,
    pub custody_type: Option<String>,
    pub operation: Option<String>,
    pub page_size: Option<usize>,
}

/// Body of the `/mock/wallets/:id/fund` helper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRequest {
    pub token_id: String,
    pub amount: f64,
}
