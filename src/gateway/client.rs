use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::types::*;
use super::{Auth, Gateway};
use crate::error::GatewayError;

const API_PREFIX: &str = "/v1/w3s";
const USER_TOKEN_HEADER: &str = "X-User-Token";

/// `reqwest`-backed gateway to the W3S REST API
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Request carrying the bearer API key, plus `X-User-Token` when `with_user_token`
    fn request(&self, method: Method, path: &str, auth: &Auth, with_user_token: bool) -> RequestBuilder {
        let url = self.url(path);
        log::debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .bearer_auth(&auth.api_key);
        if with_user_token {
            builder = builder.header(USER_TOKEN_HEADER, &auth.user_token);
        }
        builder
    }
}

/// Read the body once and decode either the `data` envelope or the error body
async fn decode_envelope<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    let envelope: Envelope<T> = serde_json::from_slice(&body)?;
    Ok(envelope.data)
}

fn api_error(status: u16, body: &[u8]) -> GatewayError {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(err) => GatewayError::Api {
            status,
            code: err.code,
            message: err.message,
        },
        Err(_) => GatewayError::Decode(format!(
            "HTTP {} with unrecognised body: {}",
            status,
            String::from_utf8_lossy(body)
        )),
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn create_user(&self, auth: &Auth, user_id: &str) -> Result<(), GatewayError> {
        let response = self
            .request(Method::POST, "/users", auth, false)
            .json(&UserRequest { user_id })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await?;
        Err(api_error(status.as_u16(), &body))
    }

    async fn create_session(&self, auth: &Auth, user_id: &str) -> Result<SessionToken, GatewayError> {
        let response = self
            .request(Method::POST, "/users/token", auth, false)
            .json(&UserRequest { user_id })
            .send()
            .await?;
        decode_envelope(response).await
    }

    async fn initialize_user(
        &self,
        auth: &Auth,
        idempotency_key: String,
        blockchains: &[String],
    ) -> Result<ChallengeId, GatewayError> {
        let response = self
            .request(Method::POST, "/user/initialize", auth, true)
            .json(&InitializeUserRequest {
                idempotency_key,
                blockchains,
            })
            .send()
            .await?;
        decode_envelope(response).await
    }

    async fn list_wallets(
        &self,
        auth: &Auth,
        blockchain: &str,
        page_size: u32,
    ) -> Result<Vec<Wallet>, GatewayError> {
        let response = self
            .request(Method::GET, "/wallets", auth, true)
            .query(&[("blockchain", blockchain.to_string()), ("pageSize", page_size.to_string())])
            .send()
            .await?;
        let list: WalletList = decode_envelope(response).await?;
        Ok(list.wallets)
    }

    async fn get_balances(&self, auth: &Auth, wallet_id: &str) -> Result<Vec<TokenBalance>, GatewayError> {
        let path = format!("/wallets/{}/balances", wallet_id);
        let response = self.request(Method::GET, &path, auth, false).send().await?;
        let list: BalanceList = decode_envelope(response).await?;
        Ok(list.token_balances)
    }

    async fn create_transfer(&self, auth: &Auth, request: &TransferRequest) -> Result<ChallengeId, GatewayError> {
        let response = self
            .request(Method::POST, "/user/transactions/transfer", auth, true)
            .json(request)
            .send()
            .await?;
        decode_envelope(response).await
    }

    async fn list_transactions(
        &self,
        auth: &Auth,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let response = self
            .request(Method::GET, "/transactions", auth, true)
            .query(&[
                ("blockchain", query.blockchain.clone()),
                ("custodyType", query.custody_type.clone()),
                ("operation", query.operation.clone()),
                ("pageSize", query.page_size.to_string()),
            ])
            .send()
            .await?;
        let list: TransactionList = decode_envelope(response).await?;
        Ok(list.transactions)
    }
}
