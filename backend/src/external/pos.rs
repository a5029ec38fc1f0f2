//! POS API client for fetching bulk order data
//!
//! Handles the bearer-token lifecycle and the paginated bulk-orders endpoint.
//! The token is cached in-process and reused until it is within 60 seconds of
//! its embedded expiry; concurrent refreshes may race and log in twice, which
//! costs one wasted call and nothing else.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use shared::pos::{aggregate_sold_counts, PosOrder};

use crate::config::PosConfig;
use crate::error::{AppError, AppResult};

/// Reuse the cached token only while it has at least this long to live.
const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

/// POS API client
#[derive(Clone)]
pub struct PosClient {
    client: Client,
    base_url: String,
    access_type: String,
    client_id: String,
    client_secret: String,
    page_size: u32,
    page_delay: Duration,
    max_pages: u32,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Login request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    #[serde(rename = "type")]
    access_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

/// Token payload returned by the authentication endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token_type: String,
    pub scope: Option<String>,
    pub expires_in: i64,
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl PosClient {
    /// Create a new PosClient from configuration
    pub fn new(config: &PosConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            access_type: config.access_type.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            page_size: config.page_size,
            page_delay: Duration::from_millis(config.page_delay_ms),
            max_pages: config.max_pages,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a new PosClient with custom base URL (for testing)
    pub fn with_base_url(config: &PosConfig, base_url: String) -> Self {
        let mut client = Self::new(config);
        client.base_url = base_url;
        client
    }

    /// Fetch sold quantities per menu item for a business date, bounded to
    /// the caller's allow-list.
    pub async fn sales_by_menu_item(
        &self,
        restaurant_external_id: &str,
        business_date: NaiveDate,
        allowed: &HashSet<String>,
    ) -> AppResult<HashMap<String, Decimal>> {
        let orders = self
            .fetch_orders(restaurant_external_id, business_date)
            .await?;
        Ok(aggregate_sold_counts(&orders, allowed))
    }

    /// Fetch every order for a business date via page-based pagination.
    ///
    /// Termination is last-page detection (a page shorter than the page
    /// size), with a hard `max_pages` ceiling so a misbehaving upstream
    /// cannot hold a report open indefinitely.
    pub async fn fetch_orders(
        &self,
        restaurant_external_id: &str,
        business_date: NaiveDate,
    ) -> AppResult<Vec<PosOrder>> {
        let token = self.bearer_token().await?;
        let date_param = business_date.format("%Y%m%d").to_string();
        let mut orders = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self
                .client
                .get(format!("{}/orders/v2/ordersBulk", self.base_url))
                .query(&[
                    ("businessDate", date_param.as_str()),
                    ("page", &page.to_string()),
                    ("pageSize", &self.page_size.to_string()),
                ])
                .header("Toast-Restaurant-External-ID", restaurant_external_id)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| AppError::PosApiError(format!("bulk orders request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::PosApiError(format!(
                    "bulk orders returned {}: {}",
                    status, body
                )));
            }

            let batch: Vec<PosOrder> = response
                .json()
                .await
                .map_err(|e| AppError::PosApiError(format!("failed to parse orders page: {}", e)))?;

            let batch_len = batch.len();
            orders.extend(batch);

            if batch_len < self.page_size as usize {
                break;
            }
            if page >= self.max_pages {
                tracing::warn!(
                    business_date = %business_date,
                    max_pages = self.max_pages,
                    "bulk order fetch hit page ceiling, result may be truncated"
                );
                break;
            }

            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }

        tracing::debug!(
            business_date = %business_date,
            pages = page,
            orders = orders.len(),
            "fetched POS orders"
        );
        Ok(orders)
    }

    /// Get a valid bearer token, logging in only when the cached one is
    /// expired or within the expiry skew.
    async fn bearer_token(&self) -> AppResult<String> {
        if let Some(cached) = self.token_cache.read().await.as_ref() {
            if cached.expires_at - Utc::now() > chrono::Duration::seconds(TOKEN_EXPIRY_SKEW_SECS) {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.login().await?;
        let expires_at = decode_token_expiry(&token.access_token)
            .unwrap_or_else(|| Utc::now() + chrono::Duration::seconds(token.expires_in));

        let mut cache = self.token_cache.write().await;
        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    /// Exchange credentials for a token
    async fn login(&self) -> AppResult<TokenResponse> {
        let body = LoginRequest {
            access_type: &self.access_type,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        };

        let response = self
            .client
            .post(format!("{}/authentication/v1/authentication/login", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::PosApiError(format!("login request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::PosApiError(format!(
                "login returned {}: {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::PosApiError(format!("failed to parse login response: {}", e)))
    }
}

/// Decode the `exp` claim from a JWT access token's payload segment.
/// No signature verification: we only need the expiry, the API verifies
/// the token itself.
fn decode_token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_exp_from_unsigned_token() {
        // header {"alg":"none"} / payload {"exp":1718409600}
        let header = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"{\"alg\":\"none\"}");
        let payload =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"{\"exp\":1718409600}");
        let token = format!("{}.{}.sig", header, payload);

        let expiry = decode_token_expiry(&token).unwrap();
        assert_eq!(expiry, DateTime::from_timestamp(1718409600, 0).unwrap());
    }

    #[test]
    fn malformed_token_yields_none() {
        assert!(decode_token_expiry("not-a-jwt").is_none());
        assert!(decode_token_expiry("a.!!!.c").is_none());
    }
}
