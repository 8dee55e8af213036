use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::core::config::GatewayConfig;
use crate::core::{Error, ExchangeGateway, Result, UserId};
use crate::gateway::model::*;
use crate::orders::OrderData;

const API_KEY_HEADER: &str = "api-key";

/// REST client for the Doma orderbook API
pub struct DomaClient {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl DomaClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid gateway url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Gateway url {} cannot be a base", base_url)));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key)
                .map_err(|_| Error::Config("API key is not a valid header value".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            headers,
        })
    }

    /// Build from config; requires a credential
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let api_key = config
            .credential()
            .ok_or_else(|| Error::Config("gateway API key missing".into()))?;
        Self::new(
            &config.base_url,
            api_key,
            Duration::from_millis(config.submit_timeout_ms),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, op: &str, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);
        debug!("{} GET {}", op, url);

        let res = self.client.get(url).headers(self.headers.clone()).send().await?;
        Self::parse(op, res).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        op: &str,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(segments);
        debug!("{} POST {}", op, url);

        let res = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;
        Self::parse(op, res).await
    }

    async fn parse<T: DeserializeOwned>(op: &str, res: Response) -> Result<T> {
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            error!("{} failed: status {}, body {}", op, status, text);
            return Err(Error::Gateway(format!("{}: status {}, body {}", op, status, text)));
        }

        let text = res.text().await?;
        // Some endpoints acknowledge with an empty body
        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(body).map_err(|e| {
            error!("{} returned an unexpected body: {}", op, e);
            Error::Serialization(e)
        })
    }
}

#[async_trait]
impl ExchangeGateway for DomaClient {
    fn name(&self) -> &str {
        "doma"
    }

    async fn submit_offer(&self, order: &OrderData) -> Result<SubmittedOrder> {
        self.post("submit_offer", &["v1", "orderbook", "offer"], order).await
    }

    async fn get_listing_fulfillment(&self, order_id: &str, buyer: &UserId) -> Result<Value> {
        self.get(
            "get_listing_fulfillment",
            &["v1", "orderbook", "listing", order_id, buyer.as_str()],
        )
        .await
    }

    async fn get_fees(&self, orderbook: &str, chain_id: &str, contract: &str) -> Result<FeeSchedule> {
        self.get("get_fees", &["v1", "orderbook", "fee", orderbook, chain_id, contract])
            .await
    }

    async fn get_supported_currencies(
        &self,
        chain_id: &str,
        contract: &str,
        orderbook: &str,
    ) -> Result<Vec<Currency>> {
        let res: CurrenciesResponse = self
            .get(
                "get_supported_currencies",
                &["v1", "orderbook", "currencies", chain_id, contract, orderbook],
            )
            .await?;
        Ok(res.currencies)
    }

    async fn cancel_listing(&self, order_id: &str, signature: &str) -> Result<Value> {
        let body = CancelListingRequest {
            order_id: order_id.to_string(),
            signature: signature.to_string(),
        };
        self.post("cancel_listing", &["v1", "orderbook", "listing", "cancel"], &body)
            .await
    }
}
