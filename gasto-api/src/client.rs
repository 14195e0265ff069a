use std::time::Duration;

use gasto_core::{ApplyRequest, DateRange, Recommendation, StatsSummary, Transaction};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::normalize;

/// Backend paths, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub statistics: String,
    pub transactions: String,
    pub recommendations: String,
    pub apply: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            statistics: "/api/transactions/statistics".to_string(),
            transactions: "/api/transactions".to_string(),
            recommendations: "/api/recommendations/".to_string(),
            apply: "/api/recommendations/apply".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub endpoints: Endpoints,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Typed client for the GastoSmart backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
    auth: AuthContext,
}

impl ApiClient {
    pub fn new(config: ClientConfig, auth: AuthContext) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints,
            auth,
        })
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// `GET statistics?from=..&to=..`
    pub async fn statistics(&self, range: &DateRange) -> Result<StatsSummary, ApiError> {
        let (from, to) = range.iso_bounds();
        let value = self
            .get_json(&self.endpoints.statistics, &[("from", from), ("to", to)])
            .await?;
        normalize::stats_from_value(&value)
    }

    /// `GET transactions?limit=..&date_from=..&date_to=..`
    pub async fn transactions(&self, range: &DateRange, limit: u32) -> Result<Vec<Transaction>, ApiError> {
        let (from, to) = range.iso_bounds();
        let value = self
            .get_json(
                &self.endpoints.transactions,
                &[("limit", limit.to_string()), ("date_from", from), ("date_to", to)],
            )
            .await?;
        let txns = normalize::transactions_from_value(&value)?;
        tracing::debug!(count = txns.len(), "fetched transactions");
        Ok(txns)
    }

    /// `GET recommendations`
    pub async fn recommendations(&self) -> Result<Vec<Recommendation>, ApiError> {
        let value = self.get_json(&self.endpoints.recommendations, &[]).await?;
        normalize::recommendations_from_value(&value)
    }

    /// `POST recommendations/apply` with a confirmed request; returns the updated record
    pub async fn apply(&self, rec: &Recommendation) -> Result<Recommendation, ApiError> {
        let body = ApplyRequest::confirm(rec);
        let url = self.url(&self.endpoints.apply);
        tracing::debug!(%url, rec_type = %body.rec_type, "POST");

        let req = self.authorize(self.http.post(&url).json(&body))?;
        let resp = req.send().await.map_err(network_error)?;
        let value = read_json(resp).await?;
        normalize::applied_from_value(&value, rec)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, ?query, "GET");

        let req = self.authorize(self.http.get(&url).query(query))?;
        let resp = req.send().await.map_err(network_error)?;
        read_json(resp).await
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError> {
        let req = req.header(ACCEPT, "application/json");
        match self.auth.authorization() {
            None => Ok(req),
            Some(Ok(value)) => Ok(req.header(AUTHORIZATION, value)),
            Some(Err(_)) => Err(ApiError::Unauthenticated),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn network_error(e: reqwest::Error) -> ApiError {
    let msg = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    tracing::warn!(error = %msg, "request failed before a response");
    ApiError::Network(msg)
}

async fn read_json(resp: Response) -> Result<Value, ApiError> {
    let status = resp.status();
    let body = resp.text().await.map_err(network_error)?;

    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("backend answered 401");
        return Err(ApiError::Unauthenticated);
    }
    if !status.is_success() {
        let message = normalize::extract_error_message(&body).unwrap_or_default();
        tracing::warn!(status = status.as_u16(), %message, "backend error");
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ApiError::DataShape(format!("body is not JSON: {e}")))
}
