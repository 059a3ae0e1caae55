use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::SystemTime;
use thiserror::Error;

pub const LANGSMITH_API_BASE: &str = "https://api.smith.langchain.com";

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("Tracing HttpError: {0}")]
    HttpError(String),
}

/// Records model calls as runs in an external tracing service
#[async_trait]
pub trait TracingProvider: Send + Sync {
    async fn start_trace(
        &self,
        trace_id: &str,
        name: &str,
        trace_type: &str,
        inputs: &Value,
        parent_trace_id: Option<String>,
        start_time: Option<SystemTime>,
    ) -> Result<(), TracingError>;

    async fn end_trace(
        &self,
        trace_id: &str,
        outputs: &Value,
        end_time: Option<SystemTime>,
    ) -> Result<(), TracingError>;
}

/// Tracer that communicates with the LangSmith runs API.
pub struct LangSmithTracer {
    pub base_url: String,
    pub api_key: String, // "x-api-key" header
    pub http_client: Client,
}

impl LangSmithTracer {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: LANGSMITH_API_BASE.to_string(),
            api_key,
            http_client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn check(resp: reqwest::Response, what: &str) -> Result<(), TracingError> {
        if resp.status().is_success() {
            return Ok(());
        }
        let status = resp.status();
        let text = resp
            .text()
            .await
            .unwrap_or_else(|_| "No response body".to_string());
        Err(TracingError::HttpError(format!(
            "{} failed: HTTP {} - {}",
            what, status, text
        )))
    }
}

fn rfc3339(time: Option<SystemTime>) -> String {
    DateTime::<Utc>::from(time.unwrap_or_else(SystemTime::now))
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[derive(Serialize)]
struct StartRunBody<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "run_type")]
    trace_type: &'a str,
    inputs: &'a Value,
    start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_run_id: Option<String>,
}

#[derive(Serialize)]
struct EndRunBody<'a> {
    outputs: &'a Value,
    end_time: String,
}

#[async_trait]
impl TracingProvider for LangSmithTracer {
    async fn start_trace(
        &self,
        trace_id: &str,
        name: &str,
        trace_type: &str,
        inputs: &Value,
        parent_trace_id: Option<String>,
        start_time: Option<SystemTime>,
    ) -> Result<(), TracingError> {
        let body = StartRunBody {
            id: trace_id,
            name,
            trace_type,
            inputs,
            start_time: rfc3339(start_time),
            parent_run_id: parent_trace_id,
        };

        let resp = self
            .http_client
            .post(format!("{}/runs", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| TracingError::HttpError(err.to_string()))?;

        Self::check(resp, "start_trace").await
    }

    async fn end_trace(
        &self,
        trace_id: &str,
        outputs: &Value,
        end_time: Option<SystemTime>,
    ) -> Result<(), TracingError> {
        let body = EndRunBody {
            outputs,
            end_time: rfc3339(end_time),
        };

        let resp = self
            .http_client
            .patch(format!("{}/runs/{}", self.base_url, trace_id))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| TracingError::HttpError(err.to_string()))?;

        Self::check(resp, "end_trace").await
    }
}
